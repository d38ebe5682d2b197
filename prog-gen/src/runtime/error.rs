use crate::generator::GeneratorError;
use crate::runtime::run::ChecksumMapping;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Output;

#[derive(Debug)]
pub enum RunnerError {
    Generator(GeneratorError),
    Compilation(CompilationError),
    Run(RunError),
    DifferingChecksum(DifferingChecksumError),
    UnexpectedChecksum(UnexpectedChecksumError),
}

impl RunnerError {
    pub fn folder_name(&self) -> &'static str {
        match self {
            RunnerError::Generator(_) => "generator_error",
            RunnerError::Compilation(_) => "compilation_error",
            RunnerError::Run(_) => "run_error",
            RunnerError::DifferingChecksum(_) => "differing_checksum_error",
            RunnerError::UnexpectedChecksum(_) => "unexpected_checksum_error",
        }
    }

    pub fn files(&self) -> Vec<PathBuf> {
        match self {
            RunnerError::Generator(_err) => vec![],
            RunnerError::Compilation(err) => err.files(),
            RunnerError::Run(err) => err.files(),
            RunnerError::DifferingChecksum(err) => err.files(),
            RunnerError::UnexpectedChecksum(err) => err.files(),
        }
    }
}

impl Error for RunnerError {}

impl Display for RunnerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Generator(err) => Display::fmt(err, f),
            RunnerError::Compilation(err) => Display::fmt(err, f),
            RunnerError::Run(err) => Display::fmt(err, f),
            RunnerError::DifferingChecksum(err) => Display::fmt(err, f),
            RunnerError::UnexpectedChecksum(err) => Display::fmt(err, f),
        }
    }
}

impl From<GeneratorError> for RunnerError {
    fn from(err: GeneratorError) -> RunnerError {
        RunnerError::Generator(err)
    }
}

#[derive(Debug)]
pub struct CompilationError {
    pub source_files: Vec<PathBuf>,
    pub status_code: i32,
    pub std_err: String,
}

impl CompilationError {
    pub fn new(source_files: Vec<PathBuf>, output: &Output) -> CompilationError {
        CompilationError {
            source_files,
            status_code: output.status.code().unwrap_or(-1),
            std_err: String::from_utf8_lossy(output.stderr.as_ref()).to_string(),
        }
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.source_files.clone()
    }
}

impl Error for CompilationError {}

impl Display for CompilationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Failed to compile generated program")?;
        writeln!(f, "Status code {}", self.status_code)?;
        writeln!(f, "Standard error")?;
        writeln!(f, "{}", self.std_err)
    }
}

impl From<CompilationError> for RunnerError {
    fn from(err: CompilationError) -> RunnerError {
        RunnerError::Compilation(err)
    }
}

#[derive(Debug)]
pub struct RunError {
    pub bin_file_path: PathBuf,
    pub status_code: i32,
    pub std_err: String,
}

impl RunError {
    pub fn new(bin_file_path: PathBuf, output: &Output) -> RunError {
        RunError {
            bin_file_path,
            status_code: output.status.code().unwrap_or(-1),
            std_err: String::from_utf8_lossy(output.stderr.as_ref()).to_string(),
        }
    }

    pub fn files(&self) -> Vec<PathBuf> {
        vec![self.bin_file_path.clone()]
    }
}

impl Error for RunError {}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Failed to run {}", self.bin_file_path.display())?;
        writeln!(f, "Status code {}", self.status_code)?;
        writeln!(f, "Standard error")?;
        writeln!(f, "{}", self.std_err)
    }
}

impl From<RunError> for RunnerError {
    fn from(err: RunError) -> RunnerError {
        RunnerError::Run(err)
    }
}

#[derive(Debug)]
pub struct DifferingChecksumError {
    pub files: Vec<PathBuf>,
    pub checksums: ChecksumMapping,
}

impl DifferingChecksumError {
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }
}

impl Error for DifferingChecksumError {}

impl Display for DifferingChecksumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Differing checksum results between builds")?;
        writeln!(f, "{:#?}", self.checksums)
    }
}

impl From<DifferingChecksumError> for RunnerError {
    fn from(err: DifferingChecksumError) -> RunnerError {
        RunnerError::DifferingChecksum(err)
    }
}

#[derive(Debug)]
pub struct UnexpectedChecksumError {
    pub files: Vec<PathBuf>,
    pub expected_checksum: u64,
    pub checksums: ChecksumMapping,
}

impl UnexpectedChecksumError {
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }
}

impl Error for UnexpectedChecksumError {}

impl Display for UnexpectedChecksumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Miscalculated checksum")?;
        writeln!(f, "Expected checksum {}", self.expected_checksum)?;
        writeln!(f, "Actual checksums {:#?}", self.checksums)
    }
}

impl From<UnexpectedChecksumError> for RunnerError {
    fn from(err: UnexpectedChecksumError) -> RunnerError {
        RunnerError::UnexpectedChecksum(err)
    }
}
