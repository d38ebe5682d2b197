use crate::generator::{run_generator, GenOptions, GeneratorOutput};
use crate::policy::Policy;
use crate::runtime::config::{Compiler, OptLevel};
use crate::runtime::error::{
    CompilationError, DifferingChecksumError, RunError, RunnerError, UnexpectedChecksumError,
};
use crate::utils::write_as_ron;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub type RunOutput = Result<Vec<PathBuf>, RunnerError>;

pub type ChecksumMapping = Vec<((Compiler, OptLevel), u64)>;

/// Differential driver: one generated program, compiled with every
/// compiler/optimization-level pair, must print one checksum.
pub struct Runner {
    pub policy: Policy,
    pub opts: GenOptions,
    pub base_name: String,
    pub directory: PathBuf,
    pub compilers: Vec<Compiler>,
    pub opt_levels: Vec<OptLevel>,
}

impl Runner {
    pub fn run(&self, seed: u64) -> RunOutput {
        // Generate program
        let GeneratorOutput {
            files,
            seed,
            expected_checksum,
            statistics,
        } = run_generator(seed, &self.policy, &self.opts).map_err(RunnerError::Generator)?;

        // Save program
        let mut source_files: Vec<PathBuf> = vec![];
        for file in &files {
            let path = self.directory.join(&file.name);
            fs::write(&path, &file.contents).expect("Unable to write file");
            if !file.name.ends_with(".h") {
                source_files.push(path.clone());
            }
        }

        // Write statistics
        let stats_file = self.directory.join("statistics.txt");
        write_as_ron(
            fs::File::create(&stats_file).expect("Unable to create file"),
            statistics,
        );

        // Compile and run with every compiler/opt-level pair
        let mut runs: ChecksumMapping = vec![];
        let mut all_files: Vec<PathBuf> = vec![self.directory.join("init.h"), stats_file];
        all_files.extend(source_files.clone());

        for compiler in &self.compilers {
            for opt in &self.opt_levels {
                let bin_name = format!(
                    "{}-{}-{}-O{}",
                    self.base_name,
                    seed,
                    compiler.to_string(),
                    opt.to_string()
                );
                let bin_file = self.directory.join(bin_name);
                all_files.push(bin_file.clone());
                compile_program(&source_files, &bin_file, compiler, opt)?;
                let checksum = run_program(&bin_file)?;
                runs.push(((compiler.clone(), opt.clone()), checksum));
            }
        }

        // Compare outputs between builds
        if !runs.iter().all(|run| run.1 == runs[0].1) {
            return Err(DifferingChecksumError {
                files: all_files,
                checksums: runs,
            }
            .into());
        }

        // Compare outputs against the generator's prediction
        if !runs.iter().all(|run| run.1 == expected_checksum) {
            return Err(UnexpectedChecksumError {
                files: all_files,
                expected_checksum,
                checksums: runs,
            }
            .into());
        }

        Ok(all_files)
    }

    /// Moves a finished run's files into pass/fail buckets under the output
    /// directory and cleans the scratch space.
    pub fn save_and_clean_up(
        output: &RunOutput,
        seed: u64,
        output_path: &Path,
        save_passing_programs: bool,
    ) -> PathBuf {
        match output {
            Ok(files) => {
                let directory = output_path.join("pass").join(seed.to_string());
                if save_passing_programs {
                    fs::create_dir_all(&directory).expect("Unable to create directory");
                }
                for file in files {
                    if save_passing_programs {
                        let file_name = file.file_name().unwrap();
                        let _ = fs::rename(file, directory.join(file_name));
                    } else {
                        let _ = fs::remove_file(file);
                    }
                }
                directory
            }
            Err(err) => {
                let directory = output_path
                    .join("fail")
                    .join(err.folder_name())
                    .join(seed.to_string());
                fs::create_dir_all(&directory).expect("Unable to create directory");
                for file in &err.files() {
                    let file_name = file.file_name().unwrap();
                    let _ = fs::rename(file, directory.join(file_name));
                }
                directory
            }
        }
    }
}

fn compile_program(
    source_files: &[PathBuf],
    bin_file: &Path,
    compiler: &Compiler,
    opt: &OptLevel,
) -> Result<(), CompilationError> {
    let output = Command::new(compiler.to_string())
        .arg(format!("-O{}", opt.to_char()))
        .args(source_files)
        .arg("-o")
        .arg(bin_file)
        .output()
        .expect("Failed to execute compiler");
    if !output.status.success() {
        return Err(CompilationError::new(source_files.to_vec(), &output));
    }
    Ok(())
}

fn run_program(bin_file: &Path) -> Result<u64, RunError> {
    let output = Command::new(bin_file)
        .output()
        .expect("Failed to execute generated program");
    if !output.status.success() {
        return Err(RunError::new(bin_file.to_path_buf(), &output));
    }
    String::from_utf8_lossy(output.stdout.as_ref())
        .trim()
        .parse()
        .map_err(|_| RunError::new(bin_file.to_path_buf(), &output))
}
