#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OptLevel(char);

impl OptLevel {
    pub fn no_opt() -> OptLevel {
        OptLevel('0')
    }

    pub fn all_opt_levels() -> Vec<OptLevel> {
        vec![OptLevel('0'), OptLevel('1'), OptLevel('2'), OptLevel('3')]
    }

    pub fn to_char(&self) -> char {
        self.0
    }
}

impl ToString for OptLevel {
    fn to_string(&self) -> String {
        self.0.to_string()
    }
}

static COMPILERS: [&str; 2] = ["g++", "clang++"];

/// A C++ compiler driver invoked by name from PATH.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Compiler(String);

impl Compiler {
    pub fn gxx() -> Compiler {
        Compiler("g++".to_string())
    }

    pub fn new(name: impl Into<String>) -> Compiler {
        Compiler(name.into())
    }

    pub fn supported_compilers() -> Vec<Compiler> {
        COMPILERS.map(str::to_string).map(Compiler).to_vec()
    }
}

impl ToString for Compiler {
    fn to_string(&self) -> String {
        self.0.clone()
    }
}

/// Language standard of the emitted test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangStd {
    Cxx,
    Ispc,
    Sycl,
}

impl LangStd {
    pub fn from_arg(arg: &str) -> Option<LangStd> {
        match arg {
            "cpp" => Some(LangStd::Cxx),
            "ispc" => Some(LangStd::Ispc),
            "sycl" => Some(LangStd::Sycl),
            _ => None,
        }
    }

    pub fn available_args() -> Vec<&'static str> {
        vec!["cpp", "ispc", "sycl"]
    }

    pub fn func_file_name(self) -> &'static str {
        match self {
            LangStd::Ispc => "func.ispc",
            LangStd::Cxx | LangStd::Sycl => "func.cpp",
        }
    }
}

impl Default for LangStd {
    fn default() -> LangStd {
        LangStd::Cxx
    }
}

/// Three-valued option used for assert emission and input passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionLevel {
    None,
    Some,
    All,
}

impl OptionLevel {
    pub fn from_arg(arg: &str) -> Option<OptionLevel> {
        match arg {
            "none" => Some(OptionLevel::None),
            "some" => Some(OptionLevel::Some),
            "all" => Some(OptionLevel::All),
            _ => None,
        }
    }

    pub fn available_args() -> Vec<&'static str> {
        vec!["none", "some", "all"]
    }
}
