use clap::Parser;
use prog_gen::generator::{run_generator, GenOptions, GeneratorOutput};
use prog_gen::policy::Policy;
use prog_gen::runtime::config::{LangStd, OptionLevel};
use prog_gen::utils::write_as_ron;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Randomized C-dialect program generator for differential compiler testing."
)]
struct GeneratorArgs {
    #[clap(
        short,
        long,
        default_value = "0",
        help = "Seed (0 is reserved for random)."
    )]
    seed: u64,
    #[clap(short = 'd', long, default_value = "./", help = "Output directory.")]
    out_dir: PathBuf,
    #[clap(
        long,
        default_value = "cpp",
        help = "Language standard of the test [cpp, ispc, sycl]."
    )]
    std: String,
    #[clap(
        long,
        default_value = "some",
        help = "Use asserts in check function [none, some, all]."
    )]
    asserts: String,
    #[clap(
        long,
        default_value = "none",
        help = "Pass input data as parameters [none, some, all]."
    )]
    inp_as_args: String,
    #[clap(
        short,
        long,
        help = "Generation policy [default: default]. Use the flag \"-p help\" for a list of available policies."
    )]
    policy: Option<String>,
    #[clap(long, help = "Write generation statistics next to the program.")]
    statistics: bool,
}

fn parse_or_usage<T>(value: Option<T>, what: &str, available: Vec<&'static str>) -> T {
    value.unwrap_or_else(|| {
        eprintln!("Can't recognize {}, choose from {:?}", what, available);
        std::process::exit(2)
    })
}

pub fn main() {
    let args: GeneratorArgs = GeneratorArgs::parse();
    let policy = Policy::parse_policy_args(&args.policy);
    let opts = GenOptions {
        lang_std: parse_or_usage(
            LangStd::from_arg(&args.std),
            "language standard",
            LangStd::available_args(),
        ),
        asserts: parse_or_usage(
            OptionLevel::from_arg(&args.asserts),
            "asserts use level",
            OptionLevel::available_args(),
        ),
        inp_as_args: parse_or_usage(
            OptionLevel::from_arg(&args.inp_as_args),
            "input passing mode",
            OptionLevel::available_args(),
        ),
    };

    let GeneratorOutput {
        files,
        seed,
        expected_checksum,
        statistics,
    } = run_generator(args.seed, &policy, &opts).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1)
    });

    fs::create_dir_all(&args.out_dir).expect("Unable to create output directory");
    for file in &files {
        fs::write(args.out_dir.join(&file.name), &file.contents).expect("Unable to write file");
    }
    if args.statistics {
        let stats_file =
            fs::File::create(args.out_dir.join("statistics.txt")).expect("Unable to create file");
        write_as_ron(stats_file, statistics);
    }
    eprintln!("Seed: {}", seed);
    eprintln!("Expected checksum: {}", expected_checksum);
}
