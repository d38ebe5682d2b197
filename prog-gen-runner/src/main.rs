use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prog_gen::generator::GenOptions;
use prog_gen::policy::Policy;
use prog_gen::runtime::config::{Compiler, OptLevel};
use prog_gen::runtime::run::Runner;
use rand::Rng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Differential runner: generates programs and cross-checks checksums across compilers and optimization levels."
)]
struct RunnerArgs {
    #[clap(short = 'n', long, default_value = "100", help = "Number of programs to test.")]
    runs: u64,
    #[clap(
        short,
        long,
        default_value = "output",
        help = "Directory collecting failing (and optionally passing) programs."
    )]
    output_path: PathBuf,
    #[clap(
        short,
        long,
        help = "Generation policy. A random preset is chosen per run when omitted."
    )]
    policy: Option<String>,
    #[clap(long, help = "Keep passing programs as well.")]
    save_passing: bool,
    #[clap(
        long,
        default_value = "g++",
        help = "Comma-separated compiler drivers to cross-check."
    )]
    compilers: String,
}

fn main() {
    let args: RunnerArgs = RunnerArgs::parse();
    let compilers: Vec<Compiler> = args
        .compilers
        .split(',')
        .map(|name| Compiler::new(name.trim()))
        .collect();

    let scratch = args.output_path.join("scratch");
    fs::create_dir_all(&scratch).expect("Unable to create scratch directory");

    let progress_bar = ProgressBar::new(args.runs);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} {bar:60} {pos}/{len} {msg}"),
    );

    let mut failures: u64 = 0;
    for _ in 0..args.runs {
        let seed: u64 = rand::thread_rng().gen_range(1..u64::MAX);
        let policy = Policy::parse_policy_args_or_random(&args.policy);
        let runner = Runner {
            policy,
            opts: GenOptions::default(),
            base_name: "test".to_string(),
            directory: scratch.clone(),
            compilers: compilers.clone(),
            opt_levels: OptLevel::all_opt_levels(),
        };
        let output = runner.run(seed);
        if let Err(err) = &output {
            failures += 1;
            progress_bar.println(format!("Seed {}: {}", seed, err));
        }
        Runner::save_and_clean_up(&output, seed, &args.output_path, args.save_passing);
        progress_bar.set_message(format!("{} failures", failures));
        progress_bar.inc(1);
    }
    progress_bar.finish();
    println!("{}/{} programs failed", failures, args.runs);
    if failures > 0 {
        std::process::exit(1);
    }
}
