use clap::Parser;
use todos::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
