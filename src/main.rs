use clap::Parser;
use investats::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    investats::cli::init_tracing(cli.verbose);
    run(cli)
}
