use clap::{Parser, Subcommand};
use std::process;
use tracing::error;

mod cmd;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trigger scenario against a tuning session and report the outcome.
    Simulate(cmd::simulate::SimulateArgs),
    /// Validate and print a tuning space file.
    Space(cmd::space::SpaceArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Simulate(args) => cmd::simulate::run(args),
        Commands::Space(args) => cmd::space::run(args),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
