use crate::report::{run_batch, run_evaluate, run_models, BatchArgs, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use peg_risk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PEG Risk Calculator",
    about = "Serve and run the PEG placement risk models from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the registered models and the fields each one needs
    Models,
    /// Evaluate a single patient against one model
    Evaluate(EvaluateArgs),
    /// Evaluate every row of a CSV export against one model
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Models => run_models(),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Batch(args) => run_batch(args),
    }
}
