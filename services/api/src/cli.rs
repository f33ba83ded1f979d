use crate::demo::{run_demo, run_roster_report, DemoArgs, RosterReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vetwatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "vetwatch",
    about = "VA accountability scorecard: serve the portal API or score a roster from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (the default when no subcommand is given)
    Serve(ServeArgs),
    /// Import a roster export, score every facility, and print the oversight report
    Report(RosterReportArgs),
    /// Walk the full engine end to end: import, scoring, integrity intake, oversight
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Bind host, overriding VETWATCH_HOST
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Bind port, overriding VETWATCH_PORT
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Preload and score a roster CSV export before accepting traffic
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    match Cli::parse().command {
        None => server::run(ServeArgs::default()).await,
        Some(Command::Serve(args)) => server::run(args).await,
        Some(Command::Report(args)) => run_roster_report(args),
        Some(Command::Demo(args)) => run_demo(args),
    }
}
