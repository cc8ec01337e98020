use crate::commands::{
    run_announcements, run_estimate, run_init_db, AnnouncementArgs, EstimateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use house_finder::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "House Finder",
    about = "List houses for sale, search them, and estimate prices",
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
    /// Create the SQLite schema and exit
    InitDb,
    /// Print listings that have not expired yet
    Announcements(AnnouncementArgs),
    /// Estimate a sale price with the configured model
    Estimate(EstimateArgs),
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
        Command::InitDb => run_init_db().await,
        Command::Announcements(args) => run_announcements(args).await,
        Command::Estimate(args) => run_estimate(args),
    }
}
