use crate::commands::{self, DumpFieldsArgs, RenderArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use doc_assembly::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Document Assembly",
    about = "Serve, render and lint jurisdiction-aware legal documents",
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
    /// Assemble one document from a JSON answers file
    Render(RenderArgs),
    /// Cross-check the bundled catalog for missing or inconsistent mappings
    Lint,
    /// Catalog the fillable fields of an official PDF form
    DumpFields(DumpFieldsArgs),
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
        Command::Render(args) => tokio::task::spawn_blocking(move || commands::render(args))
            .await
            .map_err(|e| AppError::Worker(e.to_string()))?,
        Command::Lint => commands::lint(),
        Command::DumpFields(args) => commands::dump_fields(args).map(|_| ()),
    }
}
