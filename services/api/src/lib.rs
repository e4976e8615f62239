mod cli;
mod commands;
mod routes;
mod server;
mod state;

pub use commands::{dump_fields, DumpFieldsArgs};

use doc_assembly::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
