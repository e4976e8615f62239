use clap::Parser;
use doc_assembly_api::{dump_fields, DumpFieldsArgs};
use std::path::PathBuf;
use std::process::ExitCode;

/// List the fillable fields of an official PDF and write `<stem>-fields.json` beside it.
#[derive(Parser, Debug)]
#[command(name = "pdf-field-dump", version)]
struct Cli {
    /// PDF form to inspect
    pdf: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dump_fields(DumpFieldsArgs { pdf: cli.pdf }) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
