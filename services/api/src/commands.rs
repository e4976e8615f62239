use clap::Args;
use std::fs;
use std::path::PathBuf;

use doc_assembly::compliance::ComplianceTable;
use doc_assembly::config::AppConfig;
use doc_assembly::documents::DocumentRegistry;
use doc_assembly::error::AppError;
use doc_assembly::introspect::{inspect_pdf_path, write_sibling_catalog};
use doc_assembly::lint::lint_registry;
use doc_assembly::mapping::suggest::known_keys;
use doc_assembly::validation::RawAnswers;
use doc_assembly::{DocumentAssembler, FillRequest};

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Registered document type (e.g. vehicle-bill-of-sale)
    #[arg(long)]
    pub(crate) document: String,
    /// Two-letter state code, full state name or "generic"
    #[arg(long)]
    pub(crate) jurisdiction: String,
    /// JSON object of answers keyed by question id
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Where to write the finished PDF
    #[arg(long)]
    pub(crate) out: PathBuf,
}

#[derive(Args, Debug)]
pub struct DumpFieldsArgs {
    /// Official PDF form to inspect
    pub pdf: PathBuf,
}

pub(crate) fn render(args: RenderArgs) -> Result<(), AppError> {
    let RenderArgs {
        document,
        jurisdiction,
        answers,
        out,
    } = args;

    let raw = fs::read(&answers)?;
    let answers: RawAnswers = serde_json::from_slice(&raw).map_err(std::io::Error::from)?;

    let config = AppConfig::load()?;
    let assembler = DocumentAssembler::from_config(&config)?;
    let assembled = assembler.assemble(&FillRequest::new(&document, &jurisdiction, answers))?;

    fs::write(&out, &assembled.bytes)?;

    println!(
        "Wrote {} ({} bytes, {} strategy)",
        out.display(),
        assembled.bytes.len(),
        assembled.strategy
    );
    if let Some(form_id) = assembled.official_form_id.as_deref() {
        println!("Official form: {form_id}");
    }
    if let Some(form_id) = assembled.compliance.recommended_form.as_deref() {
        println!("Recommended form: {form_id}");
    }
    if assembled.compliance.requires_notary {
        println!("Notarization required before filing.");
    }
    if let Some(notes) = assembled.compliance.notes.as_deref() {
        println!("Note: {notes}");
    }
    if !assembled.warnings.is_empty() {
        println!("Warnings:");
        for warning in &assembled.warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}

pub(crate) fn lint() -> Result<(), AppError> {
    let registry = DocumentRegistry::shared_bundled()?;
    let findings = lint_registry(registry, ComplianceTable::shared());
    if findings.is_empty() {
        println!("Catalog is consistent.");
        return Ok(());
    }

    for finding in &findings {
        println!("- {finding}");
    }
    Err(AppError::Lint(findings))
}

/// Writes `<stem>-fields.json` next to the PDF and prints a summary.
pub fn dump_fields(args: DumpFieldsArgs) -> Result<PathBuf, AppError> {
    let registry = DocumentRegistry::shared_bundled()?;
    let candidates = known_keys(registry);
    let catalog = inspect_pdf_path(&args.pdf, &candidates)?;
    let target = write_sibling_catalog(&args.pdf, &catalog)?;

    println!("{} field(s) in {}", catalog.fields.len(), args.pdf.display());
    for field in &catalog.fields {
        let page = field
            .page
            .map(|page| format!("page {}", page + 1))
            .unwrap_or_else(|| "page ?".to_string());
        let kind = field.kind.as_str();
        match field.suggested_logical_key.as_deref() {
            Some(key) => println!("  {:<40} {kind:<9} {page:<8} -> {key}", field.name),
            None => println!("  {:<40} {kind:<9} {page}", field.name),
        }
    }
    println!("Catalog written to {}", target.display());

    Ok(target)
}
