//! Offline field discovery for official forms. Produces the `fields.json`
//! catalog that mappings are authored and linted against.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::mapping::suggest::{normalize, suggest_logical_key};
use crate::mapping::{FieldCatalog, FieldDescriptor, FieldKind};
use crate::render::{
    annotation_pages, collect_fields, dict_entry, load_template, rectangle, resolve_dict,
    FormField, PdfFieldKind, RenderError, RenderLimits,
};

#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    #[error("{0}: no such file")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error(transparent)]
    Pdf(#[from] RenderError),
    #[error("catalog did not serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Lists every fillable field with its page, rectangle and a suggested logical key.
pub fn inspect_pdf_bytes<S: AsRef<str>>(
    bytes: &[u8],
    candidates: &[S],
) -> Result<FieldCatalog, IntrospectError> {
    let limits = RenderLimits::default();
    let doc = load_template(bytes, &limits)?;
    let fields = collect_fields(&doc, &limits)?;

    let owners = annotation_pages(&doc);
    let page_numbers: HashMap<lopdf::ObjectId, usize> = doc
        .get_pages()
        .into_values()
        .enumerate()
        .map(|(index, id)| (id, index))
        .collect();

    let descriptors = fields
        .iter()
        .filter_map(|field| {
            let kind = field_kind(field)?;
            let widget = field.widgets.first().copied();
            let page = widget
                .and_then(|id| owners.get(&id))
                .and_then(|page_id| page_numbers.get(page_id))
                .copied();
            let rect = widget.and_then(|id| {
                let widget = doc.get_object(id).ok().and_then(|o| resolve_dict(&doc, o))?;
                rectangle(&doc, dict_entry(&doc, widget, b"Rect")?)
            });
            Some(FieldDescriptor {
                name: field.name.clone(),
                kind,
                current_value: field.value.clone().filter(|value| !value.is_empty()),
                suggested_logical_key: suggest_logical_key(&field.name, candidates),
                page,
                rect,
            })
        })
        .collect::<Vec<_>>();

    debug!(fields = descriptors.len(), "inspected form fields");
    Ok(FieldCatalog {
        form_id: None,
        fields: descriptors,
    })
}

/// Text fields whose name mentions a date are catalogued as dates.
fn field_kind(field: &FormField) -> Option<FieldKind> {
    match field.kind {
        PdfFieldKind::Text { .. } if normalize(&field.name).contains("date") => {
            Some(FieldKind::Date)
        }
        other => other.as_field_kind(),
    }
}

pub fn inspect_pdf_path<S: AsRef<str>>(
    path: &Path,
    candidates: &[S],
) -> Result<FieldCatalog, IntrospectError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => IntrospectError::NotFound(path.display().to_string()),
        _ => IntrospectError::Read {
            path: path.display().to_string(),
            source,
        },
    })?;
    inspect_pdf_bytes(&bytes, candidates)
}

/// `forms/hsmv-82050.pdf` becomes `forms/hsmv-82050-fields.json`.
pub fn sibling_catalog_path(pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "form".to_string());
    pdf.with_file_name(format!("{stem}-fields.json"))
}

pub fn write_sibling_catalog(
    pdf: &Path,
    catalog: &FieldCatalog,
) -> Result<PathBuf, IntrospectError> {
    let target = sibling_catalog_path(pdf);
    let mut json = serde_json::to_vec_pretty(catalog)?;
    json.push(b'\n');
    fs::write(&target, json).map_err(|source| IntrospectError::Write {
        path: target.display().to_string(),
        source,
    })?;
    Ok(target)
}
