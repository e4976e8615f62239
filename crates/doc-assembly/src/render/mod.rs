//! PDF rendering on top of `lopdf`.
//!
//! Every call parses its own [`lopdf::Document`] from the template bytes, so a
//! renderer can be shared across threads without coordination.

mod acroform;
pub mod format;
mod overlay;
pub mod text;

pub(crate) use acroform::{annotation_pages, collect_fields, FormField, PdfFieldKind};
pub use overlay::{layout_lines, PlacedLine};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::mapping::{MappingStrategy, PageBox, RenderPlan};

/// Upper bounds on the work done for a single template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub max_pages: usize,
    pub max_fields: usize,
    pub max_operations: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_fields: 1_000,
            max_operations: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("template could not be loaded: {0}")]
    PdfLoad(String),
    #[error("field '{0}' does not exist in the template")]
    FieldNotFound(String),
    #[error("field '{field}' is {actual}, mapping expects {expected}")]
    FieldKindMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("radio field '{field}' has no export state '{state}'")]
    UnknownOption { field: String, state: String },
    #[error("page {page} is out of range (template has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },
    #[error("text for '{key}' falls outside page {page} at ({x:.1}, {y:.1})")]
    OutOfBounds {
        key: String,
        page: usize,
        x: f32,
        y: f32,
    },
    #[error("'{key}' needs {width:.1}pt but its box is {max_width:.1}pt wide")]
    LineTooWide {
        key: String,
        width: f32,
        max_width: f32,
    },
    #[error("{what} limit of {limit} exceeded (found {found})")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        found: usize,
    },
    #[error("pdf write failure: {0}")]
    Pdf(String),
    #[error("renderer produced an empty document")]
    EmptyOutput,
}

impl RenderError {
    /// Stable error kind reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::PdfLoad(_) => "pdf_load",
            RenderError::EmptyOutput => "empty_output",
            _ => "render",
        }
    }
}

pub(crate) fn pdf_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Pdf(err.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    limits: RenderLimits,
}

impl PdfRenderer {
    pub fn new(limits: RenderLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RenderLimits {
        &self.limits
    }

    /// Executes `plan` against a fresh parse of `template` and returns the saved bytes.
    pub fn render(&self, template: &[u8], plan: &RenderPlan) -> Result<Vec<u8>, RenderError> {
        if plan.operations.len() > self.limits.max_operations {
            return Err(RenderError::LimitExceeded {
                what: "operation",
                limit: self.limits.max_operations,
                found: plan.operations.len(),
            });
        }

        let mut doc = load_template(template, &self.limits)?;
        match plan.strategy {
            MappingStrategy::AcroForm => acroform::fill_and_flatten(&mut doc, plan, &self.limits)?,
            MappingStrategy::Overlay => overlay::draw(&mut doc, plan)?,
        }

        let bytes = save(doc)?;
        debug!(
            document_type = %plan.document_type,
            jurisdiction = %plan.jurisdiction,
            strategy = %plan.strategy,
            operations = plan.operations.len(),
            bytes = bytes.len(),
            "rendered document"
        );
        Ok(bytes)
    }
}

pub(crate) fn load_template(bytes: &[u8], limits: &RenderLimits) -> Result<Document, RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::PdfLoad("template is empty".to_string()));
    }
    let doc = Document::load_mem(bytes).map_err(|err| RenderError::PdfLoad(err.to_string()))?;
    if doc.is_encrypted() {
        return Err(RenderError::PdfLoad(
            "encrypted templates are not supported".to_string(),
        ));
    }

    let pages = doc.get_pages().len();
    if pages == 0 {
        return Err(RenderError::PdfLoad("template has no pages".to_string()));
    }
    if pages > limits.max_pages {
        return Err(RenderError::LimitExceeded {
            what: "page",
            limit: limits.max_pages,
            found: pages,
        });
    }
    Ok(doc)
}

fn save(mut doc: Document) -> Result<Vec<u8>, RenderError> {
    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(pdf_error)?;
    if out.is_empty() {
        return Err(RenderError::EmptyOutput);
    }
    Ok(out)
}

/// Follows indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    let mut current = object;
    for _ in 0..8 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub(crate) fn dict_entry<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().map(|object| resolve(doc, object))
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

pub(crate) fn integer(object: &Object) -> Option<i64> {
    match object {
        Object::Integer(value) => Some(*value),
        Object::Real(value) => Some(*value as i64),
        _ => None,
    }
}

/// Normalized `[x0, y0, x1, y1]` from a PDF rectangle array.
pub(crate) fn rectangle(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let values = match resolve(doc, object) {
        Object::Array(values) => values,
        _ => return None,
    };
    if values.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(values) {
        *slot = number(resolve(doc, value))?;
    }
    Some([
        coords[0].min(coords[2]),
        coords[1].min(coords[3]),
        coords[0].max(coords[2]),
        coords[1].max(coords[3]),
    ])
}

/// Looks up a page attribute, honouring inheritance through `/Parent`.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok().and_then(|o| resolve_dict(doc, o));
    for _ in 0..32 {
        let dict = current?;
        if let Some(value) = dict_entry(doc, dict, key) {
            return Some(value);
        }
        current = dict_entry(doc, dict, b"Parent").and_then(|parent| match parent {
            Object::Dictionary(parent) => Some(parent),
            _ => None,
        });
    }
    None
}

/// CropBox, else MediaBox, else US Letter.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .iter()
        .find_map(|key| inherited(doc, page_id, key).and_then(|object| rectangle(doc, object)))
        .map(|[x0, y0, x1, y1]| PageBox { x0, y0, x1, y1 })
        .unwrap_or(PageBox::US_LETTER)
}

/// Owned copy of the page's (possibly inherited) resource dictionary.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|object| match object {
            Object::Dictionary(dict) => Some(dict.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

pub(crate) fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match dict_entry(doc, resources, key) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    }
}

pub(crate) fn set_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    resources: Dictionary,
) -> Result<(), RenderError> {
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(pdf_error)?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Registers `font_id` under `name` in the page's font resources.
pub(crate) fn add_page_font(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    font_id: ObjectId,
) -> Result<(), RenderError> {
    let mut resources = page_resources(doc, page_id);
    let mut fonts = sub_dictionary(doc, &resources, b"Font");
    fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    set_page_resources(doc, page_id, resources)
}

pub(crate) fn helvetica_font(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Content-stream number with at most two decimals.
pub(crate) fn fmt_num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_content_stream_numbers() {
        assert_eq!(fmt_num(72.0), "72");
        assert_eq!(fmt_num(10.5), "10.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
        assert_eq!(fmt_num(-4.25), "-4.25");
    }

    #[test]
    fn rejects_empty_and_corrupt_templates() {
        let limits = RenderLimits::default();
        assert!(matches!(
            load_template(b"", &limits),
            Err(RenderError::PdfLoad(_))
        ));
        assert!(matches!(
            load_template(b"%PDF-1.4 definitely not a pdf", &limits),
            Err(RenderError::PdfLoad(_))
        ));
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(RenderError::PdfLoad("x".to_string()).kind(), "pdf_load");
        assert_eq!(RenderError::EmptyOutput.kind(), "empty_output");
        assert_eq!(RenderError::FieldNotFound("Year".to_string()).kind(), "render");
    }
}
