//! AcroForm discovery, filling and flattening.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::format::{display_value, format_date};
use super::text::{encode_win_ansi, fit_font_size, pdf_literal, text_width, wrap_text};
use super::{
    dict_entry, fmt_num, helvetica_font, integer, number, page_resources, pdf_error, rectangle,
    resolve, resolve_dict, set_page_resources, sub_dictionary, RenderError, RenderLimits,
};
use crate::mapping::{AcroFormTarget, FieldKind, RenderOp, RenderPlan};
use crate::validation::TypedValue;

const MAX_FIELD_DEPTH: usize = 32;

const FF_MULTILINE: i64 = 1 << 12;
const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;
const ANNOT_HIDDEN: i64 = 1 << 1;

const AUTO_FONT_SIZE: f32 = 10.0;
const MIN_FONT_SIZE: f32 = 6.0;
const PADDING: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PdfFieldKind {
    Text { multiline: bool },
    Checkbox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Unknown,
}

impl PdfFieldKind {
    fn label(self) -> &'static str {
        match self {
            PdfFieldKind::Text { .. } => "a text field",
            PdfFieldKind::Checkbox => "a checkbox",
            PdfFieldKind::Radio => "a radio group",
            PdfFieldKind::PushButton => "a push button",
            PdfFieldKind::Choice => "a choice field",
            PdfFieldKind::Signature => "a signature field",
            PdfFieldKind::Unknown => "an untyped field",
        }
    }

    /// Closest mapping kind, if the field can hold a value at all.
    pub(crate) fn as_field_kind(self) -> Option<FieldKind> {
        match self {
            PdfFieldKind::Text { .. } | PdfFieldKind::Choice => Some(FieldKind::Text),
            PdfFieldKind::Checkbox => Some(FieldKind::Checkbox),
            PdfFieldKind::Radio => Some(FieldKind::Radio),
            PdfFieldKind::PushButton | PdfFieldKind::Signature | PdfFieldKind::Unknown => None,
        }
    }
}

/// A terminal field with its widget annotations.
#[derive(Debug, Clone)]
pub(crate) struct FormField {
    pub name: String,
    pub id: ObjectId,
    pub kind: PdfFieldKind,
    pub widgets: Vec<ObjectId>,
    pub value: Option<String>,
    default_appearance: Option<String>,
    quadding: i64,
}

/// Attributes a field inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<Vec<u8>>,
    flags: i64,
    default_appearance: Option<String>,
    quadding: i64,
}

fn name_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Decodes a PDF text string (UTF-16BE with BOM, else byte-per-char).
pub(crate) fn decode_pdf_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE_u8, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    bytes.iter().map(|byte| char::from(*byte)).collect()
}

fn encode_pdf_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn object_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_text(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Walks `/AcroForm /Fields`, returning terminal fields with qualified names.
pub(crate) fn collect_fields(
    doc: &Document,
    limits: &RenderLimits,
) -> Result<Vec<FormField>, RenderError> {
    let Some(catalog) = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve_dict(doc, root))
    else {
        return Err(RenderError::PdfLoad("document has no catalog".to_string()));
    };
    let Some(acroform) = catalog
        .get(b"AcroForm")
        .ok()
        .and_then(|form| resolve_dict(doc, form))
    else {
        return Ok(Vec::new());
    };
    let Some(Object::Array(roots)) = dict_entry(doc, acroform, b"Fields") else {
        return Ok(Vec::new());
    };

    let mut walker = FieldWalker {
        doc,
        limits,
        visited: HashSet::new(),
        fields: Vec::new(),
    };
    for root in roots {
        if let Object::Reference(id) = root {
            walker.walk(*id, None, &Inherited::default(), 0)?;
        }
    }
    Ok(walker.fields)
}

struct FieldWalker<'a> {
    doc: &'a Document,
    limits: &'a RenderLimits,
    visited: HashSet<ObjectId>,
    fields: Vec<FormField>,
}

impl FieldWalker<'_> {
    fn walk(
        &mut self,
        id: ObjectId,
        parent: Option<&str>,
        inherited: &Inherited,
        depth: usize,
    ) -> Result<(), RenderError> {
        if depth > MAX_FIELD_DEPTH || !self.visited.insert(id) {
            return Ok(());
        }
        let doc = self.doc;
        let Some(node) = doc.get_object(id).ok().and_then(|o| resolve_dict(doc, o)) else {
            return Ok(());
        };

        let partial = dict_entry(doc, node, b"T").and_then(object_text);
        let name = match (parent, partial) {
            (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
            (None, Some(partial)) => partial,
            (Some(parent), None) => parent.to_string(),
            (None, None) => return Ok(()),
        };

        let inherited = Inherited {
            field_type: dict_entry(doc, node, b"FT")
                .and_then(name_bytes)
                .map(<[u8]>::to_vec)
                .or_else(|| inherited.field_type.clone()),
            flags: dict_entry(doc, node, b"Ff")
                .and_then(integer)
                .unwrap_or(inherited.flags),
            default_appearance: dict_entry(doc, node, b"DA")
                .and_then(object_text)
                .or_else(|| inherited.default_appearance.clone()),
            quadding: dict_entry(doc, node, b"Q")
                .and_then(integer)
                .unwrap_or(inherited.quadding),
        };

        let kids: Vec<ObjectId> = match dict_entry(doc, node, b"Kids") {
            Some(Object::Array(kids)) => kids
                .iter()
                .filter_map(|kid| kid.as_reference().ok())
                .collect(),
            _ => Vec::new(),
        };
        let (field_kids, widget_kids): (Vec<ObjectId>, Vec<ObjectId>) =
            kids.into_iter().partition(|kid| {
                doc.get_object(*kid)
                    .ok()
                    .and_then(|o| resolve_dict(doc, o))
                    .is_some_and(|kid| kid.has(b"T"))
            });

        if !field_kids.is_empty() {
            for kid in field_kids {
                self.walk(kid, Some(&name), &inherited, depth + 1)?;
            }
            return Ok(());
        }

        let mut widgets = widget_kids;
        if is_widget(doc, node) {
            widgets.insert(0, id);
        }
        self.fields.push(FormField {
            name,
            id,
            kind: classify(&inherited),
            widgets,
            value: dict_entry(doc, node, b"V").and_then(object_text),
            default_appearance: inherited.default_appearance,
            quadding: inherited.quadding,
        });

        if self.fields.len() > self.limits.max_fields {
            return Err(RenderError::LimitExceeded {
                what: "field",
                limit: self.limits.max_fields,
                found: self.fields.len(),
            });
        }
        Ok(())
    }
}

fn is_widget(doc: &Document, node: &Dictionary) -> bool {
    match dict_entry(doc, node, b"Subtype").and_then(name_bytes) {
        Some(subtype) => subtype == b"Widget",
        None => node.has(b"Rect"),
    }
}

fn classify(inherited: &Inherited) -> PdfFieldKind {
    let flags = inherited.flags;
    match inherited.field_type.as_deref() {
        Some(b"Tx") => PdfFieldKind::Text {
            multiline: flags & FF_MULTILINE != 0,
        },
        Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => PdfFieldKind::PushButton,
        Some(b"Btn") if flags & FF_RADIO != 0 => PdfFieldKind::Radio,
        Some(b"Btn") => PdfFieldKind::Checkbox,
        Some(b"Ch") => PdfFieldKind::Choice,
        Some(b"Sig") => PdfFieldKind::Signature,
        _ => PdfFieldKind::Unknown,
    }
}

/// Names of the `/AP /N` states of a widget (for buttons: the on-state and `Off`).
pub(crate) fn appearance_states(doc: &Document, widget: ObjectId) -> Vec<Vec<u8>> {
    let Some(widget) = doc.get_object(widget).ok().and_then(|o| resolve_dict(doc, o)) else {
        return Vec::new();
    };
    let normal = dict_entry(doc, widget, b"AP")
        .and_then(|ap| match ap {
            Object::Dictionary(ap) => dict_entry(doc, ap, b"N"),
            _ => None,
        });
    match normal {
        Some(Object::Dictionary(states)) => states.iter().map(|(name, _)| name.clone()).collect(),
        _ => Vec::new(),
    }
}

fn on_state(doc: &Document, widget: ObjectId) -> Vec<u8> {
    appearance_states(doc, widget)
        .into_iter()
        .find(|state| state.as_slice() != b"Off")
        .unwrap_or_else(|| b"Yes".to_vec())
}

fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, RenderError> {
    match doc.get_object_mut(id).map_err(pdf_error)? {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream(stream) => Ok(&mut stream.dict),
        _ => Err(RenderError::Pdf(format!(
            "object {} {} is not a dictionary",
            id.0, id.1
        ))),
    }
}

fn mismatch(field: &FormField, target: &AcroFormTarget) -> RenderError {
    RenderError::FieldKindMismatch {
        field: field.name.clone(),
        expected: target.field_kind.as_str(),
        actual: field.kind.label(),
    }
}

pub(crate) fn fill_and_flatten(
    doc: &mut Document,
    plan: &RenderPlan,
    limits: &RenderLimits,
) -> Result<(), RenderError> {
    let fields = collect_fields(doc, limits)?;
    let index: HashMap<&str, &FormField> =
        fields.iter().map(|field| (field.name.as_str(), field)).collect();
    let mut filled_text: HashMap<ObjectId, String> = HashMap::new();

    for op in &plan.operations {
        let RenderOp::Fill { key, target, value } = op else {
            return Err(RenderError::FieldKindMismatch {
                field: op.key().to_string(),
                expected: "an acroform target",
                actual: "an overlay target",
            });
        };
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| RenderError::FieldNotFound(name.to_string()))
        };

        if target.is_checkbox_choice() {
            let answer = display_value(value, plan.date_format);
            let ticked = target
                .options
                .get(&answer)
                .ok_or_else(|| RenderError::UnknownOption {
                    field: key.clone(),
                    state: answer.clone(),
                })?;
            for name in target.field_names() {
                let field = lookup(name)?;
                if field.kind != PdfFieldKind::Checkbox {
                    return Err(mismatch(field, target));
                }
                set_checkbox(doc, field, name == ticked.as_str())?;
            }
            continue;
        }

        let field = lookup(target.field_name.as_str())?;

        match target.field_kind {
            FieldKind::Text | FieldKind::Date => {
                if !matches!(field.kind, PdfFieldKind::Text { .. } | PdfFieldKind::Choice) {
                    return Err(mismatch(field, target));
                }
                let text = match (target.field_kind, value) {
                    (FieldKind::Date, TypedValue::Text(raw)) => format_date(raw, plan.date_format),
                    _ => display_value(value, plan.date_format),
                };
                dict_mut(doc, field.id)?.set("V", encode_pdf_text(&text));
                filled_text.insert(field.id, text);
            }
            FieldKind::Checkbox => {
                if field.kind != PdfFieldKind::Checkbox {
                    return Err(mismatch(field, target));
                }
                let checked = value.as_bool().ok_or_else(|| RenderError::FieldKindMismatch {
                    field: key.clone(),
                    expected: "a boolean value",
                    actual: value.kind_label(),
                })?;
                set_checkbox(doc, field, checked)?;
            }
            FieldKind::Radio => {
                if field.kind != PdfFieldKind::Radio {
                    return Err(mismatch(field, target));
                }
                let answer = display_value(value, plan.date_format);
                let state = target.radio_state(&answer).ok_or_else(|| RenderError::UnknownOption {
                    field: field.name.clone(),
                    state: answer.clone(),
                })?;
                set_radio(doc, field, state)?;
            }
        }
    }

    flatten(doc, &fields, &filled_text)
}

fn set_checkbox(doc: &mut Document, field: &FormField, checked: bool) -> Result<(), RenderError> {
    let mut field_state = b"Off".to_vec();
    for widget in &field.widgets {
        let state = if checked {
            on_state(doc, *widget)
        } else {
            b"Off".to_vec()
        };
        if checked {
            field_state = state.clone();
        }
        dict_mut(doc, *widget)?.set("AS", Object::Name(state));
    }
    dict_mut(doc, field.id)?.set("V", Object::Name(field_state));
    Ok(())
}

fn set_radio(doc: &mut Document, field: &FormField, state: &str) -> Result<(), RenderError> {
    let wanted = state.as_bytes();
    let selections: Vec<(ObjectId, bool)> = field
        .widgets
        .iter()
        .map(|widget| {
            let has_state = appearance_states(doc, *widget)
                .iter()
                .any(|candidate| candidate.as_slice() == wanted);
            (*widget, has_state)
        })
        .collect();
    if !selections.iter().any(|(_, has_state)| *has_state) {
        return Err(RenderError::UnknownOption {
            field: field.name.clone(),
            state: state.to_string(),
        });
    }

    for (widget, selected) in selections {
        let appearance = if selected { wanted.to_vec() } else { b"Off".to_vec() };
        dict_mut(doc, widget)?.set("AS", Object::Name(appearance));
    }
    dict_mut(doc, field.id)?.set("V", Object::Name(wanted.to_vec()));
    Ok(())
}

/// Widget annotation to owning page, from each page's `/Annots`.
pub(crate) fn annotation_pages(doc: &Document) -> HashMap<ObjectId, ObjectId> {
    let mut owners = HashMap::new();
    for page_id in doc.get_pages().into_values() {
        let Some(page) = doc.get_object(page_id).ok().and_then(|o| resolve_dict(doc, o)) else {
            continue;
        };
        if let Some(Object::Array(annots)) = dict_entry(doc, page, b"Annots") {
            for annot in annots {
                if let Object::Reference(id) = annot {
                    owners.insert(*id, page_id);
                }
            }
        }
    }
    owners
}

#[derive(Default)]
struct PageStamp {
    content: Vec<u8>,
    xobjects: Vec<(String, ObjectId)>,
    removed: HashSet<ObjectId>,
}

struct WidgetGeometry {
    rect: [f32; 4],
    hidden: bool,
}

fn widget_geometry(doc: &Document, widget: ObjectId) -> Option<WidgetGeometry> {
    let dict = doc.get_object(widget).ok().and_then(|o| resolve_dict(doc, o))?;
    let rect = dict.get(b"Rect").ok().and_then(|rect| rectangle(doc, rect))?;
    let flags = dict_entry(doc, dict, b"F").and_then(integer).unwrap_or(0);
    Some(WidgetGeometry {
        rect,
        hidden: flags & ANNOT_HIDDEN != 0,
    })
}

/// Stamps widget appearances into page content, then drops the interactive layer.
fn flatten(
    doc: &mut Document,
    fields: &[FormField],
    filled_text: &HashMap<ObjectId, String>,
) -> Result<(), RenderError> {
    let owners = annotation_pages(doc);
    let font_id = helvetica_font(doc);
    let mut stamps: BTreeMap<ObjectId, PageStamp> = BTreeMap::new();
    let mut counter = 0usize;

    for field in fields {
        for widget in &field.widgets {
            let Some(page_id) = owners.get(widget).copied() else {
                continue;
            };
            let stamp = stamps.entry(page_id).or_default();
            stamp.removed.insert(*widget);

            let Some(geometry) = widget_geometry(doc, *widget) else {
                continue;
            };
            if geometry.hidden {
                continue;
            }

            let appearance = match (filled_text.get(&field.id), field.kind) {
                (Some(text), PdfFieldKind::Text { multiline }) => Some(text_appearance(
                    doc,
                    font_id,
                    geometry.rect,
                    text,
                    field,
                    multiline,
                )),
                (Some(text), PdfFieldKind::Choice) => Some(text_appearance(
                    doc,
                    font_id,
                    geometry.rect,
                    text,
                    field,
                    false,
                )),
                _ => existing_appearance(doc, *widget, field.kind, geometry.rect)?,
            };
            let Some((xobject_id, bbox)) = appearance else {
                continue;
            };

            counter += 1;
            let name = format!("DAFlat{counter}");
            let [x0, y0, x1, y1] = geometry.rect;
            let bbox_width = bbox[2] - bbox[0];
            let bbox_height = bbox[3] - bbox[1];
            let sx = if bbox_width > f32::EPSILON { (x1 - x0) / bbox_width } else { 1.0 };
            let sy = if bbox_height > f32::EPSILON { (y1 - y0) / bbox_height } else { 1.0 };
            let tx = x0 - bbox[0] * sx;
            let ty = y0 - bbox[1] * sy;

            let stamp = stamps.entry(page_id).or_default();
            stamp.content.extend_from_slice(
                format!(
                    "q {} 0 0 {} {} {} cm /{name} Do Q\n",
                    fmt_num(sx),
                    fmt_num(sy),
                    fmt_num(tx),
                    fmt_num(ty)
                )
                .as_bytes(),
            );
            stamp.xobjects.push((name, xobject_id));
        }
    }

    for (page_id, stamp) in stamps {
        if !stamp.xobjects.is_empty() {
            let mut resources = page_resources(doc, page_id);
            let mut xobjects = sub_dictionary(doc, &resources, b"XObject");
            for (name, id) in &stamp.xobjects {
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
            set_page_resources(doc, page_id, resources)?;
            doc.add_page_contents(page_id, stamp.content)
                .map_err(pdf_error)?;
        }
        remove_annotations(doc, page_id, &stamp.removed)?;
    }

    drop_acroform(doc)?;
    doc.prune_objects();
    Ok(())
}

fn remove_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    removed: &HashSet<ObjectId>,
) -> Result<(), RenderError> {
    let page = doc
        .get_object(page_id)
        .ok()
        .and_then(|o| resolve_dict(doc, o));
    let remaining: Vec<Object> = match page.and_then(|page| dict_entry(doc, page, b"Annots")) {
        Some(Object::Array(annots)) => annots
            .iter()
            .filter(|annot| match annot {
                Object::Reference(id) => !removed.contains(id),
                _ => true,
            })
            .cloned()
            .collect(),
        _ => return Ok(()),
    };

    let page = dict_mut(doc, page_id)?;
    if remaining.is_empty() {
        page.remove(b"Annots");
    } else {
        page.set("Annots", Object::Array(remaining));
    }
    Ok(())
}

fn drop_acroform(doc: &mut Document) -> Result<(), RenderError> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(pdf_error)?;
    dict_mut(doc, root_id)?.remove(b"AcroForm");
    Ok(())
}

/// Reuses the widget's normal appearance, picking the `/AS` state for buttons.
fn existing_appearance(
    doc: &mut Document,
    widget: ObjectId,
    kind: PdfFieldKind,
    rect: [f32; 4],
) -> Result<Option<(ObjectId, [f32; 4])>, RenderError> {
    let (stream_id, checked_without_stream) = {
        let Some(dict) = doc.get_object(widget).ok().and_then(|o| resolve_dict(doc, o)) else {
            return Ok(None);
        };
        let state = dict_entry(doc, dict, b"AS").and_then(name_bytes);
        let normal = dict
            .get(b"AP")
            .ok()
            .and_then(|ap| resolve_dict(doc, ap))
            .and_then(|ap| ap.get(b"N").ok());

        let stream_id = match normal {
            Some(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Stream(_)) => Some(*id),
                Ok(Object::Dictionary(states)) => state
                    .and_then(|state| states.get(state).ok())
                    .and_then(|stream| stream.as_reference().ok()),
                _ => None,
            },
            Some(Object::Dictionary(states)) => state
                .and_then(|state| states.get(state).ok())
                .and_then(|stream| stream.as_reference().ok()),
            _ => None,
        };
        let checked = matches!(kind, PdfFieldKind::Checkbox | PdfFieldKind::Radio)
            && state.is_some_and(|state| state != b"Off");
        (stream_id, checked)
    };

    let Some(stream_id) = stream_id else {
        if checked_without_stream {
            return Ok(Some(check_mark_appearance(doc, rect)));
        }
        return Ok(None);
    };

    let (bbox, matrix) = match doc.get_object(stream_id) {
        Ok(Object::Stream(stream)) => (
            stream
                .dict
                .get(b"BBox")
                .ok()
                .and_then(|bbox| rectangle(doc, bbox)),
            stream
                .dict
                .get(b"Matrix")
                .ok()
                .and_then(|matrix| form_matrix(doc, matrix)),
        ),
        _ => (None, None),
    };
    let bbox = bbox.unwrap_or([0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]]);

    let stream = dict_mut(doc, stream_id)?;
    stream.set("Type", "XObject");
    stream.set("Subtype", "Form");
    if !stream.has(b"BBox") {
        stream.set(
            "BBox",
            vec![0.into(), 0.into(), (bbox[2]).into(), (bbox[3]).into()],
        );
    }
    // `Do` applies the form's own /Matrix, so placement starts from the transformed box.
    Ok(Some((stream_id, transformed_bbox(bbox, matrix))))
}

fn form_matrix(doc: &Document, object: &Object) -> Option<[f32; 6]> {
    let Object::Array(values) = resolve(doc, object) else {
        return None;
    };
    if values.len() != 6 {
        return None;
    }
    let mut matrix = [0.0f32; 6];
    for (slot, value) in matrix.iter_mut().zip(values) {
        *slot = number(resolve(doc, value))?;
    }
    Some(matrix)
}

/// Axis-aligned bounds of `bbox` after mapping each corner through `matrix`.
fn transformed_bbox(bbox: [f32; 4], matrix: Option<[f32; 6]>) -> [f32; 4] {
    let Some([a, b, c, d, e, f]) = matrix else {
        return bbox;
    };
    let corners = [
        (bbox[0], bbox[1]),
        (bbox[2], bbox[1]),
        (bbox[0], bbox[3]),
        (bbox[2], bbox[3]),
    ];
    let mut bounds = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    for (x, y) in corners {
        let tx = a * x + c * y + e;
        let ty = b * x + d * y + f;
        bounds = [
            bounds[0].min(tx),
            bounds[1].min(ty),
            bounds[2].max(tx),
            bounds[3].max(ty),
        ];
    }
    bounds
}

fn form_xobject(
    doc: &mut Document,
    width: f32,
    height: f32,
    resources: Dictionary,
    content: Vec<u8>,
) -> ObjectId {
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => resources,
        },
        content,
    );
    doc.add_object(stream)
}

fn check_mark_appearance(doc: &mut Document, rect: [f32; 4]) -> (ObjectId, [f32; 4]) {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    let inset = (width.min(height) * 0.2).max(0.5);
    let content = format!(
        "q 0 G 1 w {a} {b} m {c} {d} l S {a} {d} m {c} {b} l S Q\n",
        a = fmt_num(inset),
        b = fmt_num(inset),
        c = fmt_num(width - inset),
        d = fmt_num(height - inset),
    );
    let id = form_xobject(doc, width, height, Dictionary::new(), content.into_bytes());
    (id, [0.0, 0.0, width, height])
}

/// Font size from a `/DA` string such as `/Helv 0 Tf 0 g`. Zero means auto.
fn da_font_size(default_appearance: &str) -> Option<f32> {
    let tokens: Vec<&str> = default_appearance.split_whitespace().collect();
    let position = tokens.iter().position(|token| *token == "Tf")?;
    tokens.get(position.checked_sub(1)?)?.parse().ok()
}

fn text_appearance(
    doc: &mut Document,
    font_id: ObjectId,
    rect: [f32; 4],
    text: &str,
    field: &FormField,
    multiline: bool,
) -> (ObjectId, [f32; 4]) {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    let inner_width = (width - 2.0 * PADDING).max(1.0);
    let inner_height = (height - 2.0 * PADDING).max(1.0);

    let preferred = field
        .default_appearance
        .as_deref()
        .and_then(da_font_size)
        .filter(|size| *size > 0.0)
        .unwrap_or_else(|| AUTO_FONT_SIZE.min(inner_height * 0.8))
        .max(MIN_FONT_SIZE);

    let (size, lines) = if multiline {
        let mut size = preferred;
        let mut lines = wrap_text(text, size, inner_width);
        while lines.len() as f32 * size * 1.15 > inner_height && size > MIN_FONT_SIZE {
            size = (size - 0.5).max(MIN_FONT_SIZE);
            lines = wrap_text(text, size, inner_width);
        }
        (size, lines)
    } else {
        let single = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let size = fit_font_size(&single, preferred, MIN_FONT_SIZE, inner_width);
        (size, vec![single])
    };

    let leading = size * 1.15;
    let first_baseline = if multiline {
        height - PADDING - size
    } else {
        ((height - size) / 2.0 + size * 0.22).max(PADDING * 0.5)
    };

    let mut content = b"/Tx BMC\nq\nBT\n".to_vec();
    content.extend_from_slice(format!("/DAHelv {} Tf\n0 g\n", fmt_num(size)).as_bytes());
    for (index, line) in lines.iter().enumerate() {
        let line_width = text_width(line, size);
        let x = match field.quadding {
            1 => (width - line_width) / 2.0,
            2 => width - PADDING - line_width,
            _ => PADDING,
        }
        .max(0.0);
        let y = first_baseline - index as f32 * leading;
        content.extend_from_slice(
            format!("1 0 0 1 {} {} Tm\n", fmt_num(x), fmt_num(y)).as_bytes(),
        );
        content.extend_from_slice(&pdf_literal(&encode_win_ansi(line)));
        content.extend_from_slice(b" Tj\n");
    }
    content.extend_from_slice(b"ET\nQ\nEMC\n");

    let resources = dictionary! {
        "Font" => dictionary! { "DAHelv" => Object::Reference(font_id) },
    };
    let id = form_xobject(doc, width, height, resources, content);
    (id, [0.0, 0.0, width, height])
}
