//! Field mappings bind logical answer keys to PDF targets.
//!
//! A mapping is either entirely AcroForm (official government forms) or
//! entirely overlay (coordinates on a generic template). Lookups are exact;
//! fuzzy matching only exists in the authoring helpers under [`suggest`].

mod resolver;
pub mod suggest;

pub use resolver::{FieldMappingResolver, MappingError, MappingWarning, RenderOp, RenderPlan};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrategy {
    #[serde(rename = "acroform")]
    AcroForm,
    Overlay,
}

impl MappingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MappingStrategy::AcroForm => "acroform",
            MappingStrategy::Overlay => "overlay",
        }
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    Date,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Date => "date",
        }
    }

    /// Text and date targets both land in `/Tx` widgets.
    pub fn is_textual(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Date)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcroFormTarget {
    pub field_name: String,
    pub field_kind: FieldKind,
    /// Answer value to radio export state. Empty means the answer is the state name.
    /// On a checkbox, answer value to the checkbox that answer ticks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl AcroFormTarget {
    pub fn new(field_name: &str, field_kind: FieldKind) -> Self {
        Self {
            field_name: field_name.to_string(),
            field_kind,
            options: BTreeMap::new(),
        }
    }

    pub fn text(field_name: &str) -> Self {
        Self::new(field_name, FieldKind::Text)
    }

    pub fn date(field_name: &str) -> Self {
        Self::new(field_name, FieldKind::Date)
    }

    pub fn checkbox(field_name: &str) -> Self {
        Self::new(field_name, FieldKind::Checkbox)
    }

    pub fn radio(field_name: &str, options: &[(&str, &str)]) -> Self {
        Self {
            options: options
                .iter()
                .map(|(value, state)| (value.to_string(), state.to_string()))
                .collect(),
            ..Self::new(field_name, FieldKind::Radio)
        }
    }

    /// A choice spread over independent checkboxes; every other box is cleared.
    pub fn checkbox_choice(options: &[(&str, &str)]) -> Self {
        let anchor = options.first().map(|(_, field)| *field).unwrap_or_default();
        Self {
            options: options
                .iter()
                .map(|(value, field)| (value.to_string(), field.to_string()))
                .collect(),
            ..Self::new(anchor, FieldKind::Checkbox)
        }
    }

    pub fn is_checkbox_choice(&self) -> bool {
        self.field_kind == FieldKind::Checkbox && !self.options.is_empty()
    }

    /// Every form field this target writes to.
    pub fn field_names(&self) -> Vec<&str> {
        if self.is_checkbox_choice() {
            let mut names: Vec<&str> = self.options.values().map(String::as_str).collect();
            names.sort_unstable();
            names.dedup();
            names
        } else {
            vec![self.field_name.as_str()]
        }
    }

    /// Export state selected by `answer`, if the radio group accepts it.
    pub fn radio_state<'a>(&'a self, answer: &'a str) -> Option<&'a str> {
        if self.options.is_empty() {
            Some(answer)
        } else {
            self.options.get(answer).map(String::as_str)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayTarget {
    /// Zero-based page index.
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub max_width: f32,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

impl OverlayTarget {
    pub fn at(page: usize, x: f32, y: f32, font_size: f32, max_width: f32) -> Self {
        Self {
            page,
            x,
            y,
            font_size,
            max_width,
            alignment: Alignment::Left,
            line_height: None,
        }
    }

    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn effective_line_height(&self) -> f32 {
        self.line_height.unwrap_or(self.font_size * 1.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldTarget {
    AcroForm(AcroFormTarget),
    Overlay(OverlayTarget),
}

impl FieldTarget {
    pub fn strategy(&self) -> MappingStrategy {
        match self {
            FieldTarget::AcroForm(_) => MappingStrategy::AcroForm,
            FieldTarget::Overlay(_) => MappingStrategy::Overlay,
        }
    }
}

/// Page bounding box in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    pub const US_LETTER: PageBox = PageBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Persisted `overlay.json`: logical key to target for one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageBox>,
    pub entries: BTreeMap<String, FieldTarget>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, pages: Vec<PageBox>) -> Self {
        self.pages = pages;
        self
    }

    pub fn acroform(mut self, key: &str, target: AcroFormTarget) -> Self {
        self.entries
            .insert(key.to_string(), FieldTarget::AcroForm(target));
        self
    }

    pub fn overlay(mut self, key: &str, target: OverlayTarget) -> Self {
        self.entries.insert(key.to_string(), FieldTarget::Overlay(target));
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldTarget> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One interactive field discovered in a PDF by the offline introspection tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_logical_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f32; 4]>,
}

impl FieldDescriptor {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            current_value: None,
            suggested_logical_key: None,
            page: None,
            rect: None,
        }
    }
}

/// Persisted `fields.json` for one official form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_json_uses_tagged_targets() {
        let raw = r#"{
            "entries": {
                "buyer_name": { "acroForm": { "fieldName": "Purchasers", "fieldKind": "text" } },
                "sale_date": { "overlay": { "page": 0, "x": 72, "y": 700, "fontSize": 10, "maxWidth": 200 } }
            }
        }"#;

        let mapping: FieldMapping = serde_json::from_str(raw).expect("mapping parses");
        assert_eq!(
            mapping.get("buyer_name"),
            Some(&FieldTarget::AcroForm(AcroFormTarget::text("Purchasers")))
        );
        match mapping.get("sale_date") {
            Some(FieldTarget::Overlay(target)) => {
                assert_eq!(target.alignment, Alignment::Left);
                assert!((target.effective_line_height() - 12.0).abs() < f32::EPSILON);
            }
            other => panic!("expected overlay target, found {other:?}"),
        }
        assert!(mapping.pages.is_empty());
    }

    #[test]
    fn radio_state_prefers_declared_options() {
        let target = AcroFormTarget::radio("Status", &[("actual", "Choice1")]);
        assert_eq!(target.radio_state("actual"), Some("Choice1"));
        assert_eq!(target.radio_state("exceeds"), None);

        let open = AcroFormTarget::new("Status", FieldKind::Radio);
        assert_eq!(open.radio_state("Choice2"), Some("Choice2"));
    }

    #[test]
    fn letter_box_contains_its_corners() {
        let letter = PageBox::US_LETTER;
        assert!(letter.contains(0.0, 0.0));
        assert!(letter.contains(612.0, 792.0));
        assert!(!letter.contains(612.5, 10.0));
    }
}
