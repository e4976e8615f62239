use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::jurisdiction::JurisdictionCode;
use crate::mapping::{FieldCatalog, FieldMapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Vehicle,
    Business,
    RealEstate,
    Personal,
    Estate,
}

/// Jurisdictions in which a document may be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "ScopeRepr")]
pub enum JurisdictionScope {
    All,
    Only(BTreeSet<JurisdictionCode>),
}

impl JurisdictionScope {
    /// `generic` belongs only to documents scoped to every jurisdiction.
    pub fn includes(&self, code: &JurisdictionCode) -> bool {
        match self {
            JurisdictionScope::All => true,
            JurisdictionScope::Only(codes) => codes.contains(code),
        }
    }

    pub fn codes(&self) -> Vec<JurisdictionCode> {
        match self {
            JurisdictionScope::All => JurisdictionCode::all_us()
                .chain(std::iter::once(JurisdictionCode::generic()))
                .collect(),
            JurisdictionScope::Only(codes) => codes.iter().cloned().collect(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Keyword(String),
    Codes(Vec<JurisdictionCode>),
}

impl TryFrom<ScopeRepr> for JurisdictionScope {
    type Error = String;

    fn try_from(value: ScopeRepr) -> Result<Self, Self::Error> {
        match value {
            ScopeRepr::Keyword(keyword) if keyword.eq_ignore_ascii_case("all") => Ok(Self::All),
            ScopeRepr::Keyword(other) => Err(format!(
                "jurisdiction scope must be \"all\" or a list of codes, found \"{other}\""
            )),
            ScopeRepr::Codes(codes) => Ok(Self::Only(codes.into_iter().collect())),
        }
    }
}

impl From<JurisdictionScope> for ScopeRepr {
    fn from(value: JurisdictionScope) -> Self {
        match value {
            JurisdictionScope::All => ScopeRepr::Keyword("all".to_string()),
            JurisdictionScope::Only(codes) => ScopeRepr::Codes(codes.into_iter().collect()),
        }
    }
}

/// A template file stored under `{document}/{jurisdiction}/{file_name}` in the asset tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateRef {
    pub jurisdiction: JurisdictionCode,
    pub file_name: String,
}

impl TemplateRef {
    pub fn generic(file_name: impl Into<String>) -> Self {
        Self {
            jurisdiction: JurisdictionCode::generic(),
            file_name: file_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDefinition {
    pub id: String,
    pub display_name: String,
    pub category: DocumentCategory,
    pub scope: JurisdictionScope,
    pub base_price_cents: u32,
    pub requires_notarization: bool,
    pub can_be_recorded: bool,
    pub languages: Vec<String>,
    pub schema: String,
    pub question_set: String,
    /// Generic overlay template used whenever no override applies.
    pub template: TemplateRef,
    pub schema_version: String,
    pub last_updated: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Textarea,
    Number,
    Currency,
    Date,
    Boolean,
    Select { options: Vec<SelectOption> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_unconstrained")]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

fn is_unconstrained(constraints: &Constraints) -> bool {
    *constraints == Constraints::default()
}

impl Question {
    pub fn new(id: &str, kind: QuestionKind, label: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            required: false,
            constraints: Constraints::default(),
            group: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn grouped(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn constrained(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Ordered prompts shown to the user for one document variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: String,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        self.questions
            .iter()
            .map(|question| question.id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Replacement question set, schema and official AcroForm for one jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct JurisdictionOverride {
    pub document_type: String,
    pub jurisdiction: JurisdictionCode,
    pub question_set: String,
    pub schema: String,
    pub official_form_id: String,
    pub template: TemplateRef,
    pub mapping: FieldMapping,
    pub field_catalog: Option<FieldCatalog>,
}
