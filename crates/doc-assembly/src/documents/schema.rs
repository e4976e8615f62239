use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::domain::{QuestionKind, QuestionSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueType {
    Text,
    Number,
    Currency,
    Date,
    Boolean,
    Enum { options: Vec<String> },
}

impl ValueType {
    pub fn label(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Currency => "currency",
            ValueType::Date => "date",
            ValueType::Boolean => "boolean",
            ValueType::Enum { .. } => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(flatten)]
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Validation contract keyed by logical answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub fields: BTreeMap<String, FieldRule>,
}

impl Schema {
    /// Derives a schema whose keys and rules mirror the question set.
    pub fn from_question_set(id: impl Into<String>, questions: &QuestionSet) -> Self {
        let fields = questions
            .questions
            .iter()
            .map(|question| {
                let value_type = match &question.kind {
                    QuestionKind::Text | QuestionKind::Textarea => ValueType::Text,
                    QuestionKind::Number => ValueType::Number,
                    QuestionKind::Currency => ValueType::Currency,
                    QuestionKind::Date => ValueType::Date,
                    QuestionKind::Boolean => ValueType::Boolean,
                    QuestionKind::Select { options } => ValueType::Enum {
                        options: options.iter().map(|option| option.value.clone()).collect(),
                    },
                };
                let constraints = &question.constraints;
                let rule = FieldRule {
                    value_type,
                    required: question.required,
                    pattern: constraints.pattern.clone(),
                    min: constraints.min,
                    max: constraints.max,
                    max_length: constraints.max_length,
                    message: constraints.message.clone(),
                };
                (question.id.clone(), rule)
            })
            .collect();

        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn keys(&self) -> BTreeSet<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn rule(&self, key: &str) -> Option<&FieldRule> {
        self.fields.get(key)
    }
}
