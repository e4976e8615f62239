//! Coerces raw answers into typed values against a [`Schema`].

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::documents::{FieldRule, Schema, ValueType};

/// Raw answer as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Null => true,
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::Bool(_) | AnswerValue::Number(_) => false,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

pub type RawAnswers = BTreeMap<String, AnswerValue>;

/// Answer coerced to the type its schema rule declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Text(String),
    Number(f64),
    /// Whole cents.
    Currency(i64),
    Date(NaiveDate),
    Boolean(bool),
    Choice(String),
}

impl TypedValue {
    pub fn kind_label(&self) -> &'static str {
        match self {
            TypedValue::Text(_) => "text",
            TypedValue::Number(_) => "number",
            TypedValue::Currency(_) => "currency",
            TypedValue::Date(_) => "date",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Choice(_) => "choice",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedAnswers {
    values: BTreeMap<String, TypedValue>,
}

impl ValidatedAnswers {
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    Required,
    UnknownField,
    TypeMismatch,
    NotInEnum,
    PatternMismatch,
    OutOfRange,
    TooLong,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::Required => "required",
            ValidationCode::UnknownField => "unknown_field",
            ValidationCode::TypeMismatch => "type_mismatch",
            ValidationCode::NotInEnum => "not_in_enum",
            ValidationCode::PatternMismatch => "pattern_mismatch",
            ValidationCode::OutOfRange => "out_of_range",
            ValidationCode::TooLong => "too_long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code,
            message: message.into(),
        }
    }
}

/// Validates every answer, returning all violations sorted by field.
pub fn validate(
    schema: &Schema,
    raw: &RawAnswers,
) -> Result<ValidatedAnswers, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut values = BTreeMap::new();

    for key in raw.keys() {
        if schema.rule(key).is_none() {
            errors.push(ValidationError::new(
                key,
                ValidationCode::UnknownField,
                format!("'{key}' is not a question for this document"),
            ));
        }
    }

    for (key, rule) in &schema.fields {
        let value = raw.get(key).filter(|value| !value.is_blank());
        let Some(value) = value else {
            if rule.required {
                errors.push(ValidationError::new(
                    key,
                    ValidationCode::Required,
                    "this field is required",
                ));
            }
            continue;
        };

        match coerce(key, rule, value) {
            Ok(typed) => {
                let violations = check_constraints(key, rule, &typed);
                if violations.is_empty() {
                    values.insert(key.clone(), typed);
                } else {
                    errors.extend(violations);
                }
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        Ok(ValidatedAnswers { values })
    } else {
        errors.sort_by(|left, right| left.field.cmp(&right.field));
        Err(errors)
    }
}

fn coerce(key: &str, rule: &FieldRule, value: &AnswerValue) -> Result<TypedValue, ValidationError> {
    let mismatch = |expected: &str| {
        ValidationError::new(
            key,
            ValidationCode::TypeMismatch,
            format!("expected a {expected} value"),
        )
    };

    match (&rule.value_type, value) {
        (ValueType::Text, AnswerValue::Text(text)) => Ok(TypedValue::Text(text.trim().to_string())),
        (ValueType::Text, AnswerValue::Number(number)) => Ok(TypedValue::Text(number.to_string())),
        (ValueType::Text, AnswerValue::Bool(flag)) => Ok(TypedValue::Text(flag.to_string())),
        (ValueType::Number, AnswerValue::Number(number)) if number.is_finite() => {
            Ok(TypedValue::Number(*number))
        }
        (ValueType::Number, AnswerValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(TypedValue::Number)
            .ok_or_else(|| mismatch("numeric")),
        (ValueType::Currency, AnswerValue::Number(number)) if number.is_finite() => {
            Ok(TypedValue::Currency((number * 100.0).round() as i64))
        }
        (ValueType::Currency, AnswerValue::Text(text)) => parse_currency_cents(text)
            .map(TypedValue::Currency)
            .ok_or_else(|| mismatch("currency")),
        (ValueType::Date, AnswerValue::Text(text)) => {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(TypedValue::Date)
                .map_err(|_| mismatch("YYYY-MM-DD date"))
        }
        (ValueType::Boolean, AnswerValue::Bool(flag)) => Ok(TypedValue::Boolean(*flag)),
        (ValueType::Boolean, AnswerValue::Text(text)) => {
            match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(TypedValue::Boolean(true)),
                "false" | "no" => Ok(TypedValue::Boolean(false)),
                _ => Err(mismatch("boolean")),
            }
        }
        (ValueType::Enum { options }, AnswerValue::Text(text)) => {
            let choice = text.trim();
            if options.iter().any(|option| option == choice) {
                Ok(TypedValue::Choice(choice.to_string()))
            } else {
                Err(ValidationError::new(
                    key,
                    ValidationCode::NotInEnum,
                    format!("'{choice}' is not one of {}", options.join(", ")),
                ))
            }
        }
        (value_type, _) => Err(mismatch(value_type.label())),
    }
}

/// Parses `"$1,234.50"`, `"1234.5"` or `"-20"` into cents.
pub fn parse_currency_cents(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || fraction.len() > 2
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

static PATTERNS: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();

/// Compiled once per distinct pattern. Patterns that fail to compile match nothing.
fn compiled_pattern(pattern: &str) -> Option<Regex> {
    let mut patterns = PATTERNS
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    patterns
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok())
        .clone()
}

fn check_constraints(key: &str, rule: &FieldRule, typed: &TypedValue) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let custom = |fallback: String| rule.message.clone().unwrap_or(fallback);

    let magnitude = match typed {
        TypedValue::Number(number) => Some(*number),
        TypedValue::Currency(cents) => Some(*cents as f64 / 100.0),
        _ => None,
    };
    if let Some(magnitude) = magnitude {
        let below = rule.min.is_some_and(|min| magnitude < min);
        let above = rule.max.is_some_and(|max| magnitude > max);
        if below || above {
            let bounds = match (rule.min, rule.max) {
                (Some(min), Some(max)) => format!("between {min} and {max}"),
                (Some(min), None) => format!("at least {min}"),
                (None, Some(max)) => format!("at most {max}"),
                (None, None) => String::new(),
            };
            errors.push(ValidationError::new(
                key,
                ValidationCode::OutOfRange,
                custom(format!("value must be {bounds}")),
            ));
        }
    }

    if let TypedValue::Text(text) = typed {
        if let Some(max_length) = rule.max_length {
            if text.chars().count() > max_length {
                errors.push(ValidationError::new(
                    key,
                    ValidationCode::TooLong,
                    custom(format!("must be at most {max_length} characters")),
                ));
            }
        }
        if let Some(pattern) = &rule.pattern {
            let matches = compiled_pattern(pattern).is_some_and(|regex| regex.is_match(text));
            if !matches {
                errors.push(ValidationError::new(
                    key,
                    ValidationCode::PatternMismatch,
                    custom(format!("does not match the expected format {pattern}")),
                ));
            }
        }
    }

    errors
}
