use serde::Serialize;
use tracing::debug;

use super::{AcroFormTarget, FieldKind, FieldMapping, FieldTarget, MappingStrategy, OverlayTarget};
use crate::compliance::ComplianceTable;
use crate::documents::TemplateRef;
use crate::jurisdiction::{DateFormat, JurisdictionCode, Resolution};
use crate::render::format::display_value;
use crate::validation::{TypedValue, ValidatedAnswers};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("'{key}' is required in {jurisdiction} but has no field mapping")]
    MissingFieldMapping {
        key: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("'{key}' maps to an {found} target inside an {expected} mapping")]
    StrategyMismatch {
        key: String,
        expected: MappingStrategy,
        found: MappingStrategy,
    },
    #[error("'{key}' cannot put {value} into a {target} field")]
    IncompatibleValue {
        key: String,
        target: FieldKind,
        value: String,
    },
}

impl MappingError {
    pub fn kind(&self) -> &'static str {
        match self {
            MappingError::MissingFieldMapping { .. } => "missing_field_mapping",
            MappingError::StrategyMismatch { .. } => "strategy_mismatch",
            MappingError::IncompatibleValue { .. } => "incompatible_value",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            MappingError::MissingFieldMapping { key, .. }
            | MappingError::StrategyMismatch { key, .. }
            | MappingError::IncompatibleValue { key, .. } => key,
        }
    }
}

/// An answer that was accepted but will not appear on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingWarning {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderOp {
    Fill {
        key: String,
        target: AcroFormTarget,
        value: TypedValue,
    },
    Draw {
        key: String,
        target: OverlayTarget,
        value: TypedValue,
    },
}

impl RenderOp {
    pub fn key(&self) -> &str {
        match self {
            RenderOp::Fill { key, .. } | RenderOp::Draw { key, .. } => key,
        }
    }
}

/// Everything the renderer needs, in key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub document_type: String,
    pub jurisdiction: JurisdictionCode,
    pub strategy: MappingStrategy,
    pub template: TemplateRef,
    pub date_format: DateFormat,
    pub operations: Vec<RenderOp>,
    pub warnings: Vec<MappingWarning>,
}

pub struct FieldMappingResolver<'a> {
    compliance: &'a ComplianceTable,
}

impl<'a> FieldMappingResolver<'a> {
    pub fn new(compliance: &'a ComplianceTable) -> Self {
        Self { compliance }
    }

    /// Binds every validated answer to its target. All errors are collected.
    pub fn resolve_mapping(
        &self,
        resolution: &Resolution<'_>,
        mapping: &FieldMapping,
        validated: &ValidatedAnswers,
    ) -> Result<RenderPlan, Vec<MappingError>> {
        let document_type = resolution.definition.id.as_str();
        let jurisdiction = &resolution.jurisdiction;
        let rule = self.compliance.lookup(jurisdiction);
        let date_format = jurisdiction.date_format();

        let mut operations = Vec::with_capacity(validated.len());
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for (key, value) in validated.iter() {
            let Some(target) = mapping.get(key) else {
                if rule.requires(document_type, key) {
                    errors.push(MappingError::MissingFieldMapping {
                        key: key.to_string(),
                        jurisdiction: jurisdiction.clone(),
                    });
                } else {
                    warnings.push(MappingWarning {
                        key: key.to_string(),
                        message: format!(
                            "'{key}' has no field on the {} template and was left off",
                            resolution.strategy
                        ),
                    });
                }
                continue;
            };

            match (resolution.strategy, target) {
                (MappingStrategy::AcroForm, FieldTarget::AcroForm(target)) => {
                    match check_compatible(key, target, value, date_format) {
                        Ok(()) => operations.push(RenderOp::Fill {
                            key: key.to_string(),
                            target: target.clone(),
                            value: value.clone(),
                        }),
                        Err(error) => errors.push(error),
                    }
                }
                (MappingStrategy::Overlay, FieldTarget::Overlay(target)) => {
                    operations.push(RenderOp::Draw {
                        key: key.to_string(),
                        target: target.clone(),
                        value: value.clone(),
                    })
                }
                (expected, target) => errors.push(MappingError::StrategyMismatch {
                    key: key.to_string(),
                    expected,
                    found: target.strategy(),
                }),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        debug!(
            document_type,
            jurisdiction = %jurisdiction,
            strategy = %resolution.strategy,
            operations = operations.len(),
            warnings = warnings.len(),
            "planned render"
        );

        Ok(RenderPlan {
            document_type: document_type.to_string(),
            jurisdiction: jurisdiction.clone(),
            strategy: resolution.strategy,
            template: resolution.template.clone(),
            date_format,
            operations,
            warnings,
        })
    }
}

fn check_compatible(
    key: &str,
    target: &AcroFormTarget,
    value: &TypedValue,
    date_format: DateFormat,
) -> Result<(), MappingError> {
    let incompatible = |value: String| MappingError::IncompatibleValue {
        key: key.to_string(),
        target: target.field_kind,
        value,
    };

    match target.field_kind {
        FieldKind::Text | FieldKind::Date => Ok(()),
        FieldKind::Checkbox if target.is_checkbox_choice() => {
            let answer = display_value(value, date_format);
            if target.options.contains_key(&answer) {
                Ok(())
            } else {
                Err(incompatible(format!("'{answer}'")))
            }
        }
        FieldKind::Checkbox => match value {
            TypedValue::Boolean(_) => Ok(()),
            other => Err(incompatible(format!("a {} value", other.kind_label()))),
        },
        FieldKind::Radio => {
            let answer = display_value(value, date_format);
            if target.radio_state(&answer).is_some() {
                Ok(())
            } else {
                Err(incompatible(format!("'{answer}'")))
            }
        }
    }
}
