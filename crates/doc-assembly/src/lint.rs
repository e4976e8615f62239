//! Build-time checks over the compiled catalog and its mappings.
//!
//! Runs offline: AcroForm targets are checked against the persisted field
//! catalog, overlay targets against the page boxes the mapping declares.

use std::collections::{BTreeMap, BTreeSet};

use crate::compliance::ComplianceTable;
use crate::documents::{DocumentDefinition, DocumentRegistry, JurisdictionOverride};
use crate::jurisdiction::JurisdictionCode;
use crate::mapping::{
    Alignment, FieldCatalog, FieldKind, FieldMapping, FieldTarget, MappingStrategy, OverlayTarget,
    PageBox,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LintFinding {
    #[error("{document_type}/{jurisdiction}: required field '{key}' has no mapping entry")]
    MissingRequiredMapping {
        document_type: String,
        jurisdiction: JurisdictionCode,
        key: String,
    },
    #[error("{document_type}/{jurisdiction}: mapping key '{key}' is not a question")]
    UnknownAnswerKey {
        document_type: String,
        jurisdiction: JurisdictionCode,
        key: String,
    },
    #[error("{document_type}/{jurisdiction}: '{key}' is an {found} target in an {expected} mapping")]
    StrategyMismatch {
        document_type: String,
        jurisdiction: JurisdictionCode,
        key: String,
        expected: MappingStrategy,
        found: MappingStrategy,
    },
    #[error("{document_type}/{jurisdiction}: no field catalog for the official form")]
    MissingFieldCatalog {
        document_type: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("{document_type}/{jurisdiction}: '{key}' targets unknown field '{field_name}'")]
    UnknownFieldName {
        document_type: String,
        jurisdiction: JurisdictionCode,
        key: String,
        field_name: String,
    },
    #[error(
        "{document_type}/{jurisdiction}: '{key}' expects a {expected} field but '{field_name}' is catalogued as {catalogued}"
    )]
    FieldKindMismatch {
        document_type: String,
        jurisdiction: JurisdictionCode,
        key: String,
        field_name: String,
        expected: FieldKind,
        catalogued: FieldKind,
    },
    #[error("{document_type}: '{key}' draws on page {page} but the template has {pages} page(s)")]
    UndeclaredPage {
        document_type: String,
        key: String,
        page: usize,
        pages: usize,
    },
    #[error("{document_type}: '{key}' spans ({x0}, {y0})-({x1}, {y1}) outside page {page}")]
    OverlayOutOfBounds {
        document_type: String,
        key: String,
        page: usize,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
    },
}

/// Runs every check and returns the findings in a stable order.
pub fn lint_registry(
    registry: &DocumentRegistry,
    compliance: &ComplianceTable,
) -> Vec<LintFinding> {
    let mut findings = Vec::new();
    for definition in registry.definitions() {
        lint_generic(registry, compliance, definition, &mut findings);
        for entry in registry.overrides_for(&definition.id) {
            lint_override(registry, compliance, entry, &mut findings);
        }
    }
    findings
}

fn lint_generic(
    registry: &DocumentRegistry,
    compliance: &ComplianceTable,
    definition: &DocumentDefinition,
    findings: &mut Vec<LintFinding>,
) {
    let document_type = definition.id.as_str();
    let generic = JurisdictionCode::generic();
    let Some(mapping) = registry.bundled_mapping(document_type, &generic) else {
        // Without an overlay, in-scope jurisdictions lacking an override cannot be served.
        let uncovered = definition
            .scope
            .codes()
            .into_iter()
            .find(|code| registry.override_for(document_type, code).is_none());
        if let Some(jurisdiction) = uncovered {
            for key in compliance.lookup(&jurisdiction).required_fields(document_type) {
                findings.push(LintFinding::MissingRequiredMapping {
                    document_type: document_type.to_string(),
                    jurisdiction: jurisdiction.clone(),
                    key: key.to_string(),
                });
            }
        }
        return;
    };

    // First overlay jurisdiction that needs each key.
    let mut required: BTreeMap<&'static str, JurisdictionCode> = BTreeMap::new();
    for jurisdiction in definition.scope.codes() {
        if registry.override_for(document_type, &jurisdiction).is_some() {
            continue;
        }
        for key in compliance.lookup(&jurisdiction).required_fields(document_type) {
            required.entry(key).or_insert_with(|| jurisdiction.clone());
        }
    }
    for (key, jurisdiction) in required {
        if !mapping.contains(key) {
            findings.push(LintFinding::MissingRequiredMapping {
                document_type: document_type.to_string(),
                jurisdiction,
                key: key.to_string(),
            });
        }
    }

    let questions = registry
        .question_set(&definition.question_set)
        .map(|set| set.ids())
        .unwrap_or_default();
    lint_keys(document_type, &generic, mapping, &questions, findings);

    for (key, target) in &mapping.entries {
        match target {
            FieldTarget::Overlay(target) => {
                lint_overlay(document_type, key, target, &mapping.pages, findings)
            }
            FieldTarget::AcroForm(_) => findings.push(LintFinding::StrategyMismatch {
                document_type: document_type.to_string(),
                jurisdiction: generic.clone(),
                key: key.clone(),
                expected: MappingStrategy::Overlay,
                found: MappingStrategy::AcroForm,
            }),
        }
    }
}

fn lint_override(
    registry: &DocumentRegistry,
    compliance: &ComplianceTable,
    entry: &JurisdictionOverride,
    findings: &mut Vec<LintFinding>,
) {
    let document_type = entry.document_type.as_str();
    let jurisdiction = &entry.jurisdiction;
    let mapping = &entry.mapping;

    for key in compliance.lookup(jurisdiction).required_fields(document_type) {
        if !mapping.contains(key) {
            findings.push(LintFinding::MissingRequiredMapping {
                document_type: document_type.to_string(),
                jurisdiction: jurisdiction.clone(),
                key: key.to_string(),
            });
        }
    }

    let questions = registry
        .question_set(&entry.question_set)
        .map(|set| set.ids())
        .unwrap_or_default();
    lint_keys(document_type, jurisdiction, mapping, &questions, findings);

    let catalog = entry.field_catalog.as_ref();
    if catalog.is_none() {
        findings.push(LintFinding::MissingFieldCatalog {
            document_type: document_type.to_string(),
            jurisdiction: jurisdiction.clone(),
        });
    }

    for (key, target) in &mapping.entries {
        let FieldTarget::AcroForm(target) = target else {
            findings.push(LintFinding::StrategyMismatch {
                document_type: document_type.to_string(),
                jurisdiction: jurisdiction.clone(),
                key: key.clone(),
                expected: MappingStrategy::AcroForm,
                found: MappingStrategy::Overlay,
            });
            continue;
        };
        let Some(catalog) = catalog else {
            continue;
        };
        for field_name in target.field_names() {
            findings.extend(check_catalogued(
                document_type,
                jurisdiction,
                key,
                target.field_kind,
                field_name,
                catalog,
            ));
        }
    }
}

fn check_catalogued(
    document_type: &str,
    jurisdiction: &JurisdictionCode,
    key: &str,
    expected: FieldKind,
    field_name: &str,
    catalog: &FieldCatalog,
) -> Option<LintFinding> {
    let Some(descriptor) = catalog.get(field_name) else {
        return Some(LintFinding::UnknownFieldName {
            document_type: document_type.to_string(),
            jurisdiction: jurisdiction.clone(),
            key: key.to_string(),
            field_name: field_name.to_string(),
        });
    };
    let compatible =
        expected == descriptor.kind || (expected.is_textual() && descriptor.kind.is_textual());
    (!compatible).then(|| LintFinding::FieldKindMismatch {
        document_type: document_type.to_string(),
        jurisdiction: jurisdiction.clone(),
        key: key.to_string(),
        field_name: field_name.to_string(),
        expected,
        catalogued: descriptor.kind,
    })
}

fn lint_keys(
    document_type: &str,
    jurisdiction: &JurisdictionCode,
    mapping: &FieldMapping,
    questions: &BTreeSet<&str>,
    findings: &mut Vec<LintFinding>,
) {
    for key in mapping.entries.keys() {
        if !questions.contains(key.as_str()) {
            findings.push(LintFinding::UnknownAnswerKey {
                document_type: document_type.to_string(),
                jurisdiction: jurisdiction.clone(),
                key: key.clone(),
            });
        }
    }
}

/// Horizontal span of the widest line the target allows, given its alignment.
fn horizontal_extent(target: &OverlayTarget) -> (f32, f32) {
    match target.alignment {
        Alignment::Left => (target.x, target.x + target.max_width),
        Alignment::Center => {
            let half = target.max_width / 2.0;
            (target.x - half, target.x + half)
        }
        Alignment::Right => (target.x - target.max_width, target.x),
    }
}

fn lint_overlay(
    document_type: &str,
    key: &str,
    target: &OverlayTarget,
    pages: &[PageBox],
    findings: &mut Vec<LintFinding>,
) {
    let bounds = if pages.is_empty() {
        // Undeclared layouts are assumed to be a single US Letter page.
        (target.page == 0).then_some(PageBox::US_LETTER)
    } else {
        pages.get(target.page).copied()
    };
    let Some(bounds) = bounds else {
        findings.push(LintFinding::UndeclaredPage {
            document_type: document_type.to_string(),
            key: key.to_string(),
            page: target.page,
            pages: pages.len().max(1),
        });
        return;
    };

    let (x0, x1) = horizontal_extent(target);
    let (y0, y1) = (target.y, target.y + target.font_size);
    if !bounds.contains(x0, y0) || !bounds.contains(x1, y1) {
        findings.push(LintFinding::OverlayOutOfBounds {
            document_type: document_type.to_string(),
            key: key.to_string(),
            page: target.page,
            x0,
            y0,
            x1,
            y1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::catalog::VEHICLE_BILL_OF_SALE;
    use crate::documents::RegistryBuilder;
    use crate::mapping::AcroFormTarget;

    #[test]
    fn bundled_catalog_lints_clean() {
        let registry = RegistryBuilder::bundled().build().expect("bundled builds");
        let findings = lint_registry(&registry, ComplianceTable::shared());
        assert!(findings.is_empty(), "unexpected findings: {findings:#?}");
    }

    #[test]
    fn right_aligned_targets_extend_left_of_their_anchor() {
        let target = OverlayTarget::at(0, 100.0, 400.0, 10.0, 140.0).aligned(Alignment::Right);
        let mut findings = Vec::new();
        lint_overlay("demo", "sale_price", &target, &[PageBox::US_LETTER], &mut findings);
        assert!(matches!(
            findings.as_slice(),
            [LintFinding::OverlayOutOfBounds { x0, .. }] if *x0 < 0.0
        ));

        findings.clear();
        let target = OverlayTarget::at(0, 540.0, 400.0, 10.0, 140.0).aligned(Alignment::Right);
        lint_overlay("demo", "sale_price", &target, &[PageBox::US_LETTER], &mut findings);
        assert!(findings.is_empty());
    }

    #[test]
    fn pages_beyond_the_template_are_flagged() {
        let target = OverlayTarget::at(2, 72.0, 700.0, 10.0, 100.0);
        let mut findings = Vec::new();
        lint_overlay("demo", "notes", &target, &[PageBox::US_LETTER], &mut findings);
        assert!(matches!(
            findings.as_slice(),
            [LintFinding::UndeclaredPage { page: 2, pages: 1, .. }]
        ));
    }

    #[test]
    fn catalog_checks_names_and_kinds() {
        let fl = JurisdictionCode::parse("FL").expect("fl parses");
        let registry = RegistryBuilder::bundled().build().expect("bundled builds");
        let entry = registry
            .override_for(VEHICLE_BILL_OF_SALE, &fl)
            .expect("florida override");
        let catalog = entry.field_catalog.as_ref().expect("catalog compiled in");

        let unknown = check_catalogued(
            VEHICLE_BILL_OF_SALE,
            &fl,
            "buyer_name",
            FieldKind::Text,
            "Purchaser Signature",
            catalog,
        );
        assert!(matches!(unknown, Some(LintFinding::UnknownFieldName { .. })));

        let kind = check_catalogued(
            VEHICLE_BILL_OF_SALE,
            &fl,
            "buyer_name",
            FieldKind::Checkbox,
            "Purchasers",
            catalog,
        );
        assert!(matches!(
            kind,
            Some(LintFinding::FieldKindMismatch {
                catalogued: FieldKind::Text,
                ..
            })
        ));

        let date_in_text = check_catalogued(
            VEHICLE_BILL_OF_SALE,
            &fl,
            "sale_date",
            FieldKind::Date,
            "Purchasers",
            catalog,
        );
        assert!(date_in_text.is_none());
    }

    #[test]
    fn override_missing_a_required_key_is_reported() {
        let fl = JurisdictionCode::parse("FL").expect("fl parses");
        let registry = RegistryBuilder::bundled().build().expect("bundled builds");
        let mut entry = registry
            .override_for(VEHICLE_BILL_OF_SALE, &fl)
            .expect("florida override")
            .clone();
        entry.mapping.entries.remove("odometer_reading");
        entry.mapping = entry
            .mapping
            .acroform("seller_signature", AcroFormTarget::text("Sellers Printed Name"));

        let mut findings = Vec::new();
        lint_override(&registry, ComplianceTable::shared(), &entry, &mut findings);
        assert_eq!(
            findings,
            vec![
                LintFinding::MissingRequiredMapping {
                    document_type: VEHICLE_BILL_OF_SALE.to_string(),
                    jurisdiction: fl.clone(),
                    key: "odometer_reading".to_string(),
                },
                LintFinding::UnknownAnswerKey {
                    document_type: VEHICLE_BILL_OF_SALE.to_string(),
                    jurisdiction: fl,
                    key: "seller_signature".to_string(),
                },
            ]
        );
    }
}
