//! Properties the bundled catalog and its authoring tools must hold for every
//! document and jurisdiction.

mod support;

use std::collections::BTreeSet;
use std::fs;

use doc_assembly::compliance::ComplianceTable;
use doc_assembly::introspect::{inspect_pdf_bytes, write_sibling_catalog};
use doc_assembly::jurisdiction::{JurisdictionCode, QuestionResolver};
use doc_assembly::lint::lint_registry;
use doc_assembly::mapping::suggest::known_keys;
use doc_assembly::mapping::{FieldCatalog, FieldKind, OverlayTarget, PageBox};
use doc_assembly::render::text::{text_width, wrap_text};
use doc_assembly::render::{layout_lines, RenderError};

use support::{bundled_registry, florida_template};

#[test]
fn resolved_questions_match_their_schema_everywhere() {
    let registry = bundled_registry();
    let resolver = QuestionResolver::new(&registry);
    let jurisdictions: Vec<JurisdictionCode> = JurisdictionCode::all_us()
        .chain(std::iter::once(JurisdictionCode::generic()))
        .collect();

    let mut resolved = 0;
    for definition in registry.definitions() {
        for jurisdiction in &jurisdictions {
            let Ok(resolution) = resolver.resolve(&definition.id, jurisdiction) else {
                continue;
            };
            let question_ids: BTreeSet<&str> = resolution
                .question_set
                .questions
                .iter()
                .map(|question| question.id.as_str())
                .collect();
            assert_eq!(
                question_ids,
                resolution.schema.keys(),
                "{} in {}",
                definition.id,
                jurisdiction
            );
            resolved += 1;
        }
    }
    assert!(resolved > 50, "only {resolved} pairs resolved");
}

#[test]
fn bundled_catalog_has_no_lint_findings() {
    let registry = bundled_registry();
    let findings = lint_registry(&registry, ComplianceTable::shared());
    assert!(findings.is_empty(), "{findings:#?}");
}

#[test]
fn wrapped_lines_never_exceed_the_box() {
    let samples = [
        "Sold as-is with no warranty, expressed or implied.",
        "Buyer accepts the vehicle in its present condition including all defects known or unknown",
        "Supercalifragilisticexpialidocious-hyphenated-identifier-without-spaces",
        "short",
        "line one\nline two is a little longer than line one",
    ];
    for text in samples {
        for font_size in [8.0_f32, 9.0, 10.0, 12.0] {
            for max_width in [40.0_f32, 80.0, 140.0, 340.0, 468.0] {
                let lines = wrap_text(text, font_size, max_width);
                assert!(!lines.is_empty(), "{text:?} produced no lines");
                for line in &lines {
                    assert!(
                        text_width(line, font_size) <= max_width + 0.01,
                        "{line:?} at {font_size}pt overflows {max_width}"
                    );
                }
                let rejoined: String = lines.concat().split_whitespace().collect();
                let original: String = text.split_whitespace().collect();
                assert_eq!(rejoined, original, "wrapping lost characters");
            }
        }
    }
}

#[test]
fn boxes_narrower_than_a_glyph_never_lay_out_overflowing_lines() {
    let samples = ["WWW", "Sold as-is", "i"];
    for text in samples {
        for font_size in [8.0_f32, 10.0, 12.0] {
            for max_width in [1.0_f32, 4.0, 6.0, 9.0] {
                for line in wrap_text(text, font_size, max_width) {
                    if text_width(&line, font_size) > max_width + 0.01 {
                        assert_eq!(line.chars().count(), 1, "{line:?} overflows {max_width}");
                    }
                }
                let target = OverlayTarget::at(0, 72.0, 700.0, font_size, max_width);
                match layout_lines("notes", &target, text, PageBox::US_LETTER) {
                    Ok(lines) => assert!(!lines.is_empty()),
                    Err(RenderError::LineTooWide { width, .. }) => assert!(width > max_width),
                    Err(other) => panic!("unexpected layout error {other}"),
                }
            }
        }
    }
}

#[test]
fn introspected_catalog_round_trips_through_disk() {
    let registry = bundled_registry();
    let candidates = known_keys(&registry);
    let catalog = inspect_pdf_bytes(&florida_template(), &candidates).expect("fixture inspects");

    let names: Vec<&str> = catalog.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Year", "MakeManufacturer", "Purchasers", "1 REFLECTS THE ACTUAL MILEAGE"]
    );
    let year = &catalog.fields[0];
    assert_eq!(year.kind, FieldKind::Text);
    assert_eq!(year.page, Some(0));
    assert_eq!(year.rect, Some([72.0, 700.0, 172.0, 718.0]));
    assert_eq!(year.suggested_logical_key.as_deref(), Some("vehicle_year"));
    assert_eq!(catalog.fields[3].kind, FieldKind::Checkbox);

    let dir = std::env::temp_dir().join(format!("doc-assembly-introspect-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let pdf = dir.join("hsmv-82050.pdf");
    let written = write_sibling_catalog(&pdf, &catalog).expect("catalog writes");
    assert_eq!(written, dir.join("hsmv-82050-fields.json"));

    let reread: FieldCatalog =
        serde_json::from_slice(&fs::read(&written).expect("catalog reads")).expect("valid json");
    assert_eq!(reread, catalog);
    fs::remove_dir_all(&dir).ok();
}
