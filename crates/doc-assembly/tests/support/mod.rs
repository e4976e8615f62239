//! Shared fixtures: lopdf-built templates and an in-memory template source.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde_json::Value;

use doc_assembly::assets::{
    AssetChain, AssetKind, AssetRequest, AssetSource, AssetStore, SourceError,
    StaticFallbackSource,
};
use doc_assembly::documents::{DocumentRegistry, RegistryBuilder};
use doc_assembly::render::{PdfRenderer, RenderLimits};
use doc_assembly::validation::RawAnswers;
use doc_assembly::DocumentAssembler;

pub enum FixtureField {
    Text { name: &'static str, rect: [i64; 4] },
    Checkbox { name: &'static str, rect: [i64; 4] },
}

fn letter_page(doc: &mut Document, pages_id: ObjectId) -> ObjectId {
    let contents = doc.add_object(Stream::new(dictionary! {}, b"q Q\n".to_vec()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => contents,
    })
}

fn finish(
    mut doc: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    acroform: Option<ObjectId>,
) -> Vec<u8> {
    let count = pages.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => pages.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => count,
        }),
    );
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(acroform) = acroform {
        catalog.set("AcroForm", acroform);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture saves");
    bytes
}

/// Blank US Letter pages, as used by the generic overlay templates.
pub fn blank_template(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_ids = (0..pages).map(|_| letter_page(&mut doc, pages_id)).collect();
    finish(doc, pages_id, page_ids, None)
}

/// One page carrying the given AcroForm fields, each a merged field/widget.
pub fn acroform_template(fields: &[FixtureField]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = letter_page(&mut doc, pages_id);

    let mut field_refs = Vec::new();
    for field in fields {
        let dict = match field {
            FixtureField::Text { name, rect } => dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "FT" => "Tx",
                "T" => Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
                "Rect" => rect.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
                "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
                "F" => 4,
                "P" => page_id,
            },
            FixtureField::Checkbox { name, rect } => {
                let on = doc.add_object(Stream::new(
                    dictionary! { "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()] },
                    b"q 0 g 2 2 8 8 re f Q\n".to_vec(),
                ));
                let off = doc.add_object(Stream::new(
                    dictionary! { "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()] },
                    Vec::new(),
                ));
                dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "FT" => "Btn",
                    "T" => Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
                    "Rect" => rect.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
                    "V" => "Off",
                    "AS" => "Off",
                    "AP" => dictionary! {
                        "N" => dictionary! { "Yes" => on, "Off" => off },
                    },
                    "F" => 4,
                    "P" => page_id,
                }
            }
        };
        field_refs.push(Object::Reference(doc.add_object(dict)));
    }

    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        page.set("Annots", field_refs.clone());
    }
    let acroform = doc.add_object(dictionary! {
        "Fields" => field_refs,
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    finish(doc, pages_id, vec![page_id], Some(acroform))
}

/// Every stream in the document, decompressed and concatenated.
pub fn stream_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).expect("output parses");
    let mut text = String::new();
    for object in doc.objects.values() {
        if let Object::Stream(stream) = object {
            let content = if stream.dict.get(b"Filter").is_ok() {
                stream.decompressed_content().unwrap_or_default()
            } else {
                stream.content.clone()
            };
            text.push_str(&String::from_utf8_lossy(&content));
            text.push('\n');
        }
    }
    text
}

/// Serves template PDFs by file name; every other asset kind is left to the chain.
#[derive(Default)]
pub struct TemplateFixtures {
    templates: HashMap<String, Vec<u8>>,
}

impl TemplateFixtures {
    pub fn with(mut self, file_name: &str, bytes: Vec<u8>) -> Self {
        self.templates.insert(file_name.to_string(), bytes);
        self
    }
}

impl AssetSource for TemplateFixtures {
    fn name(&self) -> &'static str {
        "fixtures"
    }

    fn supports(&self, kind: AssetKind) -> bool {
        kind == AssetKind::Template
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        self.templates
            .get(&request.file_name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(request.relative_path()))
    }
}

pub fn bundled_registry() -> Arc<DocumentRegistry> {
    Arc::new(RegistryBuilder::bundled().build().expect("bundled registry builds"))
}

/// Assembler over `sources`, with the compiled catalog appended last.
pub fn assembler_with(
    registry: Arc<DocumentRegistry>,
    mut sources: Vec<Box<dyn AssetSource>>,
) -> DocumentAssembler {
    sources.push(Box::new(StaticFallbackSource::new(Arc::clone(&registry))));
    DocumentAssembler::new(
        registry,
        AssetStore::new(AssetChain::new(sources)),
        PdfRenderer::new(RenderLimits::default()),
    )
}

pub fn answers(value: Value) -> RawAnswers {
    serde_json::from_value(value).expect("answers deserialize")
}

pub fn florida_template() -> Vec<u8> {
    acroform_template(&[
        FixtureField::Text {
            name: "Year",
            rect: [72, 700, 172, 718],
        },
        FixtureField::Text {
            name: "MakeManufacturer",
            rect: [180, 700, 320, 718],
        },
        FixtureField::Text {
            name: "Purchasers",
            rect: [72, 640, 400, 658],
        },
        FixtureField::Checkbox {
            name: "1 REFLECTS THE ACTUAL MILEAGE",
            rect: [72, 600, 84, 612],
        },
    ])
}

/// ITD 3738 text fields for the required answers plus every brand and odometer box.
pub fn idaho_template() -> Vec<u8> {
    let text = [
        "Vehicle Year",
        "Vehicle Make",
        "Vehicle Model",
        "VIN",
        "Sellers Full Legal Printed Name",
        "Physical Address",
        "Idaho Drivers License Number or SSN  EIN if Business",
        "City",
        "State",
        "Buyers Full Legal Printed Name",
        "Physical Address_2",
        "Idaho Drivers License Number or SSN  EIN if Business_2",
        "City_2",
        "State_2",
        "Sale Price",
        "Date of Sale",
    ];
    let boxes = [
        "Rebuilt Salvage",
        "Previous Brand",
        "Reconstruct",
        "Repaired",
        "Actual Miles",
        "Not Actual",
        "Exceeds Mechanical Limits",
        "Exempt",
        "No Odometer",
    ];
    let mut fields: Vec<FixtureField> = text
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let y = 740 - 24 * index as i64;
            FixtureField::Text {
                name,
                rect: [72, y, 400, y + 18],
            }
        })
        .collect();
    fields.extend(boxes.into_iter().enumerate().map(|(index, name)| {
        let x = 72 + 40 * index as i64;
        FixtureField::Checkbox {
            name,
            rect: [x, 320, x + 12, 332],
        }
    }));
    acroform_template(&fields)
}

pub fn idaho_vehicle_answers() -> Value {
    serde_json::json!({
        "vehicle_year": 2018,
        "vehicle_make": "Subaru",
        "vehicle_model": "Outback",
        "vehicle_vin": "JF2SJAEC8JH512345",
        "odometer_status": "actual",
        "vehicle_brand_status": "repaired",
        "seller_name": "Sam Seller",
        "seller_address": "210 Main St",
        "seller_id_number": "AB123456C",
        "seller_city": "Boise",
        "seller_state": "ID",
        "buyer_name": "Jane Doe",
        "buyer_address": "44 River Rd",
        "buyer_id_number": "CD654321E",
        "buyer_city": "Nampa",
        "buyer_state": "ID",
        "sale_price": "9400",
        "sale_date": "2025-05-02",
    })
}

pub fn generic_vehicle_answers() -> Value {
    serde_json::json!({
        "seller_name": "Sam Seller",
        "seller_address": "12 Harbor Rd, Juneau AK 99801",
        "buyer_name": "Jane Doe",
        "buyer_address": "40 Elm St, Anchorage AK 99501",
        "vehicle_year": 2019,
        "vehicle_make": "Honda",
        "vehicle_model": "Accord",
        "vehicle_vin": "1HGCM82633A004352",
        "sale_price": "12500",
        "sale_date": "2025-03-14",
    })
}
