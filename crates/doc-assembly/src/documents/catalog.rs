//! Compiled document catalog. Also serves as the static fallback for JSON assets.

use chrono::NaiveDate;

use super::domain::{
    Constraints, DocumentCategory, DocumentDefinition, JurisdictionOverride, JurisdictionScope,
    Question, QuestionKind, QuestionSet, SelectOption, TemplateRef,
};
use super::registry::RegistryBuilder;
use super::schema::Schema;
use crate::jurisdiction::JurisdictionCode;
use crate::mapping::{
    AcroFormTarget, Alignment, FieldCatalog, FieldDescriptor, FieldKind, FieldMapping,
    OverlayTarget, PageBox,
};

pub const VEHICLE_BILL_OF_SALE: &str = "vehicle-bill-of-sale";
pub const NON_DISCLOSURE_AGREEMENT: &str = "non-disclosure-agreement";

const VIN_PATTERN: &str = "^[A-HJ-NPR-Z0-9]{17}$";

pub(crate) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    let builder = register_vehicle_bill_of_sale(builder);
    register_non_disclosure_agreement(builder)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn code(raw: &str) -> JurisdictionCode {
    JurisdictionCode::parse(raw).unwrap_or_else(|_| JurisdictionCode::generic())
}

fn text(id: &str, label: &str) -> Question {
    Question::new(id, QuestionKind::Text, label)
}

fn number(id: &str, label: &str, min: f64, max: Option<f64>) -> Question {
    Question::new(id, QuestionKind::Number, label).constrained(Constraints {
        min: Some(min),
        max,
        ..Constraints::default()
    })
}

fn select(id: &str, label: &str, options: &[(&str, &str)]) -> Question {
    let options = options
        .iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();
    Question::new(id, QuestionKind::Select { options }, label)
}

fn vin(id: &str) -> Question {
    text(id, "Vehicle identification number (VIN)").constrained(Constraints {
        pattern: Some(VIN_PATTERN.to_string()),
        message: Some("VIN must be 17 characters and cannot contain I, O or Q".to_string()),
        ..Constraints::default()
    })
}

fn sale_price() -> Question {
    Question::new("sale_price", QuestionKind::Currency, "Sale price").constrained(Constraints {
        min: Some(0.0),
        ..Constraints::default()
    })
}

fn with_schema(id: &str, questions: Vec<Question>) -> (QuestionSet, Schema) {
    let set = QuestionSet {
        id: id.to_string(),
        questions,
    };
    let schema = Schema::from_question_set(format!("{id}.schema"), &set);
    (set, schema)
}

fn catalog_from(form_id: &str, fields: &[(&str, FieldKind)]) -> FieldCatalog {
    FieldCatalog {
        form_id: Some(form_id.to_string()),
        fields: fields
            .iter()
            .map(|(name, kind)| FieldDescriptor::new(name, *kind))
            .collect(),
    }
}

fn register_vehicle_bill_of_sale(builder: RegistryBuilder) -> RegistryBuilder {
    let base_id = format!("{VEHICLE_BILL_OF_SALE}.base");
    let (base_set, base_schema) = with_schema(
        &base_id,
        vec![
            text("seller_name", "Seller full name").required().grouped("seller"),
            text("seller_address", "Seller address").required().grouped("seller"),
            text("buyer_name", "Buyer full name").required().grouped("buyer"),
            text("buyer_address", "Buyer address").required().grouped("buyer"),
            number("vehicle_year", "Model year", 1900.0, Some(2100.0))
                .required()
                .grouped("vehicle"),
            text("vehicle_make", "Make").required().grouped("vehicle"),
            text("vehicle_model", "Model").required().grouped("vehicle"),
            vin("vehicle_vin").required().grouped("vehicle"),
            text("vehicle_color", "Color").grouped("vehicle"),
            number("odometer_reading", "Odometer reading", 0.0, None).grouped("vehicle"),
            select(
                "odometer_status",
                "Odometer status",
                &[
                    ("actual", "Actual mileage"),
                    ("exceeds", "Exceeds mechanical limits"),
                    ("not_actual", "Not the actual mileage"),
                ],
            )
            .grouped("vehicle"),
            sale_price().required().grouped("sale"),
            Question::new("sale_date", QuestionKind::Date, "Date of sale")
                .required()
                .grouped("sale"),
            Question::new("as_is", QuestionKind::Boolean, "Sold as-is").grouped("sale"),
            select(
                "payment_method",
                "Payment method",
                &[
                    ("cash", "Cash"),
                    ("check", "Check"),
                    ("wire", "Wire transfer"),
                    ("other", "Other"),
                ],
            )
            .grouped("sale"),
            Question::new("additional_terms", QuestionKind::Textarea, "Additional terms")
                .constrained(Constraints {
                    max_length: Some(600),
                    ..Constraints::default()
                })
                .grouped("sale"),
        ],
    );

    let definition = DocumentDefinition {
        id: VEHICLE_BILL_OF_SALE.to_string(),
        display_name: "Vehicle Bill of Sale".to_string(),
        category: DocumentCategory::Vehicle,
        scope: JurisdictionScope::All,
        base_price_cents: 1999,
        requires_notarization: false,
        can_be_recorded: false,
        languages: vec!["en".to_string(), "es".to_string()],
        schema: base_schema.id.clone(),
        question_set: base_set.id.clone(),
        template: TemplateRef::generic("vehicle-bill-of-sale.pdf"),
        schema_version: "1.0".to_string(),
        last_updated: date(2025, 6, 1),
    };

    let builder = builder
        .definition(definition)
        .question_set(base_set)
        .schema(base_schema)
        .generic_mapping(VEHICLE_BILL_OF_SALE, vehicle_generic_overlay());
    let builder = register_florida(builder);
    let builder = register_colorado(builder);
    let builder = register_alabama(builder);
    register_idaho(builder)
}

/// Coordinates on the generic one-page US Letter bill of sale.
pub fn vehicle_generic_overlay() -> FieldMapping {
    let value = |y: f32| OverlayTarget::at(0, 200.0, y, 10.0, 340.0);
    FieldMapping::new()
        .with_pages(vec![PageBox::US_LETTER])
        .overlay("seller_name", value(680.0))
        .overlay("seller_address", value(662.0))
        .overlay("buyer_name", value(620.0))
        .overlay("buyer_address", value(602.0))
        .overlay("vehicle_year", value(560.0))
        .overlay("vehicle_make", value(542.0))
        .overlay("vehicle_model", value(524.0))
        .overlay("vehicle_vin", value(506.0))
        .overlay("vehicle_color", value(488.0))
        .overlay("odometer_reading", value(470.0))
        .overlay("odometer_status", value(452.0))
        .overlay(
            "sale_price",
            OverlayTarget::at(0, 540.0, 410.0, 10.0, 140.0).aligned(Alignment::Right),
        )
        .overlay("sale_date", value(392.0))
        .overlay("as_is", value(374.0))
        .overlay(
            "additional_terms",
            OverlayTarget::at(0, 72.0, 330.0, 9.0, 468.0),
        )
}

fn register_florida(builder: RegistryBuilder) -> RegistryBuilder {
    let fl = code("FL");
    let id = format!("{VEHICLE_BILL_OF_SALE}.fl");
    let (set, schema) = with_schema(
        &id,
        vec![
            number("vehicle_year", "Model year", 1900.0, Some(2100.0)).required(),
            text("vehicle_make", "Make/manufacturer"),
            text("vehicle_body_type", "Body type"),
            text("vehicle_model", "Model"),
            text("vehicle_color", "Color"),
            vin("vehicle_vin"),
            Question::new(
                "title_issue_date",
                QuestionKind::Date,
                "Current title issue date",
            ),
            sale_price(),
            text("buyer_name", "Print names of purchasers").required(),
            text("buyer_address", "Purchaser address, city, state and ZIP"),
            text("buyer_phone", "Purchaser phone"),
            number("odometer_reading", "Odometer now reads", 0.0, None),
            Question::new(
                "odometer_actual",
                QuestionKind::Boolean,
                "Reading reflects the actual mileage",
            ),
            text("seller_name", "Seller printed name"),
            text("seller_address", "Seller address, city, state and ZIP"),
            Question::new("sale_date", QuestionKind::Date, "Date of sale"),
        ],
    );

    let mapping = FieldMapping::new()
        .acroform("vehicle_year", AcroFormTarget::text("Year"))
        .acroform("vehicle_make", AcroFormTarget::text("MakeManufacturer"))
        .acroform("vehicle_body_type", AcroFormTarget::text("Body Type"))
        .acroform("vehicle_model", AcroFormTarget::text("Model"))
        .acroform("vehicle_color", AcroFormTarget::text("Color"))
        .acroform(
            "vehicle_vin",
            AcroFormTarget::text("VehicleVessel Identification Number"),
        )
        .acroform(
            "title_issue_date",
            AcroFormTarget::date("Current Title Issue Date"),
        )
        .acroform("sale_price", AcroFormTarget::text("2"))
        .acroform("buyer_name", AcroFormTarget::text("Purchasers"))
        .acroform(
            "buyer_address",
            AcroFormTarget::text("Address City State Zip Code"),
        )
        .acroform("odometer_reading", AcroFormTarget::text("undefined_2"))
        .acroform(
            "odometer_actual",
            AcroFormTarget::checkbox("1 REFLECTS THE ACTUAL MILEAGE"),
        )
        .acroform("seller_name", AcroFormTarget::text("Sellers Printed Name"))
        .acroform(
            "seller_address",
            AcroFormTarget::text("Sellers Address City State Zip Code"),
        )
        .acroform("sale_date", AcroFormTarget::date("Date"));

    let catalog = catalog_from(
        "HSMV 82050",
        &[
            ("Year", FieldKind::Text),
            ("MakeManufacturer", FieldKind::Text),
            ("Body Type", FieldKind::Text),
            ("Model", FieldKind::Text),
            ("Color", FieldKind::Text),
            ("VehicleVessel Identification Number", FieldKind::Text),
            ("Current Title Issue Date", FieldKind::Date),
            ("2", FieldKind::Text),
            ("Purchasers", FieldKind::Text),
            ("Address City State Zip Code", FieldKind::Text),
            ("5 DIGIT OR", FieldKind::Checkbox),
            ("6 DIGIT ODOMETER NOW READS", FieldKind::Checkbox),
            ("undefined_2", FieldKind::Text),
            ("1 REFLECTS THE ACTUAL MILEAGE", FieldKind::Checkbox),
            ("2 IS IN EXCESS OF ITS MECHANICAL LIMITS", FieldKind::Checkbox),
            ("3 IS NOT THE ACTUAL MILEAGE", FieldKind::Checkbox),
            ("Sellers Printed Name", FieldKind::Text),
            ("Sellers Address City State Zip Code", FieldKind::Text),
            ("Date", FieldKind::Date),
            ("Date_2", FieldKind::Date),
        ],
    );

    builder
        .question_set(set.clone())
        .schema(schema.clone())
        .jurisdiction_override(JurisdictionOverride {
            document_type: VEHICLE_BILL_OF_SALE.to_string(),
            jurisdiction: fl.clone(),
            question_set: set.id,
            schema: schema.id,
            official_form_id: "HSMV 82050".to_string(),
            template: TemplateRef {
                jurisdiction: fl,
                file_name: "hsmv-82050.pdf".to_string(),
            },
            mapping,
            field_catalog: Some(catalog),
        })
}

fn register_colorado(builder: RegistryBuilder) -> RegistryBuilder {
    let co = code("CO");
    let id = format!("{VEHICLE_BILL_OF_SALE}.co");
    let (set, schema) = with_schema(
        &id,
        vec![
            number("vehicle_year", "Model year", 1900.0, Some(2100.0)).required(),
            text("vehicle_make", "Make").required(),
            text("vehicle_model", "Model"),
            text("vehicle_body_style", "Body style"),
            vin("vehicle_vin").required(),
            text("vehicle_color", "Color"),
            text("seller_name", "Seller name").required(),
            text("seller_address", "Seller address"),
            text("seller_phone", "Seller phone"),
            text("buyer_name", "Buyer name").required(),
            text("buyer_address", "Buyer address"),
            text("buyer_phone", "Buyer phone"),
            sale_price().required(),
            Question::new("sale_date", QuestionKind::Date, "Date of sale").required(),
            number("odometer_reading", "Odometer reading", 0.0, None),
            text("title_number", "Title number"),
            select(
                "purged_record",
                "Vehicle record was purged",
                &[("yes", "Yes"), ("no", "No")],
            ),
        ],
    );

    let mapping = FieldMapping::new()
        .acroform("vehicle_year", AcroFormTarget::text("1"))
        .acroform("vehicle_make", AcroFormTarget::text("2"))
        .acroform("vehicle_model", AcroFormTarget::text("3"))
        .acroform("vehicle_body_style", AcroFormTarget::text("4"))
        .acroform("vehicle_vin", AcroFormTarget::text("5"))
        .acroform("vehicle_color", AcroFormTarget::text("6"))
        .acroform("seller_name", AcroFormTarget::text("7"))
        .acroform("seller_address", AcroFormTarget::text("8"))
        .acroform("seller_phone", AcroFormTarget::text("9"))
        .acroform("buyer_name", AcroFormTarget::text("10"))
        .acroform("buyer_address", AcroFormTarget::text("11"))
        .acroform("buyer_phone", AcroFormTarget::text("12"))
        .acroform("sale_price", AcroFormTarget::text("13"))
        .acroform("sale_date", AcroFormTarget::date("14"))
        .acroform("odometer_reading", AcroFormTarget::text("15"))
        .acroform("title_number", AcroFormTarget::text("19"))
        .acroform(
            "purged_record",
            AcroFormTarget::radio("Purged Colorado Record", &[("yes", "Yes"), ("no", "No")]),
        );

    let mut fields: Vec<(String, FieldKind)> = (1..=21)
        .map(|index| {
            let kind = if index == 14 || index == 21 {
                FieldKind::Date
            } else {
                FieldKind::Text
            };
            (index.to_string(), kind)
        })
        .collect();
    fields.push(("Purged Colorado Record".to_string(), FieldKind::Radio));
    let borrowed: Vec<(&str, FieldKind)> = fields
        .iter()
        .map(|(name, kind)| (name.as_str(), *kind))
        .collect();
    let catalog = catalog_from("DR 2116", &borrowed);

    builder
        .question_set(set.clone())
        .schema(schema.clone())
        .jurisdiction_override(JurisdictionOverride {
            document_type: VEHICLE_BILL_OF_SALE.to_string(),
            jurisdiction: co.clone(),
            question_set: set.id,
            schema: schema.id,
            official_form_id: "DR 2116".to_string(),
            template: TemplateRef {
                jurisdiction: co,
                file_name: "dr-2116.pdf".to_string(),
            },
            mapping,
            field_catalog: Some(catalog),
        })
}

fn register_alabama(builder: RegistryBuilder) -> RegistryBuilder {
    let al = code("AL");
    let id = format!("{VEHICLE_BILL_OF_SALE}.al");
    let (set, schema) = with_schema(
        &id,
        vec![
            number("vehicle_year", "Model year", 1900.0, Some(2100.0)).required(),
            text("vehicle_make", "Make").required(),
            text("vehicle_model", "Model"),
            vin("vehicle_vin").required(),
            text("vehicle_color", "Color"),
            text("seller_name", "Seller name").required(),
            text("seller_address", "Seller street address"),
            text("seller_city", "Seller city"),
            text("buyer_name", "Buyer name").required(),
            text("buyer_address", "Buyer street address"),
            text("buyer_city", "Buyer city"),
            sale_price().required(),
            Question::new("sale_date", QuestionKind::Date, "Date of sale").required(),
            number("odometer_reading", "Odometer reading", 0.0, None),
            Question::new(
                "odometer_actual",
                QuestionKind::Boolean,
                "Odometer reflects the actual mileage",
            ),
            text("notary_county", "Notary county"),
        ],
    );

    let mapping = FieldMapping::new()
        .acroform("vehicle_year", AcroFormTarget::text("Text1"))
        .acroform("vehicle_make", AcroFormTarget::text("Text2"))
        .acroform("vehicle_model", AcroFormTarget::text("Text3"))
        .acroform("vehicle_vin", AcroFormTarget::text("Text4"))
        .acroform("vehicle_color", AcroFormTarget::text("Text5"))
        .acroform("seller_name", AcroFormTarget::text("Text7"))
        .acroform("seller_address", AcroFormTarget::text("Text8"))
        .acroform("seller_city", AcroFormTarget::text("Text9"))
        .acroform("buyer_name", AcroFormTarget::text("Text12"))
        .acroform("buyer_address", AcroFormTarget::text("Text13"))
        .acroform("buyer_city", AcroFormTarget::text("Text14"))
        .acroform("sale_price", AcroFormTarget::text("Text17"))
        .acroform("sale_date", AcroFormTarget::date("Text18"))
        .acroform("odometer_reading", AcroFormTarget::text("Text19"))
        .acroform("odometer_actual", AcroFormTarget::checkbox("Check Box27"))
        .acroform("notary_county", AcroFormTarget::text("Text25"));

    let mut fields: Vec<(String, FieldKind)> = (1..=42)
        .map(|index| {
            let kind = if index == 18 {
                FieldKind::Date
            } else {
                FieldKind::Text
            };
            (format!("Text{index}"), kind)
        })
        .collect();
    fields.push(("Check Box27".to_string(), FieldKind::Checkbox));
    fields.push(("Check Box28".to_string(), FieldKind::Checkbox));
    let borrowed: Vec<(&str, FieldKind)> = fields
        .iter()
        .map(|(name, kind)| (name.as_str(), *kind))
        .collect();
    let catalog = catalog_from("MVT 32-13B", &borrowed);

    builder
        .question_set(set.clone())
        .schema(schema.clone())
        .jurisdiction_override(JurisdictionOverride {
            document_type: VEHICLE_BILL_OF_SALE.to_string(),
            jurisdiction: al.clone(),
            question_set: set.id,
            schema: schema.id,
            official_form_id: "MVT 32-13B".to_string(),
            template: TemplateRef {
                jurisdiction: al,
                file_name: "mvt-32-13b.pdf".to_string(),
            },
            mapping,
            field_catalog: Some(catalog),
        })
}

const IDAHO_SECOND_VIN: &str = "Note Second VIN should be provided for most motor homes and must be entered for doublewide mobile and manufactured homes";
const IDAHO_SELLER_ID: &str = "Idaho Drivers License Number or SSN  EIN if Business";
const IDAHO_BUYER_ID: &str = "Idaho Drivers License Number or SSN  EIN if Business_2";

/// Brand boxes on ITD 3738, by answer value.
const IDAHO_BRANDS: &[(&str, &str)] = &[
    ("previous_brand", "Previous Brand"),
    ("rebuilt_salvage", "Rebuilt Salvage"),
    ("reconstruct", "Reconstruct"),
    ("repaired", "Repaired"),
];

const IDAHO_ODOMETER: &[(&str, &str)] = &[
    ("actual", "Actual Miles"),
    ("not_actual", "Not Actual"),
    ("exceeds", "Exceeds Mechanical Limits"),
    ("exempt", "Exempt"),
    ("no_odometer", "No Odometer"),
];

fn register_idaho(builder: RegistryBuilder) -> RegistryBuilder {
    let id_code = code("ID");
    let id = format!("{VEHICLE_BILL_OF_SALE}.id");
    let (set, schema) = with_schema(
        &id,
        vec![
            text("title_number", "Idaho title number").grouped("vehicle"),
            number("vehicle_weight", "Weight in pounds", 0.0, None).grouped("vehicle"),
            text("vehicle_dimensions", "Full length and width").grouped("vehicle"),
            number("vehicle_year", "Model year", 1900.0, Some(2100.0))
                .required()
                .grouped("vehicle"),
            text("vehicle_make", "Make").required().grouped("vehicle"),
            text("vehicle_model", "Model").required().grouped("vehicle"),
            Question::new("vehicle_description", QuestionKind::Textarea, "Description")
                .constrained(Constraints {
                    max_length: Some(200),
                    ..Constraints::default()
                })
                .grouped("vehicle"),
            vin("vehicle_vin").required().grouped("vehicle"),
            text("second_vin", "Second VIN (motor and manufactured homes)").grouped("vehicle"),
            select(
                "vehicle_brand_status",
                "Title brand",
                &[
                    ("rebuilt_salvage", "Rebuilt salvage"),
                    ("previous_brand", "Previous brand"),
                    ("reconstruct", "Reconstructed"),
                    ("repaired", "Repaired"),
                ],
            )
            .grouped("vehicle"),
            text("other_brand_description", "Other brand").grouped("vehicle"),
            number("odometer_reading", "Odometer reading", 0.0, None).grouped("odometer"),
            select(
                "odometer_status",
                "Odometer status",
                &[
                    ("actual", "Actual miles"),
                    ("not_actual", "Not the actual miles"),
                    ("exceeds", "Exceeds mechanical limits"),
                    ("exempt", "Exempt"),
                    ("no_odometer", "No odometer"),
                ],
            )
            .required()
            .grouped("odometer"),
            text("seller_name", "Seller full legal name").required().grouped("seller"),
            text("seller_address", "Seller physical address").required().grouped("seller"),
            text("seller_id_number", "Seller driver license, SSN or EIN")
                .required()
                .grouped("seller"),
            text("seller_city", "Seller city").required().grouped("seller"),
            text("seller_state", "Seller state").required().grouped("seller"),
            text("buyer_name", "Buyer full legal name").required().grouped("buyer"),
            text("buyer_address", "Buyer physical address").required().grouped("buyer"),
            text("buyer_id_number", "Buyer driver license, SSN or EIN")
                .required()
                .grouped("buyer"),
            text("buyer_city", "Buyer city").required().grouped("buyer"),
            text("buyer_state", "Buyer state").required().grouped("buyer"),
            sale_price().required().grouped("sale"),
            Question::new("sale_date", QuestionKind::Date, "Date of sale")
                .required()
                .grouped("sale"),
        ],
    );

    let mapping = FieldMapping::new()
        .acroform("title_number", AcroFormTarget::text("Title Number"))
        .acroform("vehicle_weight", AcroFormTarget::text("Weight"))
        .acroform("vehicle_dimensions", AcroFormTarget::text("Full Length and Width"))
        .acroform("vehicle_year", AcroFormTarget::text("Vehicle Year"))
        .acroform("vehicle_make", AcroFormTarget::text("Vehicle Make"))
        .acroform("vehicle_model", AcroFormTarget::text("Vehicle Model"))
        .acroform("vehicle_description", AcroFormTarget::text("Description"))
        .acroform("vehicle_vin", AcroFormTarget::text("VIN"))
        .acroform("second_vin", AcroFormTarget::text(IDAHO_SECOND_VIN))
        .acroform(
            "vehicle_brand_status",
            AcroFormTarget::checkbox_choice(IDAHO_BRANDS),
        )
        .acroform("other_brand_description", AcroFormTarget::text("Other"))
        .acroform("odometer_reading", AcroFormTarget::text("Odometer Reading"))
        .acroform(
            "odometer_status",
            AcroFormTarget::checkbox_choice(IDAHO_ODOMETER),
        )
        .acroform(
            "seller_name",
            AcroFormTarget::text("Sellers Full Legal Printed Name"),
        )
        .acroform("seller_address", AcroFormTarget::text("Physical Address"))
        .acroform("seller_id_number", AcroFormTarget::text(IDAHO_SELLER_ID))
        .acroform("seller_city", AcroFormTarget::text("City"))
        .acroform("seller_state", AcroFormTarget::text("State"))
        .acroform(
            "buyer_name",
            AcroFormTarget::text("Buyers Full Legal Printed Name"),
        )
        .acroform("buyer_address", AcroFormTarget::text("Physical Address_2"))
        .acroform("buyer_id_number", AcroFormTarget::text(IDAHO_BUYER_ID))
        .acroform("buyer_city", AcroFormTarget::text("City_2"))
        .acroform("buyer_state", AcroFormTarget::text("State_2"))
        .acroform("sale_price", AcroFormTarget::text("Sale Price"))
        .acroform("sale_date", AcroFormTarget::date("Date of Sale"));

    let mut fields: Vec<(&str, FieldKind)> = [
        "Title Number",
        "Weight",
        "Full Length and Width",
        "Vehicle Year",
        "Vehicle Make",
        "Vehicle Model",
        "Description",
        "VIN",
        IDAHO_SECOND_VIN,
        "Other",
        "Odometer Reading",
        "Sellers Full Legal Printed Name",
        "Physical Address",
        IDAHO_SELLER_ID,
        "City",
        "State",
        "Buyers Full Legal Printed Name",
        "Physical Address_2",
        IDAHO_BUYER_ID,
        "City_2",
        "State_2",
        "Sale Price",
    ]
    .into_iter()
    .map(|name| (name, FieldKind::Text))
    .collect();
    fields.push(("Date of Sale", FieldKind::Date));
    fields.extend(
        IDAHO_BRANDS
            .iter()
            .chain(IDAHO_ODOMETER)
            .map(|(_, name)| (*name, FieldKind::Checkbox)),
    );
    let catalog = catalog_from("ITD 3738", &fields);

    builder
        .question_set(set.clone())
        .schema(schema.clone())
        .jurisdiction_override(JurisdictionOverride {
            document_type: VEHICLE_BILL_OF_SALE.to_string(),
            jurisdiction: id_code.clone(),
            question_set: set.id,
            schema: schema.id,
            official_form_id: "ITD 3738".to_string(),
            template: TemplateRef {
                jurisdiction: id_code,
                file_name: "itd-3738.pdf".to_string(),
            },
            mapping,
            field_catalog: Some(catalog),
        })
}

fn register_non_disclosure_agreement(builder: RegistryBuilder) -> RegistryBuilder {
    let base_id = format!("{NON_DISCLOSURE_AGREEMENT}.base");
    let (set, schema) = with_schema(
        &base_id,
        vec![
            text("disclosing_party", "Disclosing party").required(),
            text("receiving_party", "Receiving party").required(),
            Question::new("effective_date", QuestionKind::Date, "Effective date").required(),
            number("term_months", "Term in months", 1.0, Some(120.0)),
            text("governing_state", "Governing law state"),
            select(
                "mutual",
                "Agreement type",
                &[("mutual", "Mutual"), ("one_way", "One-way")],
            )
            .required(),
            Question::new(
                "confidential_purpose",
                QuestionKind::Textarea,
                "Purpose of disclosure",
            )
            .constrained(Constraints {
                max_length: Some(500),
                ..Constraints::default()
            }),
        ],
    );

    let definition = DocumentDefinition {
        id: NON_DISCLOSURE_AGREEMENT.to_string(),
        display_name: "Non-Disclosure Agreement".to_string(),
        category: DocumentCategory::Business,
        scope: JurisdictionScope::All,
        base_price_cents: 2499,
        requires_notarization: false,
        can_be_recorded: false,
        languages: vec!["en".to_string()],
        schema: schema.id.clone(),
        question_set: set.id.clone(),
        template: TemplateRef::generic("non-disclosure-agreement.pdf"),
        schema_version: "1.1".to_string(),
        last_updated: date(2025, 4, 15),
    };

    let mapping = FieldMapping::new()
        .with_pages(vec![PageBox::US_LETTER, PageBox::US_LETTER])
        .overlay(
            "disclosing_party",
            OverlayTarget::at(0, 180.0, 650.0, 11.0, 360.0),
        )
        .overlay(
            "receiving_party",
            OverlayTarget::at(0, 180.0, 628.0, 11.0, 360.0),
        )
        .overlay(
            "effective_date",
            OverlayTarget::at(0, 180.0, 606.0, 11.0, 200.0),
        )
        .overlay("term_months", OverlayTarget::at(0, 180.0, 584.0, 11.0, 80.0))
        .overlay(
            "governing_state",
            OverlayTarget::at(0, 180.0, 562.0, 11.0, 200.0),
        )
        .overlay("mutual", OverlayTarget::at(0, 180.0, 540.0, 11.0, 120.0))
        .overlay(
            "confidential_purpose",
            OverlayTarget::at(1, 72.0, 700.0, 10.0, 468.0),
        );

    builder
        .definition(definition)
        .question_set(set)
        .schema(schema)
        .generic_mapping(NON_DISCLOSURE_AGREEMENT, mapping)
}
