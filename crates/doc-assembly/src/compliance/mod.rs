//! Static per-jurisdiction compliance rules for the bundled documents.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::documents::catalog::{NON_DISCLOSURE_AGREEMENT, VEHICLE_BILL_OF_SALE};
use crate::jurisdiction::JurisdictionCode;

/// Logical keys every vehicle bill of sale must be able to place on the page.
const VEHICLE_REQUIRED_FIELDS: &[&str] = &[
    "buyer_name",
    "sale_date",
    "seller_name",
    "vehicle_vin",
];

const NDA_REQUIRED_FIELDS: &[&str] = &["disclosing_party", "effective_date", "receiving_party"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceRule {
    pub requires_notary: bool,
    /// The motor vehicle agency keeps the bill of sale with the title record.
    pub can_record: bool,
    pub official_form_id: Option<&'static str>,
    /// Odometer disclosure has to appear on the bill of sale itself.
    pub odometer_disclosure: bool,
    pub notes: &'static str,
}

impl ComplianceRule {
    pub const PERMISSIVE: ComplianceRule = ComplianceRule {
        requires_notary: false,
        can_record: false,
        official_form_id: None,
        odometer_disclosure: false,
        notes: "",
    };

    /// Logical keys the jurisdiction requires for `document_type`, sorted.
    pub fn required_fields(&self, document_type: &str) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = match document_type {
            VEHICLE_BILL_OF_SALE => VEHICLE_REQUIRED_FIELDS.to_vec(),
            NON_DISCLOSURE_AGREEMENT => NDA_REQUIRED_FIELDS.to_vec(),
            _ => Vec::new(),
        };
        if document_type == VEHICLE_BILL_OF_SALE && self.odometer_disclosure {
            fields.push("odometer_reading");
        }
        fields.sort_unstable();
        fields
    }

    pub fn requires(&self, document_type: &str, key: &str) -> bool {
        self.required_fields(document_type).contains(&key)
    }
}

/// (code, notary, bill of sale filed with the title record, official form,
/// odometer on bill of sale, notes)
type RuleRow = (
    &'static str,
    bool,
    bool,
    Option<&'static str>,
    bool,
    &'static str,
);

const RULES: &[RuleRow] = &[
    ("AL", true, true, Some("MVT 32-13B"), true, "Requires notarization for all vehicle sales. Official form must be used."),
    ("AK", false, false, None, false, "Bill of sale is optional but recommended for registration."),
    ("AZ", true, true, None, true, "Notarization required. Must include odometer disclosure."),
    ("AR", true, true, None, true, "Notarization required for vehicles over 10 years old."),
    ("CA", false, true, None, true, "Bill of sale required for registration. No notarization needed."),
    ("CO", true, true, Some("DR 2116"), true, "Must use official Colorado form. Notarization required."),
    ("CT", false, true, None, true, "Bill of sale required for registration."),
    ("DE", false, false, None, false, "Bill of sale is optional."),
    ("DC", false, false, None, false, "Bill of sale is optional."),
    ("FL", true, true, Some("HSMV 82050"), true, "Must use official HSMV 82050 form with notarization."),
    ("GA", true, true, Some("T-7"), true, "Must use official T-7 form. Notarization required."),
    ("HI", false, true, None, true, "Bill of sale required for registration."),
    ("ID", true, true, Some("ITD 3738"), true, "Must use official ITD 3738 form with notarization."),
    ("IL", false, true, None, true, "Bill of sale required for registration."),
    ("IN", true, true, None, true, "Notarization required for vehicles over certain value."),
    ("IA", false, false, None, false, "Bill of sale is optional."),
    ("KS", true, true, Some("TR-312"), true, "Must use official TR-312 form. Notarization required."),
    ("KY", true, true, None, true, "Notarization required for all vehicle sales."),
    ("LA", true, true, None, true, "Notarization required. Must include odometer disclosure."),
    ("ME", false, true, None, true, "Bill of sale required for registration."),
    ("MD", true, true, Some("VR-181"), true, "Must use official VR-181 form with notarization."),
    ("MA", false, true, None, true, "Bill of sale required for registration."),
    ("MI", false, true, None, true, "Bill of sale required for registration."),
    ("MN", false, true, None, true, "Bill of sale required for registration."),
    ("MS", true, true, None, true, "Notarization required for all vehicle sales."),
    ("MO", true, true, None, true, "Notarization required. Must include odometer disclosure."),
    ("MT", true, true, Some("MV-24"), true, "Must use official MV-24 form. Notarization required."),
    ("NE", true, true, None, true, "Notarization required for all vehicle sales."),
    ("NV", true, true, None, true, "Notarization required. Must include odometer disclosure."),
    ("NH", false, true, None, true, "Bill of sale required for registration."),
    ("NJ", false, true, None, true, "Bill of sale required for registration."),
    ("NM", true, true, None, true, "Notarization required for vehicles over certain value."),
    ("NY", false, true, None, true, "Bill of sale required for registration."),
    ("NC", true, true, None, true, "Notarization required for all vehicle sales."),
    ("ND", true, true, Some("SFN-2888"), true, "Must use official SFN-2888 form. Notarization required."),
    ("OH", true, true, None, true, "Notarization required for all vehicle sales."),
    ("OK", true, true, None, true, "Notarization required. Must include odometer disclosure."),
    ("OR", false, true, None, true, "Bill of sale required for registration."),
    ("PA", true, true, None, true, "Notarization required for vehicles over certain value."),
    ("RI", false, true, None, true, "Bill of sale required for registration."),
    ("SC", true, true, None, true, "Notarization required for all vehicle sales."),
    ("SD", false, true, Some("Online Form"), true, "Uses online form system. Bill of sale required for registration."),
    ("TN", true, true, None, true, "Notarization required for all vehicle sales."),
    ("TX", false, true, None, true, "Bill of sale required for registration. No notarization needed."),
    ("UT", true, true, None, true, "Notarization required for vehicles over certain value."),
    ("VT", false, true, None, true, "Bill of sale required for registration."),
    ("VA", true, true, None, true, "Notarization required for all vehicle sales."),
    ("WA", false, true, None, true, "Bill of sale required for registration."),
    ("WV", true, true, Some("DMV-7-TR"), true, "Must use official DMV-7-TR form. Notarization required."),
    ("WI", false, true, None, true, "Bill of sale required for registration."),
    ("WY", true, true, None, true, "Notarization required for vehicles over certain value."),
];

/// Read-only rule table covering the 50 states and DC.
#[derive(Debug)]
pub struct ComplianceTable {
    rules: HashMap<JurisdictionCode, ComplianceRule>,
}

impl ComplianceTable {
    pub fn shared() -> &'static ComplianceTable {
        static TABLE: OnceLock<ComplianceTable> = OnceLock::new();
        TABLE.get_or_init(ComplianceTable::from_rows)
    }

    fn from_rows() -> Self {
        let rules = RULES
            .iter()
            .filter_map(|(code, notary, recorded, form, odometer, notes)| {
                let code = JurisdictionCode::parse(code).ok()?;
                let rule = ComplianceRule {
                    requires_notary: *notary,
                    can_record: *recorded,
                    official_form_id: *form,
                    odometer_disclosure: *odometer,
                    notes: *notes,
                };
                Some((code, rule))
            })
            .collect();
        Self { rules }
    }

    /// Unknown and generic jurisdictions get [`ComplianceRule::PERMISSIVE`].
    pub fn lookup(&self, jurisdiction: &JurisdictionCode) -> &ComplianceRule {
        self.rules
            .get(jurisdiction)
            .unwrap_or(&ComplianceRule::PERMISSIVE)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
