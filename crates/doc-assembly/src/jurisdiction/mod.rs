mod resolver;

pub use resolver::{QuestionResolver, Resolution, ResolveError};

use serde::{Deserialize, Serialize};
use std::fmt;

const GENERIC: &str = "generic";

/// Two-letter postal codes for the 50 states and DC, paired with their slugged names.
const US_JURISDICTIONS: &[(&str, &str)] = &[
    ("AL", "alabama"),
    ("AK", "alaska"),
    ("AZ", "arizona"),
    ("AR", "arkansas"),
    ("CA", "california"),
    ("CO", "colorado"),
    ("CT", "connecticut"),
    ("DE", "delaware"),
    ("DC", "district-of-columbia"),
    ("FL", "florida"),
    ("GA", "georgia"),
    ("HI", "hawaii"),
    ("ID", "idaho"),
    ("IL", "illinois"),
    ("IN", "indiana"),
    ("IA", "iowa"),
    ("KS", "kansas"),
    ("KY", "kentucky"),
    ("LA", "louisiana"),
    ("ME", "maine"),
    ("MD", "maryland"),
    ("MA", "massachusetts"),
    ("MI", "michigan"),
    ("MN", "minnesota"),
    ("MS", "mississippi"),
    ("MO", "missouri"),
    ("MT", "montana"),
    ("NE", "nebraska"),
    ("NV", "nevada"),
    ("NH", "new-hampshire"),
    ("NJ", "new-jersey"),
    ("NM", "new-mexico"),
    ("NY", "new-york"),
    ("NC", "north-carolina"),
    ("ND", "north-dakota"),
    ("OH", "ohio"),
    ("OK", "oklahoma"),
    ("OR", "oregon"),
    ("PA", "pennsylvania"),
    ("RI", "rhode-island"),
    ("SC", "south-carolina"),
    ("SD", "south-dakota"),
    ("TN", "tennessee"),
    ("TX", "texas"),
    ("UT", "utah"),
    ("VT", "vermont"),
    ("VA", "virginia"),
    ("WA", "washington"),
    ("WV", "west-virginia"),
    ("WI", "wisconsin"),
    ("WY", "wyoming"),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized jurisdiction '{0}'")]
pub struct InvalidJurisdiction(pub String);

/// Canonical jurisdiction identifier: an upper-case US postal code or `generic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Accepts `FL`, `fl`, `florida`, `us/florida`, `north dakota` or `generic`.
    pub fn parse(input: &str) -> Result<Self, InvalidJurisdiction> {
        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered == GENERIC {
            return Ok(Self::generic());
        }

        let candidate = lowered.strip_prefix("us/").unwrap_or(&lowered);
        let slug = candidate.replace([' ', '_'], "-");

        US_JURISDICTIONS
            .iter()
            .find(|(code, name)| code.eq_ignore_ascii_case(&slug) || *name == slug)
            .map(|(code, _)| Self((*code).to_string()))
            .ok_or_else(|| InvalidJurisdiction(trimmed.to_string()))
    }

    pub fn generic() -> Self {
        Self(GENERIC.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_generic(&self) -> bool {
        self.0 == GENERIC
    }

    /// Lower-case form used in asset paths (`fl`, `generic`).
    pub fn path_segment(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn state_name(&self) -> Option<&'static str> {
        US_JURISDICTIONS
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }

    pub fn date_format(&self) -> DateFormat {
        if self.is_generic() {
            DateFormat::Iso
        } else {
            DateFormat::UsSlashed
        }
    }

    /// Every known US jurisdiction, in table order.
    pub fn all_us() -> impl Iterator<Item = JurisdictionCode> {
        US_JURISDICTIONS
            .iter()
            .map(|(code, _)| Self((*code).to_string()))
    }
}

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JurisdictionCode {
    type Error = InvalidJurisdiction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JurisdictionCode> for String {
    fn from(value: JurisdictionCode) -> Self {
        value.0
    }
}

/// Textual date layout applied when rendering answers for a jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `MM/DD/YYYY`
    UsSlashed,
    /// `YYYY-MM-DD`
    Iso,
}

impl DateFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::UsSlashed => "%m/%d/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_names_and_prefixed_forms() {
        for input in ["FL", "fl", " Florida ", "us/florida", "US/FL"] {
            let code = JurisdictionCode::parse(input).expect("florida parses");
            assert_eq!(code.as_str(), "FL", "input {input:?}");
        }

        let dakota = JurisdictionCode::parse("north dakota").expect("spaced name parses");
        assert_eq!(dakota.as_str(), "ND");
        assert_eq!(
            JurisdictionCode::parse("district_of_columbia")
                .expect("dc parses")
                .as_str(),
            "DC"
        );
    }

    #[test]
    fn generic_is_recognized_and_uses_iso_dates() {
        let generic = JurisdictionCode::parse("GENERIC").expect("generic parses");
        assert!(generic.is_generic());
        assert_eq!(generic.date_format(), DateFormat::Iso);
        assert_eq!(generic.path_segment(), "generic");
    }

    #[test]
    fn rejects_unknown_inputs() {
        for input in ["", "ZZ", "ontario", "us/", "f"] {
            assert!(JurisdictionCode::parse(input).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn knows_fifty_states_and_dc() {
        assert_eq!(JurisdictionCode::all_us().count(), 51);
        let ak = JurisdictionCode::parse("AK").expect("alaska parses");
        assert_eq!(ak.state_name(), Some("alaska"));
        assert_eq!(ak.date_format(), DateFormat::UsSlashed);
        assert_eq!(ak.path_segment(), "ak");
    }

    #[test]
    fn deserializes_through_parse() {
        let code: JurisdictionCode = serde_json::from_str("\"colorado\"").expect("deserializes");
        assert_eq!(code.as_str(), "CO");
        assert_eq!(serde_json::to_string(&code).expect("serializes"), "\"CO\"");
        assert!(serde_json::from_str::<JurisdictionCode>("\"atlantis\"").is_err());
    }
}
