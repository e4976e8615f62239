use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use super::catalog;
use super::domain::{
    DocumentCategory, DocumentDefinition, JurisdictionOverride, JurisdictionScope, Question,
    QuestionSet, TemplateRef,
};
use super::schema::Schema;
use crate::jurisdiction::JurisdictionCode;
use crate::mapping::{FieldCatalog, FieldMapping};

/// Fatal registry construction failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("document '{0}' is registered more than once")]
    DuplicateDocument(String),
    #[error("question set '{0}' is registered more than once")]
    DuplicateQuestionSet(String),
    #[error("schema '{0}' is registered more than once")]
    DuplicateSchema(String),
    #[error("document '{0}' has more than one generic mapping")]
    DuplicateGenericMapping(String),
    #[error("document '{document_type}' has more than one override for {jurisdiction}")]
    DuplicateOverride {
        document_type: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("question set '{question_set}' repeats question id '{question}'")]
    DuplicateQuestion {
        question_set: String,
        question: String,
    },
    #[error(
        "question set '{question_set}' and schema '{schema}' disagree (missing from schema: {missing:?}, orphaned in schema: {orphaned:?})"
    )]
    SchemaMismatch {
        question_set: String,
        schema: String,
        missing: Vec<String>,
        orphaned: Vec<String>,
    },
    #[error("'{owner}' references unknown schema '{schema}'")]
    UnknownSchema { owner: String, schema: String },
    #[error("'{owner}' references unknown question set '{question_set}'")]
    UnknownQuestionSet { owner: String, question_set: String },
    #[error("override for {jurisdiction} targets unknown document '{document_type}'")]
    UnknownDocument {
        document_type: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("override for {jurisdiction} lies outside the scope of '{document_type}'")]
    OverrideOutOfScope {
        document_type: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("schema '{schema}' field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern {
        schema: String,
        field: String,
        reason: String,
    },
    #[error("invalid document entry: {0}")]
    InvalidEntry(String),
}

/// Immutable catalog of documents, question sets, schemas and overrides.
#[derive(Debug)]
pub struct DocumentRegistry {
    definitions: Vec<DocumentDefinition>,
    question_sets: Vec<QuestionSet>,
    schemas: Vec<Schema>,
    overrides: Vec<JurisdictionOverride>,
    definition_index: HashMap<String, usize>,
    question_set_index: HashMap<String, usize>,
    schema_index: HashMap<String, usize>,
    override_index: HashMap<(String, JurisdictionCode), usize>,
    generic_mappings: HashMap<String, FieldMapping>,
}

impl DocumentRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The compiled catalog, built once per process.
    pub fn shared_bundled() -> Result<&'static DocumentRegistry, RegistryError> {
        static BUNDLED: OnceLock<Result<DocumentRegistry, RegistryError>> = OnceLock::new();
        BUNDLED
            .get_or_init(|| RegistryBuilder::bundled().build())
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn get(&self, document_type: &str) -> Option<&DocumentDefinition> {
        self.definition_index
            .get(document_type)
            .map(|index| &self.definitions[*index])
    }

    pub fn definitions(&self) -> impl Iterator<Item = &DocumentDefinition> {
        self.definitions.iter()
    }

    pub fn question_set(&self, id: &str) -> Option<&QuestionSet> {
        self.question_set_index
            .get(id)
            .map(|index| &self.question_sets[*index])
    }

    pub fn question_sets(&self) -> impl Iterator<Item = &QuestionSet> {
        self.question_sets.iter()
    }

    pub fn schema(&self, id: &str) -> Option<&Schema> {
        self.schema_index.get(id).map(|index| &self.schemas[*index])
    }

    pub fn override_for(
        &self,
        document_type: &str,
        jurisdiction: &JurisdictionCode,
    ) -> Option<&JurisdictionOverride> {
        self.override_index
            .get(&(document_type.to_string(), jurisdiction.clone()))
            .map(|index| &self.overrides[*index])
    }

    pub fn overrides_for<'a>(
        &'a self,
        document_type: &'a str,
    ) -> impl Iterator<Item = &'a JurisdictionOverride> + 'a {
        self.overrides
            .iter()
            .filter(move |entry| entry.document_type == document_type)
    }

    /// Compiled mapping for the template stored under `asset_jurisdiction`.
    pub fn bundled_mapping(
        &self,
        document_type: &str,
        asset_jurisdiction: &JurisdictionCode,
    ) -> Option<&FieldMapping> {
        if asset_jurisdiction.is_generic() {
            self.generic_mappings.get(document_type)
        } else {
            self.override_for(document_type, asset_jurisdiction)
                .map(|entry| &entry.mapping)
        }
    }

    pub fn bundled_field_catalog(
        &self,
        document_type: &str,
        jurisdiction: &JurisdictionCode,
    ) -> Option<&FieldCatalog> {
        self.override_for(document_type, jurisdiction)
            .and_then(|entry| entry.field_catalog.as_ref())
    }
}

/// Collects registry entries and validates them into a [`DocumentRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: Vec<DocumentDefinition>,
    question_sets: Vec<QuestionSet>,
    schemas: Vec<Schema>,
    overrides: Vec<JurisdictionOverride>,
    generic_mappings: Vec<(String, FieldMapping)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with the compiled document catalog.
    pub fn bundled() -> Self {
        catalog::register(Self::new())
    }

    pub fn definition(mut self, definition: DocumentDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn question_set(mut self, question_set: QuestionSet) -> Self {
        self.question_sets.push(question_set);
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn jurisdiction_override(mut self, entry: JurisdictionOverride) -> Self {
        self.overrides.push(entry);
        self
    }

    pub fn generic_mapping(mut self, document_type: &str, mapping: FieldMapping) -> Self {
        self.generic_mappings
            .push((document_type.to_string(), mapping));
        self
    }

    /// Ingests a `config.json` registry entry together with its question set and schema.
    pub fn add_config_json(&mut self, bytes: &[u8]) -> Result<(), RegistryError> {
        let config: DocumentConfig = serde_json::from_slice(bytes)
            .map_err(|err| RegistryError::InvalidEntry(err.to_string()))?;

        let question_set = QuestionSet {
            id: format!("{}.base", config.id),
            questions: config.questions,
        };
        let schema = Schema::from_question_set(format!("{}.schema", config.id), &question_set);

        self.definitions.push(DocumentDefinition {
            id: config.id.clone(),
            display_name: config.display_name,
            category: config.category,
            scope: config.jurisdictions,
            base_price_cents: config.base_price_cents,
            requires_notarization: config.requires_notarization,
            can_be_recorded: config.can_be_recorded,
            languages: config.languages,
            schema: schema.id.clone(),
            question_set: question_set.id.clone(),
            template: TemplateRef::generic(config.template),
            schema_version: config.schema_version,
            last_updated: config.last_updated,
        });
        if let Some(mapping) = config.overlay {
            self.generic_mappings.push((config.id, mapping));
        }
        self.question_sets.push(question_set);
        self.schemas.push(schema);
        Ok(())
    }

    pub fn build(self) -> Result<DocumentRegistry, RegistryError> {
        let mut definition_index = HashMap::new();
        for (index, definition) in self.definitions.iter().enumerate() {
            validate_identifiers(definition)?;
            if definition_index
                .insert(definition.id.clone(), index)
                .is_some()
            {
                return Err(RegistryError::DuplicateDocument(definition.id.clone()));
            }
        }

        let mut question_set_index = HashMap::new();
        for (index, set) in self.question_sets.iter().enumerate() {
            if question_set_index.insert(set.id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateQuestionSet(set.id.clone()));
            }
            let mut seen = BTreeSet::new();
            for question in &set.questions {
                if !seen.insert(question.id.as_str()) {
                    return Err(RegistryError::DuplicateQuestion {
                        question_set: set.id.clone(),
                        question: question.id.clone(),
                    });
                }
            }
        }

        let mut schema_index = HashMap::new();
        for (index, schema) in self.schemas.iter().enumerate() {
            if schema_index.insert(schema.id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateSchema(schema.id.clone()));
            }
            for (field, rule) in &schema.fields {
                if let Some(pattern) = &rule.pattern {
                    Regex::new(pattern).map_err(|err| RegistryError::InvalidPattern {
                        schema: schema.id.clone(),
                        field: field.clone(),
                        reason: err.to_string(),
                    })?;
                }
            }
        }

        let pair_check = |owner: &str, set_id: &str, schema_id: &str| {
            let set = question_set_index
                .get(set_id)
                .map(|index| &self.question_sets[*index])
                .ok_or_else(|| RegistryError::UnknownQuestionSet {
                    owner: owner.to_string(),
                    question_set: set_id.to_string(),
                })?;
            let schema = schema_index
                .get(schema_id)
                .map(|index| &self.schemas[*index])
                .ok_or_else(|| RegistryError::UnknownSchema {
                    owner: owner.to_string(),
                    schema: schema_id.to_string(),
                })?;
            ensure_keys_agree(set, schema)
        };

        for definition in &self.definitions {
            pair_check(&definition.id, &definition.question_set, &definition.schema)?;
        }

        let mut override_index = HashMap::new();
        for (index, entry) in self.overrides.iter().enumerate() {
            let owner = format!("{}/{}", entry.document_type, entry.jurisdiction);
            let definition = definition_index
                .get(&entry.document_type)
                .map(|index| &self.definitions[*index])
                .ok_or_else(|| RegistryError::UnknownDocument {
                    document_type: entry.document_type.clone(),
                    jurisdiction: entry.jurisdiction.clone(),
                })?;
            if entry.jurisdiction.is_generic() || !definition.scope.includes(&entry.jurisdiction) {
                return Err(RegistryError::OverrideOutOfScope {
                    document_type: entry.document_type.clone(),
                    jurisdiction: entry.jurisdiction.clone(),
                });
            }
            pair_check(&owner, &entry.question_set, &entry.schema)?;

            let key = (entry.document_type.clone(), entry.jurisdiction.clone());
            if override_index.insert(key, index).is_some() {
                return Err(RegistryError::DuplicateOverride {
                    document_type: entry.document_type.clone(),
                    jurisdiction: entry.jurisdiction.clone(),
                });
            }
        }

        let mut generic_mappings = HashMap::new();
        for (document_type, mapping) in self.generic_mappings {
            if !definition_index.contains_key(&document_type) {
                return Err(RegistryError::InvalidEntry(format!(
                    "generic mapping registered for unknown document '{document_type}'"
                )));
            }
            if generic_mappings.contains_key(&document_type) {
                return Err(RegistryError::DuplicateGenericMapping(document_type));
            }
            generic_mappings.insert(document_type, mapping);
        }

        Ok(DocumentRegistry {
            definitions: self.definitions,
            question_sets: self.question_sets,
            schemas: self.schemas,
            overrides: self.overrides,
            definition_index,
            question_set_index,
            schema_index,
            override_index,
            generic_mappings,
        })
    }
}

fn ensure_keys_agree(set: &QuestionSet, schema: &Schema) -> Result<(), RegistryError> {
    let question_ids = set.ids();
    let schema_keys = schema.keys();
    if question_ids == schema_keys {
        return Ok(());
    }

    Err(RegistryError::SchemaMismatch {
        question_set: set.id.clone(),
        schema: schema.id.clone(),
        missing: question_ids
            .difference(&schema_keys)
            .map(|key| key.to_string())
            .collect(),
        orphaned: schema_keys
            .difference(&question_ids)
            .map(|key| key.to_string())
            .collect(),
    })
}

fn is_document_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_schema_version(value: &str) -> bool {
    match value.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn validate_identifiers(definition: &DocumentDefinition) -> Result<(), RegistryError> {
    if !is_document_id(&definition.id) {
        return Err(RegistryError::InvalidEntry(format!(
            "document id '{}' must be lowercase alphanumerics and dashes",
            definition.id
        )));
    }
    if !is_schema_version(&definition.schema_version) {
        return Err(RegistryError::InvalidEntry(format!(
            "document '{}' schema version '{}' must be major.minor",
            definition.id, definition.schema_version
        )));
    }
    Ok(())
}

/// On-disk `config.json` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConfig {
    pub id: String,
    pub display_name: String,
    pub category: DocumentCategory,
    pub jurisdictions: JurisdictionScope,
    #[serde(default)]
    pub base_price_cents: u32,
    #[serde(default)]
    pub requires_notarization: bool,
    #[serde(default)]
    pub can_be_recorded: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    pub questions: Vec<Question>,
    pub template: String,
    pub schema_version: String,
    pub last_updated: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<FieldMapping>,
}

impl DocumentRegistry {
    /// Rebuilds the `config.json` entry for a compiled document.
    pub fn bundled_config(&self, document_type: &str) -> Option<DocumentConfig> {
        let definition = self.get(document_type)?;
        let questions = self.question_set(&definition.question_set)?;
        Some(DocumentConfig {
            id: definition.id.clone(),
            display_name: definition.display_name.clone(),
            category: definition.category,
            jurisdictions: definition.scope.clone(),
            base_price_cents: definition.base_price_cents,
            requires_notarization: definition.requires_notarization,
            can_be_recorded: definition.can_be_recorded,
            languages: definition.languages.clone(),
            questions: questions.questions.clone(),
            template: definition.template.file_name.clone(),
            schema_version: definition.schema_version.clone(),
            last_updated: definition.last_updated,
            overlay: self.generic_mappings.get(document_type).cloned(),
        })
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}
