use super::JurisdictionCode;
use crate::documents::{DocumentDefinition, DocumentRegistry, QuestionSet, Schema, TemplateRef};
use crate::mapping::MappingStrategy;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("document type '{0}' is not registered")]
    DocumentNotFound(String),
    #[error("document type '{document_type}' is not offered in {jurisdiction}")]
    UnsupportedJurisdiction {
        document_type: String,
        jurisdiction: JurisdictionCode,
    },
    #[error("registry entry for '{0}' is incomplete")]
    IncompleteEntry(String),
}

/// Question set, schema and rendering strategy for one (document, jurisdiction) pair.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub definition: &'a DocumentDefinition,
    pub jurisdiction: JurisdictionCode,
    pub question_set: &'a QuestionSet,
    pub schema: &'a Schema,
    pub strategy: MappingStrategy,
    pub template: TemplateRef,
    pub official_form_id: Option<String>,
}

pub struct QuestionResolver<'a> {
    registry: &'a DocumentRegistry,
}

impl<'a> QuestionResolver<'a> {
    pub fn new(registry: &'a DocumentRegistry) -> Self {
        Self { registry }
    }

    /// An override replaces the base question set wholesale and switches to AcroForm filling.
    pub fn resolve(
        &self,
        document_type: &str,
        jurisdiction: &JurisdictionCode,
    ) -> Result<Resolution<'a>, ResolveError> {
        let definition = self
            .registry
            .get(document_type)
            .ok_or_else(|| ResolveError::DocumentNotFound(document_type.to_string()))?;

        if !definition.scope.includes(jurisdiction) {
            return Err(ResolveError::UnsupportedJurisdiction {
                document_type: document_type.to_string(),
                jurisdiction: jurisdiction.clone(),
            });
        }

        let (set_id, schema_id, strategy, template, official_form_id) =
            match self.registry.override_for(document_type, jurisdiction) {
                Some(entry) => (
                    entry.question_set.as_str(),
                    entry.schema.as_str(),
                    MappingStrategy::AcroForm,
                    entry.template.clone(),
                    Some(entry.official_form_id.clone()),
                ),
                None => (
                    definition.question_set.as_str(),
                    definition.schema.as_str(),
                    MappingStrategy::Overlay,
                    definition.template.clone(),
                    None,
                ),
            };

        let question_set = self
            .registry
            .question_set(set_id)
            .ok_or_else(|| ResolveError::IncompleteEntry(document_type.to_string()))?;
        let schema = self
            .registry
            .schema(schema_id)
            .ok_or_else(|| ResolveError::IncompleteEntry(document_type.to_string()))?;

        Ok(Resolution {
            definition,
            jurisdiction: jurisdiction.clone(),
            question_set,
            schema,
            strategy,
            template,
            official_form_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::catalog::VEHICLE_BILL_OF_SALE;
    use crate::documents::{JurisdictionScope, RegistryBuilder};

    fn code(raw: &str) -> JurisdictionCode {
        JurisdictionCode::parse(raw).expect("code parses")
    }

    #[test]
    fn override_switches_to_acroform() {
        let registry = RegistryBuilder::bundled().build().expect("registry builds");
        let resolver = QuestionResolver::new(&registry);

        let resolution = resolver
            .resolve(VEHICLE_BILL_OF_SALE, &code("FL"))
            .expect("florida resolves");
        assert_eq!(resolution.strategy, MappingStrategy::AcroForm);
        assert_eq!(resolution.official_form_id.as_deref(), Some("HSMV 82050"));
        assert_eq!(resolution.template.jurisdiction, code("FL"));
        assert!(resolution.question_set.get("vehicle_body_type").is_some());
    }

    #[test]
    fn missing_override_falls_back_to_overlay() {
        let registry = RegistryBuilder::bundled().build().expect("registry builds");
        let resolver = QuestionResolver::new(&registry);

        let resolution = resolver
            .resolve(VEHICLE_BILL_OF_SALE, &code("AK"))
            .expect("alaska resolves");
        assert_eq!(resolution.strategy, MappingStrategy::Overlay);
        assert!(resolution.official_form_id.is_none());
        assert!(resolution.template.jurisdiction.is_generic());
        assert_eq!(
            resolution.question_set.id,
            resolution.definition.question_set
        );
    }

    #[test]
    fn reports_unknown_documents_and_scopes() {
        let registry = RegistryBuilder::bundled().build().expect("registry builds");
        let resolver = QuestionResolver::new(&registry);

        let err = resolver
            .resolve("lease-agreement", &code("TX"))
            .expect_err("unknown document");
        assert_eq!(
            err,
            ResolveError::DocumentNotFound("lease-agreement".to_string())
        );

        let mut builder = RegistryBuilder::new();
        builder
            .add_config_json(
                br#"{
                    "id": "texas-only",
                    "displayName": "Texas Only",
                    "category": "personal",
                    "jurisdictions": ["TX"],
                    "questions": [{ "id": "name", "type": "text", "label": "Name" }],
                    "template": "texas-only.pdf",
                    "schemaVersion": "1.0",
                    "lastUpdated": "2025-01-01"
                }"#,
            )
            .expect("config ingests");
        let scoped = builder.build().expect("registry builds");
        let definition = scoped.get("texas-only").expect("definition present");
        assert!(matches!(definition.scope, JurisdictionScope::Only(_)));

        let resolver = QuestionResolver::new(&scoped);
        assert!(resolver.resolve("texas-only", &code("TX")).is_ok());
        let err = resolver
            .resolve("texas-only", &code("NM"))
            .expect_err("out of scope");
        assert!(matches!(err, ResolveError::UnsupportedJurisdiction { .. }));
        let err = resolver
            .resolve("texas-only", &JurisdictionCode::generic())
            .expect_err("generic outside explicit scope");
        assert!(matches!(err, ResolveError::UnsupportedJurisdiction { .. }));
    }
}
