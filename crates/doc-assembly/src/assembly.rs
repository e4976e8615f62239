//! End-to-end pipeline: resolve, validate, map, fetch assets, render.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::assets::{AssetChain, AssetStore, ConfigResolutionError};
use crate::compliance::{ComplianceRule, ComplianceTable};
use crate::config::AppConfig;
use crate::documents::{
    DocumentCategory, DocumentDefinition, DocumentRegistry, QuestionSet, RegistryBuilder,
    RegistryError,
};
use crate::jurisdiction::{
    InvalidJurisdiction, JurisdictionCode, QuestionResolver, Resolution, ResolveError,
};
use crate::mapping::{FieldMappingResolver, MappingError, MappingStrategy};
use crate::render::{PdfRenderer, RenderError};
use crate::validation::{self, RawAnswers, ValidationError};

/// One document to assemble.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FillRequest {
    pub document_type: String,
    pub jurisdiction: String,
    #[serde(default)]
    pub answers: RawAnswers,
}

impl FillRequest {
    pub fn new(document_type: &str, jurisdiction: &str, answers: RawAnswers) -> Self {
        Self {
            document_type: document_type.to_string(),
            jurisdiction: jurisdiction.to_string(),
            answers,
        }
    }
}

/// Notary and recording prompts shown alongside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceNotice {
    pub requires_notary: bool,
    pub can_record: bool,
    /// Form the output was filled on. Only set for AcroForm renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_form_id: Option<String>,
    /// State form the agency prefers when the output is a generic overlay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ComplianceNotice {
    fn new(
        definition: &DocumentDefinition,
        rule: &ComplianceRule,
        official_form_id: Option<&str>,
    ) -> Self {
        Self {
            requires_notary: definition.requires_notarization || rule.requires_notary,
            can_record: definition.can_be_recorded || rule.can_record,
            official_form_id: official_form_id.map(str::to_string),
            recommended_form: rule
                .official_form_id
                .filter(|_| official_form_id.is_none())
                .map(str::to_string),
            notes: (!rule.notes.is_empty()).then(|| rule.notes.to_string()),
        }
    }
}

/// What a client needs to prompt for one (document, jurisdiction) pair.
#[derive(Debug, Clone, Serialize)]
pub struct Questionnaire {
    pub document_type: String,
    pub display_name: String,
    pub jurisdiction: JurisdictionCode,
    pub strategy: MappingStrategy,
    pub questions: QuestionSet,
    pub compliance: ComplianceNotice,
}

#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub strategy: MappingStrategy,
    pub official_form_id: Option<String>,
    /// Dropped answers plus asset sources that failed before one answered.
    pub warnings: Vec<String>,
    pub compliance: ComplianceNotice,
}

/// Client-facing error entry: `{kind, field?, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ErrorPayload {
    fn new(kind: &'static str, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    InvalidJurisdiction(#[from] InvalidJurisdiction),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("{} answer(s) failed validation", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("{} answer(s) could not be mapped onto the template", .0.len())]
    Mapping(Vec<MappingError>),
    #[error(transparent)]
    Config(#[from] ConfigResolutionError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AssemblyError {
    pub fn kind(&self) -> &'static str {
        match self {
            AssemblyError::InvalidJurisdiction(_) => "invalid_jurisdiction",
            AssemblyError::Resolve(ResolveError::DocumentNotFound(_)) => "document_not_found",
            AssemblyError::Resolve(ResolveError::UnsupportedJurisdiction { .. }) => {
                "unsupported_jurisdiction"
            }
            AssemblyError::Resolve(ResolveError::IncompleteEntry(_)) => "config_resolution",
            AssemblyError::Validation(_) => "validation",
            AssemblyError::Mapping(errors) => errors
                .first()
                .map(MappingError::kind)
                .unwrap_or("missing_field_mapping"),
            AssemblyError::Config(_) => "config_resolution",
            AssemblyError::Render(err) => err.kind(),
        }
    }

    /// Whether the request itself is at fault, as opposed to catalog or template defects.
    pub fn is_client_error(&self) -> bool {
        match self {
            AssemblyError::InvalidJurisdiction(_) | AssemblyError::Validation(_) => true,
            AssemblyError::Resolve(err) => !matches!(err, ResolveError::IncompleteEntry(_)),
            AssemblyError::Mapping(errors) => errors
                .iter()
                .all(|err| matches!(err, MappingError::IncompatibleValue { .. })),
            AssemblyError::Config(_) | AssemblyError::Render(_) => false,
        }
    }

    /// Every underlying failure flattened into client payloads.
    pub fn payloads(&self) -> Vec<ErrorPayload> {
        match self {
            AssemblyError::Validation(errors) => errors
                .iter()
                .map(|err| ErrorPayload::new("validation", Some(&err.field), err.message.clone()))
                .collect(),
            AssemblyError::Mapping(errors) => errors
                .iter()
                .map(|err| ErrorPayload::new(err.kind(), Some(err.key()), err.to_string()))
                .collect(),
            other => vec![ErrorPayload::new(other.kind(), None, other.to_string())],
        }
    }
}

/// Owns the immutable registry plus the lazily filled asset caches.
pub struct DocumentAssembler {
    registry: Arc<DocumentRegistry>,
    compliance: &'static ComplianceTable,
    assets: AssetStore,
    renderer: PdfRenderer,
}

impl DocumentAssembler {
    pub fn new(registry: Arc<DocumentRegistry>, assets: AssetStore, renderer: PdfRenderer) -> Self {
        Self {
            registry,
            compliance: ComplianceTable::shared(),
            assets,
            renderer,
        }
    }

    /// Compiled catalog with the asset chain and limits `config` selects.
    pub fn from_config(config: &AppConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(RegistryBuilder::bundled().build()?);
        let chain = AssetChain::from_config(&config.assets, Arc::clone(&registry));
        info!(
            environment = config.environment.as_str(),
            sources = ?chain.source_names(),
            "asset chain ready"
        );
        Ok(Self::new(
            registry,
            AssetStore::new(chain),
            PdfRenderer::new(config.render),
        ))
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn questions(
        &self,
        document_type: &str,
        jurisdiction: &str,
    ) -> Result<Questionnaire, AssemblyError> {
        let jurisdiction = JurisdictionCode::parse(jurisdiction)?;
        let resolution =
            QuestionResolver::new(&self.registry).resolve(document_type, &jurisdiction)?;
        Ok(Questionnaire {
            document_type: resolution.definition.id.clone(),
            display_name: resolution.definition.display_name.clone(),
            compliance: self.notice(&resolution),
            jurisdiction,
            strategy: resolution.strategy,
            questions: resolution.question_set.clone(),
        })
    }

    pub fn assemble(&self, request: &FillRequest) -> Result<AssembledDocument, AssemblyError> {
        let jurisdiction = JurisdictionCode::parse(&request.jurisdiction)?;
        let resolution =
            QuestionResolver::new(&self.registry).resolve(&request.document_type, &jurisdiction)?;
        let validated = validation::validate(resolution.schema, &request.answers)
            .map_err(AssemblyError::Validation)?;

        let mapping = self
            .assets
            .mapping(&request.document_type, &resolution.template.jurisdiction)?;
        let plan = FieldMappingResolver::new(self.compliance)
            .resolve_mapping(&resolution, &mapping.value, &validated)
            .map_err(AssemblyError::Mapping)?;
        debug!(
            document_type = %request.document_type,
            mapping_source = mapping.source,
            "mapping resolved"
        );

        let template = self
            .assets
            .template(&request.document_type, &resolution.template)?;
        let bytes = self.renderer.render(&template.value, &plan)?;

        let mut warnings = mapping.warnings;
        warnings.extend(template.warnings);
        warnings.extend(plan.warnings.iter().map(|warning| warning.message.clone()));

        info!(
            document_type = %request.document_type,
            jurisdiction = %jurisdiction,
            strategy = %plan.strategy,
            template_source = template.source,
            bytes = bytes.len(),
            warnings = warnings.len(),
            "document assembled"
        );

        Ok(AssembledDocument {
            bytes,
            strategy: plan.strategy,
            official_form_id: resolution.official_form_id.clone(),
            warnings,
            compliance: self.notice(&resolution),
        })
    }

    /// The rule table covers title transfers; other documents rely on their own flags.
    fn notice(&self, resolution: &Resolution<'_>) -> ComplianceNotice {
        let rule = if resolution.definition.category == DocumentCategory::Vehicle {
            self.compliance.lookup(&resolution.jurisdiction)
        } else {
            &ComplianceRule::PERMISSIVE
        };
        ComplianceNotice::new(
            resolution.definition,
            rule,
            resolution.official_form_id.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StaticFallbackSource;
    use crate::documents::catalog::{NON_DISCLOSURE_AGREEMENT, VEHICLE_BILL_OF_SALE};
    use crate::render::RenderLimits;
    use crate::validation::AnswerValue;

    fn assembler() -> DocumentAssembler {
        let registry = Arc::new(RegistryBuilder::bundled().build().expect("bundled builds"));
        let chain = AssetChain::new(vec![Box::new(StaticFallbackSource::new(Arc::clone(
            &registry,
        )))]);
        DocumentAssembler::new(
            registry,
            AssetStore::new(chain),
            PdfRenderer::new(RenderLimits::default()),
        )
    }

    fn answers(pairs: &[(&str, &str)]) -> RawAnswers {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), AnswerValue::from(*value)))
            .collect()
    }

    #[test]
    fn unparseable_jurisdiction_is_reported() {
        let err = assembler()
            .assemble(&FillRequest::new(VEHICLE_BILL_OF_SALE, "atlantis", RawAnswers::new()))
            .expect_err("atlantis is not a state");
        assert_eq!(err.kind(), "invalid_jurisdiction");
        assert!(err.is_client_error());
        assert_eq!(err.payloads().len(), 1);
    }

    #[test]
    fn unknown_documents_are_not_found() {
        let err = assembler()
            .assemble(&FillRequest::new("lease-agreement", "TX", RawAnswers::new()))
            .expect_err("not registered");
        assert_eq!(err.kind(), "document_not_found");
    }

    #[test]
    fn validation_reports_every_violation_before_touching_assets() {
        let assembler = assembler();
        let err = assembler
            .assemble(&FillRequest::new(
                VEHICLE_BILL_OF_SALE,
                "FL",
                answers(&[("vehicle_year", "nineteen"), ("favorite_color", "red")]),
            ))
            .expect_err("bad answers");
        assert_eq!(err.kind(), "validation");

        let fields: Vec<Option<String>> = err.payloads().into_iter().map(|p| p.field).collect();
        assert_eq!(
            fields,
            vec![
                Some("buyer_name".to_string()),
                Some("favorite_color".to_string()),
                Some("vehicle_year".to_string()),
            ]
        );
        assert_eq!(assembler.assets().cached_entries(), 0);
    }

    #[test]
    fn missing_template_is_a_config_resolution_error() {
        let err = assembler()
            .assemble(&FillRequest::new(
                VEHICLE_BILL_OF_SALE,
                "FL",
                answers(&[("vehicle_year", "2020"), ("buyer_name", "Jane Doe")]),
            ))
            .expect_err("compiled fallback has no PDFs");
        assert_eq!(err.kind(), "config_resolution");
        assert!(!err.is_client_error());
    }

    #[test]
    fn questionnaire_carries_override_and_compliance() {
        let questionnaire = assembler()
            .questions(VEHICLE_BILL_OF_SALE, "florida")
            .expect("florida resolves");
        assert_eq!(questionnaire.strategy, MappingStrategy::AcroForm);
        assert_eq!(questionnaire.jurisdiction.as_str(), "FL");
        assert!(questionnaire.compliance.requires_notary);
        assert_eq!(
            questionnaire.compliance.official_form_id.as_deref(),
            Some("HSMV 82050")
        );
        assert!(questionnaire.compliance.recommended_form.is_none());
        assert!(questionnaire.questions.get("vehicle_body_type").is_some());
    }

    #[test]
    fn non_vehicle_documents_ignore_title_rules() {
        let questionnaire = assembler()
            .questions(NON_DISCLOSURE_AGREEMENT, "FL")
            .expect("nda is offered everywhere");
        assert_eq!(questionnaire.strategy, MappingStrategy::Overlay);
        assert!(!questionnaire.compliance.requires_notary);
        assert!(questionnaire.compliance.official_form_id.is_none());
        assert!(questionnaire.compliance.recommended_form.is_none());
    }

    #[test]
    fn overlay_states_recommend_their_form_without_claiming_it() {
        let questionnaire = assembler()
            .questions(VEHICLE_BILL_OF_SALE, "ND")
            .expect("north dakota resolves");
        assert_eq!(questionnaire.strategy, MappingStrategy::Overlay);
        assert!(questionnaire.compliance.requires_notary);
        assert!(questionnaire.compliance.official_form_id.is_none());
        assert_eq!(
            questionnaire.compliance.recommended_form.as_deref(),
            Some("SFN-2888")
        );
    }

    #[test]
    fn mapping_payloads_name_their_keys() {
        let err = AssemblyError::Mapping(vec![MappingError::MissingFieldMapping {
            key: "odometer_reading".to_string(),
            jurisdiction: JurisdictionCode::parse("FL").expect("fl parses"),
        }]);
        assert_eq!(err.kind(), "missing_field_mapping");
        assert!(!err.is_client_error());
        let payloads = err.payloads();
        assert_eq!(payloads[0].field.as_deref(), Some("odometer_reading"));
    }
}
