//! Environment-aware asset resolution: CDN, then the local bundle, then the
//! compiled catalog. The first source that yields a usable asset wins.

mod cache;
mod sources;

pub use cache::AssetStore;
pub use sources::{
    AssetSource, CdnSource, HttpResponse, HttpTransport, LocalSource, ReqwestTransport,
    RetryPolicy, SourceError, StaticFallbackSource,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AssetConfig;
use crate::documents::{DocumentRegistry, TemplateRef};
use crate::jurisdiction::JurisdictionCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Template,
    Config,
    Overlay,
    Fields,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Template => "template",
            AssetKind::Config => "config",
            AssetKind::Overlay => "overlay",
            AssetKind::Fields => "fields",
        }
    }

    pub fn is_json(self) -> bool {
        !matches!(self, AssetKind::Template)
    }

    fn default_file_name(self) -> &'static str {
        match self {
            AssetKind::Template => "template.pdf",
            AssetKind::Config => "config.json",
            AssetKind::Overlay => "overlay.json",
            AssetKind::Fields => "fields.json",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset stored at `{document_type}/{jurisdiction}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub kind: AssetKind,
    pub document_type: String,
    pub jurisdiction: JurisdictionCode,
    pub file_name: String,
}

impl AssetRequest {
    pub fn new(kind: AssetKind, document_type: &str, jurisdiction: JurisdictionCode) -> Self {
        Self {
            kind,
            document_type: document_type.to_string(),
            jurisdiction,
            file_name: kind.default_file_name().to_string(),
        }
    }

    pub fn template(document_type: &str, template: &TemplateRef) -> Self {
        Self::new(AssetKind::Template, document_type, template.jurisdiction.clone())
            .with_file(&template.file_name)
    }

    pub fn with_file(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.document_type,
            self.jurisdiction.path_segment(),
            self.file_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAttempt {
    pub source: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no source could provide the {kind} for '{document_type}' in {jurisdiction} ({} attempt(s))", .attempts.len())]
pub struct ConfigResolutionError {
    pub kind: AssetKind,
    pub document_type: String,
    pub jurisdiction: JurisdictionCode,
    pub attempts: Vec<SourceAttempt>,
}

/// An asset plus the source that produced it and the failures skipped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: &'static str,
    pub warnings: Vec<String>,
}

/// Ordered chain of asset sources for one environment.
pub struct AssetChain {
    sources: Vec<Box<dyn AssetSource>>,
}

impl AssetChain {
    pub fn new(sources: Vec<Box<dyn AssetSource>>) -> Self {
        Self { sources }
    }

    /// Builds the chain the environment's [`AssetConfig`] asks for.
    pub fn from_config(config: &AssetConfig, registry: Arc<DocumentRegistry>) -> Self {
        let mut sources: Vec<Box<dyn AssetSource>> = Vec::new();
        if config.cdn_enabled {
            match config.cdn_base_url.as_deref() {
                Some(base_url) => sources.push(Box::new(CdnSource::new(
                    base_url,
                    ReqwestTransport::default(),
                    config.retry,
                ))),
                None => warn!("CDN assets enabled without DOCS_CDN_BASE_URL; skipping CDN source"),
            }
        }
        if config.local_enabled {
            sources.push(Box::new(LocalSource::new(config.local_root.clone())));
        }
        if config.fallback_enabled {
            sources.push(Box::new(StaticFallbackSource::new(registry)));
        }
        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn resolve_bytes(
        &self,
        request: &AssetRequest,
    ) -> Result<Resolved<Vec<u8>>, ConfigResolutionError> {
        self.resolve_with(request, Ok)
    }

    /// Like [`resolve_bytes`](Self::resolve_bytes); JSON that fails to parse counts as that source failing.
    pub fn resolve_json<T: DeserializeOwned>(
        &self,
        request: &AssetRequest,
    ) -> Result<Resolved<T>, ConfigResolutionError> {
        self.resolve_with(request, |bytes| {
            serde_json::from_slice(&bytes).map_err(|e| SourceError::Invalid(e.to_string()))
        })
    }

    fn resolve_with<T>(
        &self,
        request: &AssetRequest,
        decode: impl Fn(Vec<u8>) -> Result<T, SourceError>,
    ) -> Result<Resolved<T>, ConfigResolutionError> {
        let mut attempts = Vec::new();
        for source in &self.sources {
            if !source.supports(request.kind) {
                continue;
            }
            match source.fetch(request).and_then(&decode) {
                Ok(value) => {
                    debug!(
                        source = source.name(),
                        kind = %request.kind,
                        path = %request.relative_path(),
                        "resolved asset"
                    );
                    let warnings = attempts
                        .iter()
                        .map(|attempt: &SourceAttempt| {
                            format!(
                                "{} {} unavailable from {}: {}",
                                request.kind,
                                request.relative_path(),
                                attempt.source,
                                attempt.error
                            )
                        })
                        .collect();
                    return Ok(Resolved {
                        value,
                        source: source.name(),
                        warnings,
                    });
                }
                Err(err) => {
                    warn!(
                        source = source.name(),
                        kind = %request.kind,
                        path = %request.relative_path(),
                        error = %err,
                        "asset source failed; trying next"
                    );
                    attempts.push(SourceAttempt {
                        source: source.name(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(ConfigResolutionError {
            kind: request.kind,
            document_type: request.document_type.clone(),
            jurisdiction: request.jurisdiction.clone(),
            attempts,
        })
    }
}
