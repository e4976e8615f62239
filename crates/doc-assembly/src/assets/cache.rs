use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use super::{AssetChain, AssetKind, AssetRequest, ConfigResolutionError, Resolved};
use crate::documents::{DocumentConfig, TemplateRef};
use crate::jurisdiction::JurisdictionCode;
use crate::mapping::{FieldCatalog, FieldMapping};

type Cache<T> = RwLock<HashMap<AssetRequest, Arc<T>>>;

/// Lazily loaded assets, cached per (kind, document, jurisdiction, file).
///
/// Two requests racing on a cold key both load; the last insert wins.
pub struct AssetStore {
    chain: AssetChain,
    mappings: Cache<FieldMapping>,
    catalogs: Cache<FieldCatalog>,
    configs: Cache<DocumentConfig>,
    templates: Cache<Vec<u8>>,
}

fn cached<K, T>(
    cache: &RwLock<HashMap<K, Arc<T>>>,
    key: &K,
    load: impl FnOnce() -> Result<Resolved<T>, ConfigResolutionError>,
) -> Result<Resolved<Arc<T>>, ConfigResolutionError>
where
    K: Clone + Eq + Hash,
{
    if let Some(hit) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
    {
        return Ok(Resolved {
            value: Arc::clone(hit),
            source: "cache",
            warnings: Vec::new(),
        });
    }

    let loaded = load()?;
    let value = Arc::new(loaded.value);
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.clone(), Arc::clone(&value));
    Ok(Resolved {
        value,
        source: loaded.source,
        warnings: loaded.warnings,
    })
}

impl AssetStore {
    pub fn new(chain: AssetChain) -> Self {
        Self {
            chain,
            mappings: RwLock::default(),
            catalogs: RwLock::default(),
            configs: RwLock::default(),
            templates: RwLock::default(),
        }
    }

    pub fn chain(&self) -> &AssetChain {
        &self.chain
    }

    /// `overlay.json` stored next to the template in `asset_jurisdiction`.
    pub fn mapping(
        &self,
        document_type: &str,
        asset_jurisdiction: &JurisdictionCode,
    ) -> Result<Resolved<Arc<FieldMapping>>, ConfigResolutionError> {
        let request = AssetRequest::new(
            AssetKind::Overlay,
            document_type,
            asset_jurisdiction.clone(),
        );
        cached(&self.mappings, &request, || self.chain.resolve_json(&request))
    }

    pub fn field_catalog(
        &self,
        document_type: &str,
        jurisdiction: &JurisdictionCode,
    ) -> Result<Resolved<Arc<FieldCatalog>>, ConfigResolutionError> {
        let request = AssetRequest::new(AssetKind::Fields, document_type, jurisdiction.clone());
        cached(&self.catalogs, &request, || self.chain.resolve_json(&request))
    }

    pub fn document_config(
        &self,
        document_type: &str,
    ) -> Result<Resolved<Arc<DocumentConfig>>, ConfigResolutionError> {
        let request = AssetRequest::new(
            AssetKind::Config,
            document_type,
            JurisdictionCode::generic(),
        );
        cached(&self.configs, &request, || self.chain.resolve_json(&request))
    }

    pub fn template(
        &self,
        document_type: &str,
        template: &TemplateRef,
    ) -> Result<Resolved<Arc<Vec<u8>>>, ConfigResolutionError> {
        let request = AssetRequest::template(document_type, template);
        cached(&self.templates, &request, || self.chain.resolve_bytes(&request))
    }

    /// Number of cached entries across every asset kind.
    pub fn cached_entries(&self) -> usize {
        fn count<T>(cache: &Cache<T>) -> usize {
            cache.read().unwrap_or_else(PoisonError::into_inner).len()
        }
        count(&self.mappings) + count(&self.catalogs) + count(&self.configs) + count(&self.templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetSource, SourceError, StaticFallbackSource};
    use crate::documents::RegistryBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl AssetSource for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn fetch(&self, _request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"%PDF-1.5 stub".to_vec())
        }
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = AssetStore::new(AssetChain::new(vec![Box::new(Counting {
            calls: Arc::clone(&calls),
        })]));
        let template = TemplateRef::generic("vehicle-bill-of-sale.pdf");

        let first = store
            .template("vehicle-bill-of-sale", &template)
            .expect("first load");
        let second = store
            .template("vehicle-bill-of-sale", &template)
            .expect("cached load");

        assert_eq!(first.source, "counting");
        assert_eq!(second.source, "cache");
        assert!(Arc::ptr_eq(&first.value, &second.value));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.cached_entries(), 1);
    }

    #[test]
    fn config_resolves_from_the_compiled_catalog() {
        let registry = Arc::new(RegistryBuilder::bundled().build().expect("bundled builds"));
        let store = AssetStore::new(AssetChain::new(vec![Box::new(
            StaticFallbackSource::new(registry),
        )]));

        let config = store
            .document_config("vehicle-bill-of-sale")
            .expect("config is compiled in");
        assert_eq!(config.value.display_name, "Vehicle Bill of Sale");
        assert!(config.value.overlay.is_some());

        let err = store
            .document_config("lease-agreement")
            .expect_err("unknown documents have no config");
        assert_eq!(err.kind, AssetKind::Config);
    }
}
