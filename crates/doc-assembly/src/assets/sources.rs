use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use super::{AssetKind, AssetRequest};
use crate::documents::DocumentRegistry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed after {attempts} attempt(s): {message}")]
    Transport { attempts: usize, message: String },
    #[error("read failed for {path}: {message}")]
    Io { path: String, message: String },
    #[error("path traversal blocked: {0}")]
    PathRejected(String),
    #[error("asset did not parse: {0}")]
    Invalid(String),
}

/// One link of the asset chain.
pub trait AssetSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, _kind: AssetKind) -> bool {
        true
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_backoff_ms: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal blocking GET used by [`CdnSource`].
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// `reqwest` blocking client, built on first use.
#[derive(Debug)]
pub struct ReqwestTransport {
    timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.client.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new())
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, String> {
        let response = self.client().get(url).send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| format!("read body failed: {e}"))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// `GET {base_url}/{document}/{jurisdiction}/{file}` with linear backoff.
pub struct CdnSource<T: HttpTransport = ReqwestTransport> {
    base_url: String,
    transport: T,
    retry: RetryPolicy,
}

impl<T: HttpTransport> CdnSource<T> {
    pub fn new(base_url: impl Into<String>, transport: T, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            retry,
        }
    }

    pub fn url_for(&self, request: &AssetRequest) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            request.relative_path()
        )
    }
}

impl<T: HttpTransport> AssetSource for CdnSource<T> {
    fn name(&self) -> &'static str {
        "cdn"
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        let url = self.url_for(request);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.transport.get(&url) {
                Ok(response) if (200..300).contains(&response.status) => {
                    return Ok(response.body);
                }
                Ok(response) if response.status == 404 => {
                    return Err(SourceError::NotFound(url));
                }
                Ok(response) => format!("status={} url={url}", response.status),
                Err(message) => format!("url={url}: {message}"),
            };
            if attempt >= max_attempts {
                return Err(SourceError::Transport {
                    attempts: attempt,
                    message: failure,
                });
            }
            thread::sleep(Duration::from_millis(
                self.retry.base_backoff_ms.saturating_mul(attempt as u64),
            ));
        }
    }
}

/// Bundled asset tree on disk.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

impl AssetSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        let jurisdiction = request.jurisdiction.path_segment();
        let segments = [
            request.document_type.as_str(),
            jurisdiction.as_str(),
            request.file_name.as_str(),
        ];
        if let Some(bad) = segments.iter().find(|segment| !safe_segment(segment)) {
            return Err(SourceError::PathRejected((*bad).to_string()));
        }

        let path = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        if !path.is_file() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());
        let canonical = path.canonicalize().map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if !canonical.starts_with(&root) {
            return Err(SourceError::PathRejected(path.display().to_string()));
        }

        fs::read(&canonical).map_err(|e| SourceError::Io {
            path: canonical.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// JSON assets serialized from the compiled catalog.
#[derive(Debug, Clone)]
pub struct StaticFallbackSource {
    registry: Arc<DocumentRegistry>,
}

impl StaticFallbackSource {
    pub fn new(registry: Arc<DocumentRegistry>) -> Self {
        Self { registry }
    }
}

impl AssetSource for StaticFallbackSource {
    fn name(&self) -> &'static str {
        "compiled"
    }

    fn supports(&self, kind: AssetKind) -> bool {
        kind.is_json()
    }

    fn fetch(&self, request: &AssetRequest) -> Result<Vec<u8>, SourceError> {
        let document_type = request.document_type.as_str();
        let jurisdiction = &request.jurisdiction;
        let missing = || {
            SourceError::NotFound(format!(
                "compiled {} for {document_type}/{jurisdiction}",
                request.kind
            ))
        };

        let encoded = match request.kind {
            AssetKind::Overlay => self
                .registry
                .bundled_mapping(document_type, jurisdiction)
                .map(serde_json::to_vec),
            AssetKind::Fields => self
                .registry
                .bundled_field_catalog(document_type, jurisdiction)
                .map(serde_json::to_vec),
            AssetKind::Config => self
                .registry
                .bundled_config(document_type)
                .map(|config| serde_json::to_vec(&config)),
            AssetKind::Template => None,
        };

        encoded
            .ok_or_else(missing)?
            .map_err(|e| SourceError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::JurisdictionCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedTransport {
        responses: Mutex<Vec<Result<HttpResponse, String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<Result<HttpResponse, String>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn get(&self, _url: &str) -> Result<HttpResponse, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .expect("lock responses")
                .pop()
                .unwrap_or_else(|| Err("no scripted response".to_string()))
        }
    }

    fn request() -> AssetRequest {
        AssetRequest::new(
            AssetKind::Overlay,
            "vehicle-bill-of-sale",
            JurisdictionCode::generic(),
        )
    }

    fn retry(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff_ms: 0,
        }
    }

    fn ok(body: &[u8]) -> Result<HttpResponse, String> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_vec(),
        })
    }

    fn temp_root(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("doc-assembly-{name}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn cdn_builds_document_scoped_urls() {
        let source = CdnSource::new("https://cdn.example.com/docs/", ScriptedTransport::new(vec![]), retry(1));
        assert_eq!(
            source.url_for(&request()),
            "https://cdn.example.com/docs/vehicle-bill-of-sale/generic/overlay.json"
        );
    }

    #[test]
    fn cdn_retries_transient_failures() {
        let source = CdnSource::new(
            "https://cdn.example.com",
            ScriptedTransport::new(vec![
                Err("connection reset".to_string()),
                Ok(HttpResponse {
                    status: 503,
                    body: Vec::new(),
                }),
                ok(b"{}"),
            ]),
            retry(3),
        );
        assert_eq!(source.fetch(&request()).expect("third attempt succeeds"), b"{}");
        assert_eq!(source.transport.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cdn_gives_up_after_max_attempts() {
        let source = CdnSource::new(
            "https://cdn.example.com",
            ScriptedTransport::new(vec![Err("timeout".to_string()), Err("timeout".to_string())]),
            retry(2),
        );
        let err = source.fetch(&request()).expect_err("both attempts fail");
        assert!(matches!(err, SourceError::Transport { attempts: 2, .. }));
    }

    #[test]
    fn cdn_does_not_retry_not_found() {
        let source = CdnSource::new(
            "https://cdn.example.com",
            ScriptedTransport::new(vec![Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            })]),
            retry(3),
        );
        assert!(matches!(source.fetch(&request()), Err(SourceError::NotFound(_))));
        assert_eq!(source.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_reads_bundled_files_and_blocks_traversal() {
        let root = temp_root("local");
        let dir = root.join("vehicle-bill-of-sale").join("generic");
        fs::create_dir_all(&dir).expect("create asset dir");
        fs::write(dir.join("overlay.json"), b"{\"entries\":{}}").expect("write overlay");

        let source = LocalSource::new(&root);
        assert_eq!(
            source.fetch(&request()).expect("file is read"),
            b"{\"entries\":{}}"
        );
        assert!(matches!(
            source.fetch(&request().with_file("../../../etc/passwd")),
            Err(SourceError::PathRejected(_))
        ));
        assert!(matches!(
            source.fetch(&request().with_file("missing.json")),
            Err(SourceError::NotFound(_))
        ));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn compiled_fallback_serves_json_kinds_only() {
        let registry = Arc::new(
            crate::documents::RegistryBuilder::bundled()
                .build()
                .expect("bundled registry builds"),
        );
        let source = StaticFallbackSource::new(registry);
        assert!(!source.supports(AssetKind::Template));

        let bytes = source.fetch(&request()).expect("generic overlay is compiled in");
        let mapping: crate::mapping::FieldMapping =
            serde_json::from_slice(&bytes).expect("overlay parses");
        assert!(mapping.contains("vehicle_vin"));

        let fl = JurisdictionCode::parse("FL").expect("fl parses");
        let fields = AssetRequest::new(AssetKind::Fields, "vehicle-bill-of-sale", fl);
        assert!(source.fetch(&fields).is_ok());

        let unknown = AssetRequest::new(
            AssetKind::Fields,
            "vehicle-bill-of-sale",
            JurisdictionCode::generic(),
        );
        assert!(matches!(source.fetch(&unknown), Err(SourceError::NotFound(_))));
    }
}
