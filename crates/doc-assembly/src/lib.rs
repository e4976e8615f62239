//! Jurisdiction-aware document assembly.
//!
//! A request names a document type, a jurisdiction and a set of raw answers.
//! The pipeline resolves the question set for that pair, validates the answers,
//! maps them onto either an official AcroForm or a generic overlay template and
//! renders the finished PDF.

pub mod assembly;
pub mod assets;
pub mod compliance;
pub mod config;
pub mod documents;
pub mod error;
pub mod introspect;
pub mod jurisdiction;
pub mod lint;
pub mod mapping;
pub mod render;
pub mod telemetry;
pub mod validation;

pub use assembly::{AssembledDocument, AssemblyError, DocumentAssembler, FillRequest};
pub use jurisdiction::JurisdictionCode;
