pub mod catalog;
mod domain;
mod registry;
mod schema;

pub use domain::{
    Constraints, DocumentCategory, DocumentDefinition, JurisdictionOverride, JurisdictionScope,
    Question, QuestionKind, QuestionSet, SelectOption, TemplateRef,
};
pub use registry::{DocumentConfig, DocumentRegistry, RegistryBuilder, RegistryError};
pub use schema::{FieldRule, Schema, ValueType};
