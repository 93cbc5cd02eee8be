//! view-arch: view architecture compiler
//!
//! Turns a view arch (XML form/list layout referencing model fields) into the
//! representation sent to web clients:
//! - field references rewritten to canonical field names
//! - a `modifiers` attribute on every field node, merged from `attrs`
//!   conditions, inline attributes and static field metadata
//!
//! The domain grammar used in `attrs` is not interpreted here; callers plug
//! in a [`DomainEvaluator`]. Field names and metadata come from a
//! [`FieldNamer`] / [`FieldMetadataProvider`], e.g. [`ModelFields`].
//!
//! # Example
//!
//! ```
//! use view_arch::{FieldInfo, KeepDynamic, ModelFields, RecordContext, ViewProcessor};
//!
//! let fields = ModelFields::new("Partner").add_field("Name", FieldInfo::new("name").required());
//! let processor = ViewProcessor::new(&fields, &fields, &KeepDynamic);
//! let arch = processor
//!     .process(r#"<form><field name="Name"/></form>"#, &RecordContext::new())
//!     .unwrap();
//! assert_eq!(
//!     arch,
//!     r#"<form><field name="name" modifiers="{&quot;required&quot;:true}"/></form>"#
//! );
//! ```

pub mod attrs;
pub mod canonicalize;
pub mod config;
pub mod domain;
pub mod error;
pub mod fields;
pub mod modifiers;
pub mod processor;
pub mod tree;
pub mod views;

// Re-export commonly used types
pub use attrs::{resolve_element_attrs, resolve_scopes, AttrScopes};
pub use canonicalize::canonicalize;
pub use config::{ConfigLoader, ProcessorConfig};
pub use domain::{Domain, DomainEvaluator, Evaluation, KeepDynamic, RecordContext};
pub use error::ViewError;
pub use fields::{
    jsonize_field_name, FieldInfo, FieldMetadataProvider, FieldNamer, ModelFields, RelationArity,
};
pub use modifiers::{merge_modifiers, Modifier, ModifierSet, ModifierValue};
pub use processor::ViewProcessor;
pub use tree::{Element, NodeId, ViewTree};
pub use views::{FieldsViewData, FieldsViewGetParams, ViewDef, ViewRegistry, ViewType};
