//! View Processor
//!
//! Entry point of the crate. Runs the full pipeline over one arch:
//!
//! ```text
//! arch ──parse──► ViewTree ──canonicalize──► ViewTree ──resolve_scopes──► AttrScopes
//!                                               │                             │
//!                                               └──────merge_modifiers◄───────┘
//!                                                          │
//!                                                          ▼
//!                                                    ViewTree ──to_xml──► arch
//! ```
//!
//! Every stage takes its input by reference and returns a fresh value, so
//! the stages cannot observe each other's intermediate mutations. A call
//! either returns the fully processed arch or an error, never a partial tree.

use crate::attrs::resolve_scopes;
use crate::canonicalize::canonicalize;
use crate::config::ProcessorConfig;
use crate::domain::{DomainEvaluator, RecordContext};
use crate::error::ViewError;
use crate::fields::{FieldMetadataProvider, FieldNamer};
use crate::modifiers::merge_modifiers;
use crate::tree::ViewTree;

/// Renders view archs for one model.
///
/// Holds only shared references to read-only collaborators; one processor
/// can serve concurrent calls.
pub struct ViewProcessor<'a> {
    namer: &'a (dyn FieldNamer + Sync),
    fields: &'a (dyn FieldMetadataProvider + Sync),
    evaluator: &'a (dyn DomainEvaluator + Sync),
    config: ProcessorConfig,
}

impl<'a> ViewProcessor<'a> {
    pub fn new(
        namer: &'a (dyn FieldNamer + Sync),
        fields: &'a (dyn FieldMetadataProvider + Sync),
        evaluator: &'a (dyn DomainEvaluator + Sync),
    ) -> Self {
        Self {
            namer,
            fields,
            evaluator,
            config: ProcessorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        self.namer.model_name()
    }

    pub fn namer(&self) -> &'a (dyn FieldNamer + Sync) {
        self.namer
    }

    pub fn fields(&self) -> &'a (dyn FieldMetadataProvider + Sync) {
        self.fields
    }

    /// Process `arch` for the record described by `record`.
    pub fn process(&self, arch: &str, record: &RecordContext) -> Result<String, ViewError> {
        let tree = ViewTree::parse(arch)?;
        let rendered = self.process_tree(&tree, record)?.to_xml()?;
        tracing::debug!(
            model = self.model(),
            input_len = arch.len(),
            output_len = rendered.len(),
            "processed view arch"
        );
        Ok(rendered)
    }

    /// Run the three stages over an already parsed tree.
    pub fn process_tree(
        &self,
        tree: &ViewTree,
        record: &RecordContext,
    ) -> Result<ViewTree, ViewError> {
        let model = self.model();
        let canonical = canonicalize(tree, self.namer)?;
        let scopes = resolve_scopes(&canonical, model, self.evaluator, record)?;
        merge_modifiers(&canonical, &scopes, self.fields, model, &self.config)
    }
}
