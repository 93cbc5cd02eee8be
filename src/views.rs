//! View registry and the fields-view-get assembly.
//!
//! A client asking for a view gets its processed arch together with the
//! metadata of every field the arch references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::RecordContext;
use crate::error::ViewError;
use crate::fields::FieldInfo;
use crate::processor::ViewProcessor;
use crate::tree::ViewTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Form,
    Tree,
    List,
    Search,
    Kanban,
    Graph,
    Calendar,
    Pivot,
}

/// A registered view definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub model: String,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    pub arch: String,
    /// Fields the arch references. Derived from the arch when empty.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl ViewDef {
    /// Names referenced by `field` elements, in document order, without
    /// duplicates. Uses the declared list when there is one.
    pub fn referenced_fields(&self) -> Result<Vec<String>, ViewError> {
        if !self.fields.is_empty() {
            return Ok(self.fields.clone());
        }
        let tree = ViewTree::parse(&self.arch)?;
        let mut names: Vec<String> = Vec::new();
        for (_, element) in tree.elements().filter(|(_, e)| e.tag() == "field") {
            if let Some(name) = element.attr("name") {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}

/// Request for a view: by id, or the first view of the model with the
/// given type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsViewGetParams {
    #[serde(default)]
    pub view_id: Option<String>,
    pub view_type: ViewType,
}

/// A processed view ready for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsViewData {
    pub name: String,
    pub arch: String,
    pub view_id: String,
    pub model: String,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    /// Metadata of the referenced fields, keyed by canonical name.
    pub fields: BTreeMap<String, FieldInfo>,
}

/// Views in registration order.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Vec<ViewDef>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: ViewDef) -> Result<(), ViewError> {
        if self.get_by_id(&view.id).is_some() {
            return Err(ViewError::Config(format!("duplicate view id '{}'", view.id)));
        }
        tracing::debug!(view_id = %view.id, model = %view.model, "registered view");
        self.views.push(view);
        Ok(())
    }

    /// Load a YAML list of view definitions.
    pub fn from_yaml(yaml: &str) -> Result<Self, ViewError> {
        let views: Vec<ViewDef> = serde_yaml::from_str(yaml)
            .map_err(|e| ViewError::Config(format!("invalid view definitions: {}", e)))?;
        let mut registry = Self::new();
        for view in views {
            registry.register(view)?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ViewDef> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn first_for_model(&self, model: &str, view_type: ViewType) -> Option<&ViewDef> {
        self.views
            .iter()
            .find(|v| v.model == model && v.view_type == view_type)
    }

    /// Resolve, process and describe a view of the processor's model.
    pub fn fields_view_get(
        &self,
        processor: &ViewProcessor<'_>,
        params: &FieldsViewGetParams,
        record: &RecordContext,
    ) -> Result<FieldsViewData, ViewError> {
        let model = processor.model();
        let view = params
            .view_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .and_then(|id| self.get_by_id(id))
            .or_else(|| self.first_for_model(model, params.view_type))
            .ok_or_else(|| {
                ViewError::ViewNotFound(format!(
                    "no {:?} view for model '{}' (requested id: {:?})",
                    params.view_type, model, params.view_id
                ))
            })?;
        if view.model != model {
            return Err(ViewError::ViewNotFound(format!(
                "view '{}' belongs to model '{}', not '{}'",
                view.id, view.model, model
            )));
        }

        let mut fields = BTreeMap::new();
        for name in view.referenced_fields()? {
            let canonical = processor.namer().canonical_name(&name).ok_or_else(|| {
                ViewError::UnknownField {
                    model: model.to_string(),
                    field: name.clone(),
                }
            })?;
            let info = processor.fields().field_info(&canonical).ok_or_else(|| {
                ViewError::UnknownField {
                    model: model.to_string(),
                    field: canonical.clone(),
                }
            })?;
            fields.insert(canonical, info.clone());
        }

        let arch = processor.process(&view.arch, record)?;
        tracing::info!(view_id = %view.id, model, fields = fields.len(), "fields view get");
        Ok(FieldsViewData {
            name: view.name.clone(),
            arch,
            view_id: view.id.clone(),
            model: view.model.clone(),
            view_type: view.view_type,
            fields,
        })
    }
}
