//! Field metadata and name canonicalization sources.
//!
//! The processor consumes two lookups keyed by field name:
//!
//! - [`FieldNamer`]: human-authored name → canonical storage identifier
//! - [`FieldMetadataProvider`]: canonical identifier → [`FieldInfo`]
//!
//! [`ModelFields`] is an in-memory registry for one model implementing both,
//! loadable from YAML model definitions.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Relation arity of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationArity {
    /// Plain value field.
    #[default]
    None,
    /// Many2One / One2One.
    ToOne,
    /// One2Many / Many2Many.
    ToMany,
}

impl RelationArity {
    pub fn is_relation(self) -> bool {
        self != RelationArity::None
    }
}

/// Static metadata of one model field, keyed by its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Canonical storage identifier.
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub relation: RelationArity,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            readonly: false,
            relation: RelationArity::None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn relation(mut self, relation: RelationArity) -> Self {
        self.relation = relation;
        self
    }
}

/// Maps a field reference as written in a view to its canonical identifier.
///
/// Must be idempotent: a canonical name maps to itself. Unknown names yield
/// `None`.
pub trait FieldNamer {
    /// Model the names belong to, used in error context.
    fn model_name(&self) -> &str;

    fn canonical_name(&self, name: &str) -> Option<String>;
}

/// Static field metadata lookup by canonical name.
pub trait FieldMetadataProvider {
    fn field_info(&self, canonical_name: &str) -> Option<&FieldInfo>;
}

/// Convert a field name to its JSON (snake_case) form.
///
/// `PartnerID` → `partner_id`, `ID` → `id`, `HTTPServer` → `http_server`.
/// Names already in snake_case are returned unchanged.
pub fn jsonize_field_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
                {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One field as declared in a model definition file.
#[derive(Debug, Clone, Deserialize)]
struct FieldDef {
    /// Human-facing name (e.g. `PartnerName`).
    name: String,
    /// Canonical name override; defaults to `jsonize_field_name(name)`.
    #[serde(default)]
    json: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    relation: RelationArity,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelDef {
    model: String,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

/// In-memory field registry for one model.
#[derive(Debug, Clone, Default)]
pub struct ModelFields {
    model: String,
    /// Canonical name → metadata.
    fields: HashMap<String, FieldInfo>,
    /// Human name → canonical name.
    aliases: HashMap<String, String>,
}

impl ModelFields {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Register a field under its human name. The canonical name is taken
    /// from `info.name`.
    pub fn add_field(mut self, human_name: impl Into<String>, info: FieldInfo) -> Self {
        self.insert(human_name.into(), info);
        self
    }

    fn insert(&mut self, human_name: String, info: FieldInfo) {
        if human_name != info.name {
            self.aliases.insert(human_name, info.name.clone());
        }
        self.fields.insert(info.name.clone(), info);
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a model definition:
    ///
    /// ```yaml
    /// model: Partner
    /// fields:
    ///   - name: Name
    ///     required: true
    ///   - name: ParentID
    ///     relation: to_one
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, ViewError> {
        let def: ModelDef = serde_yaml::from_str(yaml)
            .map_err(|e| ViewError::Config(format!("invalid model definition: {}", e)))?;
        let mut fields = ModelFields::new(def.model);
        for field in def.fields {
            let canonical = field
                .json
                .unwrap_or_else(|| jsonize_field_name(&field.name));
            if fields.fields.contains_key(&canonical) {
                return Err(ViewError::Config(format!(
                    "duplicate field '{}' in model '{}'",
                    canonical, fields.model
                )));
            }
            let info = FieldInfo {
                name: canonical,
                required: field.required,
                readonly: field.readonly,
                relation: field.relation,
            };
            fields.insert(field.name, info);
        }
        tracing::debug!(model = %fields.model, fields = fields.len(), "loaded model definition");
        Ok(fields)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ViewError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ViewError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }
}

impl FieldNamer for ModelFields {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn canonical_name(&self, name: &str) -> Option<String> {
        if self.fields.contains_key(name) {
            return Some(name.to_string());
        }
        self.aliases.get(name).cloned()
    }
}

impl FieldMetadataProvider for ModelFields {
    fn field_info(&self, canonical_name: &str) -> Option<&FieldInfo> {
        self.fields.get(canonical_name)
    }
}
