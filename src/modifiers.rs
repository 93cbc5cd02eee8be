//! Modifier Merge Engine
//!
//! Computes the final `modifiers` attribute of every field node from three
//! sources, applied in order:
//!
//! 1. the raw map of the nearest enclosing `attrs` declaration
//! 2. inline `readonly` / `required` / `invisible` attributes on the field
//! 3. static field metadata (can only force `true`)
//!
//! then prunes literal `false` entries and drops `required` when the field is
//! literally invisible or readonly.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::attrs::{AttrScopes, ATTRS_ATTR};
use crate::config::ProcessorConfig;
use crate::domain::Domain;
use crate::error::ViewError;
use crate::fields::{FieldInfo, FieldMetadataProvider};
use crate::tree::{Element, ViewTree};

/// Name of the rendered attribute.
pub const MODIFIERS_ATTR: &str = "modifiers";

/// A UI state constraint on a view node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Readonly,
    Required,
    Invisible,
}

impl Modifier {
    /// All modifiers, in rendering order.
    pub const ALL: [Modifier; 3] = [Modifier::Readonly, Modifier::Required, Modifier::Invisible];

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Readonly => "readonly",
            Modifier::Required => "required",
            Modifier::Invisible => "invisible",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a modifier: resolved here, or left for the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Literal(bool),
    Dynamic(Domain),
}

impl ModifierValue {
    pub fn is_literal(&self, value: bool) -> bool {
        matches!(self, ModifierValue::Literal(v) if *v == value)
    }
}

/// One optional value per [`Modifier`].
///
/// Also used for the raw map produced from an `attrs` declaration, where all
/// three slots are filled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierSet {
    values: [Option<ModifierValue>; 3],
}

impl ModifierSet {
    /// Empty set: no modifier present.
    pub fn new() -> Self {
        Self::default()
    }

    /// All three modifiers present and literally `false`.
    pub fn all_false() -> Self {
        Self {
            values: [
                Some(ModifierValue::Literal(false)),
                Some(ModifierValue::Literal(false)),
                Some(ModifierValue::Literal(false)),
            ],
        }
    }

    pub fn get(&self, modifier: Modifier) -> Option<&ModifierValue> {
        self.values[modifier.slot()].as_ref()
    }

    pub fn set(&mut self, modifier: Modifier, value: ModifierValue) {
        self.values[modifier.slot()] = Some(value);
    }

    pub fn remove(&mut self, modifier: Modifier) -> Option<ModifierValue> {
        self.values[modifier.slot()].take()
    }

    /// Whether `modifier` is present with the literal value `value`.
    pub fn is_literal(&self, modifier: Modifier, value: bool) -> bool {
        self.get(modifier).is_some_and(|v| v.is_literal(value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Modifier, &ModifierValue)> {
        Modifier::ALL
            .into_iter()
            .filter_map(move |m| self.get(m).map(|v| (m, v)))
    }

    /// Drop literal `false` entries, then drop a literal-true `required`
    /// when `invisible` or `readonly` is literally true.
    pub fn prune(&mut self) {
        for modifier in Modifier::ALL {
            if self.is_literal(modifier, false) {
                self.remove(modifier);
            }
        }
        if self.is_literal(Modifier::Required, true)
            && (self.is_literal(Modifier::Invisible, true)
                || self.is_literal(Modifier::Readonly, true))
        {
            self.remove(Modifier::Required);
        }
    }

    /// Compact JSON encoding with a fixed key order.
    pub fn to_json(&self) -> Result<String, ViewError> {
        serde_json::to_string(self).map_err(|e| ViewError::Serialization(e.to_string()))
    }
}

impl Serialize for ModifierSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.iter().count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (modifier, value) in self.iter() {
            map.serialize_entry(modifier.as_str(), value)?;
        }
        map.end()
    }
}

/// Inline boolean attribute semantics: anything but empty, `0` or `false`.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

/// Apply inline attributes and static metadata to `seed`, then prune.
pub fn merge_field_modifiers(
    element: &Element,
    info: Option<&FieldInfo>,
    seed: ModifierSet,
) -> ModifierSet {
    let mut modifiers = seed;
    for modifier in Modifier::ALL {
        if element.attr(modifier.as_str()).is_some_and(is_truthy) {
            modifiers.set(modifier, ModifierValue::Literal(true));
        }
    }
    if let Some(info) = info {
        if info.readonly {
            modifiers.set(Modifier::Readonly, ModifierValue::Literal(true));
        }
        if info.required {
            modifiers.set(Modifier::Required, ModifierValue::Literal(true));
        }
    }
    modifiers.prune();
    modifiers
}

/// Merge stage: returns a copy of `tree` with a `modifiers` attribute on
/// every field node (and on other `attrs`-bearing elements when
/// `config.container_modifiers` is set).
pub fn merge_modifiers(
    tree: &ViewTree,
    scopes: &AttrScopes,
    fields: &dyn FieldMetadataProvider,
    model: &str,
    config: &ProcessorConfig,
) -> Result<ViewTree, ViewError> {
    let mut out = tree.clone();
    for (id, element) in tree.elements() {
        let is_field = element.tag() == "field";
        if !is_field && !(config.container_modifiers && scopes.declares(id)) {
            continue;
        }

        let seed = scopes.nearest(tree, id).cloned().unwrap_or_else(ModifierSet::all_false);
        let modifiers = if is_field {
            let info = match element.attr("name") {
                Some(name) => Some(fields.field_info(name).ok_or_else(|| {
                    ViewError::UnknownField {
                        model: model.to_string(),
                        field: name.to_string(),
                    }
                })?),
                None => None,
            };
            merge_field_modifiers(element, info, seed)
        } else {
            let mut modifiers = seed;
            modifiers.prune();
            modifiers
        };

        let encoded = modifiers.to_json()?;
        tracing::trace!(model, tag = element.tag(), modifiers = %encoded, "merged modifiers");
        if let Some(target) = out.element_mut(id) {
            target.set_attr(MODIFIERS_ATTR, encoded);
        }
    }
    if !config.keep_attrs {
        for (id, _) in tree.elements().filter(|(_, e)| e.has_attr(ATTRS_ATTR)) {
            if let Some(target) = out.element_mut(id) {
                target.remove_attr(ATTRS_ATTR);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(attrs: &[(&str, &str)]) -> Element {
        let mut element = Element::new("field");
        element.set_attr("name", "state");
        for (k, v) in attrs {
            element.set_attr(k, *v);
        }
        element
    }

    fn dynamic() -> ModifierValue {
        ModifierValue::Dynamic(Domain::new(json!([["state", "=", "done"]])))
    }

    #[test]
    fn static_required_only() {
        let info = FieldInfo::new("state").required();
        let mods = merge_field_modifiers(&field(&[]), Some(&info), ModifierSet::all_false());
        assert_eq!(mods.to_json().unwrap(), r#"{"required":true}"#);
    }

    #[test]
    fn nothing_set_renders_empty_object() {
        let info = FieldInfo::new("state");
        let mods = merge_field_modifiers(&field(&[]), Some(&info), ModifierSet::all_false());
        assert!(mods.is_empty());
        assert_eq!(mods.to_json().unwrap(), "{}");
    }

    #[test]
    fn inline_attributes_force_true() {
        let info = FieldInfo::new("state");
        let mods = merge_field_modifiers(
            &field(&[("invisible", "1"), ("readonly", "0"), ("required", "false")]),
            Some(&info),
            ModifierSet::all_false(),
        );
        assert_eq!(mods.to_json().unwrap(), r#"{"invisible":true}"#);
    }

    #[test]
    fn inline_attribute_overrides_only_its_modifier() {
        let mut seed = ModifierSet::all_false();
        seed.set(Modifier::Invisible, dynamic());
        seed.set(Modifier::Readonly, dynamic());
        let mods = merge_field_modifiers(&field(&[("readonly", "True")]), None, seed);
        assert!(mods.is_literal(Modifier::Readonly, true));
        assert_eq!(mods.get(Modifier::Invisible), Some(&dynamic()));
    }

    #[test]
    fn static_metadata_never_forces_false() {
        let mut seed = ModifierSet::all_false();
        seed.set(Modifier::Readonly, ModifierValue::Literal(true));
        let info = FieldInfo::new("state");
        let mods = merge_field_modifiers(&field(&[]), Some(&info), seed);
        assert!(mods.is_literal(Modifier::Readonly, true));
    }

    #[test]
    fn required_dropped_when_invisible_or_readonly() {
        let info = FieldInfo::new("state").required();
        let mut seed = ModifierSet::all_false();
        seed.set(Modifier::Invisible, ModifierValue::Literal(true));
        let mods = merge_field_modifiers(&field(&[]), Some(&info), seed);
        assert_eq!(mods.to_json().unwrap(), r#"{"invisible":true}"#);

        let info = FieldInfo::new("state").required().readonly();
        let mods = merge_field_modifiers(&field(&[]), Some(&info), ModifierSet::all_false());
        assert_eq!(mods.to_json().unwrap(), r#"{"readonly":true}"#);
    }

    #[test]
    fn dynamic_values_do_not_drop_required() {
        let info = FieldInfo::new("state").required();
        let mut seed = ModifierSet::all_false();
        seed.set(Modifier::Invisible, dynamic());
        let mods = merge_field_modifiers(&field(&[]), Some(&info), seed);
        assert_eq!(
            mods.to_json().unwrap(),
            r#"{"required":true,"invisible":[["state","=","done"]]}"#
        );
    }

    #[test]
    fn truthiness() {
        for v in ["1", "true", "True", "yes", "invisible"] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["", " ", "0", "false", "FALSE"] {
            assert!(!is_truthy(v), "{v:?}");
        }
    }

    #[test]
    fn modifier_names() {
        assert_eq!(Modifier::from_name("readonly"), Some(Modifier::Readonly));
        assert_eq!(Modifier::from_name("column_invisible"), None);
        assert_eq!(Modifier::Invisible.to_string(), "invisible");
    }
}
