//! Per-Node Attr Resolver
//!
//! An `attrs` attribute declares conditional modifiers as a JSON object:
//!
//! ```text
//! attrs="{'invisible': [['state', '=', 'done']], 'readonly': [['locked', '=', True]]}"   (authoring)
//! attrs='{"invisible": [["state", "=", "done"]]}'                                         (stored)
//! ```
//!
//! Each recognized modifier's domain is evaluated against the bound record.
//! Definite results become literals, undetermined ones stay as the verbatim
//! domain for the client. The resolved maps are collected into [`AttrScopes`],
//! which answers the nearest enclosing declaration for any node.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::{Domain, DomainEvaluator, Evaluation, RecordContext};
use crate::error::ViewError;
use crate::modifiers::{Modifier, ModifierSet, ModifierValue};
use crate::tree::{Element, NodeId, ViewTree};

pub const ATTRS_ATTR: &str = "attrs";

/// The element's `attrs` text, if it carries a non-blank declaration.
pub fn attrs_declaration(element: &Element) -> Option<&str> {
    element
        .attr(ATTRS_ATTR)
        .filter(|text| !text.trim().is_empty())
}

/// Resolve the `attrs` declaration of one element into a raw modifier map.
///
/// Without a declaration every modifier is literally `false`.
pub fn resolve_element_attrs(
    model: &str,
    element: &Element,
    evaluator: &dyn DomainEvaluator,
    record: &RecordContext,
) -> Result<ModifierSet, ViewError> {
    let mut modifiers = ModifierSet::all_false();
    let Some(text) = attrs_declaration(element) else {
        return Ok(modifiers);
    };

    let declared = parse_attrs(model, text)?;
    for (key, value) in &declared {
        let Some(modifier) = Modifier::from_name(key) else {
            tracing::debug!(model, tag = element.tag(), key = %key, "ignoring unrecognized attrs key");
            continue;
        };
        let domain = Domain::new(value.clone());
        if domain.is_empty() {
            continue;
        }
        let value = match evaluator.evaluate(&domain, record) {
            Evaluation::True => ModifierValue::Literal(true),
            Evaluation::False => ModifierValue::Literal(false),
            Evaluation::Undetermined => ModifierValue::Dynamic(domain),
        };
        modifiers.set(modifier, value);
    }
    Ok(modifiers)
}

/// Parse an attrs declaration: a JSON object whose values are domains.
fn parse_attrs(model: &str, text: &str) -> Result<Map<String, Value>, ViewError> {
    let malformed = |reason: String| ViewError::MalformedAttrs {
        model: model.to_string(),
        attrs: text.to_string(),
        reason,
    };
    let declared: Map<String, Value> =
        serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    for (key, value) in &declared {
        if !matches!(value, Value::Array(_) | Value::Null) {
            return Err(malformed(format!("value of '{}' is not a domain", key)));
        }
    }
    Ok(declared)
}

/// Raw modifier maps of every element carrying a non-blank `attrs`
/// declaration. A blank `attrs` does not shadow an ancestor's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrScopes {
    scopes: BTreeMap<NodeId, ModifierSet>,
}

impl AttrScopes {
    /// Whether `id` carries its own `attrs` declaration.
    pub fn declares(&self, id: NodeId) -> bool {
        self.scopes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&ModifierSet> {
        self.scopes.get(&id)
    }

    /// Map of the nearest declaration governing `id`: its own, else the
    /// closest ancestor's. Siblings never contribute.
    pub fn nearest(&self, tree: &ViewTree, id: NodeId) -> Option<&ModifierSet> {
        tree.self_and_ancestors(id).find_map(|node| self.scopes.get(&node))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Resolve stage: evaluate every `attrs` declaration in `tree`.
pub fn resolve_scopes(
    tree: &ViewTree,
    model: &str,
    evaluator: &dyn DomainEvaluator,
    record: &RecordContext,
) -> Result<AttrScopes, ViewError> {
    let mut scopes = BTreeMap::new();
    for (id, element) in tree
        .elements()
        .filter(|(_, e)| attrs_declaration(e).is_some())
    {
        scopes.insert(id, resolve_element_attrs(model, element, evaluator, record)?);
    }
    Ok(AttrScopes { scopes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Resolves `[[field, "=", value]]` when the field is loaded.
    fn equality(domain: &Domain, record: &RecordContext) -> Evaluation {
        let leaf = &domain.as_value()[0];
        let field = leaf[0].as_str().unwrap_or_default();
        match record.get(field) {
            Some(value) => Evaluation::from(*value == leaf[2]),
            None => Evaluation::Undetermined,
        }
    }

    fn element_with_attrs(attrs: &str) -> Element {
        let mut element = Element::new("field");
        element.set_attr("name", "state");
        element.set_attr(ATTRS_ATTR, attrs);
        element
    }

    #[test]
    fn missing_attrs_defaults_to_all_false() {
        let element = Element::new("field");
        let map = resolve_element_attrs("Sale", &element, &equality, &RecordContext::new()).unwrap();
        assert_eq!(map, ModifierSet::all_false());

        let blank = element_with_attrs("  ");
        let map = resolve_element_attrs("Sale", &blank, &equality, &RecordContext::new()).unwrap();
        assert_eq!(map, ModifierSet::all_false());
    }

    #[test]
    fn definite_results_become_literals() {
        let record = RecordContext::new().with("state", "done");
        let element = element_with_attrs(
            r#"{"invisible": [["state", "=", "done"]], "readonly": [["state", "=", "draft"]]}"#,
        );
        let map = resolve_element_attrs("Sale", &element, &equality, &record).unwrap();
        assert!(map.is_literal(Modifier::Invisible, true));
        assert!(map.is_literal(Modifier::Readonly, false));
        assert!(map.is_literal(Modifier::Required, false));
    }

    #[test]
    fn undetermined_keeps_domain() {
        let element = element_with_attrs(r#"{"required": [["partner_id", "!=", false]]}"#);
        let map =
            resolve_element_attrs("Sale", &element, &equality, &RecordContext::new()).unwrap();
        assert_eq!(
            map.get(Modifier::Required),
            Some(&ModifierValue::Dynamic(Domain::new(json!([[
                "partner_id",
                "!=",
                false
            ]]))))
        );
    }

    #[test]
    fn empty_domains_and_unknown_keys_are_ignored() {
        let element =
            element_with_attrs(r#"{"invisible": [], "column_invisible": [["a", "=", 1]]}"#);
        let map =
            resolve_element_attrs("Sale", &element, &equality, &RecordContext::new()).unwrap();
        assert_eq!(map, ModifierSet::all_false());
    }

    #[test]
    fn malformed_attrs_name_model_and_text() {
        for text in [
            "{'invisible': [['state', '=', 'done']]}",
            "[1, 2]",
            r#"{"invisible": "state == done"}"#,
        ] {
            let element = element_with_attrs(text);
            match resolve_element_attrs("Sale", &element, &equality, &RecordContext::new()) {
                Err(ViewError::MalformedAttrs { model, attrs, .. }) => {
                    assert_eq!(model, "Sale");
                    assert_eq!(attrs, text);
                }
                other => panic!("expected MalformedAttrs for {text}, got {other:?}"),
            }
        }
    }

    #[test]
    fn nearest_scope_is_inherited_by_descendants_only() {
        let tree = ViewTree::parse(
            r#"<form>
                <group attrs='{"invisible": [["state", "=", "done"]]}'>
                    <field name="a"/>
                    <field name="b" attrs='{"readonly": [["state", "=", "done"]]}'/>
                </group>
                <field name="c"/>
            </form>"#,
        )
        .unwrap();
        let record = RecordContext::new().with("state", "done");
        let scopes = resolve_scopes(&tree, "Sale", &equality, &record).unwrap();
        assert_eq!(scopes.len(), 2);

        let fields = tree.elements_by_tag("field");
        let group = tree.elements_by_tag("group")[0];

        let a = scopes.nearest(&tree, fields[0]).unwrap();
        assert!(a.is_literal(Modifier::Invisible, true));
        assert_eq!(a, scopes.get(group).unwrap());

        let b = scopes.nearest(&tree, fields[1]).unwrap();
        assert!(b.is_literal(Modifier::Readonly, true));
        assert!(b.is_literal(Modifier::Invisible, false));

        assert!(scopes.nearest(&tree, fields[2]).is_none());
        assert!(scopes.declares(group));
        assert!(!scopes.declares(fields[0]));
    }

    #[test]
    fn blank_attrs_inherit_the_enclosing_declaration() {
        let tree = ViewTree::parse(
            r#"<form>
                <group attrs='{"invisible": [["state", "=", "done"]]}'>
                    <field name="a" attrs=""/>
                    <field name="b" attrs="   "/>
                </group>
                <field name="c" attrs=""/>
            </form>"#,
        )
        .unwrap();
        let record = RecordContext::new().with("state", "done");
        let scopes = resolve_scopes(&tree, "Sale", &equality, &record).unwrap();
        assert_eq!(scopes.len(), 1);

        let fields = tree.elements_by_tag("field");
        for &field in &fields[..2] {
            assert!(!scopes.declares(field));
            let map = scopes.nearest(&tree, field).unwrap();
            assert!(map.is_literal(Modifier::Invisible, true));
        }
        assert!(scopes.nearest(&tree, fields[2]).is_none());

        let plain = ViewTree::parse(r#"<form><field name="a" attrs=" "/></form>"#).unwrap();
        assert!(resolve_scopes(&plain, "Sale", &equality, &record)
            .unwrap()
            .is_empty());
    }
}
