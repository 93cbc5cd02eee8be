//! Name Canonicalizer
//!
//! Rewrites `field/@name` and `label/@for` from the names used when
//! authoring a view to the canonical field identifiers the rest of the
//! pipeline (and the client) work with.

use crate::error::ViewError;
use crate::fields::FieldNamer;
use crate::tree::ViewTree;

/// (tag, attribute) pairs holding field references.
const FIELD_REFERENCES: [(&str, &str); 2] = [("field", "name"), ("label", "for")];

/// Canonicalize stage: returns a copy of `tree` with every field reference
/// replaced by its canonical name.
///
/// Fails with [`ViewError::UnknownField`] on the first reference the model
/// does not define. Elements without the reference attribute (e.g. a caption
/// `label`) are left as they are.
pub fn canonicalize(tree: &ViewTree, namer: &dyn FieldNamer) -> Result<ViewTree, ViewError> {
    let mut out = tree.clone();
    for (id, element) in tree.elements() {
        let Some((_, attr)) = FIELD_REFERENCES
            .iter()
            .find(|(tag, _)| *tag == element.tag())
        else {
            continue;
        };
        let Some(name) = element.attr(attr) else {
            continue;
        };
        let canonical = namer
            .canonical_name(name)
            .ok_or_else(|| ViewError::UnknownField {
                model: namer.model_name().to_string(),
                field: name.to_string(),
            })?;
        if canonical != name {
            tracing::trace!(model = namer.model_name(), from = name, to = %canonical, "canonicalized field reference");
            if let Some(target) = out.element_mut(id) {
                target.set_attr(attr, canonical);
            }
        }
    }
    Ok(out)
}
