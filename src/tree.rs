//! View Tree
//!
//! Arena representation of a view arch. Nodes are stored in document order and
//! addressed by [`NodeId`], which stays stable across every pipeline stage
//! because stages clone the tree and only rewrite attributes.
//!
//! ```text
//! arch text ──quick-xml──► ViewTree ──(stages)──► ViewTree ──to_xml──► arch text
//! ```
//!
//! Only elements are modelled structurally. Text, comments, CDATA, processing
//! instructions, the XML declaration and doctype are kept in their source
//! (still escaped) form so that rendering reproduces them unchanged.

use std::fmt::Write;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ViewError;

/// Index of a node inside a [`ViewTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element node: tag plus ordered, unique attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value of the attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set `name` to `value`, overwriting in place (keeping its position) or
    /// appending a new attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Remove `name`, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let tag = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let mut element = Element::new(tag);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| e.to_string())?
                .to_string();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element(Element),
    /// Verbatim source text (character data, comment, CDATA, PI, declaration).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed view arch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTree {
    nodes: Vec<Node>,
    /// Top-level nodes: prolog items, the root element, trailing misc.
    top: Vec<NodeId>,
    root: NodeId,
}

impl ViewTree {
    /// Parse arch text into a tree.
    pub fn parse(arch: &str) -> Result<Self, ViewError> {
        let malformed = |reason: String| ViewError::MalformedInput {
            arch: arch.to_string(),
            reason,
        };

        let mut reader = Reader::from_str(arch);
        let mut nodes: Vec<Node> = Vec::new();
        let mut top: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                malformed(format!("{} at position {}", e, reader.buffer_position()))
            })?;

            let (kind, opens) = match event {
                Event::Eof => break,
                Event::Start(ref e) => (
                    NodeKind::Element(Element::from_start(e).map_err(&malformed)?),
                    true,
                ),
                Event::Empty(ref e) => (
                    NodeKind::Element(Element::from_start(e).map_err(&malformed)?),
                    false,
                ),
                Event::End(ref e) => {
                    if stack.pop().is_none() {
                        return Err(malformed(format!(
                            "unexpected closing tag </{}> at position {}",
                            String::from_utf8_lossy(e.name().as_ref()),
                            reader.buffer_position()
                        )));
                    }
                    continue;
                }
                other => (NodeKind::Raw(raw_markup(&other)), false),
            };

            let id = NodeId(nodes.len());
            let is_element = matches!(kind, NodeKind::Element(_));
            let parent = stack.last().copied();
            match parent {
                Some(p) => nodes[p.0].children.push(id),
                None => {
                    if is_element {
                        if root.is_some() {
                            return Err(malformed(format!(
                                "multiple root elements (second at position {})",
                                reader.buffer_position()
                            )));
                        }
                        root = Some(id);
                    }
                    top.push(id);
                }
            }
            nodes.push(Node {
                kind,
                parent,
                children: Vec::new(),
            });
            if opens {
                stack.push(id);
            }
        }

        if let Some(open) = stack.last() {
            let tag = match &nodes[open.0].kind {
                NodeKind::Element(e) => e.tag.clone(),
                NodeKind::Raw(_) => String::new(),
            };
            return Err(malformed(format!("unclosed element <{}>", tag)));
        }
        let root = root.ok_or_else(|| malformed("no root element".to_string()))?;

        Ok(Self { nodes, top, root })
    }

    /// Render the tree back to arch text.
    pub fn to_xml(&self) -> Result<String, ViewError> {
        let mut out = String::new();
        for id in &self.top {
            self.write_node(&mut out, *id)
                .map_err(|e| ViewError::Serialization(e.to_string()))?;
        }
        Ok(out)
    }

    fn write_node(&self, out: &mut String, id: NodeId) -> std::fmt::Result {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Raw(text) => out.write_str(text),
            NodeKind::Element(element) => {
                write!(out, "<{}", element.tag)?;
                for (key, value) in &element.attributes {
                    write!(out, r#" {}="{}""#, key, xml_escape(value))?;
                }
                if node.children.is_empty() {
                    return out.write_str("/>");
                }
                out.write_char('>')?;
                for child in &node.children {
                    self.write_node(out, *child)?;
                }
                write!(out, "</{}>", element.tag)
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Raw(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Raw(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `id` itself followed by its ancestors up to the root.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.parent(*current))
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match &node.kind {
                NodeKind::Element(e) => Some((NodeId(i), e)),
                NodeKind::Raw(_) => None,
            })
    }

    /// Ids of all elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .filter(|(_, e)| e.tag == tag)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Source form of a non-element event. Text content is kept escaped.
fn raw_markup(event: &Event<'_>) -> String {
    match event {
        Event::Text(t) => String::from_utf8_lossy(t).into_owned(),
        Event::CData(c) => format!("<![CDATA[{}]]>", String::from_utf8_lossy(c)),
        Event::Comment(c) => format!("<!--{}-->", String::from_utf8_lossy(c)),
        Event::Decl(d) => format!("<?{}?>", String::from_utf8_lossy(d)),
        Event::PI(p) => format!("<?{}?>", String::from_utf8_lossy(p)),
        Event::DocType(d) => format!("<!DOCTYPE {}>", String::from_utf8_lossy(d)),
        _ => String::new(),
    }
}

/// Escape text for use inside a double-quoted attribute value.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
