use std::fmt;

use serde::{Deserialize, Serialize};

/// OSM ids are kept as the text found in the file; the validator decides
/// whether they coerce to integers.
pub type OsmId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [ElementKind::Node, ElementKind::Way, ElementKind::Relation];

    pub fn from_tag_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(ElementKind::Node),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTag {
    pub key: String,
    pub value: String,
}

impl RawTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        RawTag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Direct children of a node, way or relation, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawChild {
    Tag(RawTag),
    NodeRef(OsmId),
    Member {
        member_type: String,
        member_ref: OsmId,
        role: String,
    },
}

impl RawChild {
    pub fn tag_name(&self) -> &'static str {
        match self {
            RawChild::Tag(_) => "tag",
            RawChild::NodeRef(_) => "nd",
            RawChild::Member { .. } => "member",
        }
    }
}

/// One top-level element of the map with its attributes kept in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub kind: ElementKind,
    pub id: OsmId,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RawChild>,
}

impl RawElement {
    pub fn new(kind: ElementKind, id: impl Into<OsmId>) -> Self {
        let id = id.into();
        RawElement {
            kind,
            attributes: vec![("id".to_string(), id.clone())],
            id,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.children.push(RawChild::Tag(RawTag::new(key, value)));
        self
    }

    pub fn with_node_ref(mut self, node_ref: impl Into<OsmId>) -> Self {
        self.children.push(RawChild::NodeRef(node_ref.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn tags(&self) -> impl Iterator<Item = &RawTag> {
        self.children.iter().filter_map(|child| match child {
            RawChild::Tag(tag) => Some(tag),
            _ => None,
        })
    }
}
