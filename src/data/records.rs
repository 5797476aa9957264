use std::borrow::Cow;

use super::osm::{OsmId, RawElement};

pub const NODE_FIELDS: &[&str] = &["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"];
pub const NODE_TAGS_FIELDS: &[&str] = &["id", "key", "value", "type"];
pub const WAY_FIELDS: &[&str] = &["id", "user", "uid", "version", "changeset", "timestamp"];
pub const WAY_TAGS_FIELDS: &[&str] = &["id", "key", "value", "type"];
pub const WAY_NODES_FIELDS: &[&str] = &["id", "node_id", "position"];

/// A row of one output table. `values` yields one cell per entry of
/// `fields()`, in the same order; `None` is an absent attribute.
pub trait TabularRecord {
    fn fields() -> &'static [&'static str];
    fn values(&self) -> Vec<Option<Cow<'_, str>>>;

    fn value(&self, field: &str) -> Option<Cow<'_, str>> {
        let index = Self::fields().iter().position(|name| *name == field)?;
        self.values().into_iter().nth(index).flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    pub id: OsmId,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub user: Option<String>,
    pub uid: Option<String>,
    pub version: Option<String>,
    pub changeset: Option<String>,
    pub timestamp: Option<String>,
}

impl From<&RawElement> for NodeRecord {
    fn from(element: &RawElement) -> Self {
        let attr = |name: &str| element.attribute(name).map(str::to_string);
        NodeRecord {
            id: element.id.clone(),
            lat: attr("lat"),
            lon: attr("lon"),
            user: attr("user"),
            uid: attr("uid"),
            version: attr("version"),
            changeset: attr("changeset"),
            timestamp: attr("timestamp"),
        }
    }
}

impl TabularRecord for NodeRecord {
    fn fields() -> &'static [&'static str] {
        NODE_FIELDS
    }

    fn values(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            Some(Cow::Borrowed(self.id.as_str())),
            self.lat.as_deref().map(Cow::Borrowed),
            self.lon.as_deref().map(Cow::Borrowed),
            self.user.as_deref().map(Cow::Borrowed),
            self.uid.as_deref().map(Cow::Borrowed),
            self.version.as_deref().map(Cow::Borrowed),
            self.changeset.as_deref().map(Cow::Borrowed),
            self.timestamp.as_deref().map(Cow::Borrowed),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayRecord {
    pub id: OsmId,
    pub user: Option<String>,
    pub uid: Option<String>,
    pub version: Option<String>,
    pub changeset: Option<String>,
    pub timestamp: Option<String>,
}

impl From<&RawElement> for WayRecord {
    fn from(element: &RawElement) -> Self {
        let attr = |name: &str| element.attribute(name).map(str::to_string);
        WayRecord {
            id: element.id.clone(),
            user: attr("user"),
            uid: attr("uid"),
            version: attr("version"),
            changeset: attr("changeset"),
            timestamp: attr("timestamp"),
        }
    }
}

impl TabularRecord for WayRecord {
    fn fields() -> &'static [&'static str] {
        WAY_FIELDS
    }

    fn values(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            Some(Cow::Borrowed(self.id.as_str())),
            self.user.as_deref().map(Cow::Borrowed),
            self.uid.as_deref().map(Cow::Borrowed),
            self.version.as_deref().map(Cow::Borrowed),
            self.changeset.as_deref().map(Cow::Borrowed),
            self.timestamp.as_deref().map(Cow::Borrowed),
        ]
    }
}

/// A tag after normalization, split into namespace (`tag_type`) and local key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTag {
    pub id: OsmId,
    pub key: String,
    pub value: String,
    pub tag_type: String,
}

impl TabularRecord for NormalizedTag {
    fn fields() -> &'static [&'static str] {
        NODE_TAGS_FIELDS
    }

    fn values(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            Some(Cow::Borrowed(self.id.as_str())),
            Some(Cow::Borrowed(self.key.as_str())),
            Some(Cow::Borrowed(self.value.as_str())),
            Some(Cow::Borrowed(self.tag_type.as_str())),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRef {
    pub id: OsmId,
    pub node_id: OsmId,
    pub position: usize,
}

impl TabularRecord for WayNodeRef {
    fn fields() -> &'static [&'static str] {
        WAY_NODES_FIELDS
    }

    fn values(&self) -> Vec<Option<Cow<'_, str>>> {
        vec![
            Some(Cow::Borrowed(self.id.as_str())),
            Some(Cow::Borrowed(self.node_id.as_str())),
            Some(Cow::Owned(self.position.to_string())),
        ]
    }
}

/// Everything one source element contributes to the output tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedElement {
    Node {
        node: NodeRecord,
        tags: Vec<NormalizedTag>,
    },
    Way {
        way: WayRecord,
        nodes: Vec<WayNodeRef>,
        tags: Vec<NormalizedTag>,
    },
}

impl ShapedElement {
    pub fn id(&self) -> &str {
        match self {
            ShapedElement::Node { node, .. } => &node.id,
            ShapedElement::Way { way, .. } => &way.id,
        }
    }

    pub fn tags(&self) -> &[NormalizedTag] {
        match self {
            ShapedElement::Node { tags, .. } | ShapedElement::Way { tags, .. } => tags,
        }
    }
}
