use log::debug;

use crate::clean::classify::{classify, DEFAULT_TAG_TYPE};
use crate::clean::rules::TagNormalizer;
use crate::data::osm::{ElementKind, RawChild, RawElement, RawTag};
use crate::data::records::{NodeRecord, NormalizedTag, ShapedElement, WayNodeRef, WayRecord};

/// Turns raw elements into table rows. Keeps the normalizer's memory of
/// street names across elements and counts keys with problem characters.
pub struct ElementShaper {
    normalizer: TagNormalizer,
    default_tag_type: String,
    problem_keys: u64,
}

impl Default for ElementShaper {
    fn default() -> Self {
        ElementShaper::new(TagNormalizer::new(), DEFAULT_TAG_TYPE)
    }
}

impl ElementShaper {
    pub fn new(normalizer: TagNormalizer, default_tag_type: impl Into<String>) -> Self {
        ElementShaper {
            normalizer,
            default_tag_type: default_tag_type.into(),
            problem_keys: 0,
        }
    }

    pub fn problem_keys(&self) -> u64 {
        self.problem_keys
    }

    pub fn normalizer(&self) -> &TagNormalizer {
        &self.normalizer
    }

    /// Shapes a node or way; anything else has no table and yields `None`.
    pub fn shape(&mut self, element: &RawElement) -> Option<ShapedElement> {
        match element.kind {
            ElementKind::Node => Some(ShapedElement::Node {
                node: NodeRecord::from(element),
                tags: element
                    .tags()
                    .map(|tag| self.shape_tag(&element.id, tag))
                    .collect(),
            }),
            ElementKind::Way => {
                let mut nodes = Vec::new();
                let mut tags = Vec::new();
                for child in &element.children {
                    match child {
                        RawChild::NodeRef(node_id) => nodes.push(WayNodeRef {
                            id: element.id.clone(),
                            node_id: node_id.clone(),
                            position: nodes.len(),
                        }),
                        RawChild::Tag(tag) => tags.push(self.shape_tag(&element.id, tag)),
                        RawChild::Member { .. } => (),
                    }
                }
                Some(ShapedElement::Way {
                    way: WayRecord::from(element),
                    nodes,
                    tags,
                })
            }
            ElementKind::Relation => None,
        }
    }

    // TODO: drop problem-character keys here once there is a decision on
    // whether they belong in the tag tables at all.
    fn shape_tag(&mut self, id: &str, raw: &RawTag) -> NormalizedTag {
        let mut tag = raw.clone();
        self.normalizer.normalize(&mut tag);

        let class = classify(&tag.key, &self.default_tag_type);
        if class.problematic {
            self.problem_keys += 1;
            debug!(id = id, key = tag.key.as_str(); "Tag key contains problem characters");
        }

        NormalizedTag {
            id: id.to_string(),
            key: class.local.to_string(),
            value: tag.value,
            tag_type: class.namespace.to_string(),
        }
    }
}
