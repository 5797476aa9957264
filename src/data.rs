//! Source elements as read from the .osm file, and the flat records they are
//! shaped into for the five output tables.

pub mod osm;
pub mod records;

pub use osm::{ElementKind, OsmId, RawChild, RawElement, RawTag};
pub use records::{NodeRecord, NormalizedTag, ShapedElement, TabularRecord, WayNodeRef, WayRecord};
