//! Declared schemas for the five output tables and a validator that checks
//! shaped records against them before they are written.
//!
//! Every field is checked by attempting its coercion: `id`, `uid`,
//! `changeset`, `node_id` and `position` must parse as integers, `lat` and
//! `lon` as floating point numbers, and everything else is a string. This is
//! roughly an order of magnitude slower than writing unchecked, so runs over
//! full extracts normally leave it off.

use crate::data::records::{NormalizedTag, ShapedElement, TabularRecord, WayNodeRef};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        name,
        required: true,
        kind,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [FieldRule],
}

pub const NODE_SCHEMA: RecordSchema = RecordSchema {
    name: "node",
    fields: &[
        required("id", FieldKind::Integer),
        required("lat", FieldKind::Float),
        required("lon", FieldKind::Float),
        required("user", FieldKind::String),
        required("uid", FieldKind::Integer),
        required("version", FieldKind::String),
        required("changeset", FieldKind::Integer),
        required("timestamp", FieldKind::String),
    ],
};

const TAG_FIELDS: &[FieldRule] = &[
    required("id", FieldKind::Integer),
    required("key", FieldKind::String),
    required("value", FieldKind::String),
    required("type", FieldKind::String),
];

pub const NODE_TAGS_SCHEMA: RecordSchema = RecordSchema {
    name: "node_tags",
    fields: TAG_FIELDS,
};

pub const WAY_SCHEMA: RecordSchema = RecordSchema {
    name: "way",
    fields: &[
        required("id", FieldKind::Integer),
        required("user", FieldKind::String),
        required("uid", FieldKind::Integer),
        required("version", FieldKind::String),
        required("changeset", FieldKind::Integer),
        required("timestamp", FieldKind::String),
    ],
};

pub const WAY_NODES_SCHEMA: RecordSchema = RecordSchema {
    name: "way_nodes",
    fields: &[
        required("id", FieldKind::Integer),
        required("node_id", FieldKind::Integer),
        required("position", FieldKind::Integer),
    ],
};

pub const WAY_TAGS_SCHEMA: RecordSchema = RecordSchema {
    name: "way_tags",
    fields: TAG_FIELDS,
};

fn coercion_error(value: &str, kind: FieldKind) -> Option<String> {
    let ok = match kind {
        FieldKind::Integer => value.trim().parse::<i64>().is_ok(),
        FieldKind::Float => value.trim().parse::<f64>().is_ok(),
        FieldKind::String => true,
    };
    if ok {
        None
    } else {
        let kind = match kind {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::String => "string",
        };
        Some(format!("value '{value}' cannot be coerced to {kind}"))
    }
}

/// Checks one record; on failure returns the first offending field and every
/// problem found with it.
pub fn check_record<R: TabularRecord>(record: &R, schema: &RecordSchema) -> std::result::Result<(), (String, Vec<String>)> {
    for rule in schema.fields {
        let mut errors = Vec::new();
        match record.value(rule.name) {
            None if rule.required => errors.push("required field".to_string()),
            None => (),
            Some(value) => errors.extend(coercion_error(&value, rule.kind)),
        }
        if !errors.is_empty() {
            return Err((rule.name.to_string(), errors));
        }
    }
    Ok(())
}

pub fn validate_record<R: TabularRecord>(record: &R, schema: &RecordSchema) -> Result<()> {
    check_record(record, schema).map_err(|(field, errors)| Error::Validation {
        element: schema.name.to_string(),
        field,
        errors,
    })
}

fn validate_list<R: TabularRecord>(records: &[R], schema: &RecordSchema, element: &str) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        check_record(record, schema).map_err(|(field, errors)| Error::Validation {
            element: element.to_string(),
            field: format!("{}[{index}].{field}", schema.name),
            errors,
        })?;
    }
    Ok(())
}

pub fn validate_shaped(shaped: &ShapedElement) -> Result<()> {
    match shaped {
        ShapedElement::Node { node, tags } => {
            validate_record(node, &NODE_SCHEMA)?;
            validate_list::<NormalizedTag>(tags, &NODE_TAGS_SCHEMA, NODE_SCHEMA.name)
        }
        ShapedElement::Way { way, nodes, tags } => {
            validate_record(way, &WAY_SCHEMA)?;
            validate_list::<WayNodeRef>(nodes, &WAY_NODES_SCHEMA, WAY_SCHEMA.name)?;
            validate_list::<NormalizedTag>(tags, &WAY_TAGS_SCHEMA, WAY_SCHEMA.name)
        }
    }
}
