use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::data::records::{NodeRecord, NormalizedTag, ShapedElement, TabularRecord, WayNodeRef, WayRecord};
use crate::errors::{Error, Result};

pub const NODES_FILE_NAME: &str = "nodes.csv";
pub const NODE_TAGS_FILE_NAME: &str = "nodes_tags.csv";
pub const WAYS_FILE_NAME: &str = "ways.csv";
pub const WAY_NODES_FILE_NAME: &str = "ways_nodes.csv";
pub const WAY_TAGS_FILE_NAME: &str = "ways_tags.csv";

pub const OUTPUT_FILE_NAMES: [&str; 5] = [
    NODES_FILE_NAME,
    NODE_TAGS_FILE_NAME,
    WAYS_FILE_NAME,
    WAY_NODES_FILE_NAME,
    WAY_TAGS_FILE_NAME,
];

/// Row counts per output table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub nodes: u64,
    pub node_tags: u64,
    pub ways: u64,
    pub way_nodes: u64,
    pub way_tags: u64,
}

/// The five output tables. Each gets its header on creation and rows in the
/// order elements are written. The underlying `csv::Writer`s flush on drop,
/// so rows already written survive an aborted run.
pub struct TableWriter<W: Write> {
    nodes: Writer<W>,
    node_tags: Writer<W>,
    ways: Writer<W>,
    way_nodes: Writer<W>,
    way_tags: Writer<W>,
    counts: TableCounts,
}

fn create_table(dir: &Path, file_name: &str) -> Result<File> {
    let path = dir.join(file_name);
    File::create(&path).map_err(|source| Error::Open { path, source })
}

impl TableWriter<File> {
    /// Creates (or truncates) the five CSV files inside `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| Error::Open {
            path: dir.to_path_buf(),
            source,
        })?;
        TableWriter::from_writers(
            create_table(dir, NODES_FILE_NAME)?,
            create_table(dir, NODE_TAGS_FILE_NAME)?,
            create_table(dir, WAYS_FILE_NAME)?,
            create_table(dir, WAY_NODES_FILE_NAME)?,
            create_table(dir, WAY_TAGS_FILE_NAME)?,
        )
    }
}

fn write_header<W: Write, R: TabularRecord>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_record(R::fields())?;
    Ok(())
}

fn write_row<W: Write, R: TabularRecord>(writer: &mut Writer<W>, record: &R) -> Result<()> {
    let row = record.values();
    writer.write_record(row.iter().map(|value| value.as_deref().unwrap_or("")))?;
    Ok(())
}

fn write_rows<W: Write, R: TabularRecord>(writer: &mut Writer<W>, records: &[R]) -> Result<u64> {
    for record in records {
        write_row(writer, record)?;
    }
    Ok(records.len() as u64)
}

impl<W: Write> TableWriter<W> {
    pub fn from_writers(nodes: W, node_tags: W, ways: W, way_nodes: W, way_tags: W) -> Result<Self> {
        let mut writer = TableWriter {
            nodes: Writer::from_writer(nodes),
            node_tags: Writer::from_writer(node_tags),
            ways: Writer::from_writer(ways),
            way_nodes: Writer::from_writer(way_nodes),
            way_tags: Writer::from_writer(way_tags),
            counts: TableCounts::default(),
        };
        write_header::<W, NodeRecord>(&mut writer.nodes)?;
        write_header::<W, NormalizedTag>(&mut writer.node_tags)?;
        write_header::<W, WayRecord>(&mut writer.ways)?;
        write_header::<W, WayNodeRef>(&mut writer.way_nodes)?;
        write_header::<W, NormalizedTag>(&mut writer.way_tags)?;
        Ok(writer)
    }

    pub fn counts(&self) -> TableCounts {
        self.counts
    }

    pub fn write(&mut self, shaped: &ShapedElement) -> Result<()> {
        match shaped {
            ShapedElement::Node { node, tags } => {
                write_row(&mut self.nodes, node)?;
                self.counts.nodes += 1;
                self.counts.node_tags += write_rows(&mut self.node_tags, tags)?;
            }
            ShapedElement::Way { way, nodes, tags } => {
                write_row(&mut self.ways, way)?;
                self.counts.ways += 1;
                self.counts.way_nodes += write_rows(&mut self.way_nodes, nodes)?;
                self.counts.way_tags += write_rows(&mut self.way_tags, tags)?;
            }
        }
        Ok(())
    }

    /// Flushes every table, even when an earlier one fails; the first error
    /// is returned.
    pub fn flush(&mut self) -> Result<()> {
        let results = [
            self.nodes.flush(),
            self.node_tags.flush(),
            self.ways.flush(),
            self.way_nodes.flush(),
            self.way_tags.flush(),
        ];
        results.into_iter().collect::<std::io::Result<Vec<()>>>()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writers.
    pub fn into_inner(self) -> Result<[W; 5]> {
        let into_inner = |writer: Writer<W>| writer.into_inner().map_err(|err| Error::Io(err.into_error()));
        Ok([
            into_inner(self.nodes)?,
            into_inner(self.node_tags)?,
            into_inner(self.ways)?,
            into_inner(self.way_nodes)?,
            into_inner(self.way_tags)?,
        ])
    }
}
