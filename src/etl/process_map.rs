use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;

use log::{info, warn};

use crate::clean::rules::TagNormalizer;
use crate::config::UserConfig;
use crate::data::osm::{ElementKind, RawElement};
use crate::data::records::ShapedElement;
use crate::errors::{Error, Result};
use crate::etl::audit::load_known_streets;
use crate::etl::parse_osm::{open_osm, OsmElements};
use crate::etl::shape::ElementShaper;
use crate::etl::validate::validate_shaped;
use crate::etl::write_csv::{TableCounts, TableWriter};
use crate::etl::Etl;

pub const ETL_NAME: &str = "process_map";

/// Totals for a finished (or aborted) run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub tables: TableCounts,
    pub problem_keys: u64,
}

/// Streams nodes and ways from the map into the five CSV tables, optionally
/// validating every shaped element first.
pub struct ProcessMapEtl {
    data_path: PathBuf,
    dest_path: PathBuf,
    validate: bool,
    progress: bool,
    shaper: ElementShaper,
    writer: Option<TableWriter<File>>,
    stats: RunStats,
}

impl ProcessMapEtl {
    pub fn new(config: &UserConfig) -> Result<ProcessMapEtl> {
        let normalizer = match &config.known_streets_path {
            Some(path) => TagNormalizer::with_known_streets(load_known_streets(path)?),
            None => TagNormalizer::new(),
        };
        if config.validate {
            warn!(etl_name = ETL_NAME; "Schema validation is enabled; expect a much slower run");
        }

        Ok(ProcessMapEtl {
            data_path: config.data_path.clone(),
            dest_path: config.dest_path.clone(),
            validate: config.validate,
            progress: config.progress,
            shaper: ElementShaper::new(normalizer, config.default_tag_type.clone()),
            writer: None,
            stats: RunStats::default(),
        })
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }
}

impl Etl for ProcessMapEtl {
    type Input = RawElement;
    type Output = ShapedElement;
    type Source = OsmElements<Box<dyn BufRead>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn show_progress(&self) -> bool {
        self.progress
    }

    fn extract(&mut self) -> Result<Self::Source> {
        let source = open_osm(&self.data_path, &[ElementKind::Node, ElementKind::Way])?;
        info!(
            etl_name = ETL_NAME,
            known_streets = self.shaper.normalizer().known_streets().len() as u64;
            "Opened map"
        );
        self.writer = Some(TableWriter::create(&self.dest_path)?);
        Ok(source)
    }

    fn transform(&mut self, input: RawElement) -> Result<Option<ShapedElement>> {
        let Some(shaped) = self.shaper.shape(&input) else {
            return Ok(None);
        };
        if self.validate {
            validate_shaped(&shaped)?;
        }
        Ok(Some(shaped))
    }

    fn load(&mut self, output: ShapedElement) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(&output),
            None => Err(Error::OutOfOrder {
                etl_name: ETL_NAME,
                message: "tables were not opened before loading",
            }),
        }
    }

    fn finish(&mut self) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let flushed = writer.flush();
        self.stats = RunStats {
            tables: writer.counts(),
            problem_keys: self.shaper.problem_keys(),
        };
        info!(
            etl_name = ETL_NAME,
            nodes = self.stats.tables.nodes,
            node_tags = self.stats.tables.node_tags,
            ways = self.stats.tables.ways,
            way_nodes = self.stats.tables.way_nodes,
            way_tags = self.stats.tables.way_tags,
            problem_keys = self.stats.problem_keys;
            "Tables written"
        );
        self.writer = None;
        flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_before_extract_is_out_of_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut etl = ProcessMapEtl::new(&UserConfig::new(dir.path().join("map.osm"), dir.path())).unwrap();
        let shaped = etl
            .transform(RawElement::new(ElementKind::Node, "1").with_attribute("lat", "0"))
            .unwrap()
            .unwrap();

        let err = etl.load(shaped).unwrap_err();
        assert!(matches!(err, Error::OutOfOrder { etl_name: ETL_NAME, .. }), "{err:?}");
    }

    #[test]
    fn finish_without_extract_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut etl = ProcessMapEtl::new(&UserConfig::new(dir.path().join("map.osm"), dir.path().join("out"))).unwrap();
        etl.finish().unwrap();
        assert!(!dir.path().join("out").exists());
        assert_eq!(etl.stats(), RunStats::default());
    }
}
