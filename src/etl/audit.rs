//! Statistics over a whole map: which keys appear, how they are spelled,
//! who contributed, and the raw values of the keys the cleaning rules care
//! about. The summary is built by folding `audit_element` over the element
//! stream and is written as JSON; its street names can seed a later run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::clean::classify::{has_problem_chars, key_type, KeyType};
use crate::clean::rules::{HOUSE_NUMBER_KEY, STREET_KEY};
use crate::config::UserConfig;
use crate::data::osm::{ElementKind, RawElement, RawTag};
use crate::errors::{Error, Result};
use crate::etl::parse_osm::{open_osm, OsmElements};
use crate::etl::Etl;

pub const ETL_NAME: &str = "audit";
pub const OUTPUT_FILE_NAME: &str = "audit.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTypeCounts {
    pub lower: u64,
    pub lower_colon: u64,
    pub problemchars: u64,
    pub other: u64,
}

impl KeyTypeCounts {
    fn add(&mut self, key_type: KeyType) {
        match key_type {
            KeyType::Lower => self.lower += 1,
            KeyType::LowerColon => self.lower_colon += 1,
            KeyType::ProblemChars => self.problemchars += 1,
            KeyType::Other => self.other += 1,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Elements and their children counted by XML tag name.
    pub element_counts: BTreeMap<String, u64>,
    pub key_types: KeyTypeCounts,
    pub problem_tags: Vec<RawTag>,
    pub tag_keys: BTreeMap<String, u64>,
    /// Distinct `uid` attributes.
    pub users: BTreeSet<String>,
    pub non_integer_housenumbers: Vec<String>,
    pub streets: BTreeMap<String, u64>,
    /// Value frequencies for each audited key.
    pub tag_values: BTreeMap<String, BTreeMap<String, u64>>,
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    match counts.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            counts.insert(key.to_string(), 1);
        }
    }
}

fn audit_tag(summary: &mut AuditSummary, tag: &RawTag, audited_keys: &[String]) {
    summary.key_types.add(key_type(&tag.key));
    if has_problem_chars(&tag.key) {
        summary.problem_tags.push(tag.clone());
    }
    bump(&mut summary.tag_keys, &tag.key);

    if tag.key == HOUSE_NUMBER_KEY && tag.value.parse::<i64>().is_err() {
        summary.non_integer_housenumbers.push(tag.value.clone());
    }
    if tag.key == STREET_KEY {
        bump(&mut summary.streets, &tag.value);
    }
    if audited_keys.iter().any(|key| *key == tag.key) {
        bump(summary.tag_values.entry(tag.key.clone()).or_default(), &tag.value);
    }
}

/// Folds one element into the summary.
pub fn audit_element(mut summary: AuditSummary, element: &RawElement, audited_keys: &[String]) -> AuditSummary {
    bump(&mut summary.element_counts, element.kind.as_str());
    if let Some(uid) = element.attribute("uid") {
        summary.users.insert(uid.to_string());
    }
    for child in &element.children {
        bump(&mut summary.element_counts, child.tag_name());
    }
    for tag in element.tags() {
        audit_tag(&mut summary, tag, audited_keys);
    }
    summary
}

pub fn audit<I>(elements: I, audited_keys: &[String]) -> Result<AuditSummary>
where
    I: IntoIterator<Item = Result<RawElement>>,
{
    elements
        .into_iter()
        .try_fold(AuditSummary::default(), |summary, element| {
            Ok(audit_element(summary, &element?, audited_keys))
        })
}

pub fn load_summary(path: &Path) -> Result<AuditSummary> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Street names recorded by an earlier audit.
pub fn load_known_streets(path: &Path) -> Result<Vec<String>> {
    Ok(load_summary(path)?.streets.into_keys().collect())
}

pub struct AuditEtl {
    data_path: PathBuf,
    output_path: PathBuf,
    audited_keys: Vec<String>,
    progress: bool,
    summary: AuditSummary,
}

impl AuditEtl {
    pub fn new(config: &UserConfig) -> AuditEtl {
        AuditEtl {
            data_path: config.data_path.clone(),
            output_path: config.dest_path.join(OUTPUT_FILE_NAME),
            audited_keys: config.audited_keys.clone(),
            progress: config.progress,
            summary: AuditSummary::default(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn summary(&self) -> &AuditSummary {
        &self.summary
    }
}

impl Etl for AuditEtl {
    type Input = RawElement;
    type Output = RawElement;
    type Source = OsmElements<Box<dyn std::io::BufRead>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn show_progress(&self) -> bool {
        self.progress
    }

    fn extract(&mut self) -> Result<Self::Source> {
        open_osm(&self.data_path, &ElementKind::ALL)
    }

    fn transform(&mut self, input: RawElement) -> Result<Option<RawElement>> {
        Ok(Some(input))
    }

    fn load(&mut self, output: RawElement) -> Result<()> {
        let summary = mem::take(&mut self.summary);
        self.summary = audit_element(summary, &output, &self.audited_keys);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(dir) = self.output_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.output_path).map_err(|source| Error::Open {
            path: self.output_path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.summary)?;
        writer.flush()?;

        info!(
            etl_name = ETL_NAME,
            users = self.summary.users.len() as u64,
            tag_keys = self.summary.tag_keys.len() as u64,
            problem_tags = self.summary.problem_tags.len() as u64,
            streets = self.summary.streets.len() as u64;
            "Audit summary written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        vec!["name".to_string(), "source".to_string()]
    }

    fn sample() -> Vec<Result<RawElement>> {
        vec![
            Ok(RawElement::new(ElementKind::Node, "1")
                .with_attribute("uid", "10")
                .with_tag("addr:housenumber", "12B")
                .with_tag("addr:street", "Los Leones")
                .with_tag("name", "Farmacia")),
            Ok(RawElement::new(ElementKind::Node, "2")
                .with_attribute("uid", "11")
                .with_tag("addr:housenumber", "440")
                .with_tag("addr:street", "Los Leones")
                .with_tag("fixme?", "check")),
            Ok(RawElement::new(ElementKind::Way, "3")
                .with_attribute("uid", "10")
                .with_node_ref("1")
                .with_node_ref("2")
                .with_tag("source", "bing")
                .with_tag("FIXME", "x")),
        ]
    }

    #[test]
    fn folds_counts_over_stream() {
        let summary = audit(sample(), &keys()).unwrap();

        assert_eq!(summary.element_counts["node"], 2);
        assert_eq!(summary.element_counts["way"], 1);
        assert_eq!(summary.element_counts["nd"], 2);
        assert_eq!(summary.element_counts["tag"], 8);
        assert_eq!(summary.users.len(), 2);
        assert_eq!(summary.streets["Los Leones"], 2);
        assert_eq!(summary.non_integer_housenumbers, vec!["12B".to_string()]);
        assert_eq!(summary.tag_values["name"]["Farmacia"], 1);
        assert_eq!(summary.tag_values["source"]["bing"], 1);
        assert!(!summary.tag_values.contains_key("highway"));
    }

    #[test]
    fn key_types_and_problem_tags() {
        let summary = audit(sample(), &keys()).unwrap();
        assert_eq!(
            summary.key_types,
            KeyTypeCounts {
                lower: 2,
                lower_colon: 4,
                problemchars: 1,
                other: 1,
            }
        );
        assert_eq!(summary.problem_tags, vec![RawTag::new("fixme?", "check")]);
    }

    #[test]
    fn read_error_stops_the_fold() {
        let mut elements = sample();
        elements.insert(1, Err(Error::malformed(10, "broken")));
        assert!(audit(elements, &keys()).is_err());
    }

    #[test]
    fn etl_writes_summary_that_seeds_streets() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("map.osm");
        std::fs::write(
            &data_path,
            r#"<osm><node id="1" uid="5"><tag k="addr:street" v="Avenida Grecia"/></node></osm>"#,
        )
        .unwrap();

        let config = UserConfig::new(&data_path, dir.path().join("out"));
        let mut etl = AuditEtl::new(&config);
        etl.process().unwrap();

        let streets = load_known_streets(etl.output_path()).unwrap();
        assert_eq!(streets, vec!["Avenida Grecia".to_string()]);
        assert_eq!(load_summary(etl.output_path()).unwrap(), *etl.summary());
    }
}
