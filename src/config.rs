use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::clean::classify::DEFAULT_TAG_TYPE;
use crate::errors::{Error, Result};

fn default_tag_type() -> String {
    DEFAULT_TAG_TYPE.to_string()
}

fn default_audited_keys() -> Vec<String> {
    ["name", "addr:interpolation", "highway", "source", "id_origin"]
        .iter()
        .map(|key| key.to_string())
        .collect()
}

/// Run settings, read from a JSON file and/or the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub data_path: PathBuf,
    pub dest_path: PathBuf,
    #[serde(default)]
    pub validate: bool,
    #[serde(default = "default_tag_type")]
    pub default_tag_type: String,
    #[serde(default)]
    pub known_streets_path: Option<PathBuf>,
    #[serde(default = "default_audited_keys")]
    pub audited_keys: Vec<String>,
    #[serde(default)]
    pub progress: bool,
}

impl UserConfig {
    pub fn new(data_path: impl Into<PathBuf>, dest_path: impl Into<PathBuf>) -> Self {
        UserConfig {
            data_path: data_path.into(),
            dest_path: dest_path.into(),
            validate: false,
            default_tag_type: default_tag_type(),
            known_streets_path: None,
            audited_keys: default_audited_keys(),
            progress: false,
        }
    }
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| Error::Config(format!("could not parse {}: {err}", path.display())))
}
