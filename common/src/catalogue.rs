use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("catalogue not found at {path:?}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no catalogue entry for {0:?}")]
    UnknownKey(String),
    #[error(transparent)]
    Yaml(#[from] serde_yml::Error),
}

/// One experiment recorded in the catalogue. Unknown fields (notes,
/// provenance paths, ...) are ignored; only what the reports need is
/// kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub plot_name: String,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Mapping from the short experiment identifier (the data hash) to its
/// display metadata.
pub type Catalogue = BTreeMap<String, CatalogueEntry>;

pub fn load(path: &Path) -> Result<Catalogue, CatalogueError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_yml::from_str(&text)?)
}

pub fn lookup<'c>(catalogue: &'c Catalogue, key: &str) -> Result<&'c CatalogueEntry, CatalogueError> {
    catalogue
        .get(key)
        .ok_or_else(|| CatalogueError::UnknownKey(key.to_owned()))
}
