use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Collection, Error, Result};

#[allow(unused_imports)]
use crate::engine::MemStore;

/// Records of one collection, keyed by id.
pub type CollectionData = HashMap<String, serde_json::Value>;

const META_FILE: &str = "vault.meta";

/// Unencrypted vault metadata kept next to the collection files.
///
/// Neither field is secret: the salt only has to be unique per installation and
/// the key check is an ordinary encrypted envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultMeta {
    /// Hex-encoded key derivation salt.
    pub salt: String,
    /// Envelope encrypted with the session key, used to reject wrong passphrases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_check: Option<serde_json::Value>,
}

/// Handles disk I/O for the [`MemStore`].
///
/// Persistence uses an atomic "write-then-rename" strategy to ensure data integrity.
/// Each collection is stored in its own `.json` file.
pub struct Persistence {
    data_dir: PathBuf,
}

impl Persistence {
    /// Initializes a new `Persistence` handler in the specified directory.
    ///
    /// If the directory does not exist, it will be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Writes a single collection to its JSON file atomically.
    pub fn save_collection(&self, collection: Collection, data: &CollectionData) -> Result<()> {
        let file_path = self.data_dir.join(format!("{}.json", collection));
        write_atomic(&file_path, &serde_json::to_vec_pretty(data)?)
    }

    /// Loads every collection file found in the data directory.
    ///
    /// A `.json` file whose name is not a known collection is an error: it means the
    /// directory was written by a different schema version. An unreadable or corrupt
    /// file is also an error; the file is left as it is on disk.
    pub fn load_all(&self) -> Result<HashMap<Collection, CollectionData>> {
        let mut all_data = HashMap::new();

        if !self.data_dir.exists() {
            return Ok(all_data);
        }

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let collection: Collection = stem.parse()?;

            let corrupt = |reason: String| Error::CorruptCollection { path: path.clone(), reason };
            let content = fs::read(&path).map_err(|e| corrupt(e.to_string()))?;
            let data: CollectionData = serde_json::from_slice(&content).map_err(|e| corrupt(e.to_string()))?;

            all_data.insert(collection, data);
        }

        Ok(all_data)
    }

    /// Reads the vault metadata, if this directory has been unlocked before.
    pub fn load_meta(&self) -> Result<Option<VaultMeta>> {
        let path = self.data_dir.join(META_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    pub fn save_meta(&self, meta: &VaultMeta) -> Result<()> {
        write_atomic(&self.data_dir.join(META_FILE), &serde_json::to_vec_pretty(meta)?)
    }
}

fn write_atomic(file_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_path = file_path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, file_path)?;
    Ok(())
}
