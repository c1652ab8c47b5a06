use crate::core::Result;
use crate::model::{Actor, Scene};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Exported world data: the actor and scene collections plus stored
/// settings keyed by `namespace.key`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    /// Records that could not be read. They are written back unchanged.
    #[serde(skip)]
    pub unreadable: Vec<UnreadableRecord>,
}

/// An actor or scene document that does not fit the record model.
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableRecord {
    pub collection: &'static str,
    /// Position in the collection as loaded.
    pub index: usize,
    pub raw: Value,
    pub error: String,
}

impl UnreadableRecord {
    /// The `_id` of the raw document, when it has a string one.
    pub fn id(&self) -> Option<&str> {
        self.raw.get("_id").and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
struct RawWorld {
    #[serde(default)]
    actors: Vec<Value>,
    #[serde(default)]
    scenes: Vec<Value>,
    #[serde(default)]
    settings: BTreeMap<String, Value>,
}

fn read_records<T: DeserializeOwned>(
    collection: &'static str,
    raw: Vec<Value>,
    unreadable: &mut Vec<UnreadableRecord>,
) -> Vec<T> {
    let mut records = Vec::with_capacity(raw.len());
    for (index, document) in raw.into_iter().enumerate() {
        match T::deserialize(&document) {
            Ok(record) => records.push(record),
            Err(err) => {
                let record = UnreadableRecord {
                    collection,
                    index,
                    raw: document,
                    error: err.to_string(),
                };
                warn!(
                    "Skipping unreadable {} record {} ({}): {}",
                    collection,
                    index,
                    record.id().unwrap_or("no id"),
                    record.error
                );
                unreadable.push(record);
            }
        }
    }
    records
}

/// A world snapshot stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct WorldFile {
    path: PathBuf,
}

impl WorldFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the world, one record at a time. A record that does not parse
    /// is set aside in [`WorldSnapshot::unreadable`] instead of failing the
    /// whole load.
    pub async fn load(&self) -> Result<WorldSnapshot> {
        let bytes = fs::read(&self.path).await?;
        let raw: RawWorld = serde_json::from_slice(&bytes)?;

        let mut unreadable = Vec::new();
        let actors = read_records("actors", raw.actors, &mut unreadable);
        let scenes = read_records("scenes", raw.scenes, &mut unreadable);
        Ok(WorldSnapshot {
            actors,
            scenes,
            settings: raw.settings,
            unreadable,
        })
    }

    /// Writes to a sibling temp file, syncs it, then renames it over the
    /// target.
    pub async fn save(&self, snapshot: &WorldSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut document = serde_json::to_value(snapshot)?;
        // Indices ascend per collection, so inserting in order restores
        // every record to its loaded position.
        for record in &snapshot.unreadable {
            if let Some(Value::Array(items)) = document.get_mut(record.collection) {
                let at = record.index.min(items.len());
                items.insert(at, record.raw.clone());
            }
        }
        let serialized = serde_json::to_vec_pretty(&document)?;
        let temp_path = self.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&serialized).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
