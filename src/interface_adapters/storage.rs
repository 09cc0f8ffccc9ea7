use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::domain::ports::StorageCache;

// Storage cache adapter keeping one JSON file per key under a data
// directory. Writes land in a temp file first and move into place.
#[derive(Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Keys may carry separators and uuids; everything outside a small safe
    // set becomes a dash.
    fn entry_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                    ch
                } else {
                    '-'
                }
            })
            .collect();
        self.root.join(format!("{sanitized}.json"))
    }
}

#[async_trait]
impl StorageCache for JsonFileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, String> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), String> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|err| err.to_string())?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await.map_err(|err| err.to_string())?;
        fs::rename(&tmp, &path).await.map_err(|err| err.to_string())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}
