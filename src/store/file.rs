use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{DraftStore, StoreError};

/// One file per key under a directory, written via rename so a crash never leaves half a
/// snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    // Keys are hex-encoded so any string maps to a distinct, portable file name.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key.as_bytes())))
    }
}

#[async_trait]
impl DraftStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_store() -> FileStore {
        FileStore::new(std::env::temp_dir().join(format!("exam-draft-test-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let store = scratch_store();
        store.set("exam-draft", r#"{"currentStep":1}"#).await.unwrap();

        let reopened = FileStore::new(store.dir().to_path_buf());
        assert_eq!(
            reopened.get("exam-draft").await.unwrap().as_deref(),
            Some(r#"{"currentStep":1}"#)
        );

        fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_and_missing_dir_read_as_none() {
        let store = scratch_store();
        assert_eq!(store.get("exam-draft").await.unwrap(), None);
        store.remove("exam-draft").await.unwrap();
    }

    #[tokio::test]
    async fn keys_with_path_characters_stay_inside_dir() {
        let store = scratch_store();
        store.set("../escape/../key", "v").await.unwrap();
        store.set("other key", "w").await.unwrap();

        assert_eq!(store.get("../escape/../key").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("other key").await.unwrap().as_deref(), Some("w"));

        let mut entries = fs::read_dir(store.dir()).await.unwrap();
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            assert_eq!(entry.path().parent(), Some(store.dir()));
            count += 1;
        }
        assert_eq!(count, 2);

        store.remove("../escape/../key").await.unwrap();
        assert_eq!(store.get("../escape/../key").await.unwrap(), None);
        fs::remove_dir_all(store.dir()).await.unwrap();
    }
}
