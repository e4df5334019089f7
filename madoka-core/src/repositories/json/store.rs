use std::path::{Path, PathBuf};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use crate::Error;

/// One JSON document, read wholesale at startup and rewritten wholesale after every
/// mutation.
///
/// Reads go through a blocking `RwLock`. Writers hold an async lock from mutation until
/// the file is replaced, so saves land in mutation order. A mutation becomes visible
/// to readers only after its document is on disk.
pub struct JsonStore<T> {
    path: PathBuf,
    data: RwLock<T>,
    write_lock: Mutex<()>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Loads `path`; a missing file starts empty, a corrupt one is an error.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => T::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", path.display());
                T::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.data.read())
    }

    /// Applies `f` to a copy, persists it and then swaps it in. On error the
    /// in-memory document is unchanged.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.data.read().clone();
        let result = f(&mut next);
        let bytes = serde_json::to_vec_pretty(&next)?;
        write_atomic(&self.path, &bytes).await?;
        *self.data.write() = next;
        Ok(result)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!("Failed to replace {}: {}", path.display(), e);
        return Err(e.into());
    }
    Ok(())
}
