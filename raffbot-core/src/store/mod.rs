//! src/store/mod.rs
//!
//! File-backed raffle store. The whole set of raffles lives in memory and is
//! flushed to a single JSON document (an object keyed by raffle id) after every
//! mutation.
//!
//! All writes go through [`RaffleStore::mutate`], which holds the store lock
//! for the whole read-modify-flush cycle. Two concurrent mutations therefore
//! always see each other's effects, and a failed flush leaves the in-memory
//! state untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use raffbot_common::models::Raffle;

use crate::Error;

pub type RaffleMap = BTreeMap<String, Raffle>;

pub struct RaffleStore {
    path: PathBuf,
    raffles: Mutex<RaffleMap>,
}

impl RaffleStore {
    /// Loads the store file at `path`. A missing file is an empty store; the
    /// file is only created on the first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let raffles = read_store_file(&path).await?;
        info!("Loaded {} raffle(s) from {}", raffles.len(), path.display());

        Ok(Self {
            path,
            raffles: Mutex::new(raffles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, id: &str) -> Option<Raffle> {
        let raffles = self.raffles.lock().await;
        debug!("Store lookup for raffle id={}", id);
        raffles.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<Raffle> {
        self.raffles.lock().await.values().cloned().collect()
    }

    /// Runs `f` against a working copy of the raffles under the store lock.
    ///
    /// If `f` succeeds and changed anything, the copy is flushed to disk and
    /// then becomes the live state. If `f` fails, or the flush fails, nothing
    /// changes.
    pub async fn mutate<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut RaffleMap) -> Result<T, E>,
        E: From<Error>,
    {
        let mut raffles = self.raffles.lock().await;
        let mut working = raffles.clone();
        let out = f(&mut working)?;

        if working != *raffles {
            if let Err(e) = write_store_file(&self.path, &working).await {
                error!("Failed to persist raffle store to {}: {:?}", self.path.display(), e);
                return Err(E::from(e));
            }
            *raffles = working;
        }

        Ok(out)
    }
}

/// Reads a store document. Ids are restored from the document keys.
pub async fn read_store_file(path: &Path) -> Result<RaffleMap, Error> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RaffleMap::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(RaffleMap::new());
    }

    let mut raffles: RaffleMap = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Store(format!("{} is not a valid store file: {}", path.display(), e)))?;
    for (id, raffle) in raffles.iter_mut() {
        raffle.id = id.clone();
    }
    Ok(raffles)
}

/// Writes the document next to `path` first and renames it into place, so a
/// crash mid-write never leaves a truncated store behind.
pub async fn write_store_file(path: &Path, raffles: &RaffleMap) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(raffles)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!("Flushed {} raffle(s) to {}", raffles.len(), path.display());
    Ok(())
}
