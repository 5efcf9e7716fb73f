use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rami_ledger::LedgerRecord;
use rami_types::GameId;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::traits::GameStore;

const EXTENSION: &str = "json";

/// Directory-backed game store: one `<game-id>.json` file per game.
///
/// Saves are written to a temporary file in the same directory and renamed
/// over the target, so a crash mid-write never leaves a truncated game.
#[derive(Clone, Debug)]
pub struct FileGameStore {
    root: PathBuf,
}

impl FileGameStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "file game store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `id`.
    pub fn path_for(&self, id: &GameId) -> PathBuf {
        self.root.join(format!("{id}.{EXTENSION}"))
    }
}

impl GameStore for FileGameStore {
    fn save(&self, id: &GameId, record: &LedgerRecord) -> StoreResult<()> {
        let text = codec::encode(record)?;
        let target = self.path_for(id);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        debug!(
            game = %id,
            path = %target.display(),
            rounds = record.round_history.len(),
            "game saved"
        );
        Ok(())
    }

    fn load(&self, id: &GameId) -> StoreResult<LedgerRecord> {
        let path = self.path_for(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()))
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::Corrupt {
                    id: id.clone(),
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!(game = %id, path = %path.display(), "game loaded");
        codec::decode(id, &text)
    }

    fn exists(&self, id: &GameId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }

    fn delete(&self, id: &GameId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<GameId>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match GameId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unrecognised file"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
