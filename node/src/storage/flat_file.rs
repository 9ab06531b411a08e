use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::storage::{Result, StorageError};

/// Storage key of a committed block, assigned sequentially from 1.
pub type Identifier = u64;

/// Width of an on-disk block file name. Zero padding to a fixed width keeps
/// lexicographic and numeric ordering of the directory identical.
pub const DIGIT_CAPACITY: usize = 16;

/// Append-only block storage, one file per block in a single flat directory.
///
/// The in-memory id set always mirrors the set of well-formed files on disk:
/// `create` rebuilds it from a directory scan and `add` registers every id
/// it writes. That makes the store recoverable after a crash and
/// self-healing against stray files.
pub struct FlatFile {
    dir: PathBuf,
    ids: RwLock<BTreeSet<Identifier>>,
}

impl FlatFile {
    /// Fixed-width decimal file name for a block id.
    pub fn id_to_name(id: Identifier) -> String {
        format!("{:0width$}", id, width = DIGIT_CAPACITY)
    }

    /// Inverse of [`FlatFile::id_to_name`]. `None` unless the name is
    /// exactly [`DIGIT_CAPACITY`] decimal digits.
    pub fn name_to_id(name: &str) -> Option<Identifier> {
        if name.len() != DIGIT_CAPACITY || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse::<Identifier>().ok()
    }

    /// Opens the store at `path`, creating the directory when absent.
    ///
    /// Every entry with a well-formed name is adopted into the id set;
    /// everything else is deleted as garbage.
    pub fn create<P: Into<PathBuf>>(path: P) -> Result<FlatFile> {
        let dir = path.into();
        fs::create_dir_all(&dir)?;
        if !dir.is_dir() {
            return Err(StorageError::NotADirectory(dir.display().to_string()));
        }

        let mut ids = BTreeSet::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().and_then(Self::name_to_id) {
                Some(id) => {
                    ids.insert(id);
                }
                None => {
                    log::warn!("Removing garbage entry from block store: {name:?}");
                    if let Err(err) = fs::remove_file(entry.path()) {
                        log::warn!("Failed to remove {name:?}: {err}");
                    }
                }
            }
        }

        log::debug!(
            "Opened block store at {} with {} blocks",
            dir.display(),
            ids.len()
        );
        Ok(FlatFile {
            dir,
            ids: RwLock::new(ids),
        })
    }

    /// Writes `bytes` under `id`. Returns false without side effects when a
    /// file for `id` already exists or the file cannot be written.
    ///
    /// A crash in the middle of the write can leave a truncated file behind;
    /// the next `create` adopts it as-is. See DESIGN.md.
    pub fn add(&self, id: Identifier, bytes: &[u8]) -> bool {
        let file_name = self.dir.join(Self::id_to_name(id));

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_name)
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                log::warn!("Insertion for {id} failed, file already exists");
                return false;
            }
            Err(err) => {
                log::warn!("Cannot open file for block {id} for writing: {err}");
                return false;
            }
        };

        if let Err(err) = file.write_all(bytes) {
            log::warn!("Cannot write block {id}: {err}");
            return false;
        }

        self.ids.write().insert(id);
        true
    }

    /// Full contents of the block file for `id`, or `None` when absent or
    /// unreadable.
    pub fn get(&self, id: Identifier) -> Option<Vec<u8>> {
        let file_name = self.dir.join(Self::id_to_name(id));
        match fs::read(&file_name) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("get({id}): {err}");
                None
            }
        }
    }

    /// The maximum registered id, or 0 for an empty store.
    pub fn last_id(&self) -> Identifier {
        self.ids.read().iter().next_back().copied().unwrap_or(0)
    }

    /// Ascending snapshot of all known block ids.
    pub fn block_identifiers(&self) -> BTreeSet<Identifier> {
        self.ids.read().clone()
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Deletes every file in the store and clears the id set. The directory
    /// itself stays.
    pub fn drop_all(&self) {
        let mut ids = self.ids.write();
        match fs::read_dir(&self.dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    if let Err(err) = fs::remove_file(entry.path()) {
                        log::warn!("Failed to remove {:?}: {err}", entry.file_name());
                    }
                }
            }
            Err(err) => {
                log::warn!("Failed to list {} for drop_all: {err}", self.dir.display());
            }
        }
        ids.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_id_name_round_trip() {
        for id in [1, 9, 10, 999_999, u64::from(u32::MAX)] {
            let name = FlatFile::id_to_name(id);
            assert_eq!(name.len(), DIGIT_CAPACITY);
            assert_eq!(FlatFile::name_to_id(&name), Some(id));
        }
    }

    #[test]
    fn test_name_to_id_rejects_malformed_names() {
        assert_eq!(FlatFile::name_to_id("123"), None);
        assert_eq!(FlatFile::name_to_id("00000000000000a1"), None);
        assert_eq!(FlatFile::name_to_id("00000000000000017"), None);
        assert_eq!(FlatFile::name_to_id(""), None);
    }

    #[test]
    fn test_add_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFile::create(dir.path()).unwrap();

        assert!(store.add(1, b"genesis"));
        assert_eq!(store.get(1), Some(b"genesis".to_vec()));
        assert_eq!(store.get(2), None);
    }

    #[test]
    fn test_duplicate_add_rejected_and_original_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFile::create(dir.path()).unwrap();

        assert!(store.add(1, b"original"));
        assert!(!store.add(1, b"overwrite"));
        assert_eq!(store.get(1), Some(b"original".to_vec()));
    }

    #[test]
    fn test_last_id_is_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFile::create(dir.path()).unwrap();
        assert_eq!(store.last_id(), 0);

        for id in [5, 22, 11] {
            assert!(store.add(id, b"block"));
        }

        assert_eq!(store.last_id(), 22);
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn test_recovery_via_rescan() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FlatFile::create(dir.path()).unwrap();
            for id in [4, 17, 7] {
                assert!(store.add(id, b"block"));
            }
        }

        let reopened = FlatFile::create(dir.path()).unwrap();
        let ids: Vec<Identifier> = reopened.block_identifiers().into_iter().collect();
        assert_eq!(ids, vec![4, 7, 17]);
        assert_eq!(reopened.last_id(), 17);
    }

    #[test]
    fn test_garbage_files_purged_on_create() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FlatFile::create(dir.path()).unwrap();
            assert!(store.add(3, b"block"));
        }
        std::fs::write(dir.path().join("stray.tmp"), b"junk").unwrap();
        std::fs::write(dir.path().join("123"), b"short name").unwrap();

        let reopened = FlatFile::create(dir.path()).unwrap();

        assert_eq!(
            reopened.block_identifiers().into_iter().collect::<Vec<_>>(),
            vec![3]
        );
        assert!(!dir.path().join("stray.tmp").exists());
        assert!(!dir.path().join("123").exists());
        assert!(dir.path().join(FlatFile::id_to_name(3)).exists());
    }

    #[test]
    fn test_drop_all_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFile::create(dir.path()).unwrap();
        assert!(store.add(1, b"block"));
        assert!(store.add(2, b"block"));

        store.drop_all();

        assert_eq!(store.last_id(), 0);
        assert!(store.block_identifiers().is_empty());
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // The store stays usable after a reset.
        assert!(store.add(1, b"fresh"));
        assert_eq!(store.last_id(), 1);
    }

    #[test]
    fn test_create_fails_on_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("occupied");
        std::fs::write(&file_path, b"file, not a directory").unwrap();

        assert!(FlatFile::create(&file_path).is_err());
    }
}
