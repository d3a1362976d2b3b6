use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use prov_types::{Product, ProductId, StageLabel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::table::ProductTable;
use crate::traits::ProvenanceStore;

/// File name used by [`FileProvenanceStore::open_in`].
pub const JOURNAL_FILE_NAME: &str = "products.journal";

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

/// A single journaled mutation.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized JournalEntry)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    Created(Product),
    /// A stage and, when anchored, the reference it was anchored under.
    StageAppended {
        id: ProductId,
        stage: StageLabel,
        reference: Option<String>,
    },
    LedgerRefSet { id: ProductId, reference: String },
}

/// Flush strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` every entry before acknowledging the write.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (tests, throwaway data).
    OsDefault,
}

struct JournalState {
    file: File,
    /// Offset just past the last complete entry.
    offset: u64,
    table: ProductTable,
    /// Set when a failed write could not be rolled back.
    broken: Option<String>,
}

/// Journal-backed durable product store.
///
/// Each mutation is validated against the current state, appended to the
/// journal, synced, and only then applied in memory, all under one lock.
/// Once a call returns `Ok`, the change survives a crash. On open the
/// journal is replayed; an incomplete entry at the tail (a torn write) is
/// truncated with a warning, damage anywhere else is a hard error.
pub struct FileProvenanceStore {
    path: PathBuf,
    sync_mode: SyncMode,
    state: Mutex<JournalState>,
}

impl FileProvenanceStore {
    /// Open (or create) the journal at `path` and replay it.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        let (table, offset) = replay(&mut file)?;
        let file_len = file.metadata()?.len();
        if offset < file_len {
            warn!(
                path = %path.display(),
                offset,
                file_len,
                "truncating incomplete journal tail"
            );
            file.set_len(offset)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(offset))?;

        debug!(path = %path.display(), products = table.len(), "journal replayed");
        Ok(Self {
            path: path.to_path_buf(),
            sync_mode,
            state: Mutex::new(JournalState {
                file,
                offset,
                table,
                broken: None,
            }),
        })
    }

    /// Open the journal named [`JOURNAL_FILE_NAME`] inside `dir`.
    pub fn open_in(dir: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        Self::open(&dir.join(JOURNAL_FILE_NAME), sync_mode)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, JournalState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Append one entry and sync it. On failure the file is cut back to the
    /// last complete entry; if even that fails, the store stops accepting
    /// writes.
    fn append(&self, state: &mut JournalState, entry: &JournalEntry) -> StoreResult<()> {
        if let Some(reason) = &state.broken {
            return Err(StoreError::Unavailable(reason.clone()));
        }

        let frame = encode_frame(entry)?;
        let written = write_frame(&mut state.file, &frame, self.sync_mode);
        if let Err(err) = written {
            let rollback = state
                .file
                .set_len(state.offset)
                .and_then(|_| state.file.seek(SeekFrom::Start(state.offset)).map(|_| ()));
            if let Err(rollback_err) = rollback {
                let reason = format!("journal write failed ({err}) and rollback failed ({rollback_err})");
                warn!(path = %self.path.display(), %reason, "journal disabled");
                state.broken = Some(reason);
            }
            return Err(err.into());
        }

        state.offset += frame.len() as u64;
        debug!(offset = state.offset, len = frame.len(), "journal append");
        Ok(())
    }
}

fn encode_frame(entry: &JournalEntry) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("journal entry too large".into()))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

fn write_frame(file: &mut File, frame: &[u8], sync_mode: SyncMode) -> std::io::Result<()> {
    file.write_all(frame)?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync_data()?;
    }
    Ok(())
}

/// Rebuild the product table from the journal.
///
/// Returns the table and the offset just past the last complete entry.
fn replay(file: &mut File) -> StoreResult<(ProductTable, u64)> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;

    let mut table = ProductTable::new();
    let mut offset: u64 = 0;
    let file_len = bytes.len() as u64;

    while offset + HEADER_SIZE <= file_len {
        let at = offset as usize;
        let length = u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let expected_crc =
            u32::from_le_bytes([bytes[at + 4], bytes[at + 5], bytes[at + 6], bytes[at + 7]]);

        let end = offset + HEADER_SIZE + length as u64;
        if end > file_len {
            // torn write at the tail
            break;
        }
        if length == 0 {
            return Err(StoreError::Corrupt {
                offset,
                reason: "zero-length entry".into(),
            });
        }

        let payload = &bytes[(offset + HEADER_SIZE) as usize..end as usize];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            if end == file_len {
                warn!(offset, "CRC mismatch on final journal entry; treating as torn write");
                break;
            }
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
            });
        }

        let entry: JournalEntry = bincode::deserialize(payload).map_err(|e| StoreError::Corrupt {
            offset,
            reason: format!("undecodable entry: {e}"),
        })?;
        apply(&mut table, entry).map_err(|e| StoreError::Corrupt {
            offset,
            reason: format!("entry does not replay: {e}"),
        })?;

        offset = end;
    }

    Ok((table, offset))
}

fn apply(table: &mut ProductTable, entry: JournalEntry) -> StoreResult<()> {
    match entry {
        JournalEntry::Created(product) => table.insert(product),
        JournalEntry::StageAppended {
            id,
            stage,
            reference,
        } => table
            .push_stage(&id, &stage, reference.as_deref())
            .map(|_| ()),
        JournalEntry::LedgerRefSet { id, reference } => {
            table.set_ledger_ref(&id, &reference).map(|_| ())
        }
    }
}

impl ProvenanceStore for FileProvenanceStore {
    fn create(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.table.check_insert(product)?;
        self.append(&mut state, &JournalEntry::Created(product.clone()))?;
        state.table.insert(product.clone())
    }

    fn append_stage(
        &self,
        id: &ProductId,
        stage: &StageLabel,
        reference: Option<&str>,
    ) -> StoreResult<Product> {
        let mut state = self.lock()?;
        state.table.check_append(id, reference)?;
        self.append(
            &mut state,
            &JournalEntry::StageAppended {
                id: id.clone(),
                stage: stage.clone(),
                reference: reference.map(str::to_string),
            },
        )?;
        state.table.push_stage(id, stage, reference)
    }

    fn set_ledger_ref(&self, id: &ProductId, reference: &str) -> StoreResult<Product> {
        let mut state = self.lock()?;
        state.table.check_exists(id)?;
        if reference.is_empty() {
            return Err(StoreError::EmptyLedgerRef(id.clone()));
        }
        self.append(
            &mut state,
            &JournalEntry::LedgerRefSet {
                id: id.clone(),
                reference: reference.to_string(),
            },
        )?;
        state.table.set_ledger_ref(id, reference)
    }

    fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.lock()?.table.get(id).cloned())
    }

    fn find_by_certification_hash(&self, hash: &str) -> StoreResult<Option<Product>> {
        Ok(self.lock()?.table.by_certification_hash(hash).cloned())
    }

    fn find_by_ledger_ref(&self, reference: &str) -> StoreResult<Option<Product>> {
        Ok(self.lock()?.table.by_ledger_ref(reference).cloned())
    }

    fn list_all(&self) -> StoreResult<Vec<Product>> {
        Ok(self.lock()?.table.all())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.table.len())
    }
}

impl std::fmt::Debug for FileProvenanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProvenanceStore")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}
