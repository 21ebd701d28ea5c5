use anyhow::{ensure, Context as _, Result};
use crc::{Crc, CRC_32_BZIP2};
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::transaction::{Transaction, TransactionId};

const RECORD_EXTENSION: &str = "txn";
const TEMP_EXTENSION: &str = "tmp";

fn crc() -> Crc<u32> {
    Crc::<u32>::new(&CRC_32_BZIP2)
}

/// Durable store of finalized decisions, one record per transaction id.
///
/// Every [`Stage::put`] is on disk before it returns, so a crashed run can be
/// resumed from the same directory.
pub struct Stage {
    dir: PathBuf,
    // Removed on drop when the stage isn't kept across runs
    _tempdir: Option<TempDir>,
}

impl Stage {
    /// Opens (or creates) a stage that outlives the run.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create stage directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            _tempdir: None,
        })
    }

    /// A stage that is deleted at the end of the run.
    pub fn temporary() -> Result<Self> {
        let tempdir = tempfile::Builder::new()
            .prefix("ledger-import-stage")
            .tempdir()
            .context("Failed to create temporary stage directory")?;
        Ok(Self {
            dir: tempdir.path().to_path_buf(),
            _tempdir: Some(tempdir),
        })
    }

    /// Stores `transaction` under its id, replacing any earlier record.
    pub fn put(&self, transaction: &Transaction) -> Result<()> {
        self._put(transaction).with_context(|| {
            format!("Failed to write transaction {:?} to stage", transaction)
        })
    }

    fn _put(&self, transaction: &Transaction) -> Result<()> {
        let crc = crc();
        let content = postcard::to_stdvec_crc32(transaction, crc.digest())?;

        // Write to a temporary file first so a crash never leaves a half written record
        let path = self.record_path(&transaction.id);
        let tmppath = path.with_extension(TEMP_EXTENSION);
        let mut file = File::create(&tmppath)?;
        file.write_all(&content)?;
        file.sync_all()?;
        std::fs::rename(&tmppath, &path)?;
        sync_dir(&self.dir)?;
        Ok(())
    }

    pub fn get(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        let path = self.record_path(id);
        if !path.try_exists()? {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    /// All stored transactions, in no particular order.
    pub fn scan_all(&self) -> Result<Vec<Transaction>> {
        let mut transactions = vec![];
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list stage directory {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            transactions.push(read_record(&path)?);
        }
        Ok(transactions)
    }

    /// Deletes all records once they have been exported, so the next run with
    /// the same directory starts empty. Other files in the directory are kept.
    pub fn discard(self) -> Result<()> {
        if let Some(tempdir) = self._tempdir {
            tempdir.close()?;
            return Ok(());
        }
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list stage directory {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            if extension == Some(RECORD_EXTENSION) || extension == Some(TEMP_EXTENSION) {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove stage record {}", path.display()))?;
            }
        }
        sync_dir(&self.dir)?;
        Ok(())
    }

    fn record_path(&self, id: &TransactionId) -> PathBuf {
        self.dir
            .join(format!("{}.{RECORD_EXTENSION}", hex::encode(id.as_str())))
    }
}

fn read_record(path: &Path) -> Result<Transaction> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read stage record {}", path.display()))?;
    let crc = crc();
    let (transaction, remaining): (Transaction, &[u8]) =
        postcard::take_from_bytes_crc32(&content, crc.digest())
            .with_context(|| format!("Failed to decode stage record {}", path.display()))?;
    ensure!(0 == remaining.len(), "Stage record {} had extra bytes", path.display());
    Ok(transaction)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
