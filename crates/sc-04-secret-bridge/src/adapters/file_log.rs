//! # File-Backed Interchange Log
//!
//! One JSON object per line, every buy intent in the same file. Each
//! read-modify-append holds an exclusive `fs2` lock on the file, so separate
//! processes sharing the path serialize their writes; the file is synced
//! before the lock is released.
//!
//! A crash mid-append can leave a torn final line. It carries no newline and
//! is skipped on read; the next append truncates it away before writing.

use crate::domain::{BridgeError, BuyIntentId, InterchangeEvent};
use crate::ports::outbound::{AppendDecision, InterchangeLog};
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Interchange log persisted as JSON lines.
pub struct FileInterchangeLog {
    path: PathBuf,
    // Serializes writers within this process; fs2 covers other processes.
    local: Mutex<()>,
}

struct Contents {
    events: Vec<InterchangeEvent>,
    // Bytes up to and including the last newline.
    valid_len: u64,
    torn_tail: bool,
}

impl FileInterchangeLog {
    /// Open or create the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::open_file(&path)?;
        debug!("[sc-04] Interchange log at {}", path.display());
        Ok(Self {
            path,
            local: Mutex::new(()),
        })
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(path: &Path) -> Result<File, BridgeError> {
        Ok(OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?)
    }

    fn load(&self, file: &mut File) -> Result<Contents, BridgeError> {
        file.seek(SeekFrom::Start(0))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;

        let torn_tail = !raw.is_empty() && !raw.ends_with('\n');
        let valid_len = raw.rfind('\n').map_or(0, |i| i + 1) as u64;
        let mut lines: Vec<&str> = raw.split('\n').collect();
        // Either the empty remainder after the final newline, or a torn write.
        if let Some(last) = lines.pop() {
            if torn_tail {
                warn!(
                    "[sc-04] Skipping torn entry at end of {} ({} bytes)",
                    self.path.display(),
                    last.len()
                );
            }
        }

        let mut events = Vec::with_capacity(lines.len());
        for line in lines.into_iter().filter(|l| !l.trim().is_empty()) {
            events.push(serde_json::from_str(line)?);
        }
        Ok(Contents {
            events,
            valid_len,
            torn_tail,
        })
    }

    fn unlock(file: &File) -> Result<(), BridgeError> {
        FileExt::unlock(file)?;
        Ok(())
    }
}

impl InterchangeLog for FileInterchangeLog {
    fn read(&self, buy_intent_id: BuyIntentId) -> Result<Vec<InterchangeEvent>, BridgeError> {
        let mut file = Self::open_file(&self.path)?;
        FileExt::lock_shared(&file)?;
        let loaded = self.load(&mut file);
        Self::unlock(&file)?;
        Ok(loaded?
            .events
            .into_iter()
            .filter(|e| e.buy_intent_id() == buy_intent_id)
            .collect())
    }

    fn append_with(
        &self,
        buy_intent_id: BuyIntentId,
        decide: &mut AppendDecision<'_>,
    ) -> Result<Vec<InterchangeEvent>, BridgeError> {
        let _local = self.local.lock();
        let mut file = Self::open_file(&self.path)?;
        FileExt::lock_exclusive(&file)?;

        let result: Result<Vec<InterchangeEvent>, BridgeError> = (|| {
            let contents = self.load(&mut file)?;
            let mut history: Vec<InterchangeEvent> = contents
                .events
                .into_iter()
                .filter(|e| e.buy_intent_id() == buy_intent_id)
                .collect();

            let appended = decide(&history)?;
            if appended.is_empty() {
                return Ok(history);
            }

            if contents.torn_tail {
                warn!(
                    "[sc-04] Truncating torn entry in {} at byte {}",
                    self.path.display(),
                    contents.valid_len
                );
                file.set_len(contents.valid_len)?;
            }

            let mut buf = Vec::new();
            for event in &appended {
                serde_json::to_writer(&mut buf, event)?;
                buf.push(b'\n');
            }
            file.write_all(&buf)?;
            file.sync_all()?;

            history.extend(appended);
            Ok(history)
        })();

        Self::unlock(&file)?;
        result
    }

    fn buy_intent_ids(&self) -> Result<Vec<BuyIntentId>, BridgeError> {
        let mut file = Self::open_file(&self.path)?;
        FileExt::lock_shared(&file)?;
        let loaded = self.load(&mut file);
        Self::unlock(&file)?;
        let ids: BTreeSet<BuyIntentId> = loaded?
            .events
            .iter()
            .map(InterchangeEvent::buy_intent_id)
            .collect();
        Ok(ids.into_iter().collect())
    }
}
