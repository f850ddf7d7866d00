use crate::persistence::journal::{JournalEntry, StoreError, TransferStore};
use log::warn;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Journal kept as a JSON-lines file, one entry per line.
///
/// Appends are flushed and synced before returning. A crash mid-append
/// leaves at most one partial line at the end of the file; `load` drops it
/// and truncates the file back to the last complete entry. A failed append
/// is cut back off the file, and any bytes past the last known-good length
/// are discarded before the next append. A malformed line anywhere else is
/// reported as corruption.
///
/// The file must have a single writer: open one store per path.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    /// File length after the last successful load or append.
    clean_len: Option<u64>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            clean_len: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn truncate(&self, len: u64) -> Result<(), StoreError> {
        OpenOptions::new()
            .write(true)
            .open(&self.path)?
            .set_len(len)?;
        Ok(())
    }
}

impl TransferStore for JsonLinesStore {
    fn load(&mut self) -> Result<Vec<JournalEntry>, StoreError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.clean_len = Some(0);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut offset = 0usize;
        let mut torn = false;
        for (idx, raw) in content.split_inclusive(|b| *b == b'\n').enumerate() {
            let complete = raw.last() == Some(&b'\n');
            if !raw.iter().all(u8::is_ascii_whitespace) {
                match serde_json::from_slice::<JournalEntry>(raw) {
                    Ok(entry) => entries.push(entry),
                    Err(e) if !complete && e.is_eof() => {
                        warn!(
                            "dropping torn journal tail at line {} of {}: {}",
                            idx + 1,
                            self.path.display(),
                            e
                        );
                        self.truncate(offset as u64)?;
                        torn = true;
                        break;
                    }
                    Err(source) => {
                        return Err(StoreError::Corrupt {
                            line: idx + 1,
                            source,
                        })
                    }
                }
            }
            offset += raw.len();
        }

        // A complete entry missing only its newline would swallow the next append.
        if !torn && matches!(content.last(), Some(b) if *b != b'\n') {
            OpenOptions::new()
                .append(true)
                .open(&self.path)?
                .write_all(b"\n")?;
            offset += 1;
        }
        self.clean_len = Some(offset as u64);
        Ok(entries)
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut len = file.metadata()?.len();
        if let Some(clean) = self.clean_len.filter(|clean| *clean < len) {
            warn!(
                "discarding {} bytes left by an earlier failed append to {}",
                len - clean,
                self.path.display()
            );
            file.set_len(clean)?;
            len = clean;
        }

        let written = file
            .write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data());
        if let Err(e) = written {
            // Best effort: a failed rollback is repaired on the next append.
            let _ = file.set_len(len);
            return Err(e.into());
        }
        self.clean_len = Some(len + line.len() as u64);
        Ok(())
    }
}
