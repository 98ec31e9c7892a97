use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use maat_types::{ContentHash, LedgerRecord};
use tracing::debug;

use crate::error::LedgerError;
use crate::sink::LedgerSink;

/// Appends one sorted-key JSON line per record.
#[derive(Debug)]
pub struct JsonlLedger {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl JsonlLedger {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened JSONL ledger");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl LedgerSink for JsonlLedger {
    fn append(&mut self, record: &LedgerRecord) -> Result<ContentHash, LedgerError> {
        let ukh = record.ukh()?;
        let line = record.to_ledger_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(ukh)
    }

    fn flush(&mut self) -> Result<(), LedgerError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlLedger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Read back a JSONL ledger, skipping blank lines. Missing files read empty.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<LedgerRecord>, LedgerError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: LedgerRecord =
            serde_json::from_str(&line).map_err(|e| LedgerError::Malformed {
                line: i + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}
