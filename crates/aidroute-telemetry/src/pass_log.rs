//! On-disk pass log and routing snapshot

use crate::paths::Paths;
use crate::types::PassRecord;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// What came back from reading the log
#[derive(Debug, Default)]
pub struct LogContents {
    pub records: Vec<PassRecord>,
    /// Lines that did not parse as a pass record (torn write, older schema)
    pub skipped: usize,
}

/// Append-only JSONL log with one [`PassRecord`] per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassLog {
    path: PathBuf,
}

impl PassLog {
    pub fn open(paths: &Paths) -> Self {
        Self::at(paths.passes_file())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The line goes out in one write so concurrent runs never interleave records
    pub fn append(&self, record: &PassRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(&line)
    }

    /// Every record in file order; a log that was never written is empty
    pub fn read(&self) -> io::Result<LogContents> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LogContents::default()),
            Err(err) => return Err(err),
        };

        let mut contents = LogContents::default();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => contents.records.push(record),
                Err(_) => contents.skipped += 1,
            }
        }
        Ok(contents)
    }
}

/// Replace `path` with pretty JSON, never leaving a half-written file behind
pub fn write_snapshot<T: Serialize>(path: &Path, snapshot: &T) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    let staging = dir.join(format!(".{name}.{}.tmp", std::process::id()));

    let mut writer = BufWriter::new(File::create(&staging)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n")?;
    writer.into_inner().map_err(|err| err.into_error())?.sync_all()?;

    fs::rename(&staging, path)
}
