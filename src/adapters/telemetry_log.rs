//! JSON-lines telemetry store.
//!
//! Implements [`TelemetrySink`] as an append-only file with one record per
//! line:
//!
//! ```text
//! {"ts":1700000000.25,"sensor":0,"value":21.5,"stream":"raw"}
//! {"ts":1699999990.0,"sensor":0,"value":21.4375,"stream":"smoothed"}
//! ```
//!
//! Raw and smoothed streams share one file and are told apart by
//! `stream`; readers key on `(ts, sensor)` within a stream.

use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::TelemetrySink;
use crate::error::StorageError;
use crate::sensors::TelemetryPoint;

pub struct JsonLinesLog {
    writer: Option<LineWriter<File>>,
    path: PathBuf,
}

impl JsonLinesLog {
    /// Open `path` for appending, creating it and its directory as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("telemetry: appending to {}", path.display());
        Ok(Self {
            writer: Some(LineWriter::new(file)),
            path,
        })
    }

    fn writer(&mut self) -> Result<&mut LineWriter<File>, StorageError> {
        self.writer
            .as_mut()
            .ok_or_else(|| StorageError::Io(std::io::Error::other("telemetry log closed")))
    }
}

impl TelemetrySink for JsonLinesLog {
    fn append(&mut self, point: &TelemetryPoint) -> Result<(), StorageError> {
        let mut line =
            serde_json::to_string(point).map_err(|e| StorageError::Encode(e.to_string()))?;
        line.push('\n');
        self.writer()?.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.writer()?.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        match self.writer.take() {
            Some(mut w) => {
                w.flush()?;
                w.get_ref().sync_all()?;
                info!("telemetry: closed {}", self.path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}
