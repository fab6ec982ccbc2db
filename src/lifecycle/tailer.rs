//! nginx error log forwarding.
//!
//! # Responsibilities
//! - Start every run with an empty `logs/error.log`
//! - Poll the file and forward each complete line as a `tracing` event
//!   with target `nginx`
//!
//! # Design Decisions
//! - Polling instead of a second notify watch; nginx appends in small bursts
//! - A shrinking file is treated as truncation and read from the start

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::BridgeError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    interval: Duration,
    offset: u64,
    partial: Vec<u8>,
}

impl LogTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interval: DEFAULT_POLL_INTERVAL,
            offset: 0,
            partial: Vec::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log file, discarding anything a previous run left behind.
    pub fn prepare(&mut self) -> Result<(), BridgeError> {
        std::fs::File::create(&self.path).map_err(|e| self.tail_error(e))?;
        self.offset = 0;
        self.partial.clear();
        Ok(())
    }

    /// Forward lines until a read fails.
    pub async fn run(mut self) -> Result<(), BridgeError> {
        tracing::debug!(path = %self.path.display(), "Tailing nginx error log");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            for line in self.poll().await? {
                tracing::info!(target: "nginx", "{}", line);
            }
        }
    }

    /// Read whatever was appended since the last poll and return the
    /// complete lines. A trailing fragment is held until its newline arrives.
    pub async fn poll(&mut self) -> Result<Vec<String>, BridgeError> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.tail_error(e)),
        };

        if len < self.offset {
            tracing::debug!(path = %self.path.display(), "Error log truncated, rewinding");
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.tail_error(e))?;
        file.seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|e| self.tail_error(e))?;
        let mut buf = Vec::new();
        let read = file
            .read_to_end(&mut buf)
            .await
            .map_err(|e| self.tail_error(e))?;
        self.offset += read as u64;

        // Bytes are decoded per complete line so a character split across
        // reads survives.
        self.partial.extend_from_slice(&buf);
        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        Ok(lines)
    }

    fn tail_error(&self, source: std::io::Error) -> BridgeError {
        BridgeError::Tail {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        append_bytes(path, text.as_bytes());
    }

    fn append_bytes(path: &Path, bytes: &[u8]) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(bytes).unwrap();
    }

    #[tokio::test]
    async fn test_prepare_truncates_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, "stale line\n").unwrap();

        let mut tailer = LogTailer::new(&path);
        tailer.prepare().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(tailer.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_returns_complete_lines_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        let mut tailer = LogTailer::new(&path);
        tailer.prepare().unwrap();

        append(&path, "[notice] start\r\n[warn] half");
        assert_eq!(tailer.poll().await.unwrap(), vec!["[notice] start"]);

        append(&path, " done\n");
        assert_eq!(tailer.poll().await.unwrap(), vec!["[warn] half done"]);
        assert!(tailer.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        let mut tailer = LogTailer::new(&path);
        tailer.prepare().unwrap();

        append_bytes(&path, b"[warn] caf\xC3");
        assert!(tailer.poll().await.unwrap().is_empty());

        append_bytes(&path, b"\xA9\n");
        assert_eq!(tailer.poll().await.unwrap(), vec!["[warn] café"]);
    }

    #[tokio::test]
    async fn test_truncation_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.log");
        let mut tailer = LogTailer::new(&path);
        tailer.prepare().unwrap();

        append(&path, "first line that is fairly long\n");
        assert_eq!(tailer.poll().await.unwrap().len(), 1);

        std::fs::write(&path, "after\n").unwrap();
        assert_eq!(tailer.poll().await.unwrap(), vec!["after"]);
    }

    #[test]
    fn test_prepare_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut tailer = LogTailer::new(dir.path().join("missing").join("error.log"));
        assert!(matches!(tailer.prepare(), Err(BridgeError::Tail { .. })));
    }
}
