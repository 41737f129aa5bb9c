//! JSONL operational log with size-based gzip rotation, grounded on the
//! teacher's `RotatingLogger` (`core::network::debug_logger`).

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use fs2::FileExt;

use super::event::DiagnosticEvent;

const ROTATION_SIZE_BYTES: u64 = 8 * 1024 * 1024;
const MAX_ARCHIVES: usize = 5;
const ROTATION_CHECK_INTERVAL: u32 = 200;

/// Appends one JSON line per [`DiagnosticEvent`], rotating and gzip-archiving
/// the active file once it crosses [`ROTATION_SIZE_BYTES`]. Safe to share
/// across threads; rotation itself is guarded by an advisory file lock so
/// concurrent processes don't double-rotate.
pub struct RotatingLogger {
    path: PathBuf,
    write_count: AtomicU32,
    inner: Mutex<()>,
}

impl RotatingLogger {
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            path,
            write_count: AtomicU32::new(0),
            inner: Mutex::new(()),
        }
    }

    pub fn log(&self, event: &DiagnosticEvent) -> Result<(), std::io::Error> {
        let line = serde_json::to_string(event)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.write_line(&line)
    }

    fn write_line(&self, json_line: &str) -> Result<(), std::io::Error> {
        let _guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if self.write_count.fetch_add(1, Ordering::Relaxed) % ROTATION_CHECK_INTERVAL == 0 {
            let _ = self.rotate_if_needed();
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{json_line}")?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> Result<(), std::io::Error> {
        if !self.needs_rotation()? {
            return Ok(());
        }

        let lock_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => {
                if self.needs_rotation()? {
                    self.perform_rotation()?;
                }
                let _ = std::fs::remove_file(&lock_path);
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }

    fn needs_rotation(&self) -> Result<bool, std::io::Error> {
        if !self.path.exists() {
            return Ok(false);
        }
        Ok(std::fs::metadata(&self.path)?.len() >= ROTATION_SIZE_BYTES)
    }

    fn perform_rotation(&self) -> Result<(), std::io::Error> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = self.path.file_name().unwrap().to_str().unwrap();
        let archive_name = format!("{filename}.{timestamp}.gz");
        let archive_path = self.path.parent().unwrap().join(archive_name);

        let temp_path = self.path.with_extension("rotating");
        std::fs::rename(&self.path, &temp_path)?;

        let source = File::open(&temp_path)?;
        let target = File::create(&archive_path)?;
        let mut encoder = GzEncoder::new(target, Compression::default());
        std::io::copy(&mut BufReader::new(source), &mut encoder)?;
        encoder.finish()?;
        std::fs::remove_file(&temp_path)?;

        let _ = self.cleanup_old_archives();
        Ok(())
    }

    fn cleanup_old_archives(&self) -> Result<(), std::io::Error> {
        let dir = self.path.parent().unwrap();
        let filename = self.path.file_name().unwrap().to_str().unwrap();

        let mut archives = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&format!("{filename}.")) && name.ends_with(".gz") {
                archives.push((entry.path(), entry.metadata()?.modified()?));
            }
        }
        archives.sort_by_key(|(_, modified)| *modified);
        if archives.len() > MAX_ARCHIVES {
            for (path, _) in archives.iter().take(archives.len() - MAX_ARCHIVES) {
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::event::EventKind;
    use uuid::Uuid;

    #[test]
    fn writes_one_jsonl_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.jsonl");
        let logger = RotatingLogger::new(path.clone());

        logger
            .log(&DiagnosticEvent::new(Uuid::new_v4(), EventKind::CaptchaDetected))
            .unwrap();
        logger
            .log(&DiagnosticEvent::new(
                Uuid::new_v4(),
                EventKind::CacheHit { fingerprint: "fp".to_string() },
            ))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().all(|l| serde_json::from_str::<serde_json::Value>(l).is_ok()));
    }
}
