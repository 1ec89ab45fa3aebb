use chrono::Local;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::logging::LogEntry;

/// Append-only log file named after the session start time, with a
/// `latest.log` pointer next to it
pub struct LogFile {
    file: Mutex<Option<File>>,
    path: PathBuf,
}

impl LogFile {
    pub fn create_in(log_dir: &Path) -> Self {
        let _ = std::fs::create_dir_all(log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = log_dir.join(format!("directory-cli_{}.log", timestamp));
        let latest_path = log_dir.join("latest.log");

        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(&latest_path);
            let _ = std::os::unix::fs::symlink(&path, &latest_path);
        }

        #[cfg(windows)]
        {
            // symlinks need elevated rights on Windows
            let pointer = format!("Current log file: {}\n", path.display());
            let _ = std::fs::write(&latest_path, pointer);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok();

        Self {
            file: Mutex::new(file),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_entry(&self, entry: &LogEntry) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = writeln!(file, "{}", entry.format_for_display());
        }
    }

    pub fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn entries_are_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::create_in(dir.path());

        log.write_entry(&LogEntry::new(Level::INFO, "search", "Searching".to_string()));
        log.flush();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("INFO [search] Searching"));
        assert!(dir.path().join("latest.log").exists());
    }
}
