// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A side channel for engine output.
//!
//! Engines are noisy. Everything they print is appended to a log file instead of the console,
//! which is reserved for the orchestrator's own lines. The file is open only while a
//! [`SideLogScope`] is alive; dropping the scope (on success, error or panic) closes it.

use crate::errors::SideLogOpenError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, warn};

/// The default location of the side log.
pub const DEFAULT_SIDE_LOG_PATH: &str = "target/scenario-rollup-engine.log";

type Sink = Arc<Mutex<Option<BufWriter<File>>>>;

/// A cloneable writer appending to the side log.
///
/// Once the owning [`SideLogScope`] is dropped, writes through any remaining handle are discarded.
#[derive(Clone, Debug, Default)]
pub struct SideLog {
    sink: Sink,
}

impl SideLog {
    /// Opens the side log at `path` for appending, creating parent directories as needed.
    ///
    /// A header line is written immediately, so failures surface here rather than mid-run.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<SideLogScope, SideLogOpenError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| SideLogOpenError::CreateDir {
                dir: dir.to_owned(),
                error,
            })?;
        }

        let open_err = |error| SideLogOpenError::Open {
            path: path.clone(),
            error,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "==== scenario-rollup: engine output, started {} ====",
            Local::now().to_rfc3339()
        )
        .and_then(|()| writer.flush())
        .map_err(open_err)?;

        debug!("opened side log at {path}");
        Ok(SideLogScope {
            sink: SideLog {
                sink: Arc::new(Mutex::new(Some(writer))),
            },
            path,
        })
    }

    /// Returns a side log that discards everything written to it.
    pub fn discard() -> Self {
        Self::default()
    }

    /// Appends a single line to the log. Errors are logged and otherwise ignored.
    pub fn write_line(&self, line: &str) {
        let mut sink = self.clone();
        if let Err(error) = writeln!(sink, "{line}") {
            debug!("error writing to side log: {error}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        // A panic while holding the lock leaves the writer usable.
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for SideLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.lock().as_mut() {
            Some(writer) => writer.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // Hold the lock across the whole buffer so concurrent writers don't interleave.
        match self.lock().as_mut() {
            Some(writer) => writer.write_all(buf),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Keeps the side log open. Dropping it writes a footer and closes the file.
#[derive(Debug)]
#[must_use = "the side log is closed as soon as the scope is dropped"]
pub struct SideLogScope {
    sink: SideLog,
    path: Utf8PathBuf,
}

impl SideLogScope {
    /// Returns a writer for the side log.
    pub fn sink(&self) -> SideLog {
        self.sink.clone()
    }

    /// The path to the side log.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for SideLogScope {
    fn drop(&mut self) {
        let Some(mut writer) = self.sink.lock().take() else {
            return;
        };
        let res = writeln!(
            writer,
            "==== scenario-rollup: engine output, finished {} ====",
            Local::now().to_rfc3339()
        )
        .and_then(|()| writer.flush());
        if let Err(error) = res {
            warn!("error closing side log {}: {error}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;

    #[test]
    fn scope_closes_sink() {
        let dir = tempdir().expect("created temp dir");
        let path = dir.path().join("nested/engine.log");

        let scope = SideLog::open(&path).expect("opened side log");
        let mut sink = scope.sink();
        sink.write_line("first line");
        writeln!(sink, "second line").expect("write succeeded");
        drop(scope);

        // Writes after the scope is gone are discarded, not errors.
        writeln!(sink, "too late").expect("discarded write succeeds");

        let contents = std::fs::read_to_string(&path).expect("read side log");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4, "header, two lines, footer: {contents}");
        assert!(lines[0].contains("started"));
        assert_eq!(lines[1], "first line");
        assert_eq!(lines[2], "second line");
        assert!(lines[3].contains("finished"));
        assert!(!contents.contains("too late"));
    }

    #[test]
    fn reopening_appends() {
        let dir = tempdir().expect("created temp dir");
        let path = dir.path().join("engine.log");
        for run in 0..2 {
            let scope = SideLog::open(&path).expect("opened side log");
            scope.sink().write_line(&format!("run {run}"));
        }
        let contents = std::fs::read_to_string(&path).expect("read side log");
        assert!(contents.contains("run 0"));
        assert!(contents.contains("run 1"));
        assert_eq!(contents.lines().count(), 6);
    }

    #[test]
    fn scope_closes_on_panic() {
        let dir = tempdir().expect("created temp dir");
        let path = dir.path().join("engine.log");
        let result = std::panic::catch_unwind(|| {
            let scope = SideLog::open(&path).expect("opened side log");
            scope.sink().write_line("before panic");
            panic!("engine blew up");
        });
        assert!(result.is_err());
        let contents = std::fs::read_to_string(&path).expect("read side log");
        assert!(contents.contains("before panic"));
        assert!(contents.lines().last().is_some_and(|line| line.contains("finished")));
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempdir().expect("created temp dir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").expect("wrote file");
        let err = SideLog::open(blocker.join("engine.log")).expect_err("parent is a file");
        assert!(matches!(err, SideLogOpenError::CreateDir { .. }), "{err:?}");
    }

    #[test]
    fn discard_accepts_writes() {
        let mut sink = SideLog::discard();
        sink.write_all(b"ignored").expect("discarded");
        sink.flush().expect("flushed");
    }
}
