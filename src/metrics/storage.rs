use super::types::{Metric, Report};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on report file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse JSON in report file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Owns the report file on disk.
///
/// Every append is a whole-file read, merge and rewrite. There is no locking:
/// two processes appending to the same file at the same time can race, and the
/// metric written by the slower one is lost. Callers that record metrics
/// concurrently must serialize their invocations.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `metric` to the end of the report, creating the file if needed.
    ///
    /// A missing file starts out as an empty report. An existing file that is
    /// not a well-formed report is an error and is left untouched.
    pub fn append(&self, metric: Metric) -> Result<Report, StoreError> {
        let (mut file, mut report) = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => {
                let report = self.decode(&file)?;
                debug!(file = ?self.path, existing = report.metrics().len(), "Loaded existing report");
                (file, report)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(file = ?self.path, "Report file not found, creating it");
                (self.create()?, Report::default())
            }
            Err(e) => return Err(self.io_error(e)),
        };

        report.push(metric);

        // Full rewrite from offset zero
        file.set_len(0).map_err(|e| self.io_error(e))?;
        file.seek(SeekFrom::Start(0)).map_err(|e| self.io_error(e))?;
        self.encode(&mut file, &report)?;

        info!(file = ?self.path, metrics = report.metrics().len(), "Metric appended to report");
        Ok(report)
    }

    /// Read the report without modifying it.
    pub fn load(&self) -> Result<Report, StoreError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        self.decode(&file)
    }

    fn create(&self) -> Result<File, StoreError> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(&self.path).map_err(|e| self.io_error(e))
    }

    fn decode(&self, file: &File) -> Result<Report, StoreError> {
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            if source.is_io() {
                self.io_error(source.into())
            } else {
                StoreError::Parse {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }

    fn encode(&self, file: &mut File, report: &Report) -> Result<(), StoreError> {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report).map_err(|e| self.io_error(e.into()))?;
        writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
        writer.flush().map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
