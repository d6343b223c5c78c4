//! Run output on disk: one JSON snapshot per run plus the cumulative CSV table.
//!
//! The table is append-only. Its header is written once, when the file is
//! created, and on every later append the existing header is checked against
//! [`Observation::COLUMNS`]; a mismatch is reported instead of appending rows
//! that would land under the wrong columns.
//!
//! The two files are not written atomically together. The snapshot goes first,
//! so a failure in between leaves a snapshot with no matching table rows.

use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::model::{Observation, RunBatch};

pub const HISTORY_FILE: &str = "observaciones.csv";
const SNAPSHOT_PREFIX: &str = "observaciones_";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("refusing to persist an empty run batch")]
    EmptyBatch,
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(
        "header of {} does not match the observation schema (expected [{expected}], found [{found}])",
        .path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Where one run's output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub snapshot_path: PathBuf,
    pub history_path: PathBuf,
    pub rows_appended: usize,
}

#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    /// Snapshot file for a run, named after its UTC start second.
    pub fn snapshot_path(&self, batch: &RunBatch) -> PathBuf {
        let stamp = batch.started_at.format("%Y%m%d_%H%M%S");
        self.data_dir.join(format!("{SNAPSHOT_PREFIX}{stamp}.json"))
    }

    /// Write the snapshot, then append the batch to the cumulative table.
    pub fn persist(&self, batch: &RunBatch) -> Result<PersistSummary, StoreError> {
        if batch.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        fs::create_dir_all(&self.data_dir).map_err(io_error(&self.data_dir))?;

        let snapshot_path = self.write_snapshot(batch)?;
        let rows_appended = self.append_history(&batch.observations)?;

        tracing::info!(
            rows = rows_appended,
            snapshot = %snapshot_path.display(),
            history = %self.history_path().display(),
            "run persisted"
        );

        Ok(PersistSummary {
            snapshot_path,
            history_path: self.history_path(),
            rows_appended,
        })
    }

    fn write_snapshot(&self, batch: &RunBatch) -> Result<PathBuf, StoreError> {
        let path = self.snapshot_path(batch);
        let json = serde_json::to_string_pretty(&batch.observations)?;
        fs::write(&path, json).map_err(io_error(&path))?;
        Ok(path)
    }

    fn append_history(&self, observations: &[Observation]) -> Result<usize, StoreError> {
        let path = self.history_path();

        let write_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(io_error(&path)(e)),
        };
        if !write_header {
            check_header(&path)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        for obs in observations {
            wtr.serialize(obs)?;
        }
        wtr.flush().map_err(io_error(&path))?;

        Ok(observations.len())
    }

    /// Every row of the cumulative table, oldest first. Empty if the table doesn't exist yet.
    pub fn read_history(&self) -> Result<Vec<Observation>, StoreError> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        check_header(&path)?;
        let mut rdr = csv::Reader::from_path(&path)?;
        let rows = rdr.deserialize().collect::<Result<Vec<Observation>, _>>()?;
        Ok(rows)
    }
}

fn check_header(path: &Path) -> Result<(), StoreError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let found = rdr.headers()?;

    if found.iter().eq(Observation::COLUMNS.iter().copied()) {
        return Ok(());
    }

    Err(StoreError::SchemaMismatch {
        path: path.to_path_buf(),
        expected: Observation::COLUMNS.join(","),
        found: found.iter().collect::<Vec<_>>().join(","),
    })
}
