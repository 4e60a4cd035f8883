//! JSON-Lines record files.
//!
//! A record file starts with a header line naming its tree and title,
//! followed by one JSON object per record:
//!
//! ```text
//! {"tree":"avalancheTree","title":"Avalanche Information"}
//! {"nele":1,"nelep":2,"status":[-1,-1],"x0":[...],...}
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{
    AvalancheRow, DriftRow, RecordSink,
    schema::{AVALANCHE_TREE, DRIFT_TREE},
};

/// A row type stored in its own named tree.
pub trait Record: Serialize + DeserializeOwned {
    /// Tree name written to and expected in the file header.
    const TREE: &'static str;
}

impl Record for DriftRow {
    const TREE: &'static str = DRIFT_TREE;
}

impl Record for AvalancheRow {
    const TREE: &'static str = AVALANCHE_TREE;
}

/// Errors that can occur while reading or writing a record file.
#[derive(Debug, Error)]
pub enum RecordFileError {
    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: missing header line")]
    MissingHeader { path: PathBuf },

    #[error("{path}: expected tree `{expected}`, found `{found}`")]
    WrongTree {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("{path}:{line}: malformed record")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl RecordFileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    tree: String,
    title: String,
}

/// The contents of a record file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet<T> {
    pub title: String,
    pub rows: Vec<T>,
}

/// Reads every record of tree `T::TREE` from `path`.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns a [`RecordFileError`] if the file cannot be read, has no header,
/// holds a different tree, or contains a row that does not match `T`.
pub fn read_records<T: Record>(path: impl AsRef<Path>) -> Result<RecordSet<T>, RecordFileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| RecordFileError::io(path, err))?;
    let mut lines = BufReader::new(file)
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line));

    let header = loop {
        match lines.next() {
            None => {
                return Err(RecordFileError::MissingHeader {
                    path: path.to_path_buf(),
                });
            }
            Some((_, Err(err))) => return Err(RecordFileError::io(path, err)),
            Some((_, Ok(line))) if line.trim().is_empty() => {}
            Some((line_number, Ok(line))) => {
                break serde_json::from_str::<Header>(&line).map_err(|source| {
                    RecordFileError::Malformed {
                        path: path.to_path_buf(),
                        line: line_number,
                        source,
                    }
                })?;
            }
        }
    };

    if header.tree != T::TREE {
        return Err(RecordFileError::WrongTree {
            path: path.to_path_buf(),
            expected: T::TREE,
            found: header.tree,
        });
    }

    let mut rows = Vec::new();
    for (line_number, line) in lines {
        let line = line.map_err(|err| RecordFileError::io(path, err))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|source| RecordFileError::Malformed {
            path: path.to_path_buf(),
            line: line_number,
            source,
        })?;
        rows.push(row);
    }

    log::debug!(
        "read {} {} rows from {}",
        rows.len(),
        T::TREE,
        path.display()
    );

    Ok(RecordSet {
        title: header.title,
        rows,
    })
}

/// Streams records into a file that only appears once writing succeeds.
///
/// Rows go to a temporary file next to the destination, which is renamed
/// into place by [`RecordWriter::finish`]. A writer dropped without
/// finishing removes its temporary file and leaves the destination as it
/// was.
#[derive(Debug)]
pub struct RecordWriter<T> {
    path: PathBuf,
    out: BufWriter<NamedTempFile>,
    rows: usize,
    _row: PhantomData<fn(&T)>,
}

impl<T: Record> RecordWriter<T> {
    /// Starts a record file at `path` with the given title.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Io`] if the temporary file cannot be
    /// created or the header cannot be written.
    pub fn create(path: impl Into<PathBuf>, title: &str) -> Result<Self, RecordFileError> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = NamedTempFile::new_in(dir).map_err(|err| RecordFileError::io(&path, err))?;

        let mut writer = Self {
            path,
            out: BufWriter::new(file),
            rows: 0,
            _row: PhantomData,
        };
        let header = Header {
            tree: T::TREE.to_owned(),
            title: title.to_owned(),
        };
        writer.write_line(&header)?;
        Ok(writer)
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Io`] if the row cannot be written.
    pub fn write(&mut self, row: &T) -> Result<(), RecordFileError> {
        self.write_line(row)?;
        self.rows += 1;
        Ok(())
    }

    /// Returns the number of rows written so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the file and moves it to its destination.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`RecordFileError::Io`] if flushing or renaming fails.
    pub fn finish(self) -> Result<usize, RecordFileError> {
        let Self {
            path, out, rows, ..
        } = self;

        let file = out
            .into_inner()
            .map_err(|err| RecordFileError::io(&path, err.into_error()))?;
        file.as_file()
            .sync_all()
            .map_err(|err| RecordFileError::io(&path, err))?;
        file.persist(&path)
            .map_err(|err| RecordFileError::io(&path, err.error))?;

        log::debug!("wrote {rows} {} rows to {}", T::TREE, path.display());
        Ok(rows)
    }

    fn write_line(&mut self, value: &impl Serialize) -> Result<(), RecordFileError> {
        serde_json::to_writer(&mut self.out, value)
            .map_err(|err| RecordFileError::io(&self.path, err.into()))?;
        self.out
            .write_all(b"\n")
            .map_err(|err| RecordFileError::io(&self.path, err))
    }
}

impl RecordSink for RecordWriter<AvalancheRow> {
    type Error = RecordFileError;

    fn write_row(&mut self, row: AvalancheRow) -> Result<(), Self::Error> {
        self.write(&row)
    }
}
