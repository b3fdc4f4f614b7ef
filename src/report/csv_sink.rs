use std::{
    io,
    path::{Path, PathBuf},
};

use csv::WriterBuilder;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::tax_year::TaxYear;

use super::{Report, ReportRow};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create report file in {}", dir.display())]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write report row {row}")]
    Write {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("failed to flush report")]
    Flush(#[source] io::Error),
    #[error("failed to set report file permissions")]
    Permissions(#[source] io::Error),
    #[error("failed to move report into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(unix)]
const REPORT_FILE_MODE: u32 = 0o644;

pub fn default_report_path(year: TaxYear) -> PathBuf {
    PathBuf::from(format!("{year}-report.csv"))
}

/// Writes the header, then every row in report order. The header is written even when there are
/// no rows.
pub fn write_csv<W: io::Write>(writer: W, report: &Report) -> Result<(), SinkError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    writer
        .write_record(ReportRow::HEADERS)
        .map_err(|source| SinkError::Write { row: 0, source })?;

    for (i, row) in report.rows.iter().enumerate() {
        writer
            .write_record(row.to_record())
            .map_err(|source| SinkError::Write { row: i + 1, source })?;
    }

    writer.flush().map_err(SinkError::Flush)
}

/// Writes the report next to `path` and renames it into place once complete, a failure halfway
/// leaves no report file behind.
pub fn write_report_file(path: &Path, report: &Report) -> Result<(), SinkError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|source| SinkError::Create {
        dir: dir.to_path_buf(),
        source,
    })?;

    debug!(temp_path = %file.path().display(), "writing report to temporary file");
    write_csv(&mut file, report)?;

    // Temp files start out owner-only.
    #[cfg(unix)]
    {
        use std::{fs::Permissions, os::unix::fs::PermissionsExt};

        file.as_file()
            .set_permissions(Permissions::from_mode(REPORT_FILE_MODE))
            .map_err(SinkError::Permissions)?;
    }

    file.persist(path).map_err(|err| SinkError::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    Ok(())
}
