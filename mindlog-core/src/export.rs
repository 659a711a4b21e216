//! Exporting the schedule as an .ics file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{MindLogError, MindLogResult};
use crate::ics::generate_ics;
use crate::timeline::{EventKind, TimelineEvent};

pub const MIME_TYPE: &str = "text/calendar";

/// `MindLog_Schedule_2024-12-14.ics`
pub fn export_filename(date: NaiveDate) -> String {
    format!("MindLog_Schedule_{}.ics", date.format("%Y-%m-%d"))
}

/// Where a finished calendar document goes.
pub trait ExportSink {
    /// Hand over `contents` under `filename`; returns where it ended up.
    fn deliver(&self, contents: &str, filename: &str, mime_type: &str) -> MindLogResult<PathBuf>;
}

/// Writes exports into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&self, contents: &str, filename: &str, mime_type: &str) -> MindLogResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, contents)?;
        tracing::debug!(path = %path.display(), mime_type, "wrote export");
        Ok(path)
    }
}

/// Outcome of an export, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

/// Export the schedule events among `events`. Diary entries are left out.
///
/// Never fails: problems are reported through [`ExportResult`]. When there
/// is nothing to export no file is written.
pub fn export_events(events: &[TimelineEvent], sink: &dyn ExportSink, today: NaiveDate) -> ExportResult {
    match try_export(events, sink, today) {
        Ok((path, count)) => {
            tracing::info!(count, path = %path.display(), "exported schedule");
            ExportResult {
                success: true,
                message: format!(
                    "Exported {} event{}",
                    count,
                    if count == 1 { "" } else { "s" }
                ),
                file_path: Some(path),
            }
        }
        Err(MindLogError::EmptySelection) => ExportResult {
            success: false,
            message: MindLogError::EmptySelection.to_string(),
            file_path: None,
        },
        Err(e) => {
            tracing::warn!("export failed: {e}");
            ExportResult {
                success: false,
                message: format!("Export failed: {e}"),
                file_path: None,
            }
        }
    }
}

fn try_export(
    events: &[TimelineEvent],
    sink: &dyn ExportSink,
    today: NaiveDate,
) -> MindLogResult<(PathBuf, usize)> {
    let schedule: Vec<TimelineEvent> = events
        .iter()
        .filter(|e| e.kind == EventKind::Schedule)
        .cloned()
        .collect();
    if schedule.is_empty() {
        return Err(MindLogError::EmptySelection);
    }

    let contents = generate_ics(&schedule)?;
    let path = sink.deliver(&contents, &export_filename(today), MIME_TYPE)?;
    Ok((path, schedule.len()))
}

/// Delete `.ics` files left in `dir` by earlier exports. Returns how many
/// were removed; files that cannot be removed are logged and skipped.
pub fn cleanup_exported_files(dir: &Path) -> MindLogResult<usize> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(0);
    };

    let mut removed = 0;
    for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
        let is_ics = path.is_file() && path.extension().is_some_and(|ext| ext == "ics");
        if !is_ics {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), "could not remove export: {e}"),
        }
    }

    Ok(removed)
}
