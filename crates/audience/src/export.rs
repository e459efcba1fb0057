//! CSV export, partitioned by email presence.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::profile::UserProfile;

/// File name for profiles with a discovered email.
pub const EMAILS_FILE: &str = "users-emails.csv";

/// File name for profiles without one.
pub const NO_EMAILS_FILE: &str = "users-noemails.csv";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Summary of an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub with_email: usize,
    pub without_email: usize,
    /// Written file, present only when its partition was non-empty.
    pub emails_path: Option<PathBuf>,
    pub no_emails_path: Option<PathBuf>,
}

impl ExportSummary {
    pub fn total(&self) -> usize {
        self.with_email + self.without_email
    }
}

/// Split profiles by email presence, preserving order.
///
/// Pure: callers decide what to do with each partition.
pub fn partition_by_email(profiles: Vec<UserProfile>) -> (Vec<UserProfile>, Vec<UserProfile>) {
    profiles
        .into_iter()
        .partition(|profile| profile.has_email())
}

/// Write profiles to one CSV file with a header row.
///
/// Absent fields become empty columns. Empty input writes nothing, not
/// even the file.
pub fn write_profiles(path: &Path, profiles: &[UserProfile]) -> Result<(), ExportError> {
    if profiles.is_empty() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    for profile in profiles {
        writer.serialize(profile)?;
    }
    writer.flush()?;
    Ok(())
}

/// Partition profiles by email presence and write each non-empty
/// partition to its CSV file under `output_dir`.
///
/// An empty partition produces no file, so exporting an empty audience
/// writes nothing at all.
pub fn export_partitioned(
    output_dir: &Path,
    profiles: Vec<UserProfile>,
) -> Result<ExportSummary, ExportError> {
    let (with_email, without_email) = partition_by_email(profiles);

    let mut summary = ExportSummary {
        with_email: with_email.len(),
        without_email: without_email.len(),
        ..ExportSummary::default()
    };

    if !with_email.is_empty() {
        let path = output_dir.join(EMAILS_FILE);
        write_profiles(&path, &with_email)?;
        summary.emails_path = Some(path);
    }

    if !without_email.is_empty() {
        let path = output_dir.join(NO_EMAILS_FILE);
        write_profiles(&path, &without_email)?;
        summary.no_emails_path = Some(path);
    }

    Ok(summary)
}
