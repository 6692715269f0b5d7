//! Flat CSV dumps of interview history and parent registrations.
//!
//! Output is UTF-8 with a leading BOM so spreadsheet apps pick the right
//! encoding. Fields are not quoted; commas inside text become a full-width
//! comma and newlines become spaces.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::info;

use crate::error::{CoreError, ValidationError};
use crate::queue::{format_clock, Registration, Ticket};

const BOM: &str = "\u{FEFF}";
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

const INTERVIEW_HEADERS: &str = "Number,Student,Parent,Started,Completed,Duration";
const REGISTRATION_HEADERS: &str = "Submitted,Parent,Student,Suggestions,Questions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Interviews,
    Registrations,
}

impl ExportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Interviews => "interviews",
            ExportKind::Registrations => "registrations",
        }
    }

    /// `{class_label}_{kind}_{YYYY-MM-DD}.csv`
    pub fn file_name(self, class_label: &str, date: NaiveDate) -> String {
        format!("{class_label}_{}_{}.csv", self.as_str(), date.format("%Y-%m-%d"))
    }
}

/// Completed interviews, in the order given (newest first from
/// [`QueueView::completed`](crate::queue::QueueView::completed)).
pub fn interviews_csv<Tz>(completed: &[&Ticket], tz: &Tz) -> Result<String, ValidationError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if completed.is_empty() {
        return Err(ValidationError::EmptyExport("interviews"));
    }
    let rows = completed.iter().map(|t| {
        [
            t.number.to_string(),
            clean(&t.student_name),
            clean(&t.parent_name),
            local_timestamp(t.started_at, tz),
            local_timestamp(t.completed_at, tz),
            format_clock(t.duration_seconds.unwrap_or(0)),
        ]
        .join(",")
    });
    Ok(assemble(INTERVIEW_HEADERS, rows))
}

/// Registrations, in the order given (newest first from the store).
pub fn registrations_csv<Tz>(
    registrations: &[Registration],
    tz: &Tz,
) -> Result<String, ValidationError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if registrations.is_empty() {
        return Err(ValidationError::EmptyExport("registrations"));
    }
    let rows = registrations.iter().map(|r| {
        [
            local_timestamp(Some(r.submitted_at), tz),
            clean(&r.parent_name),
            clean(&r.student_name),
            clean(&r.suggestions),
            clean(&r.questions),
        ]
        .join(",")
    });
    Ok(assemble(REGISTRATION_HEADERS, rows))
}

/// Write `content` to `dir/file_name`, returning the full path.
pub fn write_to_dir(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, CoreError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}

fn assemble(headers: &str, rows: impl Iterator<Item = String>) -> String {
    let mut lines = vec![headers.to_string()];
    lines.extend(rows);
    format!("{BOM}{}", lines.join("\n"))
}

fn clean(text: &str) -> String {
    text.replace(',', "\u{FF0C}")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn local_timestamp<Tz>(at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match at {
        Some(at) => at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::TicketStatus;
    use chrono::FixedOffset;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, h, m, s).unwrap()
    }

    fn completed(number: i64, student: &str, parent: &str) -> Ticket {
        let mut t = Ticket::new_waiting(format!("t{number}"), number, student, parent, at(7, 0, 0));
        t.status = TicketStatus::Completed;
        t.started_at = Some(at(8, 0, 0));
        t.completed_at = Some(at(8, 9, 5));
        t.duration_seconds = Some(545);
        t
    }

    #[test]
    fn interviews_csv_layout() {
        let t = completed(3001, "Ada", "Mrs A");
        let csv = interviews_csv(&[&t], &Utc).unwrap();
        assert!(csv.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').split('\n').collect();
        assert_eq!(lines[0], "Number,Student,Parent,Started,Completed,Duration");
        assert_eq!(
            lines[1],
            "3001,Ada,Mrs A,2026/10/18 08:00:00,2026/10/18 08:09:05,09:05"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn interviews_csv_uses_local_time_and_dash_for_missing() {
        let mut t = completed(3002, "Bob", "Mr B");
        t.started_at = None;
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let csv = interviews_csv(&[&t], &tz).unwrap();
        assert!(csv.ends_with("3002,Bob,Mr B,-,2026/10/18 16:09:05,09:05"));
    }

    #[test]
    fn registrations_csv_cleans_text() {
        let reg = Registration {
            id: "r1".into(),
            parent_name: "Mrs A".into(),
            student_name: "Ada".into(),
            suggestions: "more homework, less tests".into(),
            questions: "line one\nline two".into(),
            submitted_at: at(9, 30, 0),
        };
        let csv = registrations_csv(&[reg], &Utc).unwrap();
        let body = csv.trim_start_matches('\u{FEFF}');
        assert_eq!(
            body,
            "Submitted,Parent,Student,Suggestions,Questions\n\
             2026/10/18 09:30:00,Mrs A,Ada,more homework\u{FF0C} less tests,line one line two"
        );
    }

    #[test]
    fn empty_exports_are_rejected() {
        assert_eq!(
            interviews_csv(&[], &Utc),
            Err(ValidationError::EmptyExport("interviews"))
        );
        assert_eq!(
            registrations_csv(&[], &Utc),
            Err(ValidationError::EmptyExport("registrations"))
        );
    }

    #[test]
    fn file_names_carry_label_kind_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(
            ExportKind::Interviews.file_name("3-B", date),
            "3-B_interviews_2026-10-18.csv"
        );
        assert_eq!(
            ExportKind::Registrations.file_name("parent-day", date),
            "parent-day_registrations_2026-10-18.csv"
        );
    }

    #[test]
    fn write_to_dir_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_to_dir(&dir.path().join("out"), "x.csv", "\u{FEFF}a\n1").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "\u{FEFF}a\n1");
    }
}
