//! Read-side views over stored logs: history filters, the yearly medication
//! trend and its CSV export.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dates::parse_timestamp;
use crate::models::{PainLogEntry, StoredLog};
use crate::pipeline::normalize::format_number;

pub const CSV_HEADER: &str =
    "id,date,bodyPart,intensity,medication,doseMg,normalizedDose_0to10,effectiveness,notes";

static LEADING_DOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-+]?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());

/// Query-string filters for the history listing. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub body_part: Option<String>,
    pub intensity: Option<String>,
    pub pain_type: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, entry: &PainLogEntry) -> bool {
        if let Some(q) = query(&self.body_part) {
            let q = q.to_lowercase();
            if !entry
                .body_parts
                .iter()
                .any(|bp| bp.body_part.to_lowercase().contains(&q))
            {
                return false;
            }
        }

        if let Some(q) = query(&self.intensity) {
            // A non-numeric intensity query matches nothing.
            let Ok(wanted) = q.parse::<f64>() else {
                return false;
            };
            if !entry.body_parts.iter().any(|bp| bp.intensity == wanted) {
                return false;
            }
        }

        if let Some(q) = query(&self.pain_type) {
            let q = q.to_lowercase();
            if !entry
                .body_parts
                .iter()
                .flat_map(|bp| bp.types.iter())
                .any(|t| t.to_lowercase().contains(&q))
            {
                return false;
            }
        }

        true
    }
}

fn query(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|q| !q.is_empty())
}

pub fn filter_logs(logs: Vec<StoredLog>, filter: &LogFilter) -> Vec<StoredLog> {
    logs.into_iter()
        .filter(|log| filter.matches(&log.entry))
        .collect()
}

/// Parsed log date; unparseable timestamps sort as the Unix epoch.
pub fn log_date(entry: &PainLogEntry) -> DateTime<Utc> {
    parse_timestamp(&entry.timestamp).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Distinct years present in the logs, ascending.
pub fn available_years(logs: &[StoredLog]) -> Vec<i32> {
    let mut years: Vec<i32> = logs.iter().map(|l| log_date(&l.entry).year()).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// One chart row, taken from the first body part of a log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub body_part: String,
    pub intensity: f64,
    pub dose_mg: f64,
    /// Dose scaled to 0..=10 against the largest dose in the selection.
    pub normalized_dose: f64,
    pub medication: String,
    pub effectiveness: String,
    pub notes: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub year: Option<i32>,
    /// `YYYY-MM-DD` of the earliest and latest selected logs.
    pub from: Option<String>,
    pub to: Option<String>,
    pub points: Vec<TrendPoint>,
}

/// Leading number of a dose string (`"400mg"` → 400). Zero when absent.
pub fn dose_mg(dose: &str) -> f64 {
    LEADING_DOSE
        .find(dose)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn taken_dose(entry: &PainLogEntry) -> f64 {
    if entry.medication.taking {
        dose_mg(&entry.medication.dose)
    } else {
        0.0
    }
}

/// Build the trend for `year`, or for the latest year on record when `None`.
pub fn build_trend(logs: &[StoredLog], year: Option<i32>) -> TrendReport {
    let year = year.or_else(|| available_years(logs).last().copied());

    let mut selected: Vec<(DateTime<Utc>, &StoredLog)> = logs
        .iter()
        .map(|l| (log_date(&l.entry), l))
        .filter(|(date, _)| Some(date.year()) == year)
        .collect();
    selected.sort_by_key(|(date, _)| *date);

    let max_dose = selected
        .iter()
        .map(|(_, l)| taken_dose(&l.entry))
        .fold(0.0_f64, f64::max);

    let points = selected
        .iter()
        .map(|(date, log)| {
            let entry = &log.entry;
            let first = entry.body_parts.first();
            let dose = taken_dose(entry);
            let normalized_dose = if max_dose > 0.0 {
                (dose / max_dose * 100.0).round() / 10.0
            } else {
                0.0
            };
            let med = &entry.medication;

            TrendPoint {
                date: date.format("%b %d, %Y").to_string(),
                body_part: first
                    .map(|bp| bp.body_part.clone())
                    .unwrap_or_else(|| "unknown".into()),
                intensity: first.map(|bp| bp.intensity).unwrap_or(0.0),
                dose_mg: dose,
                normalized_dose,
                medication: if med.taking {
                    med.name.clone()
                } else {
                    "None".into()
                },
                effectiveness: if med.taking {
                    med.effectiveness.clone()
                } else {
                    "N/A".into()
                },
                notes: first.map(|bp| bp.notes.clone()).unwrap_or_default(),
                id: log.id.clone(),
            }
        })
        .collect();

    let day = |d: &DateTime<Utc>| d.format("%Y-%m-%d").to_string();
    TrendReport {
        year,
        from: selected.first().map(|(d, _)| day(d)),
        to: selected.last().map(|(d, _)| day(d)),
        points,
    }
}

fn csv_cell(value: &str) -> String {
    if value.contains(['"', ',', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the trend as CSV, header included, rows joined with `\n`.
pub fn export_csv(report: &TrendReport) -> String {
    let mut lines = Vec::with_capacity(report.points.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for p in &report.points {
        let notes = p.notes.replace(['\r', '\n'], " ");
        let cells = [
            csv_cell(&p.id),
            csv_cell(&p.date),
            csv_cell(&p.body_part),
            format_number(p.intensity),
            csv_cell(&p.medication),
            format_number(p.dose_mg),
            format_number(p.normalized_dose),
            csv_cell(&p.effectiveness),
            csv_cell(&notes),
        ];
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

pub fn export_filename(report: &TrendReport) -> String {
    format!(
        "pain-logs_{}_to_{}.csv",
        report.from.as_deref().unwrap_or("start"),
        report.to.as_deref().unwrap_or("end")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyPartEntry, GeneralFlag, Medication};

    fn stored(id: &str, timestamp: &str, part: &str, intensity: f64, dose: Option<&str>) -> StoredLog {
        StoredLog {
            id: id.into(),
            entry: PainLogEntry {
                patient_email: "a@b.com".into(),
                timestamp: timestamp.into(),
                body_parts: vec![BodyPartEntry {
                    body_part: part.into(),
                    intensity,
                    notes: String::new(),
                    types: vec!["sharp".into(), "Burning".into()],
                }],
                general_flag: GeneralFlag::Normal,
                medication: match dose {
                    Some(d) => Medication {
                        taking: true,
                        name: "Ibuprofen".into(),
                        dose: d.into(),
                        effectiveness: "some relief".into(),
                    },
                    None => Medication::not_taking(),
                },
                ai_summary: String::new(),
                pdf_data: String::new(),
            },
        }
    }

    fn filter(body_part: &str, intensity: &str, pain_type: &str) -> LogFilter {
        let opt = |s: &str| Some(s.to_string());
        LogFilter {
            body_part: opt(body_part),
            intensity: opt(intensity),
            pain_type: opt(pain_type),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let log = stored("1", "2025-01-01T00:00:00Z", "left_knee", 5.0, None);
        assert!(LogFilter::default().matches(&log.entry));
        assert!(filter(" ", "", "").matches(&log.entry));
    }

    #[test]
    fn filters_combine() {
        let log = stored("1", "2025-01-01T00:00:00Z", "left_knee", 5.0, None);
        assert!(filter("KNEE", "5", "burn").matches(&log.entry));
        assert!(!filter("elbow", "", "").matches(&log.entry));
        assert!(!filter("", "4", "").matches(&log.entry));
        assert!(!filter("", "five", "").matches(&log.entry));
        assert!(!filter("", "", "dull").matches(&log.entry));
    }

    #[test]
    fn filter_logs_keeps_matches_in_order() {
        let logs = vec![
            stored("1", "2025-01-01T00:00:00Z", "knee", 5.0, None),
            stored("2", "2025-01-02T00:00:00Z", "chest", 7.0, None),
            stored("3", "2025-01-03T00:00:00Z", "left_knee", 3.0, None),
        ];
        let ids: Vec<_> = filter_logs(logs, &filter("knee", "", ""))
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn years_are_distinct_and_sorted() {
        let logs = vec![
            stored("1", "2025-03-01T00:00:00Z", "knee", 5.0, None),
            stored("2", "2023-06-01T00:00:00Z", "knee", 5.0, None),
            stored("3", "October 1, 2025 at 3:00 PM", "knee", 5.0, None),
            stored("4", "garbage", "knee", 5.0, None),
        ];
        assert_eq!(available_years(&logs), vec![1970, 2023, 2025]);
    }

    #[test]
    fn dose_parsing_takes_leading_number() {
        assert_eq!(dose_mg("400mg"), 400.0);
        assert_eq!(dose_mg(" 12.5 mg"), 12.5);
        assert_eq!(dose_mg("two pills"), 0.0);
        assert_eq!(dose_mg(""), 0.0);
    }

    #[test]
    fn trend_defaults_to_latest_year_and_normalizes_doses() {
        let logs = vec![
            stored("old", "2024-12-31T00:00:00Z", "knee", 2.0, Some("1000mg")),
            stored("b", "2025-02-01T00:00:00Z", "chest", 6.0, Some("200mg")),
            stored("a", "2025-01-15T00:00:00Z", "knee", 4.0, Some("600 mg")),
            stored("c", "2025-03-01T00:00:00Z", "knee", 1.0, None),
        ];

        let report = build_trend(&logs, None);
        assert_eq!(report.year, Some(2025));
        assert_eq!(report.from.as_deref(), Some("2025-01-15"));
        assert_eq!(report.to.as_deref(), Some("2025-03-01"));

        let ids: Vec<_> = report.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        assert_eq!(report.points[0].date, "Jan 15, 2025");
        assert_eq!(report.points[0].dose_mg, 600.0);
        assert_eq!(report.points[0].normalized_dose, 10.0);
        assert_eq!(report.points[1].normalized_dose, 3.3);
        assert_eq!(report.points[2].medication, "None");
        assert_eq!(report.points[2].effectiveness, "N/A");
        assert_eq!(report.points[2].normalized_dose, 0.0);
    }

    #[test]
    fn explicit_year_without_logs_is_empty() {
        let logs = vec![stored("a", "2025-01-15T00:00:00Z", "knee", 4.0, None)];
        let report = build_trend(&logs, Some(2020));
        assert!(report.points.is_empty());
        assert_eq!(export_filename(&report), "pain-logs_start_to_end.csv");
    }

    #[test]
    fn csv_quotes_and_flattens_notes() {
        let mut log = stored("a", "2025-01-15T00:00:00Z", "knee", 4.5, Some("400mg"));
        log.entry.body_parts[0].notes = "worse at night,\nsays \"burning\"".into();
        let report = build_trend(&[log], None);

        let csv = export_csv(&report);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some(
                r#"a,"Jan 15, 2025",knee,4.5,Ibuprofen,400,10,some relief,"worse at night, says ""burning""""#
            )
        );
        assert_eq!(lines.next(), None);
        assert_eq!(
            export_filename(&report),
            "pain-logs_2025-01-15_to_2025-01-15.csv"
        );
    }
}
