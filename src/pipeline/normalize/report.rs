//! Markdown report synthesized for logs that arrive without one.

use std::fmt::Write;

use crate::dates::format_display_date;
use crate::models::PainLogEntry;

pub const REPORT_TITLE: &str = "# Pain Report";

/// Render the clinician-facing report. `pdf_data` on the input is ignored.
pub fn render_markdown_report(entry: &PainLogEntry) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{REPORT_TITLE}\n");
    let _ = writeln!(out, "**Patient:** {}  ", entry.patient_email);
    let _ = writeln!(out, "**Date:** {}", format_display_date(&entry.timestamp));
    if entry.general_flag.is_emergency() {
        let _ = writeln!(out, "\n> **Emergency flagged** during intake.");
    }

    let _ = writeln!(out, "\n## Summary\n");
    if entry.ai_summary.trim().is_empty() {
        let _ = writeln!(out, "_No summary provided._");
    } else {
        let _ = writeln!(out, "{}", entry.ai_summary.trim());
    }

    let _ = writeln!(out, "\n## Body Parts\n");
    for part in &entry.body_parts {
        let _ = write!(
            out,
            "- **{}**: {}/10",
            part.body_part,
            format_number(part.intensity)
        );
        if !part.types.is_empty() {
            let _ = write!(out, " ({})", part.types.join(", "));
        }
        out.push('\n');
        if !part.notes.trim().is_empty() {
            let _ = writeln!(out, "  - Notes: {}", part.notes.trim());
        }
    }

    let _ = writeln!(out, "\n## Medication\n");
    let med = &entry.medication;
    if med.taking {
        let _ = writeln!(out, "- Taking: Yes");
        for (label, value) in [
            ("Name", &med.name),
            ("Dose", &med.dose),
            ("Effectiveness", &med.effectiveness),
        ] {
            if !value.trim().is_empty() {
                let _ = writeln!(out, "- {label}: {}", value.trim());
            }
        }
    } else {
        let _ = writeln!(out, "- Not taking medication for this pain.");
    }

    out
}

/// `5.0` → `"5"`, `7.5` → `"7.5"`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
