use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::PatientRecord;

/// Create or replace the context for `record.patient_email`.
pub fn upsert_record(conn: &Connection, record: &PatientRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO records (patient_email, context) VALUES (?1, ?2)
         ON CONFLICT(patient_email) DO UPDATE SET
             context = excluded.context,
             updated_at = datetime('now')",
        params![record.patient_email, record.context],
    )?;
    Ok(())
}

pub fn get_record(
    conn: &Connection,
    patient_email: &str,
) -> Result<Option<PatientRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT patient_email, context, updated_at FROM records WHERE patient_email = ?1",
            params![patient_email],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

pub fn list_records(conn: &Connection) -> Result<Vec<PatientRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_email, context, updated_at FROM records ORDER BY created_at ASC, patient_email ASC",
    )?;
    let rows = stmt.query_map([], row_to_record)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Replace the context of an existing record. Returns false when no record matched.
pub fn update_record_context(
    conn: &Connection,
    patient_email: &str,
    context: &str,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE records SET context = ?2, updated_at = datetime('now') WHERE patient_email = ?1",
        params![patient_email, context],
    )?;
    Ok(changed > 0)
}

pub fn delete_record(conn: &Connection, patient_email: &str) -> Result<bool, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM records WHERE patient_email = ?1",
        params![patient_email],
    )?;
    Ok(removed > 0)
}

/// Context string handed to the intake assistant; empty when the patient has none.
pub fn get_patient_context(conn: &Connection, patient_email: &str) -> Result<String, DatabaseError> {
    Ok(get_record(conn, patient_email)?
        .map(|r| r.context)
        .unwrap_or_default())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        patient_email: row.get(0)?,
        context: row.get(1)?,
        updated_at: row.get(2)?,
    })
}
