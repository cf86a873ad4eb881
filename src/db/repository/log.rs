use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{PainLogEntry, StoredLog};

/// Persist one normalized entry as a new document. Returns the generated id.
pub fn insert_log(conn: &Connection, entry: &PainLogEntry) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().simple().to_string();
    let document = serde_json::to_string(entry)?;
    conn.execute(
        "INSERT INTO logs (id, patient_email, timestamp, document) VALUES (?1, ?2, ?3, ?4)",
        params![id, entry.patient_email, entry.timestamp, document],
    )?;
    Ok(id)
}

/// All logs for one patient, or every log when `patient_email` is `None`.
pub fn list_logs(
    conn: &Connection,
    patient_email: Option<&str>,
) -> Result<Vec<StoredLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document FROM logs
         WHERE (?1 IS NULL OR patient_email = ?1)
         ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![patient_email], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut logs = Vec::new();
    for row in rows {
        let (id, document) = row?;
        let entry: PainLogEntry = serde_json::from_str(&document)?;
        logs.push(StoredLog { id, entry });
    }
    Ok(logs)
}

pub fn count_logs(conn: &Connection, patient_email: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM logs WHERE patient_email = ?1",
        params![patient_email],
        |row| row.get(0),
    )?;
    Ok(count)
}
