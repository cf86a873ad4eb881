use serde::{Deserialize, Serialize};

/// One normalized pain report. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainLogEntry {
    pub patient_email: String,
    /// ISO 8601, as supplied or generated at normalization time.
    pub timestamp: String,
    pub body_parts: Vec<BodyPartEntry>,
    pub general_flag: GeneralFlag,
    pub medication: Medication,
    pub ai_summary: String,
    /// Markdown report rendered for clinicians.
    pub pdf_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPartEntry {
    pub body_part: String,
    pub intensity: f64,
    pub notes: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub taking: bool,
    pub name: String,
    pub dose: String,
    pub effectiveness: String,
}

impl Medication {
    pub fn not_taking() -> Self {
        Self::default()
    }
}

/// Severity marker stored as `0` (normal) or `1` (emergency).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GeneralFlag {
    #[default]
    Normal,
    Emergency,
}

impl GeneralFlag {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Emergency => 1,
        }
    }

    pub fn is_emergency(self) -> bool {
        self == Self::Emergency
    }
}

impl From<GeneralFlag> for u8 {
    fn from(flag: GeneralFlag) -> Self {
        flag.as_u8()
    }
}

impl TryFrom<u8> for GeneralFlag {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Emergency),
            other => Err(format!("general_flag must be 0 or 1, got {other}")),
        }
    }
}

/// A persisted log as returned by the API: the entry plus its store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLog {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub entry: PainLogEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_flag_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&GeneralFlag::Emergency).unwrap(), "1");
        assert_eq!(serde_json::to_string(&GeneralFlag::Normal).unwrap(), "0");
    }

    #[test]
    fn general_flag_rejects_out_of_range() {
        let parsed: Result<GeneralFlag, _> = serde_json::from_str("3");
        assert!(parsed.is_err());
    }

    #[test]
    fn stored_log_flattens_entry_under_underscore_id() {
        let stored = StoredLog {
            id: "abc".into(),
            entry: PainLogEntry {
                patient_email: "a@b.com".into(),
                timestamp: "2025-01-01T00:00:00Z".into(),
                body_parts: vec![BodyPartEntry {
                    body_part: "knee".into(),
                    intensity: 5.0,
                    notes: String::new(),
                    types: vec![],
                }],
                general_flag: GeneralFlag::Normal,
                medication: Medication::not_taking(),
                ai_summary: String::new(),
                pdf_data: String::new(),
            },
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["_id"], "abc");
        assert_eq!(json["patient_email"], "a@b.com");
        assert_eq!(json["body_parts"][0]["body_part"], "knee");
        assert_eq!(json["general_flag"], 0);
    }
}
