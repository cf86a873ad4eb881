use serde::{Deserialize, Serialize};

/// Free-text clinical background for one patient. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_email: String,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PatientRecord {
    pub fn new(patient_email: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            patient_email: patient_email.into(),
            context: context.into(),
            updated_at: None,
        }
    }
}
