use serde::{Deserialize, Serialize};

/// Patient identity as carried in generator file names and `patient_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub first_name: String,
    pub last_name: String,
    pub referrer_id: String,
}

impl PatientIdentity {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        referrer_id: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            referrer_id: referrer_id.into(),
        }
    }
}

impl std::fmt::Display for PatientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.first_name, self.last_name, self.referrer_id)
    }
}
