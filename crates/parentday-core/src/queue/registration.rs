//! Parent intake form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A stored intake form. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub parent_name: String,
    pub student_name: String,
    #[serde(default)]
    pub suggestions: String,
    #[serde(default)]
    pub questions: String,
    pub submitted_at: DateTime<Utc>,
}

/// Intake form as typed by the parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub parent_name: String,
    pub student_name: String,
    pub suggestions: String,
    pub questions: String,
}

/// Validated, trimmed form ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub parent_name: String,
    pub student_name: String,
    pub suggestions: String,
    pub questions: String,
    pub submitted_at: DateTime<Utc>,
}

impl RegistrationForm {
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewRegistration, ValidationError> {
        let parent_name = self.parent_name.trim();
        let student_name = self.student_name.trim();
        if parent_name.is_empty() {
            return Err(ValidationError::MissingField("parent_name"));
        }
        if student_name.is_empty() {
            return Err(ValidationError::MissingField("student_name"));
        }
        Ok(NewRegistration {
            parent_name: parent_name.to_string(),
            student_name: student_name.to_string(),
            suggestions: self.suggestions.trim().to_string(),
            questions: self.questions.trim().to_string(),
            submitted_at: now,
        })
    }
}
