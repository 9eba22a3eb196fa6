//! Participation certificates.

use crate::event::Event;
use crate::types::{CertificateId, EventId, UserId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A certificate issued to a volunteer for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Certificate id
    pub id: CertificateId,
    /// Recipient
    pub user_id: UserId,
    /// Event attended
    pub event_id: EventId,
    /// Event name at issue time
    pub event_name: String,
    /// Location of the stored certificate file
    #[serde(default)]
    pub file_url: String,
    /// Issue time
    pub date_issued: DateTime<Utc>,
}

/// Request to issue a certificate. The file itself is already stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    /// Recipient
    pub user_id: UserId,
    /// Location of the stored certificate file
    pub file_url: String,
}

impl NewCertificate {
    /// Checks that a file url was supplied.
    ///
    /// # Errors
    ///
    /// Returns `Invalid("Missing required data.")` when the url is blank.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.file_url.trim().is_empty() {
            return Err(ValidationError::Invalid("Missing required data.".to_string()));
        }
        Ok(self)
    }

    /// Builds the stored certificate, copying the event name.
    #[must_use]
    pub fn issue(self, id: CertificateId, event: &Event, date_issued: DateTime<Utc>) -> Certificate {
        Certificate {
            id,
            user_id: self.user_id,
            event_id: event.id,
            event_name: event.name.clone(),
            file_url: self.file_url.trim().to_string(),
            date_issued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NewEvent;

    #[test]
    fn blank_url_is_missing_data() {
        let err = NewCertificate {
            user_id: UserId::new(),
            file_url: " ".to_string(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required data.");
    }

    #[test]
    fn issue_copies_event_name() {
        let now = Utc::now();
        let event = Event::from_new(
            EventId::new(),
            NewEvent::minimal("Tree Planting", "Riverside", now, 20),
            None,
            now,
        );
        let user_id = UserId::new();

        let cert = NewCertificate {
            user_id,
            file_url: "https://files.example.org/cert.pdf".to_string(),
        }
        .issue(CertificateId::new(), &event, now);

        assert_eq!(cert.event_name, "Tree Planting");
        assert_eq!(cert.event_id, event.id);
        assert_eq!(cert.user_id, user_id);
        assert_eq!(cert.date_issued, now);
    }
}
