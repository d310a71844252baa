//! Triage queue records.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use vetdesk_core::{PetId, TriageId, TriageSeverity, TriageStatus};

use super::common::optional_datetime;

/// A patient waiting for, or receiving, urgent care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triage {
    pub id: TriageId,
    pub pet_id: PetId,
    #[serde(default)]
    pub pet_name: Option<String>,
    pub severity: TriageSeverity,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: TriageStatus,
    #[serde(default, with = "optional_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl Triage {
    /// Queue order: most severe first, then earliest arrival. Records with
    /// no arrival time go last within their severity.
    #[must_use]
    pub fn queue_order(&self, other: &Self) -> Ordering {
        self.severity.cmp(&other.severity).then_with(|| {
            match (self.created_at, other.created_at) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    }
}

/// Sort records into queue order (see [`Triage::queue_order`]).
pub fn sort_by_urgency(records: &mut [Triage]) {
    records.sort_by(Triage::queue_order);
}

/// Body for creating or updating a triage record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageInput {
    pub pet_id: PetId,
    pub severity: TriageSeverity,
    pub symptoms: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: TriageStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::types::common::parse_timestamp;

    fn record(id: i64, severity: TriageSeverity, at: Option<&str>) -> Triage {
        Triage {
            id: TriageId::new(id),
            pet_id: PetId::new(1),
            pet_name: None,
            severity,
            symptoms: "vomiting".to_string(),
            notes: None,
            status: TriageStatus::Waiting,
            created_at: at.and_then(parse_timestamp),
        }
    }

    #[test]
    fn test_sort_by_severity_then_arrival() {
        let mut queue = vec![
            record(1, TriageSeverity::Low, Some("2026-03-14T08:00:00")),
            record(2, TriageSeverity::Critical, Some("2026-03-14T09:10:00")),
            record(3, TriageSeverity::High, None),
            record(4, TriageSeverity::Critical, Some("2026-03-14T09:00:00")),
            record(5, TriageSeverity::High, Some("2026-03-14T10:00:00")),
        ];
        sort_by_urgency(&mut queue);

        let ids: Vec<i64> = queue.iter().map(|t| t.id.as_i64()).collect();
        assert_eq!(ids, vec![4, 2, 5, 3, 1]);
    }
}
