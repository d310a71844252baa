//! Status and classification enums for clinic records.
//!
//! All of these mirror values the clinic API sends as `snake_case` strings.
//! Each enum exposes the wire value (`as_str`), a display label, and a badge
//! tone used by the templates.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string from a form or query is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

impl Tone {
    /// CSS modifier class used by `badge--*` styles.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Neutral => "badge--neutral",
            Self::Info => "badge--info",
            Self::Success => "badge--success",
            Self::Warning => "badge--warning",
            Self::Danger => "badge--danger",
        }
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, $label:literal, $tone:ident; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Wire value sent to and received from the API.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Badge tone for templates.
            #[must_use]
            pub const fn tone(self) -> Tone {
                match self {
                    $( Self::$variant => Tone::$tone, )+
                }
            }

            /// CSS class for the badge.
            #[must_use]
            pub const fn badge_class(self) -> &'static str {
                self.tone().css_class()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: wanted.to_string(),
                    })
            }
        }
    };
}

wire_enum! {
    /// Lifecycle of an appointment.
    AppointmentStatus, "appointment status" {
        Scheduled => "scheduled", "Scheduled", Info;
        Confirmed => "confirmed", "Confirmed", Success;
        InProgress => "in_progress", "In progress", Warning;
        Completed => "completed", "Completed", Neutral;
        Cancelled => "cancelled", "Cancelled", Danger;
        NoShow => "no_show", "No show", Danger;
    }
}

impl AppointmentStatus {
    /// Whether the appointment is finished and can no longer change.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }
}

wire_enum! {
    /// Clinical urgency of a triage record.
    ///
    /// Declaration order is urgency order, so sorting ascending puts the most
    /// urgent records first.
    TriageSeverity, "triage severity" {
        Critical => "critical", "Critical", Danger;
        High => "high", "High", Warning;
        Medium => "medium", "Medium", Info;
        Low => "low", "Low", Neutral;
    }
}

wire_enum! {
    /// Where a triaged patient is in the queue.
    TriageStatus, "triage status" {
        Waiting => "waiting", "Waiting", Warning;
        InCare => "in_care", "In care", Info;
        Discharged => "discharged", "Discharged", Success;
    }
}

wire_enum! {
    /// Kind of metadata attached to an appointment.
    DecoratorKind, "decorator kind" {
        Note => "note", "Note", Neutral;
        Reminder => "reminder", "Reminder", Info;
        Priority => "priority", "Priority", Danger;
    }
}

wire_enum! {
    /// Stock level warning for an inventory item.
    AlertLevel, "alert level" {
        Critical => "critical", "Out of stock", Danger;
        Warning => "warning", "Low stock", Warning;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_sorts_most_urgent_first() {
        let mut severities = vec![
            TriageSeverity::Low,
            TriageSeverity::Critical,
            TriageSeverity::Medium,
            TriageSeverity::High,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                TriageSeverity::Critical,
                TriageSeverity::High,
                TriageSeverity::Medium,
                TriageSeverity::Low,
            ]
        );
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
            "\"no_show\""
        );
        let status: TriageStatus = serde_json::from_str("\"in_care\"").unwrap();
        assert_eq!(status, TriageStatus::InCare);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(
            "IN_PROGRESS".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::InProgress
        );
        let err = "urgent".parse::<DecoratorKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown decorator kind: urgent");
    }

    #[test]
    fn test_closed_statuses() {
        assert!(AppointmentStatus::Cancelled.is_closed());
        assert!(!AppointmentStatus::Confirmed.is_closed());
    }

    #[test]
    fn test_badge_class() {
        assert_eq!(TriageSeverity::Critical.badge_class(), "badge--danger");
        assert_eq!(AlertLevel::Warning.badge_class(), "badge--warning");
    }
}
