//! Options for `<select>` inputs.

use vetdesk_core::{AppointmentStatus, DecoratorKind, Role, TriageSeverity, TriageStatus};

/// One `<option>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Option marked selected when `value` equals `current`.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        Self {
            selected: !current.is_empty() && value == current,
            value,
            label: label.into(),
        }
    }

    /// Options from `(value, label)` pairs.
    pub fn list<I, V, L>(items: I, current: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        items
            .into_iter()
            .map(|(value, label)| Self::new(value, label, current))
            .collect()
    }

    /// Options for every variant of a wire enum.
    #[must_use]
    pub fn choices<T: Choice>(current: &str) -> Vec<Self> {
        T::all()
            .iter()
            .map(|c| Self::new(c.value(), c.label(), current))
            .collect()
    }
}

/// An enum that can be offered in a select input.
pub trait Choice: Copy + 'static {
    fn all() -> &'static [Self];
    fn value(self) -> &'static str;
    fn label(self) -> &'static str;
}

impl Choice for Role {
    fn all() -> &'static [Self] {
        &Self::ALL
    }
    fn value(self) -> &'static str {
        self.as_str()
    }
    fn label(self) -> &'static str {
        Self::label(self)
    }
}

macro_rules! impl_choice {
    ($($ty:ty),+) => {
        $(
            impl Choice for $ty {
                fn all() -> &'static [Self] {
                    Self::ALL
                }
                fn value(self) -> &'static str {
                    self.as_str()
                }
                fn label(self) -> &'static str {
                    <$ty>::label(self)
                }
            }
        )+
    };
}

impl_choice!(AppointmentStatus, TriageSeverity, TriageStatus, DecoratorKind);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices_mark_current_value() {
        let options = SelectOption::choices::<TriageSeverity>("high");
        assert_eq!(options.len(), 4);
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].label, "High");
    }

    #[test]
    fn test_blank_current_selects_nothing() {
        let options = SelectOption::list([("", "Any"), ("dog", "Dog")], "");
        assert!(options.iter().all(|o| !o.selected));
    }
}
