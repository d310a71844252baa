//! Shared page components.
//!
//! Pieces every page template composes: the navigation, the alert banner,
//! select options, the confirmation page, and list search.

pub mod alert;
pub mod confirm;
pub mod nav;
pub mod search;
pub mod select;

pub use alert::{AlertKind, NoticeQuery, PageAlert};
pub use confirm::ConfirmTemplate;
pub use nav::Nav;
pub use search::{Searchable, filter_by_query, normalize_query};
pub use select::{Choice, SelectOption};
