//! Dashboard aggregates.

use serde::{Deserialize, Serialize};

use vetdesk_core::{AlertLevel, InventoryAlertId};

/// Headline counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_pets: u64,
    pub appointments_today: u64,
    pub pending_triage: u64,
}

/// A stock item at or below its reorder level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlert {
    pub id: InventoryAlertId,
    pub item_name: String,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    pub severity: AlertLevel,
}

impl InventoryAlert {
    /// Units needed to get back to the minimum.
    #[must_use]
    pub const fn shortfall(&self) -> i64 {
        let gap = self.minimum_stock - self.current_stock;
        if gap > 0 { gap } else { 0 }
    }
}
