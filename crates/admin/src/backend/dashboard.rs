//! Dashboard endpoints.

use tracing::instrument;

use super::{Api, BackendError, DashboardStats, InventoryAlert};

/// Service wrapper for dashboard aggregates.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    api: Api<'a>,
}

impl<'a> Dashboard<'a> {
    pub(crate) const fn new(api: Api<'a>) -> Self {
        Self { api }
    }

    /// Headline counts.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn stats(self) -> Result<DashboardStats, BackendError> {
        self.api.get("dashboard/stats", &[]).await
    }

    /// Stock items below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn inventory_alerts(self) -> Result<Vec<InventoryAlert>, BackendError> {
        Ok(self
            .api
            .get_list::<InventoryAlert>("inventory/alerts", &[])
            .await?
            .items)
    }
}
