use listingdesk_api_types::{AnalyticsPeriod, AnalyticsReport, DashboardStats};

use super::client::ApiClient;
use crate::application::gateway::ApiError;

impl ApiClient {
    pub async fn analytics(
        &self,
        period: AnalyticsPeriod,
        account: Option<&str>,
    ) -> Result<AnalyticsReport, ApiError> {
        let mut query = vec![("period", period.as_str().to_string())];
        if let Some(account) = account.map(str::trim).filter(|a| !a.is_empty()) {
            query.push(("account", account.to_string()));
        }
        self.get_json("analytics/", &query).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("stats/dashboard/", &[]).await
    }
}
