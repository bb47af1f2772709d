//! Dashboard View Registry
//!
//! Declares the dashboard's known views and the access requirement each
//! one carries. The guard consumes these; routing itself lives in the
//! presentation layer.

use super::policy::RouteRequirement;
use serde::{Deserialize, Serialize};

/// Route the guard redirects to when a visitor must sign in
pub const LOGIN_ROUTE: &str = "/auth";

/// Known dashboard views
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardView {
    /// Store layout heat map
    HeatMap,
    /// Zone and section analytics
    ZoneAnalytics,
    /// Camera status map
    CameraMap,
    /// Sales analytics charts
    SalesAnalytics,
    /// Seasonal trend charts
    SeasonalTrends,
    /// Report exports
    Reports,
    /// Store administration screens
    StoreManagement,
    /// Product administration screens
    ProductManagement,
}

impl DashboardView {
    /// All views, in display order
    pub fn all() -> [DashboardView; 8] {
        [
            DashboardView::HeatMap,
            DashboardView::ZoneAnalytics,
            DashboardView::CameraMap,
            DashboardView::SalesAnalytics,
            DashboardView::SeasonalTrends,
            DashboardView::Reports,
            DashboardView::StoreManagement,
            DashboardView::ProductManagement,
        ]
    }

    /// Access requirement this view declares
    ///
    /// The administrative CRUD screens are manager gated; every other
    /// view only requires a signed-in operator.
    pub fn requirement(&self) -> RouteRequirement {
        match self {
            DashboardView::StoreManagement | DashboardView::ProductManagement => {
                RouteRequirement::manager_only()
            }
            DashboardView::HeatMap
            | DashboardView::ZoneAnalytics
            | DashboardView::CameraMap
            | DashboardView::SalesAnalytics
            | DashboardView::SeasonalTrends
            | DashboardView::Reports => RouteRequirement::authenticated(),
        }
    }
}

impl std::fmt::Display for DashboardView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardView::HeatMap => write!(f, "heat_map"),
            DashboardView::ZoneAnalytics => write!(f, "zone_analytics"),
            DashboardView::CameraMap => write!(f, "camera_map"),
            DashboardView::SalesAnalytics => write!(f, "sales_analytics"),
            DashboardView::SeasonalTrends => write!(f, "seasonal_trends"),
            DashboardView::Reports => write!(f, "reports"),
            DashboardView::StoreManagement => write!(f, "store_management"),
            DashboardView::ProductManagement => write!(f, "product_management"),
        }
    }
}

impl std::str::FromStr for DashboardView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heat_map" => Ok(DashboardView::HeatMap),
            "zone_analytics" => Ok(DashboardView::ZoneAnalytics),
            "camera_map" => Ok(DashboardView::CameraMap),
            "sales_analytics" => Ok(DashboardView::SalesAnalytics),
            "seasonal_trends" => Ok(DashboardView::SeasonalTrends),
            "reports" => Ok(DashboardView::Reports),
            "store_management" => Ok(DashboardView::StoreManagement),
            "product_management" => Ok(DashboardView::ProductManagement),
            _ => Err(format!("Unknown dashboard view: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn only_admin_screens_require_manager() {
        for view in DashboardView::all() {
            let requirement = view.requirement();
            assert!(!requirement.anonymous_allowed, "{} must not be public", view);

            let gated = matches!(
                view,
                DashboardView::StoreManagement | DashboardView::ProductManagement
            );
            assert_eq!(
                requirement.required_role.is_some(),
                gated,
                "unexpected role gate on {}",
                view
            );
        }
    }

    #[test]
    fn view_names_roundtrip() {
        for view in DashboardView::all() {
            let parsed = DashboardView::from_str(&view.to_string()).unwrap();
            assert_eq!(parsed, view);
        }
        assert!(DashboardView::from_str("inventory").is_err());
    }
}
