//! The fixed catalog of known feature flags.
//!
//! Built once on first access and never mutated afterwards.

use std::sync::OnceLock;

use crate::domain::{FlagCategory, FlagDefinition, FlagKey, FlagValue, FlagValueType};

static DEFINITIONS: OnceLock<Vec<FlagDefinition>> = OnceLock::new();

pub fn definitions() -> &'static [FlagDefinition] {
    DEFINITIONS.get_or_init(|| FlagKey::ALL.into_iter().map(describe).collect())
}

pub fn definition(key: FlagKey) -> &'static FlagDefinition {
    // `definitions()` is built from `FlagKey::ALL`, whose order matches the
    // enum discriminants.
    &definitions()[key as usize]
}

/// Looks up a definition by its wire key, e.g. a path segment.
pub fn find_definition(raw_key: &str) -> Option<&'static FlagDefinition> {
    definitions().iter().find(|def| def.key.as_str() == raw_key)
}

fn describe(key: FlagKey) -> FlagDefinition {
    let (name, description, category, default_value) = match key {
        FlagKey::EnhancedDashboard => (
            "Enhanced Dashboard",
            "Show the new dashboard with improved metrics",
            FlagCategory::Ui,
            FlagValue::Bool(false),
        ),
        FlagKey::RealTimeNotifications => (
            "Real-time Notifications",
            "Enable real-time push notifications",
            FlagCategory::Performance,
            FlagValue::Bool(true),
        ),
        FlagKey::AdvancedAnalytics => (
            "Advanced Analytics",
            "Enable advanced analytics tracking",
            FlagCategory::Analytics,
            FlagValue::Bool(false),
        ),
        FlagKey::BetaUiComponents => (
            "Beta UI Components",
            "Show beta version of UI components",
            FlagCategory::Ui,
            FlagValue::Bool(false),
        ),
        FlagKey::ExperimentalSearch => (
            "Experimental Search",
            "Use experimental search algorithm",
            FlagCategory::Experimental,
            FlagValue::Bool(false),
        ),
        FlagKey::DarkMode => (
            "Dark Mode",
            "Enable dark mode theme",
            FlagCategory::Ui,
            FlagValue::Bool(true),
        ),
        FlagKey::DashboardRefreshSeconds => (
            "Dashboard Refresh Interval",
            "Seconds between automatic dashboard refreshes",
            FlagCategory::Performance,
            FlagValue::from(30),
        ),
        FlagKey::SearchRankingModel => (
            "Search Ranking Model",
            "Name of the ranking model used by search",
            FlagCategory::Experimental,
            FlagValue::from("baseline"),
        ),
    };

    FlagDefinition {
        key,
        name: name.to_string(),
        description: description.to_string(),
        category,
        value_type: default_value.value_type(),
        default_value,
    }
}
