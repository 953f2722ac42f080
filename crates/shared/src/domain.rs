use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque organization identifier. Only string equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl OrgId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrgId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKey {
    EnhancedDashboard,
    RealTimeNotifications,
    AdvancedAnalytics,
    BetaUiComponents,
    ExperimentalSearch,
    DarkMode,
    DashboardRefreshSeconds,
    SearchRankingModel,
}

impl FlagKey {
    /// Catalog order. The flag directory is built in this order.
    pub const ALL: [FlagKey; 8] = [
        FlagKey::EnhancedDashboard,
        FlagKey::RealTimeNotifications,
        FlagKey::AdvancedAnalytics,
        FlagKey::BetaUiComponents,
        FlagKey::ExperimentalSearch,
        FlagKey::DarkMode,
        FlagKey::DashboardRefreshSeconds,
        FlagKey::SearchRankingModel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlagKey::EnhancedDashboard => "ENHANCED_DASHBOARD",
            FlagKey::RealTimeNotifications => "REAL_TIME_NOTIFICATIONS",
            FlagKey::AdvancedAnalytics => "ADVANCED_ANALYTICS",
            FlagKey::BetaUiComponents => "BETA_UI_COMPONENTS",
            FlagKey::ExperimentalSearch => "EXPERIMENTAL_SEARCH",
            FlagKey::DarkMode => "DARK_MODE",
            FlagKey::DashboardRefreshSeconds => "DASHBOARD_REFRESH_SECONDS",
            FlagKey::SearchRankingModel => "SEARCH_RANKING_MODEL",
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flag key '{0}'")]
pub struct UnknownFlagKey(pub String);

impl FromStr for FlagKey {
    type Err = UnknownFlagKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlagKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownFlagKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagCategory {
    #[serde(rename = "UI")]
    Ui,
    Analytics,
    Performance,
    Experimental,
}

impl FlagCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagCategory::Ui => "UI",
            FlagCategory::Analytics => "Analytics",
            FlagCategory::Performance => "Performance",
            FlagCategory::Experimental => "Experimental",
        }
    }
}

impl fmt::Display for FlagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagValueType {
    Boolean,
    String,
    Number,
}

impl FlagValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagValueType::Boolean => "boolean",
            FlagValueType::String => "string",
            FlagValueType::Number => "number",
        }
    }
}

impl fmt::Display for FlagValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flag value as it travels on the wire: a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl FlagValue {
    pub fn value_type(&self) -> FlagValueType {
        match self {
            FlagValue::Bool(_) => FlagValueType::Boolean,
            FlagValue::Number(_) => FlagValueType::Number,
            FlagValue::String(_) => FlagValueType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Non-finite floats have no JSON form and yield `None`.
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(FlagValue::Number)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(value) => write!(f, "{value}"),
            FlagValue::Number(value) => write!(f, "{value}"),
            FlagValue::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Number(value.into())
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

/// Per-organization flag values. Keys are raw strings so values stored
/// under keys outside the directory survive a round trip.
pub type FlagValueMap = BTreeMap<String, FlagValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    pub key: FlagKey,
    pub name: String,
    pub description: String,
    pub category: FlagCategory,
    pub default_value: FlagValue,
    pub value_type: FlagValueType,
}

/// One page of organization ids. Never merged with other pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgPage {
    pub ids: Vec<OrgId>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
