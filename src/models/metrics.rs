// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded query execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub recorded_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rolling aggregate over the retained sample window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub error_count: u64,
    /// `error_count / total_queries`; 0.0 when no queries were recorded.
    pub error_rate: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub avg_duration_ms: f64,
    pub latest_duration_ms: u64,
}

/// Cached summary of the external search service's reachability/state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Unknown,
    Healthy,
    Warning,
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "unknown"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Error => write!(f, "error"),
        }
    }
}

/// Read-only aggregation served to the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub health: HealthStatus,
    pub metrics: MetricsSnapshot,
    pub recent_queries: Vec<MetricSample>,
    pub recent_errors: Vec<MetricSample>,
}
