// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Query timing, rolling metrics, and the cached backend health check.
//!
//! Samples live in a bounded ring buffer behind a single mutex; both locks
//! are held only for short, non-awaiting critical sections. Metrics read
//! during a concurrent `track_query` may miss that in-flight sample, which
//! is acceptable for monitoring.

use crate::models::metrics::{DashboardData, HealthStatus, MetricSample, MetricsSnapshot};
use crate::services::search::SearchBackend;
use anyhow::Result;
use chrono::Utc;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Retained sample window.
const MAX_SAMPLES: usize = 500;

/// Latency above which a successful query is logged as slow.
const WARN_LATENCY: Duration = Duration::from_secs(1);

/// Latency above which a successful query is logged as an operational error.
const ERROR_LATENCY: Duration = Duration::from_secs(5);

/// Rolling error rate above which a warning is logged after each sample.
const ERROR_RATE_THRESHOLD: f64 = 0.05;

/// How long a health-check result is served from cache.
const HEALTH_TTL: Duration = Duration::from_secs(300);

struct CachedHealth {
    status: HealthStatus,
    checked_at: Instant,
}

/// Severity of a latency threshold breach, independent of the query outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatencyBreach {
    Warn,
    Error,
}

fn latency_breach(elapsed: Duration) -> Option<LatencyBreach> {
    if elapsed >= ERROR_LATENCY {
        Some(LatencyBreach::Error)
    } else if elapsed >= WARN_LATENCY {
        Some(LatencyBreach::Warn)
    } else {
        None
    }
}

pub struct SearchMonitor {
    backend: Arc<dyn SearchBackend>,
    samples: Mutex<VecDeque<MetricSample>>,
    health: Mutex<Option<CachedHealth>>,
    health_ttl: Duration,
}

impl SearchMonitor {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            samples: Mutex::new(VecDeque::with_capacity(MAX_SAMPLES)),
            health: Mutex::new(None),
            health_ttl: HEALTH_TTL,
        }
    }

    #[cfg(test)]
    fn with_health_ttl(mut self, ttl: Duration) -> Self {
        self.health_ttl = ttl;
        self
    }

    /// Run one search operation, recording its duration and outcome. The
    /// operation's result passes through untouched; tracking never changes
    /// behavior, only observes it.
    pub async fn track_query<T, F, Fut>(&self, query: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let outcome = operation().await;
        let elapsed = started.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        let sample = MetricSample {
            recorded_at: Utc::now(),
            duration_ms,
            success: outcome.is_ok(),
            query: query.to_string(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };
        let error_rate = self.record(sample);

        // Latency thresholds apply to every outcome; a failed query can be
        // slow too.
        match latency_breach(elapsed) {
            Some(LatencyBreach::Error) => {
                error!(query = %query, duration_ms, "Search query exceeded error latency");
            }
            Some(LatencyBreach::Warn) => {
                warn!(query = %query, duration_ms, "Slow search query");
            }
            None => {}
        }
        if let Err(e) = &outcome {
            warn!(query = %query, duration_ms, error = %e, "Search query failed");
        }
        if error_rate > ERROR_RATE_THRESHOLD {
            warn!(
                error_rate = format!("{:.1}%", error_rate * 100.0),
                "Search error rate above threshold"
            );
        }

        outcome
    }

    fn record(&self, sample: MetricSample) -> f64 {
        let mut samples = lock(&self.samples);
        if samples.len() == MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(sample);

        let errors = samples.iter().filter(|s| !s.success).count();
        errors as f64 / samples.len() as f64
    }

    /// Aggregate over the retained window.
    pub fn metrics(&self) -> MetricsSnapshot {
        let samples = lock(&self.samples);
        if samples.is_empty() {
            return MetricsSnapshot::default();
        }

        let total = samples.len() as u64;
        let errors = samples.iter().filter(|s| !s.success).count() as u64;
        let durations: Vec<u64> = samples.iter().map(|s| s.duration_ms).collect();
        let sum: u64 = durations.iter().sum();

        MetricsSnapshot {
            total_queries: total,
            error_count: errors,
            error_rate: errors as f64 / total as f64,
            min_duration_ms: durations.iter().copied().min().unwrap_or(0),
            max_duration_ms: durations.iter().copied().max().unwrap_or(0),
            avg_duration_ms: sum as f64 / total as f64,
            latest_duration_ms: samples.back().map_or(0, |s| s.duration_ms),
        }
    }

    /// Backend health, cached for the TTL. Unreachable stats mean `Error`;
    /// an index that is mid-ingestion with zero documents is `Warning` (it
    /// answers queries but returns nothing useful yet).
    pub async fn check_health(&self) -> HealthStatus {
        {
            let cached = lock(&self.health);
            if let Some(entry) = cached.as_ref() {
                if entry.checked_at.elapsed() < self.health_ttl {
                    return entry.status;
                }
            }
            // Lock dropped before the await below.
        }

        let status = match self.backend.stats().await {
            Ok(stats) if stats.is_indexing && stats.document_count == 0 => HealthStatus::Warning,
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                error!(error = %e, "Search backend health check failed");
                HealthStatus::Error
            }
        };

        *lock(&self.health) = Some(CachedHealth {
            status,
            checked_at: Instant::now(),
        });
        status
    }

    /// Most recent samples, newest first.
    pub fn recent_queries(&self, count: usize) -> Vec<MetricSample> {
        lock(&self.samples)
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect()
    }

    /// Most recent failed samples, newest first.
    pub fn recent_errors(&self, count: usize) -> Vec<MetricSample> {
        lock(&self.samples)
            .iter()
            .rev()
            .filter(|s| !s.success)
            .take(count)
            .cloned()
            .collect()
    }

    /// Last computed health without probing the backend; `Unknown` until the
    /// first completed check.
    pub fn cached_health(&self) -> HealthStatus {
        lock(&self.health)
            .as_ref()
            .map_or(HealthStatus::Unknown, |entry| entry.status)
    }

    /// Dashboard aggregation. Health is the last-known value; only the
    /// health endpoint itself triggers a backend probe.
    pub fn dashboard_data(&self) -> DashboardData {
        DashboardData {
            health: self.cached_health(),
            metrics: self.metrics(),
            recent_queries: self.recent_queries(10),
            recent_errors: self.recent_errors(10),
        }
    }
}

/// A panicked tracker thread must not take monitoring down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::SearchDocument;
    use crate::models::query::QuerySpec;
    use crate::services::search::{BackendSearchResults, IndexSettingsSpec, IndexStats};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double whose stats calls are counted and configurable.
    struct StatsBackend {
        stats_calls: AtomicUsize,
        document_count: u64,
        is_indexing: bool,
        fail: bool,
    }

    impl StatsBackend {
        fn healthy() -> Self {
            Self {
                stats_calls: AtomicUsize::new(0),
                document_count: 10,
                is_indexing: false,
                fail: false,
            }
        }

        fn warming_up() -> Self {
            Self {
                document_count: 0,
                is_indexing: true,
                ..Self::healthy()
            }
        }

        fn unreachable() -> Self {
            Self {
                fail: true,
                ..Self::healthy()
            }
        }
    }

    #[async_trait]
    impl SearchBackend for StatsBackend {
        async fn add_documents(&self, _documents: &[SearchDocument]) -> Result<()> {
            Ok(())
        }

        async fn delete_document(&self, _document_id: &str) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _spec: &QuerySpec) -> Result<BackendSearchResults> {
            anyhow::bail!("not under test")
        }

        async fn apply_settings(&self, _settings: &IndexSettingsSpec) -> Result<()> {
            Ok(())
        }

        async fn stats(&self) -> Result<IndexStats> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(IndexStats {
                document_count: self.document_count,
                is_indexing: self.is_indexing,
            })
        }
    }

    fn monitor(backend: StatsBackend) -> SearchMonitor {
        SearchMonitor::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn test_track_query_passes_result_through() {
        let m = monitor(StatsBackend::healthy());

        let ok: Result<i32> = m.track_query("q", || async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<i32> = m
            .track_query("q", || async { anyhow::bail!("boom") })
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_error_rate_is_errors_over_total() {
        let m = monitor(StatsBackend::healthy());
        for i in 0..10 {
            let _: Result<()> = m
                .track_query("q", || async move {
                    if i < 3 {
                        anyhow::bail!("boom")
                    } else {
                        Ok(())
                    }
                })
                .await;
        }

        let metrics = m.metrics();
        assert_eq!(metrics.total_queries, 10);
        assert_eq!(metrics.error_count, 3);
        assert!((metrics.error_rate - 0.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_sample_window_is_bounded() {
        let m = monitor(StatsBackend::healthy());
        for i in 0..(MAX_SAMPLES + 50) {
            let _: Result<()> = m
                .track_query(&format!("q{}", i), || async { Ok(()) })
                .await;
        }

        let metrics = m.metrics();
        assert_eq!(metrics.total_queries, MAX_SAMPLES as u64);
        // The oldest samples rolled off.
        let recent = m.recent_queries(MAX_SAMPLES);
        assert_eq!(recent.last().unwrap().query, "q50");
    }

    #[tokio::test]
    async fn test_empty_metrics_snapshot() {
        let m = monitor(StatsBackend::healthy());
        let metrics = m.metrics();
        assert_eq!(metrics.total_queries, 0);
        assert_eq!(metrics.error_rate, 0.0);
    }

    #[tokio::test]
    async fn test_recent_queries_newest_first() {
        let m = monitor(StatsBackend::healthy());
        for name in ["first", "second", "third"] {
            let _: Result<()> = m.track_query(name, || async { Ok(()) }).await;
        }

        let recent = m.recent_queries(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "third");
        assert_eq!(recent[1].query, "second");
    }

    #[tokio::test]
    async fn test_recent_errors_only_failures() {
        let m = monitor(StatsBackend::healthy());
        let _: Result<()> = m.track_query("ok", || async { Ok(()) }).await;
        let _: Result<()> = m
            .track_query("bad", || async { anyhow::bail!("boom") })
            .await;

        let errors = m.recent_errors(10);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].query, "bad");
        assert_eq!(errors[0].error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_health_statuses() {
        assert_eq!(
            monitor(StatsBackend::healthy()).check_health().await,
            HealthStatus::Healthy
        );
        assert_eq!(
            monitor(StatsBackend::warming_up()).check_health().await,
            HealthStatus::Warning
        );
        assert_eq!(
            monitor(StatsBackend::unreachable()).check_health().await,
            HealthStatus::Error
        );
    }

    #[tokio::test]
    async fn test_health_check_is_cached() {
        let backend = Arc::new(StatsBackend::healthy());
        let m = SearchMonitor::new(backend.clone());

        assert_eq!(m.check_health().await, HealthStatus::Healthy);
        assert_eq!(m.check_health().await, HealthStatus::Healthy);
        assert_eq!(backend.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health_cache_expires() {
        let backend = Arc::new(StatsBackend::healthy());
        let m = SearchMonitor::new(backend.clone()).with_health_ttl(Duration::ZERO);

        m.check_health().await;
        m.check_health().await;
        assert_eq!(backend.stats_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_health_unknown_before_first_check() {
        let m = monitor(StatsBackend::healthy());
        assert_eq!(m.cached_health(), HealthStatus::Unknown);

        m.check_health().await;
        assert_eq!(m.cached_health(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_dashboard_data_assembles() {
        let m = monitor(StatsBackend::healthy());
        let _: Result<()> = m.track_query("q", || async { Ok(()) }).await;

        // No health check has run yet; the dashboard does not trigger one.
        let data = m.dashboard_data();
        assert_eq!(data.health, HealthStatus::Unknown);
        assert_eq!(data.metrics.total_queries, 1);
        assert_eq!(data.recent_queries.len(), 1);
        assert!(data.recent_errors.is_empty());

        m.check_health().await;
        assert_eq!(m.dashboard_data().health, HealthStatus::Healthy);
    }

    #[test]
    fn test_latency_breach_thresholds() {
        assert_eq!(latency_breach(Duration::from_millis(10)), None);
        assert_eq!(
            latency_breach(Duration::from_secs(1)),
            Some(LatencyBreach::Warn)
        );
        assert_eq!(
            latency_breach(Duration::from_secs(5)),
            Some(LatencyBreach::Error)
        );
        assert_eq!(
            latency_breach(Duration::from_secs(60)),
            Some(LatencyBreach::Error)
        );
    }

    #[tokio::test]
    async fn test_failed_query_still_records_duration() {
        let m = monitor(StatsBackend::healthy());
        let _: Result<()> = m
            .track_query("bad", || async { anyhow::bail!("boom") })
            .await;

        let errors = m.recent_errors(1);
        assert_eq!(errors.len(), 1);
        // Duration is recorded on failures too; the latency thresholds see it.
        assert!(latency_breach(Duration::from_millis(errors[0].duration_ms)).is_none());
    }
}
