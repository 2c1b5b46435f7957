//! Prometheus metrics.
//!
//! Every series carries a `namespace` label ("chat" or "video") so one
//! process exposes both relay instances side by side.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use beacon_core::RelayStats;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

/// Install the global recorder and its scrape endpoint.
pub fn init(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    describe_metrics();
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "beacon_connections_total",
        "Connections accepted since start"
    );
    describe_gauge!("beacon_connections_active", "Currently open connections");
    describe_counter!("beacon_events_total", "Inbound events routed since start");
    describe_counter!(
        "beacon_events_bytes_total",
        "Bytes of inbound events routed since start"
    );
    describe_counter!(
        "beacon_errors_total",
        "Handshakes refused and events dropped since start"
    );
    describe_gauge!("beacon_rooms_active", "Rooms with at least one member");
    describe_gauge!(
        "beacon_registered_users",
        "User ids registered as direct targets"
    );
}

/// Count one routed inbound event.
pub fn event_routed(namespace: &'static str, event: &'static str, bytes: usize) {
    counter!("beacon_events_total", "namespace" => namespace, "event" => event).increment(1);
    counter!("beacon_events_bytes_total", "namespace" => namespace).increment(bytes as u64);
}

/// Count one refused handshake or dropped event.
pub fn event_error(namespace: &'static str, reason: &'static str) {
    counter!("beacon_errors_total", "namespace" => namespace, "reason" => reason).increment(1);
}

/// Refresh the table gauges from a relay snapshot.
pub fn update_tables(namespace: &'static str, stats: &RelayStats) {
    gauge!("beacon_rooms_active", "namespace" => namespace).set(stats.rooms as f64);
    gauge!("beacon_registered_users", "namespace" => namespace)
        .set(stats.registered_users as f64);
}

/// Ties the active-connections gauge to connection lifetime.
pub struct ConnectionGuard {
    namespace: &'static str,
}

impl ConnectionGuard {
    /// Record an accepted connection; the gauge drops with the guard.
    #[must_use]
    pub fn accepted(namespace: &'static str) -> Self {
        counter!("beacon_connections_total", "namespace" => namespace).increment(1);
        gauge!("beacon_connections_active", "namespace" => namespace).increment(1.0);
        Self { namespace }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        gauge!("beacon_connections_active", "namespace" => self.namespace).decrement(1.0);
    }
}
