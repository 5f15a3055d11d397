//! Prometheus metrics collection for warden.
//!
//! - `warden_punishments_total{kind}` - punishments issued
//! - `warden_pardons_total{kind}` - punishments lifted by a moderator
//! - `warden_expired_total{kind}` - punishments lifted by lazy expiry
//! - `warden_rejected_total{kind,reason}` - punish/pardon calls refused
//! - `warden_store_writes_total{op,result}` - journal writes reaching the store
//! - `warden_active_punishments{kind}` - active entries after the last save

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

pub static PUNISHMENTS: OnceLock<IntCounterVec> = OnceLock::new();

pub static PARDONS: OnceLock<IntCounterVec> = OnceLock::new();

pub static EXPIRED: OnceLock<IntCounterVec> = OnceLock::new();

pub static REJECTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Store writes issued by `save`, by operation and outcome.
pub static STORE_WRITES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

pub static ACTIVE_PUNISHMENTS: OnceLock<IntGaugeVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded. Until
/// then every `record_*` call is a no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(PUNISHMENTS, IntCounterVec::new(Opts::new("warden_punishments_total", "Punishments issued"), &["kind"]));
    register!(PARDONS, IntCounterVec::new(Opts::new("warden_pardons_total", "Punishments pardoned"), &["kind"]));
    register!(EXPIRED, IntCounterVec::new(Opts::new("warden_expired_total", "Punishments lifted on expiry"), &["kind"]));
    register!(REJECTED, IntCounterVec::new(Opts::new("warden_rejected_total", "Punish/pardon calls refused"), &["kind", "reason"]));
    register!(STORE_WRITES, IntCounterVec::new(Opts::new("warden_store_writes_total", "Journal writes issued to the store"), &["op", "result"]));
    register!(ACTIVE_PUNISHMENTS, IntGaugeVec::new(Opts::new("warden_active_punishments", "Active punishments"), &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

fn inc(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

pub fn record_punish(kind: &str) {
    inc(&PUNISHMENTS, &[kind]);
}

pub fn record_pardon(kind: &str) {
    inc(&PARDONS, &[kind]);
}

pub fn record_expiry(kind: &str) {
    inc(&EXPIRED, &[kind]);
}

pub fn record_rejected(kind: &str, reason: &str) {
    inc(&REJECTED, &[kind, reason]);
}

pub fn record_write(op: &str, ok: bool) {
    inc(&STORE_WRITES, &[op, if ok { "ok" } else { "error" }]);
}

pub fn set_active(kind: &str, count: usize) {
    if let Some(g) = ACTIVE_PUNISHMENTS.get() {
        g.with_label_values(&[kind]).set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_after_init_shows_up_in_output() {
        init();
        record_punish("ban");
        record_write("insert", false);
        set_active("mute", 3);

        // Other tests in this process may record too; only check presence
        let text = gather_metrics();
        assert!(text.contains("warden_punishments_total"));
        assert!(text.contains("result=\"error\""));
        assert!(text.contains("warden_active_punishments{kind=\"mute\"}"));
    }
}
