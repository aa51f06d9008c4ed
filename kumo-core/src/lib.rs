//! Kumo Core: tick aggregation, bar resampling, Ichimoku overlay, signal detection.
//!
//! Data flows one way:
//! - a tick source (any `Iterator<Item = Tick>`, e.g. [`synthetic::RandomWalk`])
//! - [`aggregate::aggregate_seconds`]: one bar per wall-clock second
//! - [`aggregate::resample`]: one bar per minute / hour / day
//! - a materialized [`domain::BarTable`]
//! - [`indicators::compute_overlay`]: the five Ichimoku lines
//! - [`signals::detect_signals`]: long and short trade windows
//!
//! The aggregation stages are lazy and pull-based; the indicator and signal
//! stages are pure batch transforms over a completed table.

pub mod aggregate;
pub mod domain;
pub mod indicators;
pub mod rng;
pub mod signals;
pub mod synthetic;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain and result types are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Tick>();
        require_sync::<domain::Tick>();
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarTable>();
        require_sync::<domain::BarTable>();

        require_send::<aggregate::SecondAggregator>();
        require_sync::<aggregate::SecondAggregator>();
        require_send::<aggregate::Resampler>();
        require_sync::<aggregate::Resampler>();
        require_send::<aggregate::AggregationError>();
        require_sync::<aggregate::AggregationError>();

        require_send::<indicators::Overlay>();
        require_sync::<indicators::Overlay>();
        require_send::<signals::SignalReport>();
        require_sync::<signals::SignalReport>();

        require_send::<synthetic::RandomWalk>();
        require_sync::<synthetic::RandomWalk>();
    }

    /// Signal rules see only the table and overlay.
    ///
    /// `evaluate()` takes `&BarTable`, `&Overlay` and a position, nothing
    /// mutable. Adding state to the signature breaks this check.
    #[test]
    fn signal_rule_is_read_only() {
        fn _check_trait_object_builds(
            rule: &dyn signals::SignalRule,
            table: &domain::BarTable,
            overlay: &indicators::Overlay,
        ) -> signals::SignalState {
            rule.evaluate(table, overlay, 0)
        }
    }
}
