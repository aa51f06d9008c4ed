//! Synthetic tick source: a geometric random walk quoted with a 1-3 tick spread.
//!
//! Per tick: `value *= 1 + N(mu, sigma)`, where drift and volatility are
//! annual percentages scaled to the tick interval over a 365-day year.
//! `bid = round(max(value, 0), 3)` and `ask = bid + spread * 0.001`.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CalendarUnit, Tick, PRICE_SCALE};

const MS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkError {
    #[error("tick interval must be positive")]
    ZeroInterval,
    #[error("initial price must be finite and non-negative, got {0}")]
    InvalidPrice(f64),
    #[error("annual drift must be finite and above -100%, got {0}")]
    InvalidDrift(f64),
    #[error("annual volatility must be finite and non-negative, got {0}")]
    InvalidVolatility(f64),
}

/// Random-walk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkParams {
    /// Walk start; truncated to the whole second. The first tick is one
    /// interval later.
    pub start: NaiveDateTime,
    pub initial_price: f64,
    pub annual_drift_pct: f64,
    pub annual_volatility_pct: f64,
    pub interval_ms: u32,
    pub seed: u64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2010, 1, 1)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap_or_default(),
            initial_price: 100.0,
            annual_drift_pct: 0.0,
            annual_volatility_pct: 20.0,
            interval_ms: 20,
            seed: 42,
        }
    }
}

impl WalkParams {
    fn samples_per_year(&self) -> f64 {
        MS_PER_YEAR / f64::from(self.interval_ms)
    }

    /// Per-tick drift.
    pub fn tick_mu(&self) -> f64 {
        (1.0 + self.annual_drift_pct / 100.0).powf(1.0 / self.samples_per_year()) - 1.0
    }

    /// Per-tick standard deviation.
    pub fn tick_sigma(&self) -> f64 {
        (self.annual_volatility_pct / 100.0) / self.samples_per_year().sqrt()
    }
}

/// Infinite, deterministic tick stream.
///
/// Ends early only if the walk leaves the range a `Decimal` can represent.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: StdRng,
    step: Normal<f64>,
    value: f64,
    clock: NaiveDateTime,
    interval: Duration,
}

impl RandomWalk {
    pub fn new(params: &WalkParams) -> Result<Self, WalkError> {
        if params.interval_ms == 0 {
            return Err(WalkError::ZeroInterval);
        }
        if !params.initial_price.is_finite() || params.initial_price < 0.0 {
            return Err(WalkError::InvalidPrice(params.initial_price));
        }
        if !params.annual_drift_pct.is_finite() || params.annual_drift_pct <= -100.0 {
            return Err(WalkError::InvalidDrift(params.annual_drift_pct));
        }
        if !params.annual_volatility_pct.is_finite() || params.annual_volatility_pct < 0.0 {
            return Err(WalkError::InvalidVolatility(params.annual_volatility_pct));
        }
        let step = Normal::new(params.tick_mu(), params.tick_sigma())
            .map_err(|_| WalkError::InvalidVolatility(params.annual_volatility_pct))?;

        Ok(Self {
            rng: StdRng::seed_from_u64(params.seed),
            step,
            value: params.initial_price,
            clock: CalendarUnit::Second.bucket_start(params.start),
            interval: Duration::milliseconds(i64::from(params.interval_ms)),
        })
    }
}

impl Iterator for RandomWalk {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        let change = self.step.sample(&mut self.rng);
        self.value *= 1.0 + change;
        let spread: i64 = self.rng.gen_range(1..=3);

        let mut bid = Decimal::from_f64(self.value.max(0.0))?.round_dp(PRICE_SCALE);
        bid.rescale(PRICE_SCALE);
        let ask = bid + Decimal::new(spread, PRICE_SCALE);
        self.clock += self.interval;
        tracing::trace!(timestamp = %self.clock, %bid, %ask, "tick");

        Some(Tick::new(self.clock, bid, ask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn same_seed_same_ticks() {
        let params = WalkParams::default();
        let a: Vec<Tick> = RandomWalk::new(&params).unwrap().take(500).collect();
        let b: Vec<Tick> = RandomWalk::new(&params).unwrap().take(500).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a: Vec<Tick> = RandomWalk::new(&WalkParams::default()).unwrap().take(100).collect();
        let b: Vec<Tick> = RandomWalk::new(&WalkParams {
            seed: 7,
            ..WalkParams::default()
        })
        .unwrap()
        .take(100)
        .collect();
        assert_ne!(a, b);
    }

    #[test]
    fn ticks_are_spaced_and_quoted() {
        let params = WalkParams::default();
        let ticks: Vec<Tick> = RandomWalk::new(&params).unwrap().take(1000).collect();
        assert_eq!(ticks[0].timestamp, params.start + Duration::milliseconds(20));
        for pair in ticks.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::milliseconds(20));
        }
        for tick in &ticks {
            assert!(tick.bid <= tick.ask);
            let spread = tick.spread();
            assert!(spread >= dec!(0.001) && spread <= dec!(0.003), "spread {spread}");
            assert_eq!(tick.bid, tick.bid.round_dp(PRICE_SCALE));
        }
    }

    #[test]
    fn sub_second_start_is_truncated() {
        let params = WalkParams {
            start: WalkParams::default().start + Duration::milliseconds(730),
            ..WalkParams::default()
        };
        let first = RandomWalk::new(&params).unwrap().next().unwrap();
        assert_eq!(first.timestamp, WalkParams::default().start + Duration::milliseconds(20));
    }

    #[test]
    fn zero_volatility_zero_drift_is_flat() {
        let params = WalkParams {
            annual_volatility_pct: 0.0,
            ..WalkParams::default()
        };
        assert_eq!(params.tick_mu(), 0.0);
        assert!(RandomWalk::new(&params)
            .unwrap()
            .take(200)
            .all(|t| t.bid == dec!(100.000)));
    }

    #[test]
    fn rejects_bad_params() {
        let zero = WalkParams {
            interval_ms: 0,
            ..WalkParams::default()
        };
        assert_eq!(RandomWalk::new(&zero).unwrap_err(), WalkError::ZeroInterval);

        let negative_vol = WalkParams {
            annual_volatility_pct: -1.0,
            ..WalkParams::default()
        };
        assert!(matches!(
            RandomWalk::new(&negative_vol),
            Err(WalkError::InvalidVolatility(_))
        ));

        for vol in [f64::NAN, f64::INFINITY] {
            let params = WalkParams {
                annual_volatility_pct: vol,
                ..WalkParams::default()
            };
            assert!(matches!(
                RandomWalk::new(&params),
                Err(WalkError::InvalidVolatility(_))
            ));
        }

        let flat = WalkParams {
            annual_volatility_pct: 0.0,
            ..WalkParams::default()
        };
        assert!(RandomWalk::new(&flat).is_ok());

        let nan_price = WalkParams {
            initial_price: f64::NAN,
            ..WalkParams::default()
        };
        assert!(matches!(RandomWalk::new(&nan_price), Err(WalkError::InvalidPrice(_))));
    }
}
