//! Clock offset filter for one remote device
//!
//! Observations are `client_ts - local_receive` in seconds. Network delay
//! only ever makes an observation smaller, so the filter treats the two
//! sides differently:
//! - a residual far below the prediction is a delayed packet and is not
//!   fused (the prediction is kept)
//! - a residual beyond the resync threshold in either direction means the
//!   client clock jumped and the filter restarts at the new offset
//!
//! Measurement noise is the configured baseline plus the observed variance of
//! receive-interval jitter.

use contracts::ClockConfig;
use nalgebra::{Matrix2, RowVector2, Vector2};

const MIN_DT: f64 = 1e-4;
/// Used when a caller passes a non-positive or non-finite dt (90 Hz)
const NOMINAL_INTERVAL: f64 = 1.0 / 90.0;
/// Prior variance of the drift term, (100 ppm)^2
const INITIAL_DRIFT_VARIANCE: f64 = 1e-8;
/// Standard deviations below the prediction that count as delayed
const DELAY_GATE_SIGMAS: f64 = 3.0;
/// Delayed observations in a row before one is fused anyway
const MAX_CONSECUTIVE_DELAYED: u32 = 30;
/// Weight of the newest interval in the jitter variance
const JITTER_WEIGHT: f64 = 0.1;

/// What one observation did to the filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Fused into the estimate
    Applied { residual: f64 },
    /// Arrived late; the estimate only advanced by prediction
    Delayed { residual: f64 },
    /// Client clock jumped by `jump` seconds; the filter restarted
    Resync { jump: f64 },
}

/// Offset/drift Kalman filter, all quantities in seconds
#[derive(Debug, Clone)]
pub struct OffsetFilter {
    /// [offset, drift]
    state: Vector2<f64>,
    covariance: Matrix2<f64>,
    /// Process noise per second of elapsed time
    process: Matrix2<f64>,
    base_r: f64,
    jitter_variance: f64,
    resync_threshold: f64,
    last_observation: Option<f64>,
    consecutive_delayed: u32,
}

impl OffsetFilter {
    pub fn new(config: &ClockConfig, initial_offset: f64) -> Self {
        let q = config.process_noise.max(1e-12);
        let base_r = config.measurement_noise.max(1e-12);

        Self {
            state: Vector2::new(initial_offset, 0.0),
            covariance: Self::initial_covariance(base_r),
            process: Matrix2::new(q, 0.0, 0.0, q * 0.01),
            base_r,
            jitter_variance: 0.0,
            resync_threshold: (config.resync_threshold_ms / 1e3).max(MIN_DT),
            last_observation: None,
            consecutive_delayed: 0,
        }
    }

    fn initial_covariance(base_r: f64) -> Matrix2<f64> {
        Matrix2::new(base_r, 0.0, 0.0, INITIAL_DRIFT_VARIANCE)
    }

    /// Feed one observation taken `dt` seconds after the previous one
    pub fn update(&mut self, observation: f64, dt: f64) -> Correction {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            NOMINAL_INTERVAL
        }
        .max(MIN_DT);

        let transition = Matrix2::new(1.0, dt, 0.0, 1.0);
        let state = transition * self.state;
        let covariance =
            transition * self.covariance * transition.transpose() + self.process * dt;

        let residual = observation - state[0];
        if residual.abs() > self.resync_threshold {
            self.reset(observation);
            return Correction::Resync { jump: residual };
        }

        let innovation_variance = covariance[(0, 0)] + self.measurement_noise();
        self.track_jitter(observation, dt);

        let delayed = residual < -DELAY_GATE_SIGMAS * innovation_variance.sqrt();
        if delayed && self.consecutive_delayed < MAX_CONSECUTIVE_DELAYED {
            self.consecutive_delayed += 1;
            self.state = state;
            self.covariance = covariance;
            return Correction::Delayed { residual };
        }
        self.consecutive_delayed = 0;

        let h = RowVector2::new(1.0, 0.0);
        let gain = covariance * h.transpose() / innovation_variance;
        self.state = state + gain * residual;

        let updated = (Matrix2::identity() - gain * h) * covariance;
        // Keep P symmetric against rounding
        self.covariance = (updated + updated.transpose()) * 0.5;

        Correction::Applied { residual }
    }

    /// Restart at `offset` with zero drift and the prior covariance
    pub fn reset(&mut self, offset: f64) {
        self.state = Vector2::new(offset, 0.0);
        self.covariance = Self::initial_covariance(self.base_r);
        self.jitter_variance = 0.0;
        self.last_observation = None;
        self.consecutive_delayed = 0;
    }

    /// Interval jitter is the change in observed offset that drift does not
    /// explain: the client and local intervals between two packets differ.
    fn track_jitter(&mut self, observation: f64, dt: f64) {
        if let Some(last) = self.last_observation.replace(observation) {
            let step = observation - last - self.state[1] * dt;
            self.jitter_variance += JITTER_WEIGHT * (step * step - self.jitter_variance);
        }
    }

    pub fn offset(&self) -> f64 {
        self.state[0]
    }

    /// Seconds of offset change per second
    pub fn drift(&self) -> f64 {
        self.state[1]
    }

    /// Variance of the offset component
    pub fn uncertainty(&self) -> f64 {
        self.covariance[(0, 0)]
    }

    /// Current measurement noise
    pub fn measurement_noise(&self) -> f64 {
        self.base_r + self.jitter_variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config() -> ClockConfig {
        ClockConfig {
            process_noise: 1e-4,
            measurement_noise: 1e-6,
            resync_threshold_ms: 500.0,
        }
    }

    fn settled(offset: f64) -> OffsetFilter {
        let mut filter = OffsetFilter::new(&config(), offset);
        for _ in 0..200 {
            filter.update(offset, NOMINAL_INTERVAL);
        }
        filter
    }

    #[test]
    fn test_initial_state() {
        let filter = OffsetFilter::new(&config(), 0.25);
        assert_eq!(filter.offset(), 0.25);
        assert_eq!(filter.drift(), 0.0);
        assert_eq!(filter.measurement_noise(), 1e-6);
    }

    #[test]
    fn test_converges_to_constant_offset() {
        let mut filter = OffsetFilter::new(&config(), 0.0);
        for _ in 0..200 {
            filter.update(0.01, NOMINAL_INTERVAL);
        }
        assert_abs_diff_eq!(filter.offset(), 0.01, epsilon = 1e-3);
    }

    #[test]
    fn test_smooths_symmetric_jitter() {
        let mut filter = OffsetFilter::new(&config(), 0.05);
        for i in 0..300 {
            let jitter = ((i % 9) as f64 - 4.0) * 0.001;
            filter.update(0.05 + jitter, NOMINAL_INTERVAL);
        }
        assert_abs_diff_eq!(filter.offset(), 0.05, epsilon = 3e-3);
    }

    #[test]
    fn test_jitter_raises_measurement_noise() {
        let mut calm = OffsetFilter::new(&config(), 0.0);
        let mut noisy = OffsetFilter::new(&config(), 0.0);
        for i in 0..100 {
            calm.update(0.0, NOMINAL_INTERVAL);
            noisy.update(if i % 2 == 0 { 0.004 } else { -0.004 }, NOMINAL_INTERVAL);
        }
        assert_abs_diff_eq!(calm.measurement_noise(), 1e-6, epsilon = 1e-12);
        assert!(noisy.measurement_noise() > 1e-5, "{}", noisy.measurement_noise());
    }

    #[test]
    fn test_tracks_drift() {
        let mut filter = OffsetFilter::new(&config(), 0.0);
        // 1 ms of drift per second
        for i in 0..900 {
            let t = i as f64 * NOMINAL_INTERVAL;
            filter.update(t * 1e-3, NOMINAL_INTERVAL);
        }
        assert!(filter.drift() > 0.0, "drift: {}", filter.drift());
        assert_abs_diff_eq!(filter.offset(), 0.01, epsilon = 2e-3);
    }

    #[test]
    fn test_delayed_packet_is_not_fused() {
        let mut filter = settled(0.02);
        let before = filter.offset();

        let correction = filter.update(0.02 - 0.15, NOMINAL_INTERVAL);

        assert!(matches!(correction, Correction::Delayed { .. }));
        assert_abs_diff_eq!(filter.offset(), before, epsilon = 1e-6);
    }

    #[test]
    fn test_early_packet_is_fused() {
        let mut filter = settled(0.02);
        let correction = filter.update(0.03, NOMINAL_INTERVAL);

        assert!(matches!(correction, Correction::Applied { .. }));
        assert!(filter.offset() > 0.02);
    }

    #[test]
    fn test_persistent_step_down_is_accepted() {
        let mut filter = settled(0.1);

        // Fused at the latest once the delayed budget is spent
        let mut applied = false;
        for _ in 0..=MAX_CONSECUTIVE_DELAYED {
            if let Correction::Applied { .. } = filter.update(0.0, NOMINAL_INTERVAL) {
                applied = true;
                break;
            }
        }
        assert!(applied);

        for _ in 0..200 {
            filter.update(0.0, NOMINAL_INTERVAL);
        }
        assert!(filter.offset() < 0.05, "offset {}", filter.offset());
    }

    #[test]
    fn test_clock_jump_resyncs() {
        let mut filter = settled(0.0);

        let correction = filter.update(-42.0, NOMINAL_INTERVAL);

        assert_eq!(correction, Correction::Resync { jump: -42.0 });
        assert_eq!(filter.offset(), -42.0);
        assert_eq!(filter.drift(), 0.0);
        assert_eq!(filter.measurement_noise(), 1e-6);
    }

    #[test]
    fn test_bad_dt_uses_nominal_interval() {
        let mut filter = OffsetFilter::new(&config(), 0.0);
        let correction = filter.update(0.002, f64::NAN);
        assert_eq!(correction, Correction::Applied { residual: 0.002 });
        assert!(filter.offset().is_finite());
    }
}
