//! # Motion Stream
//!
//! Streaming-side collaborators of the device adapters.
//!
//! Responsibilities:
//! - Estimate each remote device's clock (`ClockEstimator`)
//! - Produce motion events from a synthetic or recorded source
//! - Route events into `PoseTarget`s and count them
//!
//! ## Usage Example
//!
//! ```ignore
//! use motion_stream::{ClockEstimator, MockMotionSource, TrackingRouter};
//!
//! let clock = Arc::new(ClockEstimator::new(config.clock.clone()));
//! let mut router = TrackingRouter::new(clock.clone());
//! router.register(Box::new(MockMotionSource::with_defaults(path)), target)?;
//! router.start_all();
//! ```

mod clock;
mod error;
mod kalman;
mod mock_source;
mod replay_source;
mod router;

pub use clock::{ClockEstimator, ClockSnapshot};
pub use error::{Result, StreamError};
pub use kalman::{Correction, OffsetFilter};
pub use mock_source::{MockMotionConfig, MockMotionSource};
pub use replay_source::{ReplayConfig, ReplayMotionSource};
pub use router::{StreamMetrics, StreamMetricsSnapshot, TrackingRouter};
