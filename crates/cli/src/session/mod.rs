//! Bridge session orchestration.

mod orchestrator;
mod stats;

pub use orchestrator::{MotionMode, Session, SessionConfig};
pub use stats::SessionStats;
