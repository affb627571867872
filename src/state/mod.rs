//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: lifecycle of a crawl run (idle, running, completed, interrupted)

mod engine_state;

pub use engine_state::EngineState;
