//! # Producer Thread
//!
//! The decode loop and its lifecycle state.

mod decode_loop;
mod state;

pub use decode_loop::DecodeWorker;
pub use state::WorkerState;
