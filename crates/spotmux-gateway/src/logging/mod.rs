//! Logging helpers
//!
//! Per-invocation correlation for tool calls. Subscriber setup lives in the
//! server binary.

mod invocation;

pub use invocation::{generate_trace_id, InvocationContext, InvocationSpan};
