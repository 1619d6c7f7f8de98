//! Invocation context - correlation for a single tool call

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{info, info_span, warn, Span};

static INVOCATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short trace ID: 6 hex characters (e.g. "a1b2c3")
pub fn generate_trace_id() -> String {
    let counter = INVOCATION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    // Spread the counter so IDs differ within one microsecond
    let mixed = timestamp ^ counter.wrapping_mul(0x9E37_79B9);
    format!("{:06x}", mixed & 0xFF_FFFF)
}

/// Correlation data for one tool call
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub trace_id: String,
    pub tool: String,
    pub started_at: Instant,
}

impl InvocationContext {
    pub fn new(tool: &str) -> Self {
        Self {
            trace_id: generate_trace_id(),
            tool: tool.to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// Span and entry/exit lines for a tool call
pub struct InvocationSpan;

impl InvocationSpan {
    /// Span carrying `trace_id` and `tool` into every nested log line
    pub fn enter(ctx: &InvocationContext) -> Span {
        info_span!("tool_call", trace_id = %ctx.trace_id, tool = %ctx.tool)
    }

    pub fn log_entry(ctx: &InvocationContext) {
        info!(trace_id = %ctx.trace_id, "→ {}", ctx.tool);
    }

    pub fn log_exit(ctx: &InvocationContext, outcome: Result<(), &str>) {
        let elapsed = ctx.elapsed_ms();
        match outcome {
            Ok(()) => info!(trace_id = %ctx.trace_id, "← {} ok ({}ms)", ctx.tool, elapsed),
            Err(reason) => warn!(
                trace_id = %ctx.trace_id,
                "← {} failed: {} ({}ms)",
                ctx.tool,
                reason,
                elapsed
            ),
        }
    }
}
