//! Time utilities for the client tick loop

use std::time::Instant;

/// Client start time for uptime tracking
static CLIENT_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize client start time (call once at startup)
pub fn init_client_time() {
    CLIENT_START.get_or_init(Instant::now);
}

/// Get client uptime in seconds
pub fn uptime_secs() -> u64 {
    CLIENT_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second
pub const RENDER_TPS: u32 = 15; // 15 render frames per second

/// Delta time for one tick (in seconds)
pub fn tick_delta() -> f64 {
    1.0 / SIMULATION_TPS as f64
}

/// Slack for summed tick deltas (30 x 1/30 is not exactly 1.0)
const TIME_EPSILON: f64 = 1e-9;

/// Accumulated time has reached `duration`
pub fn reached(elapsed: f64, duration: f64) -> bool {
    elapsed + TIME_EPSILON >= duration
}
