/*!
 * Diagnostics
 * Session orchestration over sampling, hierarchy tracking and trend detection
 */

pub mod monitor;
pub mod session;
pub mod state;

pub use monitor::LeakMonitor;
pub use session::{duration_to_ms, Session, SessionReport};
pub use state::DiagnosticsState;
