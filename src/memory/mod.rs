/*!
 * Memory Module
 * Memory metrics providers and sampling
 */

pub mod provider;
pub mod sampler;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use provider::SystemMemoryProvider;
pub use sampler::{MemorySampler, SamplerStats};
pub use traits::*;
pub use types::*;
