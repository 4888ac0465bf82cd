//! cm-core: stable foundation for the climate manager.
//!
//! Contains:
//! - ids (entity references and slug-derived stable ids)
//! - numeric (tolerances + float helpers)
//! - timing (deadlines and the monotonic clock)
//! - ports (narrow contracts with the host: state reads, service calls, displays)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod ports;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use ports::*;
pub use timing::*;
