//! cm-hub: zones, circuits and the hub tick.
//!
//! A [`Hub`] is built once from a validated [`cm_project::HubConfig`]. The
//! driver polls it; every due tick runs the zone control steps in
//! configuration order, then the circuit aggregation steps. Failures are
//! caught at the zone boundary and again at the hub boundary, so a tick never
//! escapes with an error.

pub mod circuit;
pub mod climate;
pub mod driver;
pub mod error;
pub mod hub;
pub mod indicator;
pub mod memory;
pub mod zone;

pub use circuit::{Circuit, CircuitState, ZoneReport, aggregate};
pub use climate::{PRESETS, ZoneClimate};
pub use driver::{RunLimits, run};
pub use error::{HubError, HubResult};
pub use hub::{Hub, TickContext};
pub use indicator::{BinaryIndicator, NumericIndicator};
pub use memory::{
    ClimateView, DisplayBoard, DisplayValue, MemoryDisplays, MemoryServices, MemoryStates,
};
pub use zone::Zone;
