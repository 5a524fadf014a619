//! Client-side state layer for an IoT device/telemetry dashboard.
//!
//! Keeps a reactive local copy of the remote device directory with
//! optimistic CRUD ([`devices::DeviceStore`]), resolves the dependent
//! sensor-type → device filter with stale-response suppression
//! ([`sensors::SensorBrowser`]), and reshapes raw readings into chart-ready
//! multi-series rows ([`dataset`]). Rendering and routing live elsewhere;
//! this crate is the layer underneath.

pub mod config;
pub mod dataset;
pub mod devices;
pub mod error;
pub mod filter;
pub mod request;
pub mod sensors;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, Result};
pub use request::{Gateway, HttpGateway};
