//! Library crate for tcping-rs exposing reusable modules.
pub mod error;
pub mod logging;
pub mod ports;
pub mod portset;
pub mod prober;
pub mod scanner;
pub mod sink;
pub mod timing;
pub mod types;
