//! Core library for the VetWatch accountability portal: the facility
//! hierarchy, the failure-weighted scorers, and the bottom-up scorecard
//! aggregation engine with its HTTP surface.

pub mod config;
pub mod error;
pub mod oversight;
pub mod telemetry;
