//! Oversight domain: the scorecard engine plus roster ingestion.

pub mod roster;
pub mod scorecard;
