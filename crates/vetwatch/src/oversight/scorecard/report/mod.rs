mod insights;
mod summary;
pub mod views;

pub use summary::compile_summary;
pub use views::{
    FacilityStanding, OversightInsights, OversightLevel, OversightSummary, TierBreakdownEntry,
    VisnStanding,
};

pub(crate) use insights::generate_insights;
