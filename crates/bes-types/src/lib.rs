//! Shared domain types for the BES configuration optimizer: configurations
//! and their tunable parameters, objectives, evaluator readings, requests,
//! run reports, and the error hierarchy.

pub mod configuration;
pub mod errors;
pub mod metrics;
pub mod objective;
pub mod report;
pub mod request;

pub use configuration::*;
pub use errors::*;
pub use metrics::*;
pub use objective::*;
pub use report::*;
pub use request::*;
