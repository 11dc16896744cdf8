pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod rate_limit;
pub mod store;
pub mod token;
pub mod url_policy;

pub use config::SubguardConfig;
pub use error::GuardError;
pub use pipeline::{SecurityPipeline, SubmissionVerdict};
