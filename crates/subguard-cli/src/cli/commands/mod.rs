//! CLI command handlers, one per file.

mod check_urls;
mod rate_limit;
mod sanitize;
mod scan;
mod token;
mod validate;

pub use check_urls::run_check_urls;
pub use rate_limit::run_rate_limit;
pub use sanitize::run_sanitize;
pub use scan::run_scan;
pub use token::run_token;
pub use validate::run_validate;
