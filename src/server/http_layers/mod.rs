mod rate_limit;
mod requests_logging;

pub use rate_limit::{limit_by_ip, IpRateLimiter, EDIT_TOGGLE_PER_MINUTE};
pub use requests_logging::{log_requests, RequestsLoggingLevel};
