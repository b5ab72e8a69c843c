pub mod csp;
pub mod language;
pub mod rate_limit;
