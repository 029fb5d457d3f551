// Package identity baked in at build time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `User-Agent` sent with query engine requests.
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
