//! Application workflows behind the HTTP handlers.
//!
//! Each use case is a trait so handlers can be driven by fakes in tests;
//! errors are already mapped to `AppError`.

pub mod ai;
pub mod auth;
pub mod email;

pub use ai::{AiService, AiUseCase};
pub use auth::{AccountService, AuthUseCase};
pub use email::{EmailService, EmailUseCase};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Out-of-range page sizes fall back to the default
pub(crate) fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 || limit > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 20);
        assert_eq!(clamp_limit(-5), 20);
        assert_eq!(clamp_limit(101), 20);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(100), 100);
    }
}
