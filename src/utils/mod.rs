//! Shared helpers.

pub mod clock;
pub(crate) mod metrics;
pub mod number_format;
pub mod retry;
