//! Exit codes for the CLI

/// Success, including a signal-triggered shutdown whose cleanup succeeded
pub const SUCCESS: i32 = 0;

/// Any validation, IO, signing, confirmation or cleanup failure
pub const ERROR: i32 = 1;
