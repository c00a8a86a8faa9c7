//! Well-known addresses used across the workspace's tests.

pub mod accounts;
pub mod protocol;
pub mod tokens;
