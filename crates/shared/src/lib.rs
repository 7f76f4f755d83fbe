//! Wire protocol and domain identities shared by the dashboard client crates.

pub mod domain;
pub mod error;
pub mod protocol;
