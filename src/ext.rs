//! Extension contracts for concerns that live outside the broker proper.
//!
//! One-time code delivery is exposed as a trait plus an in-memory capture
//! implementation so applications can bring their own SMS gateway without
//! this crate depending on any particular vendor SDK.

pub mod sms;

pub use sms::*;
