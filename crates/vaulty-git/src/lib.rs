//! Git abstraction for vaulty
//!
//! Answers one question about rendered outputs: would committing the working
//! tree leak this file?

pub mod error;
pub mod probe;

pub use error::{Error, Result};
pub use probe::{GitProbe, IgnoreStatus, ignore_status};
