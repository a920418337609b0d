//! Filesystem primitives for vaulty
//!
//! Provides normalized path handling, atomic writes that honour file modes,
//! permission probes and format-agnostic configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod permissions;
pub mod search;

pub use config::{ConfigFormat, ConfigStore};
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use permissions::{file_mode, format_mode, is_path_writeable, set_file_mode};
pub use search::find_up;
