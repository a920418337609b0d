//! Shared test utilities for the vaulty workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] - git repository fixtures at three realism levels
//! - [`project`] - [`project::TestProject`] builder for a project directory
//!   plus an isolated home directory holding the store

pub mod git;
pub mod project;
