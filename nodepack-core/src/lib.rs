//! nodepack core library
//!
//! Finds the node packages a graph is missing and tracks each package's
//! install lifecycle. See [`resolver`] for the resolution engine and
//! [`session::ManagerSession`] for the entry point used by front ends.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod resolver;
pub mod selection;
pub mod session;

pub use error::{FetchError, ManagerError, PatternError, Result};
