//! # questlog-core
//!
//! Core types, traits, configuration, pagination, and error handling for questlog.

pub mod config;
pub mod error;
pub mod message;
pub mod pager;
pub mod traits;
pub mod validate;
