//! # questlog-channels
//!
//! Messaging platform integrations for Questlog.

pub mod telegram;
