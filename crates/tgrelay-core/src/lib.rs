//! Core domain + application logic for the Telegram relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port (trait) implemented in the adapter crate.

pub mod commands;
pub mod composer;
pub mod config;
pub mod controller;
pub mod decision;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod sanitizer;
pub mod state;

pub use errors::{Error, Result};
