//! SurveyKit Core - Domain models, errors, and configuration
//!
//! This crate holds the value types shared by the COGO engine and the
//! topology validator, plus the layered configuration used by hosts.

pub mod config;
pub mod error;
pub mod models;

pub use error::{Result, SurveyError};
