//! Core use-case services.
//!
//! # Responsibility
//! - Expose the record store as an explicitly owned handle.
//! - Host the auxiliary backup and email use-cases.
//! - Keep UI/FFI layers decoupled from storage and transport details.

pub mod backup_service;
pub mod email_service;
pub mod record_store;
