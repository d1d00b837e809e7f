//! Core domain logic for the Kwitariusz childcare receipt book.
//! This crate owns the record schema, its invariants and every use-case the
//! UI boundary exposes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{load_email_config, save_email_config, AppPaths, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attendance::{AttendanceMark, AttendanceMonth, AttendanceRecord};
pub use model::child::{Child, NewChild};
pub use model::parent::{NewParent, Parent};
pub use model::payment::{NewPayment, Payment};
pub use model::rate::{NewRate, Rate};
pub use model::snapshot::Snapshot;
pub use model::{RecordId, ValidationError};
pub use repo::{EntityKind, ReferenceError, RepoError, RepoResult};
pub use service::backup_service::{
    default_backup_file_name, todays_backup_file_name, BackupError, BackupOutcome, BackupService,
};
pub use service::email_service::{
    EmailConfig, EmailOutcome, EmailService, MailError, MailTransport, OutgoingEmail, SmtpMailer,
};
pub use service::record_store::RecordStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
