//! FFI use-case API for the desktop UI.
//!
//! # Responsibility
//! - Expose one sync function per UI boundary operation.
//! - Own the process's single open `RecordStore` between `open_store` and
//!   `close_store`.
//! - Flatten core errors into response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failed envelopes carry `ok = false`, a message and a stable `error_code`.
//! - A cancelled file dialog is reported as `cancelled = true`, never as a failure.

use kwitariusz_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_email_config,
    save_email_config as store_email_config, todays_backup_file_name, AppPaths, AttendanceRecord,
    BackupError, BackupOutcome, BackupService, Child, EmailConfig, EmailOutcome, EmailService,
    NewChild, NewParent, NewPayment, NewRate, OutgoingEmail, Parent, Payment, Rate, RecordId,
    RecordStore, RepoError, SmtpMailer, Snapshot,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const ERROR_CODE_STORE_CLOSED: &str = "store_closed";
const ERROR_CODE_CONFIG: &str = "config";
const ERROR_CODE_INVALID_BACKUP: &str = "invalid_backup";

struct Session {
    paths: AppPaths,
    store: RecordStore,
}

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

/// Minimal health-check API for Flutter smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    "pong".to_string()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), Path::new(log_dir.as_str())) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Suggested file name for the save dialog of `backup_data`.
#[flutter_rust_bridge::frb(sync)]
pub fn suggested_backup_file_name() -> String {
    todays_backup_file_name()
}

/// Generic envelope for commands without row output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Affected record id when the command targets one record.
    pub id: Option<RecordId>,
    pub message: String,
    pub error_code: Option<String>,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<RecordId>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(failure: Failure) -> Self {
        Self {
            ok: false,
            id: None,
            message: failure.message,
            error_code: Some(failure.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentItem {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildItem {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub group_name: String,
    pub birth_date: String,
    pub parent_id: RecordId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateItem {
    pub id: RecordId,
    pub kind: String,
    pub amount: f64,
    pub description: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentItem {
    pub id: RecordId,
    pub child_id: RecordId,
    pub parent_id: RecordId,
    pub amount: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceItem {
    pub id: RecordId,
    pub child_id: RecordId,
    pub date: String,
    pub present: bool,
}

/// Row envelopes. `get_*` return every row; `add_*`/`set_*` return the stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentsResponse {
    pub ok: bool,
    pub items: Vec<ParentItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenResponse {
    pub ok: bool,
    pub items: Vec<ChildItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatesResponse {
    pub ok: bool,
    pub items: Vec<RateItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentsResponse {
    pub ok: bool,
    pub items: Vec<PaymentItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceResponse {
    pub ok: bool,
    pub items: Vec<AttendanceItem>,
    pub message: String,
    pub error_code: Option<String>,
}

macro_rules! rows_response {
    ($($response:ident => $item:ident),* $(,)?) => {
        $(
            impl $response {
                fn from_rows(result: Result<Vec<$item>, Failure>) -> Self {
                    match result {
                        Ok(items) => Self {
                            ok: true,
                            message: format!("{} row(s).", items.len()),
                            items,
                            error_code: None,
                        },
                        Err(failure) => Self {
                            ok: false,
                            items: Vec::new(),
                            message: failure.message,
                            error_code: Some(failure.code),
                        },
                    }
                }
            }
        )*
    };
}

rows_response!(
    ParentsResponse => ParentItem,
    ChildrenResponse => ChildItem,
    RatesResponse => RateItem,
    PaymentsResponse => PaymentItem,
    AttendanceResponse => AttendanceItem,
);

/// Result of `backup_data`/`restore_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupResponse {
    pub ok: bool,
    pub cancelled: bool,
    pub path: Option<String>,
    pub records: u64,
    pub message: String,
    pub error_code: Option<String>,
}

/// Sender settings as edited in the UI.
///
/// `smtp_host`/`smtp_port` fall back to the Gmail submission defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub sender: String,
    pub password: String,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
}

/// Stored sender settings; the password itself is never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfigResponse {
    pub ok: bool,
    pub sender: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub has_password: bool,
    pub message: String,
}

/// Result of `send_email`/`test_email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailResponse {
    pub success: bool,
    pub message: String,
}

/// Opens the record store under `data_dir` (or the resolved default).
///
/// Re-opening replaces and closes any previously open store.
#[flutter_rust_bridge::frb(sync)]
pub fn open_store(data_dir: Option<String>) -> ActionResponse {
    let result = (|| -> Result<Session, Failure> {
        let override_dir = data_dir
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        let paths = AppPaths::resolve(override_dir).map_err(Failure::config)?;
        paths.ensure_data_dir().map_err(Failure::config)?;
        let store = RecordStore::open(paths.db_path()).map_err(Failure::from)?;
        Ok(Session { paths, store })
    })();

    match result {
        Ok(session) => {
            let mut guard = lock_session();
            if let Some(previous) = guard.replace(session) {
                if let Err(err) = previous.store.close() {
                    warn!(
                        "event=store_close module=ffi status=error error_code={}",
                        err.code()
                    );
                }
            }
            ActionResponse::success("Store opened.", None)
        }
        Err(failure) => ActionResponse::failure(failure),
    }
}

/// Closes the open store. Closing an already closed store succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn close_store() -> ActionResponse {
    let session = lock_session().take();
    match session {
        Some(session) => match session.store.close() {
            Ok(()) => ActionResponse::success("Store closed.", None),
            Err(err) => ActionResponse::failure(Failure::from(err)),
        },
        None => ActionResponse::success("Store already closed.", None),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_parents() -> ParentsResponse {
    ParentsResponse::from_rows(with_store(|store| {
        Ok(store
            .list_parents()?
            .into_iter()
            .map(ParentItem::from)
            .collect())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_parent(
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
) -> ParentsResponse {
    ParentsResponse::from_rows(with_store(|store| {
        let parent = store.add_parent(&NewParent::new(first_name, last_name, email, phone))?;
        Ok(vec![ParentItem::from(parent)])
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_parent(id: RecordId) -> ActionResponse {
    delete_with(id, "Parent deleted.", |store| store.delete_parent(id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_children() -> ChildrenResponse {
    ChildrenResponse::from_rows(with_store(|store| {
        Ok(store
            .list_children()?
            .into_iter()
            .map(ChildItem::from)
            .collect())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_child(
    first_name: String,
    last_name: String,
    group_name: String,
    birth_date: String,
    parent_id: RecordId,
) -> ChildrenResponse {
    ChildrenResponse::from_rows(with_store(|store| {
        let child = store.add_child(&NewChild::new(
            first_name, last_name, group_name, birth_date, parent_id,
        ))?;
        Ok(vec![ChildItem::from(child)])
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_child(id: RecordId) -> ActionResponse {
    delete_with(id, "Child deleted.", |store| store.delete_child(id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_rates() -> RatesResponse {
    RatesResponse::from_rows(with_store(|store| {
        Ok(store
            .list_rates()?
            .into_iter()
            .map(RateItem::from)
            .collect())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_rate(
    kind: String,
    amount: f64,
    description: Option<String>,
    date: String,
) -> RatesResponse {
    RatesResponse::from_rows(with_store(|store| {
        let mut rate = NewRate::new(kind, amount, date);
        rate.description = description;
        Ok(vec![RateItem::from(store.add_rate(&rate)?)])
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_rate(id: RecordId) -> ActionResponse {
    delete_with(id, "Rate deleted.", |store| store.delete_rate(id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_payments() -> PaymentsResponse {
    PaymentsResponse::from_rows(with_store(|store| {
        Ok(store
            .list_payments()?
            .into_iter()
            .map(PaymentItem::from)
            .collect())
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_payment(
    child_id: RecordId,
    parent_id: RecordId,
    amount: f64,
    date: String,
) -> PaymentsResponse {
    PaymentsResponse::from_rows(with_store(|store| {
        let payment = store.add_payment(&NewPayment::new(child_id, parent_id, amount, date))?;
        Ok(vec![PaymentItem::from(payment)])
    }))
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_payment(id: RecordId) -> ActionResponse {
    delete_with(id, "Payment deleted.", |store| store.delete_payment(id))
}

/// Attendance rows of `month` (`YYYY-MM`).
#[flutter_rust_bridge::frb(sync)]
pub fn get_attendance(month: String) -> AttendanceResponse {
    AttendanceResponse::from_rows(with_store(|store| {
        Ok(store
            .get_attendance(month.as_str())?
            .into_iter()
            .map(AttendanceItem::from)
            .collect())
    }))
}

/// Marks one child present/absent on one day (upsert).
#[flutter_rust_bridge::frb(sync)]
pub fn set_attendance(child_id: RecordId, date: String, present: bool) -> AttendanceResponse {
    AttendanceResponse::from_rows(with_store(|store| {
        let record = store.set_attendance(child_id, date.as_str(), present)?;
        Ok(vec![AttendanceItem::from(record)])
    }))
}

/// Writes a backup of the open store to `target_path`.
///
/// `None` means the save dialog was cancelled.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_data(target_path: Option<String>) -> BackupResponse {
    let target = target_path.map(PathBuf::from);
    backup_response(with_store(|store| {
        BackupService::new(store)
            .backup(target.as_deref())
            .map_err(Failure::from)
    }))
}

/// Writes a UI-supplied JSON snapshot to `target_path` without reading the store.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_payload(payload_json: String, target_path: Option<String>) -> BackupResponse {
    let target = target_path.map(PathBuf::from);
    backup_response(with_store(|store| {
        let snapshot = Snapshot::from_json(&payload_json)
            .map_err(|err| Failure::new(ERROR_CODE_INVALID_BACKUP, err.to_string()))?;
        BackupService::new(store)
            .backup_payload(&snapshot, target.as_deref())
            .map_err(Failure::from)
    }))
}

/// Replaces store contents with the backup at `source_path`.
///
/// `None` means the open dialog was cancelled.
#[flutter_rust_bridge::frb(sync)]
pub fn restore_data(source_path: Option<String>) -> BackupResponse {
    let source = source_path.map(PathBuf::from);
    backup_response(with_store(|store| {
        BackupService::new(store)
            .restore(source.as_deref())
            .map_err(Failure::from)
    }))
}

/// Reads stored sender settings.
#[flutter_rust_bridge::frb(sync)]
pub fn get_email_config() -> EmailConfigResponse {
    match with_session(|session| {
        load_email_config(&session.paths.email_config_path()).map_err(Failure::config)
    }) {
        Ok(config) => EmailConfigResponse {
            ok: true,
            has_password: config.has_password(),
            sender: config.sender,
            smtp_host: config.smtp_host,
            smtp_port: config.smtp_port,
            message: String::new(),
        },
        Err(failure) => {
            let defaults = EmailConfig::default();
            EmailConfigResponse {
                ok: false,
                sender: defaults.sender,
                smtp_host: defaults.smtp_host,
                smtp_port: defaults.smtp_port,
                has_password: false,
                message: failure.message,
            }
        }
    }
}

/// Persists sender settings. An empty password keeps the stored one.
#[flutter_rust_bridge::frb(sync)]
pub fn save_email_config(settings: EmailSettings) -> ActionResponse {
    let result = with_session(|session| {
        let path = session.paths.email_config_path();
        let stored = load_email_config(&path).map_err(Failure::config)?;
        let config = merge_settings(settings, &stored);
        store_email_config(&path, &config).map_err(Failure::config)
    });
    match result {
        Ok(()) => ActionResponse::success("Email settings saved.", None),
        Err(failure) => ActionResponse::failure(failure),
    }
}

/// Sends one HTML email. `settings = None` uses the stored sender settings.
#[flutter_rust_bridge::frb(sync)]
pub fn send_email(
    to: String,
    subject: String,
    html: String,
    settings: Option<EmailSettings>,
) -> EmailResponse {
    let email = OutgoingEmail::new(to, subject, html);
    email_response(resolve_email_config(settings).map(|config| {
        EmailService::new(SmtpMailer).send_email(&config, &email)
    }))
}

/// Sends a probe email from the sender to itself.
#[flutter_rust_bridge::frb(sync)]
pub fn test_email(settings: Option<EmailSettings>) -> EmailResponse {
    email_response(
        resolve_email_config(settings)
            .map(|config| EmailService::new(SmtpMailer).test_email(&config)),
    )
}

struct Failure {
    code: String,
    message: String,
}

impl Failure {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn store_closed() -> Self {
        Self::new(ERROR_CODE_STORE_CLOSED, "store is not open; call open_store first")
    }

    fn config(err: impl std::fmt::Display) -> Self {
        Self::new(ERROR_CODE_CONFIG, err.to_string())
    }
}

impl From<RepoError> for Failure {
    fn from(value: RepoError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<BackupError> for Failure {
    fn from(value: BackupError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

fn lock_session() -> MutexGuard<'static, Option<Session>> {
    SESSION.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn with_session<T>(f: impl FnOnce(&Session) -> Result<T, Failure>) -> Result<T, Failure> {
    let guard = lock_session();
    match guard.as_ref() {
        Some(session) => f(session),
        None => Err(Failure::store_closed()),
    }
}

fn with_store<T>(f: impl FnOnce(&RecordStore) -> Result<T, Failure>) -> Result<T, Failure> {
    with_session(|session| f(&session.store))
}

fn delete_with(
    id: RecordId,
    message: &str,
    f: impl FnOnce(&RecordStore) -> Result<(), RepoError>,
) -> ActionResponse {
    match with_store(|store| f(store).map_err(Failure::from)) {
        Ok(()) => ActionResponse::success(message, Some(id)),
        Err(failure) => ActionResponse::failure(failure),
    }
}

fn backup_response(result: Result<BackupOutcome, Failure>) -> BackupResponse {
    match result {
        Ok(outcome) => {
            let message = outcome.message();
            let (cancelled, path, records) = match outcome {
                BackupOutcome::Saved { path, records }
                | BackupOutcome::Restored { path, records } => {
                    (false, Some(path.display().to_string()), records as u64)
                }
                BackupOutcome::Cancelled => (true, None, 0),
            };
            BackupResponse {
                ok: true,
                cancelled,
                path,
                records,
                message,
                error_code: None,
            }
        }
        Err(failure) => BackupResponse {
            ok: false,
            cancelled: false,
            path: None,
            records: 0,
            message: failure.message,
            error_code: Some(failure.code),
        },
    }
}

fn merge_settings(settings: EmailSettings, stored: &EmailConfig) -> EmailConfig {
    let defaults = EmailConfig::default();
    EmailConfig {
        sender: settings.sender.trim().to_string(),
        password: if settings.password.is_empty() {
            stored.password.clone()
        } else {
            settings.password
        },
        smtp_host: settings
            .smtp_host
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unwrap_or(defaults.smtp_host),
        smtp_port: settings.smtp_port.unwrap_or(defaults.smtp_port),
    }
}

fn resolve_email_config(settings: Option<EmailSettings>) -> Result<EmailConfig, Failure> {
    with_session(|session| {
        let stored =
            load_email_config(&session.paths.email_config_path()).map_err(Failure::config)?;
        Ok(match settings {
            Some(settings) => merge_settings(settings, &stored),
            None => stored,
        })
    })
}

fn email_response(result: Result<EmailOutcome, Failure>) -> EmailResponse {
    match result {
        Ok(outcome) => EmailResponse {
            success: outcome.success,
            message: outcome.message,
        },
        Err(failure) => EmailResponse {
            success: false,
            message: failure.message,
        },
    }
}

impl From<Parent> for ParentItem {
    fn from(value: Parent) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            phone: value.phone,
        }
    }
}

impl From<Child> for ChildItem {
    fn from(value: Child) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            group_name: value.group_name,
            birth_date: value.birth_date,
            parent_id: value.parent_id,
        }
    }
}

impl From<Rate> for RateItem {
    fn from(value: Rate) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
            amount: value.amount,
            description: value.description,
            date: value.date,
        }
    }
}

impl From<Payment> for PaymentItem {
    fn from(value: Payment) -> Self {
        Self {
            id: value.id,
            child_id: value.child_id,
            parent_id: value.parent_id,
            amount: value.amount,
            date: value.date,
        }
    }
}

impl From<AttendanceRecord> for AttendanceItem {
    fn from(value: AttendanceRecord) -> Self {
        Self {
            id: value.id,
            child_id: value.child_id,
            date: value.date,
            present: value.present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_child, add_parent, add_payment, add_rate, backup_data, backup_payload, close_store,
        core_version, delete_child, delete_parent, delete_payment, delete_rate, get_attendance,
        get_children, get_email_config, get_parents, get_payments, get_rates, init_logging,
        open_store, ping, restore_data, save_email_config, send_email, set_attendance,
        suggested_backup_file_name, test_email, EmailSettings,
    };
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    // The store session is process-global; tests touching it run one at a time.
    static SERIAL: Mutex<()> = Mutex::new(());

    struct OpenStore {
        dir: TempDir,
        _serial: MutexGuard<'static, ()>,
    }

    impl Drop for OpenStore {
        fn drop(&mut self) {
            close_store();
        }
    }

    fn open_temp_store() -> OpenStore {
        let serial = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = TempDir::new().expect("tempdir");
        let opened = open_store(Some(dir.path().display().to_string()));
        assert!(opened.ok, "{}", opened.message);
        OpenStore {
            dir,
            _serial: serial,
        }
    }

    fn settings(sender: &str, password: &str) -> EmailSettings {
        EmailSettings {
            sender: sender.to_string(),
            password: password.to_string(),
            smtp_host: None,
            smtp_port: None,
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/kwitariusz-logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn suggested_backup_name_has_expected_shape() {
        let name = suggested_backup_file_name();
        assert!(name.starts_with("backup-kwitariusz-"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "backup-kwitariusz-2024-09-01.json".len());
    }

    #[test]
    fn calls_fail_with_store_closed_when_no_store_is_open() {
        let _serial = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        close_store();

        let parents = get_parents();
        assert!(!parents.ok);
        assert_eq!(parents.error_code.as_deref(), Some("store_closed"));

        let deleted = delete_rate(1);
        assert_eq!(deleted.error_code.as_deref(), Some("store_closed"));

        let closed = close_store();
        assert!(closed.ok);
    }

    #[test]
    fn parent_child_payment_flow_round_trips_through_envelopes() {
        let _store = open_temp_store();

        let parent = add_parent(
            "Anna".to_string(),
            "Nowak".to_string(),
            "anna@example.com".to_string(),
            "600100200".to_string(),
        );
        assert!(parent.ok, "{}", parent.message);
        let parent_id = parent.items[0].id;

        let child = add_child(
            "Ola".to_string(),
            "Nowak".to_string(),
            "Motylki".to_string(),
            "2020-05-14".to_string(),
            parent_id,
        );
        assert!(child.ok, "{}", child.message);
        let child_id = child.items[0].id;
        assert_eq!(child.items[0].parent_id, parent_id);

        let payment = add_payment(child_id, parent_id, 350.0, "2024-09-05".to_string());
        assert!(payment.ok, "{}", payment.message);

        assert_eq!(get_parents().items.len(), 1);
        assert_eq!(get_children().items.len(), 1);
        assert_eq!(get_payments().items.len(), 1);

        let blocked = delete_parent(parent_id);
        assert!(!blocked.ok);
        assert_eq!(blocked.error_code.as_deref(), Some("referential"));

        let removed = delete_payment(payment.items[0].id);
        assert!(removed.ok, "{}", removed.message);
        assert_eq!(removed.id, Some(payment.items[0].id));
        assert!(delete_child(child_id).ok);
        assert!(delete_parent(parent_id).ok);
        assert!(get_parents().items.is_empty());
    }

    #[test]
    fn add_child_with_unknown_parent_reports_referential_code() {
        let _store = open_temp_store();

        let child = add_child(
            "Ola".to_string(),
            "Nowak".to_string(),
            "Motylki".to_string(),
            "2020-05-14".to_string(),
            404,
        );
        assert!(!child.ok);
        assert!(child.items.is_empty());
        assert_eq!(child.error_code.as_deref(), Some("referential"));
    }

    #[test]
    fn delete_missing_parent_reports_not_found() {
        let _store = open_temp_store();

        let response = delete_parent(99);
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn add_rate_returns_stored_row() {
        let _store = open_temp_store();

        let rate = add_rate("monthly".to_string(), 350.0, None, "2024-09-01".to_string());
        assert!(rate.ok, "{}", rate.message);
        let row = &rate.items[0];
        assert_eq!(row.id, 1);
        assert_eq!(row.kind, "monthly");
        assert_eq!(row.amount, 350.0);
        assert_eq!(row.description, None);
        assert_eq!(row.date, "2024-09-01");
        assert_eq!(get_rates().items.len(), 1);

        let invalid = add_rate("monthly".to_string(), f64::NAN, None, "2024-09-01".to_string());
        assert!(!invalid.ok);
        assert_eq!(invalid.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn set_attendance_upserts_and_month_query_filters() {
        let _store = open_temp_store();

        let parent = add_parent(
            "Jan".to_string(),
            "Kowalski".to_string(),
            "jan@example.com".to_string(),
            "600000000".to_string(),
        );
        let parent_id = parent.items[0].id;
        let child = add_child(
            "Kuba".to_string(),
            "Kowalski".to_string(),
            "Biedronki".to_string(),
            "2021-01-02".to_string(),
            parent_id,
        );
        let child_id = child.items[0].id;

        assert!(set_attendance(child_id, "2024-09-02".to_string(), true).ok);
        let updated = set_attendance(child_id, "2024-09-02".to_string(), false);
        assert!(updated.ok, "{}", updated.message);
        assert!(set_attendance(child_id, "2024-10-01".to_string(), true).ok);

        let september = get_attendance("2024-09".to_string());
        assert!(september.ok, "{}", september.message);
        assert_eq!(september.items.len(), 1);
        assert!(!september.items[0].present);

        let bad_month = get_attendance("2024-13".to_string());
        assert!(!bad_month.ok);
        assert_eq!(bad_month.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn backup_and_restore_report_cancel_and_records() {
        let store = open_temp_store();
        add_rate(
            "daily".to_string(),
            25.5,
            Some("meal".to_string()),
            "2024-09-01".to_string(),
        );

        let cancelled = backup_data(None);
        assert!(cancelled.ok);
        assert!(cancelled.cancelled);

        let target = store.dir.path().join("backup.json");
        let saved = backup_data(Some(target.display().to_string()));
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.records, 1);
        assert!(target.exists());

        add_rate("monthly".to_string(), 350.0, None, "2024-10-01".to_string());
        assert_eq!(get_rates().items.len(), 2);

        let restored = restore_data(Some(target.display().to_string()));
        assert!(restored.ok, "{}", restored.message);
        assert_eq!(restored.records, 1);
        let rates = get_rates();
        assert_eq!(rates.items.len(), 1);
        assert_eq!(rates.items[0].description.as_deref(), Some("meal"));

        assert!(restore_data(None).cancelled);
    }

    #[test]
    fn backup_payload_rejects_invalid_json() {
        let store = open_temp_store();
        let target = store.dir.path().join("payload.json");

        let response = backup_payload("not json".to_string(), Some(target.display().to_string()));
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_backup"));
        assert!(!target.exists());
    }

    #[test]
    fn backup_payload_accepts_integer_attendance_flags() {
        let store = open_temp_store();
        let target = store.dir.path().join("payload.json");
        let payload = r#"{
            "parents": [{"id": 1, "firstName": "Anna", "lastName": "Nowak",
                         "email": "anna@example.com", "phone": "600100200"}],
            "children": [{"id": 1, "firstName": "Ola", "lastName": "Nowak",
                          "groupName": "Motylki", "birthDate": "2021-03-04", "parentId": 1}],
            "attendance": [{"id": 1, "childId": 1, "date": "2024-09-02", "present": 1},
                           {"id": 2, "childId": 1, "date": "2024-09-03", "present": 0}]
        }"#;

        let saved = backup_payload(payload.to_string(), Some(target.display().to_string()));
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.records, 4);

        let restored = restore_data(Some(target.display().to_string()));
        assert!(restored.ok, "{}", restored.message);
        let september = get_attendance("2024-09".to_string());
        let flags: Vec<bool> = september.items.iter().map(|item| item.present).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn email_config_is_saved_without_exposing_password() {
        let _store = open_temp_store();

        let initial = get_email_config();
        assert!(initial.ok, "{}", initial.message);
        assert!(!initial.has_password);
        assert_eq!(initial.smtp_host, "smtp.gmail.com");
        assert_eq!(initial.smtp_port, 587);

        assert!(save_email_config(settings("office@example.com", "secret")).ok);
        let saved = get_email_config();
        assert_eq!(saved.sender, "office@example.com");
        assert!(saved.has_password);

        // An empty password keeps the stored one.
        assert!(save_email_config(settings("desk@example.com", "")).ok);
        let kept = get_email_config();
        assert_eq!(kept.sender, "desk@example.com");
        assert!(kept.has_password);
    }

    #[test]
    fn email_with_incomplete_settings_fails_without_network() {
        let _store = open_temp_store();

        let sent = send_email(
            "parent@example.com".to_string(),
            "Receipt".to_string(),
            "<p>Thanks</p>".to_string(),
            None,
        );
        assert!(!sent.success);
        assert!(sent.message.contains("sender"));

        let probe = test_email(Some(settings("office@example.com", "")));
        assert!(!probe.success);
        assert!(probe.message.contains("password"));
    }
}
