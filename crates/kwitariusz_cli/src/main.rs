//! Command-line front end over `kwitariusz_core`.
//!
//! # Responsibility
//! - Mirror the UI boundary operations as subcommands for scripting.
//! - Print rows and outcomes as JSON on stdout, errors on stderr.
//!
//! # Invariants
//! - Exit code is non-zero only when the requested operation failed.
//! - A store is opened per invocation and closed before exit.

use clap::{Parser, Subcommand};
use kwitariusz_core::{
    default_log_level, init_logging, load_email_config, save_email_config,
    todays_backup_file_name, AppPaths, BackupError, BackupService, ConfigError, EmailConfig,
    EmailService, NewChild, NewParent, NewPayment, NewRate, OutgoingEmail, RecordId, RecordStore,
    RepoError, SmtpMailer,
};
use log::warn;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(
    name = "kwitariusz",
    version,
    about = "Childcare receipt book: parents, children, rates, payments and attendance."
)]
struct Cli {
    /// Data directory holding the database and settings.
    /// Defaults to `$KWITARIUSZ_DATA_DIR` or the platform data directory.
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Log level (trace|debug|info|warn|error).
    #[clap(long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(flatten)]
    Store(StoreCommand),
    #[clap(flatten)]
    Settings(SettingsCommand),
}

/// Commands that read or change records in the store.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// List all parents.
    GetParents,
    /// Add a parent.
    AddParent {
        #[clap(long)]
        first_name: String,
        #[clap(long)]
        last_name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        phone: String,
    },
    /// Delete a parent without children or payments.
    DeleteParent {
        #[clap(long)]
        id: RecordId,
    },
    /// List all children.
    GetChildren,
    /// Add a child of an existing parent.
    AddChild {
        #[clap(long)]
        first_name: String,
        #[clap(long)]
        last_name: String,
        #[clap(long)]
        group_name: String,
        /// Birth date, YYYY-MM-DD.
        #[clap(long)]
        birth_date: String,
        #[clap(long)]
        parent_id: RecordId,
    },
    /// Delete a child without payments.
    DeleteChild {
        #[clap(long)]
        id: RecordId,
    },
    /// List all rates.
    GetRates,
    /// Add a rate.
    AddRate {
        #[clap(long = "type")]
        kind: String,
        #[clap(long)]
        amount: f64,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        date: String,
    },
    DeleteRate {
        #[clap(long)]
        id: RecordId,
    },
    /// List all payments.
    GetPayments,
    /// Record a payment for a child by a parent.
    AddPayment {
        #[clap(long)]
        child_id: RecordId,
        #[clap(long)]
        parent_id: RecordId,
        #[clap(long)]
        amount: f64,
        #[clap(long)]
        date: String,
    },
    DeletePayment {
        #[clap(long)]
        id: RecordId,
    },
    /// Attendance rows of one month.
    GetAttendance {
        /// Month, YYYY-MM.
        #[clap(long)]
        month: String,
    },
    /// Mark a child present or absent on a day.
    SetAttendance {
        #[clap(long)]
        child_id: RecordId,
        #[clap(long)]
        date: String,
        #[clap(long, action = clap::ArgAction::Set)]
        present: bool,
    },
    /// Write a JSON backup. Without `--output` it lands in the data directory.
    BackupData {
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Replace all records with a JSON backup.
    RestoreData {
        #[clap(long)]
        input: PathBuf,
    },
}

/// Commands that only touch sender settings and the mail transport.
#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Send one HTML email with the saved sender settings.
    SendEmail {
        /// Recipient address; several may be separated by commas.
        #[clap(long)]
        to: String,
        #[clap(long)]
        subject: String,
        #[clap(long)]
        html: String,
    },
    /// Send a probe email from the saved sender to itself.
    TestEmail,
    /// Show saved sender settings (password omitted).
    GetEmailConfig,
    /// Save sender settings. Omitted options keep their stored values.
    SaveEmailConfig {
        #[clap(long)]
        sender: Option<String>,
        #[clap(long)]
        password: Option<String>,
        #[clap(long)]
        smtp_host: Option<String>,
        #[clap(long)]
        smtp_port: Option<u16>,
    },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Repo(RepoError),
    Backup(BackupError),
    Json(serde_json::Error),
    Email(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "[{}] {err}", err.code()),
            Self::Backup(err) => write!(f, "[{}] {err}", err.code()),
            Self::Json(err) => write!(f, "failed to encode output: {err}"),
            Self::Email(message) => write!(f, "{message}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<BackupError> for CliError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailConfigView {
    sender: String,
    smtp_host: String,
    smtp_port: u16,
    has_password: bool,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let paths = AppPaths::resolve(cli.data_dir)?;
    paths.ensure_data_dir()?;

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, &paths.log_dir()) {
        eprintln!("warning: logging disabled: {err}");
    }

    match cli.command {
        Command::Settings(command) => run_settings_command(&paths, command),
        Command::Store(command) => {
            let store = RecordStore::open(paths.db_path())?;
            let result = run_store_command(&store, &paths, command);
            if let Err(err) = store.close() {
                warn!(
                    "event=store_close module=cli status=error error_code={}",
                    err.code()
                );
            }
            result
        }
    }
}

fn run_settings_command(paths: &AppPaths, command: SettingsCommand) -> Result<(), CliError> {
    match command {
        SettingsCommand::GetEmailConfig => {
            let config = load_email_config(&paths.email_config_path())?;
            print_json(&EmailConfigView {
                has_password: config.has_password(),
                sender: config.sender,
                smtp_host: config.smtp_host,
                smtp_port: config.smtp_port,
            })
        }
        SettingsCommand::SaveEmailConfig {
            sender,
            password,
            smtp_host,
            smtp_port,
        } => {
            let path = paths.email_config_path();
            let stored = load_email_config(&path)?;
            let config = EmailConfig {
                sender: sender.unwrap_or(stored.sender),
                password: password.unwrap_or(stored.password),
                smtp_host: smtp_host.unwrap_or(stored.smtp_host),
                smtp_port: smtp_port.unwrap_or(stored.smtp_port),
            };
            save_email_config(&path, &config)?;
            print_message("Email settings saved.")
        }
        SettingsCommand::SendEmail { to, subject, html } => {
            let config = load_email_config(&paths.email_config_path())?;
            let outcome = EmailService::new(SmtpMailer)
                .send_email(&config, &OutgoingEmail::new(to, subject, html));
            if !outcome.success {
                return Err(CliError::Email(outcome.message));
            }
            print_message(&outcome.message)
        }
        SettingsCommand::TestEmail => {
            let config = load_email_config(&paths.email_config_path())?;
            let outcome = EmailService::new(SmtpMailer).test_email(&config);
            if !outcome.success {
                return Err(CliError::Email(outcome.message));
            }
            print_message(&outcome.message)
        }
    }
}

fn run_store_command(
    store: &RecordStore,
    paths: &AppPaths,
    command: StoreCommand,
) -> Result<(), CliError> {
    match command {
        StoreCommand::GetParents => print_json(&store.list_parents()?),
        StoreCommand::AddParent {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let parent = store.add_parent(&NewParent::new(first_name, last_name, email, phone))?;
            print_json(&parent)
        }
        StoreCommand::DeleteParent { id } => {
            store.delete_parent(id)?;
            print_message("Parent deleted.")
        }
        StoreCommand::GetChildren => print_json(&store.list_children()?),
        StoreCommand::AddChild {
            first_name,
            last_name,
            group_name,
            birth_date,
            parent_id,
        } => {
            let child = store.add_child(&NewChild::new(
                first_name, last_name, group_name, birth_date, parent_id,
            ))?;
            print_json(&child)
        }
        StoreCommand::DeleteChild { id } => {
            store.delete_child(id)?;
            print_message("Child deleted.")
        }
        StoreCommand::GetRates => print_json(&store.list_rates()?),
        StoreCommand::AddRate {
            kind,
            amount,
            description,
            date,
        } => {
            let mut rate = NewRate::new(kind, amount, date);
            rate.description = description;
            print_json(&store.add_rate(&rate)?)
        }
        StoreCommand::DeleteRate { id } => {
            store.delete_rate(id)?;
            print_message("Rate deleted.")
        }
        StoreCommand::GetPayments => print_json(&store.list_payments()?),
        StoreCommand::AddPayment {
            child_id,
            parent_id,
            amount,
            date,
        } => {
            let payment = store.add_payment(&NewPayment::new(child_id, parent_id, amount, date))?;
            print_json(&payment)
        }
        StoreCommand::DeletePayment { id } => {
            store.delete_payment(id)?;
            print_message("Payment deleted.")
        }
        StoreCommand::GetAttendance { month } => print_json(&store.get_attendance(&month)?),
        StoreCommand::SetAttendance {
            child_id,
            date,
            present,
        } => print_json(&store.set_attendance(child_id, &date, present)?),
        StoreCommand::BackupData { output } => {
            let target = output.unwrap_or_else(|| paths.data_dir().join(todays_backup_file_name()));
            let outcome = BackupService::new(store).backup(Some(&target))?;
            print_message(&format!("{} to {}", outcome.message(), target.display()))
        }
        StoreCommand::RestoreData { input } => {
            let outcome = BackupService::new(store).restore(Some(&input))?;
            print_message(&outcome.message())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_message(message: &str) -> Result<(), CliError> {
    print_json(&Message {
        message: message.to_string(),
    })
}
