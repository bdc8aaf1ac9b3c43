//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Errors shared by every subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("{0}")]
    Repository(#[from] fitshop_api::db::RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] fitshop_core::EmailError),

    /// No account with that email.
    #[error("No account found with email: {0}")]
    UserNotFound(String),

    /// The change would leave the account with no permissions.
    #[error("Refusing to remove the last permission from {0}")]
    EmptyPermissions(String),
}

/// Database URL from `FITSHOP_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("FITSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("FITSHOP_DATABASE_URL"))
}
