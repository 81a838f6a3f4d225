// Error types shared across the client

use thiserror::Error as ThisError;

/// Crate-wide error taxonomy.
///
/// Validation failures are meant to be shown inline next to the offending
/// field; everything else is logged and surfaced as a single banner message
/// via [`Error::friendly_message`].
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("no user logged in")]
    NotAuthenticated,

    #[error("failed to create user profile")]
    ProfileCreationFailed,

    #[error("sign-up rejected: {0}")]
    SignupRejected(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

impl Error {
    /// Classify a raw provider error message into the taxonomy.
    ///
    /// The hosted auth provider reports failures as free-text messages; known
    /// substrings are promoted to their dedicated variants.
    pub fn from_provider_message(status: u16, message: String) -> Self {
        if message.contains("Invalid login credentials") {
            Error::InvalidCredentials
        } else if message.contains("unique constraint") || message.contains("duplicate key") {
            Error::UsernameTaken
        } else {
            Error::Backend { status, message }
        }
    }

    /// User-facing banner text for this error.
    pub fn friendly_message(&self) -> String {
        match self {
            Error::InvalidCredentials => "Invalid email or password".to_string(),
            Error::UsernameTaken => "Username is already taken".to_string(),
            Error::NotAuthenticated => "You need to be logged in to do that".to_string(),
            Error::ProfileCreationFailed => "Failed to create user profile".to_string(),
            Error::SignupRejected(_) => "Sign-up was rejected. Please try again.".to_string(),
            Error::Network(_) => "Network error. Please check your connection.".to_string(),
            Error::Validation(msg) => msg.clone(),
            Error::Backend { message, .. } => {
                if message.contains("Email not confirmed") {
                    "Please confirm your email address before logging in".to_string()
                } else if message.contains("Too many requests") {
                    "Too many attempts. Please wait a moment and try again.".to_string()
                } else if message.contains("User not found") {
                    "No account found with this email".to_string()
                } else {
                    "An unexpected error occurred".to_string()
                }
            }
        }
    }

    /// Whether a retry with different input could succeed (as opposed to an
    /// infrastructure failure).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidCredentials
                | Error::UsernameTaken
                | Error::NotAuthenticated
                | Error::Validation(_)
        )
    }
}

impl From<super::validation::ValidationResult> for Error {
    fn from(result: super::validation::ValidationResult) -> Self {
        let messages: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        Error::Validation(messages.join(", "))
    }
}
