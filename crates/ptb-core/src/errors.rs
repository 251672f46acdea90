/// Core error type for the relay service.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core and the HTTP layer can handle failures consistently (user-facing
/// message vs internal failure).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The pairing code is unknown (never issued, already consumed, or swept).
    #[error("invalid verification code")]
    InvalidCode,

    /// The pairing code exists but its lifetime has elapsed.
    #[error("expired verification code")]
    ExpiredCode,

    /// A browse callback arrived for a chat with no live session.
    #[error("browse session expired")]
    SessionExpired,

    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Document-store failure (Firestore adapter).
    #[error("store error: {0}")]
    Store(String),

    /// Messaging-API failure (Telegram adapter).
    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
