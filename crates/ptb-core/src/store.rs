//! Document-store port.
//!
//! The web application owns the `users` and `packages` collections; this
//! service reads the fields below and writes exactly one of them
//! (`telegramNotifications.enabled`). Firestore is the first implementation;
//! the trait keeps the core testable against in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChatId, PackageId, UserId},
    status::PackageStatus,
    Result,
};

/// The slice of a `packages` document this service cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct Package {
    pub id: PackageId,
    pub user_id: UserId,
    pub tracking_number: String,
    pub status: PackageStatus,
    pub description: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    /// `telegramNotifications.enabled`, the per-package opt-in flag.
    pub notifications_enabled: bool,
}

/// The slice of a `users` document this service cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub telegram_connected: bool,
    pub telegram_chat_id: Option<ChatId>,
    pub created_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PackageStore: Send + Sync {
    async fn package(&self, id: &PackageId) -> Result<Option<Package>>;

    async fn packages_for_user(&self, user: &UserId) -> Result<Vec<Package>>;

    async fn user(&self, id: &UserId) -> Result<Option<User>>;

    /// Reverse lookup used by the bot: which account paired with this chat?
    async fn user_by_chat(&self, chat: ChatId) -> Result<Option<User>>;

    /// Persist the per-package opt-in flag.
    async fn set_notifications_enabled(&self, id: &PackageId, enabled: bool) -> Result<()>;
}
