//! Status-change notification relay.
//!
//! An admin status update calls `notify` over HTTP; the relay resolves the
//! package and its owner, checks opt-in, and delivers one formatted message.
//! Lack of opt-in is an expected skip, not a failure; delivery failures
//! surface to the caller but never roll back the status change that
//! triggered them. There is no dedup: every call is its own event.

use std::sync::Arc;

use crate::{
    domain::{ChatId, PackageId},
    errors::Error,
    formatting,
    messaging::MessagingPort,
    status::PackageStatus,
    store::PackageStore,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    OwnerMissing,
    NotPaired,
    NotificationsDisabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered { chat_id: ChatId },
    Skipped(SkipReason),
}

pub struct StatusRelay {
    store: Arc<dyn PackageStore>,
    messenger: Arc<dyn MessagingPort>,
}

impl StatusRelay {
    pub fn new(store: Arc<dyn PackageStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { store, messenger }
    }

    pub async fn notify(
        &self,
        package_id: &PackageId,
        new_status: &PackageStatus,
    ) -> Result<NotifyOutcome> {
        let package = self
            .store
            .package(package_id)
            .await?
            .ok_or_else(|| Error::PackageNotFound(package_id.0.clone()))?;

        let Some(user) = self.store.user(&package.user_id).await? else {
            tracing::warn!(
                package = %package_id.0,
                user = %package.user_id.0,
                "status notification skipped: owner document missing"
            );
            return Ok(NotifyOutcome::Skipped(SkipReason::OwnerMissing));
        };

        let chat_id = match user.telegram_chat_id {
            Some(chat_id) if user.telegram_connected => chat_id,
            _ => {
                tracing::debug!(
                    package = %package_id.0,
                    user = %user.id.0,
                    "status notification skipped: telegram not connected"
                );
                return Ok(NotifyOutcome::Skipped(SkipReason::NotPaired));
            }
        };

        if !package.notifications_enabled {
            tracing::debug!(
                package = %package_id.0,
                "status notification skipped: notifications disabled for package"
            );
            return Ok(NotifyOutcome::Skipped(SkipReason::NotificationsDisabled));
        }

        let message = formatting::status_change_message(
            &package,
            new_status,
            chrono::Local::now().date_naive(),
        );
        self.messenger.send_html(chat_id, &message).await?;

        tracing::info!(
            package = %package_id.0,
            chat = chat_id.0,
            status = new_status.code(),
            "status notification delivered"
        );
        Ok(NotifyOutcome::Delivered { chat_id })
    }
}
