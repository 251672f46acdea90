//! Per-chat package browsing state.
//!
//! "My packages" takes a snapshot of the user's package list and renders one
//! card at a time inside a single chat message; the inline buttons move a
//! wrapping cursor over the snapshot. Sessions are keyed by chat id, live for
//! the process lifetime, and are overwritten by each new invocation. The list
//! is not live; it refreshes only when the user reopens it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, MessageRef, PackageId, UserId},
    errors::Error,
    store::{Package, PackageStore},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

#[derive(Clone, Debug)]
struct BrowseSession {
    user_id: UserId,
    packages: Vec<Package>,
    current_index: usize,
    last_message: Option<MessageRef>,
}

/// What the renderer needs for the current card.
#[derive(Clone, Debug)]
pub struct BrowseView {
    pub index: usize,
    pub total: usize,
    pub package: Package,
    /// The message being edited in place; `None` until the first send.
    pub message: Option<MessageRef>,
}

/// Browsing service: owns the session map and keeps the in-memory snapshot
/// consistent with the persisted opt-in flag on toggle.
pub struct PackageBrowser {
    store: Arc<dyn PackageStore>,
    sessions: Mutex<HashMap<i64, BrowseSession>>,
}

impl PackageBrowser {
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the user's packages and start (or restart) a session at index 0.
    ///
    /// Returns `None` when the user has no packages; an existing session for
    /// the chat is dropped in that case so stale callbacks fail cleanly.
    pub async fn open(&self, chat: ChatId, user: &UserId) -> Result<Option<BrowseView>> {
        let packages = self.store.packages_for_user(user).await?;

        let mut sessions = self.sessions.lock().await;
        if packages.is_empty() {
            sessions.remove(&chat.0);
            return Ok(None);
        }

        let session = BrowseSession {
            user_id: user.clone(),
            packages,
            current_index: 0,
            last_message: None,
        };
        let view = view_of(&session);
        sessions.insert(chat.0, session);
        Ok(Some(view))
    }

    /// Move the cursor one step, wrapping in both directions.
    pub async fn navigate(&self, chat: ChatId, direction: NavDirection) -> Result<BrowseView> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&chat.0).ok_or(Error::SessionExpired)?;

        let len = session.packages.len();
        session.current_index = match direction {
            NavDirection::Prev => (session.current_index + len - 1) % len,
            NavDirection::Next => (session.current_index + 1) % len,
        };
        Ok(view_of(session))
    }

    /// Current card without moving the cursor (the `count` refresh button).
    pub async fn current(&self, chat: ChatId) -> Result<BrowseView> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(&chat.0).ok_or(Error::SessionExpired)?;
        Ok(view_of(session))
    }

    /// Remember which message the session renders into.
    pub async fn remember_message(&self, chat: ChatId, msg: MessageRef) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&chat.0) {
            session.last_message = Some(msg);
        }
    }

    /// Flip the opt-in flag for `package_id`: persist first, then update the
    /// snapshot, so the card never shows a state the store rejected.
    ///
    /// Returns the refreshed view and the new flag value.
    pub async fn toggle_notifications(
        &self,
        chat: ChatId,
        package_id: &PackageId,
    ) -> Result<(BrowseView, bool)> {
        let enabled = {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&chat.0).ok_or(Error::SessionExpired)?;
            session
                .packages
                .iter()
                .find(|p| p.id == *package_id)
                // A toggle for a package outside the snapshot is a stale
                // callback from a previous session.
                .ok_or(Error::SessionExpired)?
                .notifications_enabled
        };
        let new_enabled = !enabled;

        self.store
            .set_notifications_enabled(package_id, new_enabled)
            .await?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&chat.0).ok_or(Error::SessionExpired)?;
        if let Some(package) = session.packages.iter_mut().find(|p| p.id == *package_id) {
            package.notifications_enabled = new_enabled;
        }
        Ok((view_of(session), new_enabled))
    }
}

fn view_of(session: &BrowseSession) -> BrowseView {
    BrowseView {
        index: session.current_index,
        total: session.packages.len(),
        package: session.packages[session.current_index].clone(),
        message: session.last_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tokio::sync::Mutex as TokioMutex;

    use crate::status::PackageStatus;
    use crate::store::User;

    #[derive(Default)]
    struct FakeStore {
        packages: TokioMutex<Vec<Package>>,
    }

    impl FakeStore {
        async fn with_packages(packages: Vec<Package>) -> Arc<Self> {
            let store = Arc::new(Self::default());
            *store.packages.lock().await = packages;
            store
        }

        async fn enabled_of(&self, id: &PackageId) -> bool {
            self.packages
                .lock()
                .await
                .iter()
                .find(|p| p.id == *id)
                .map(|p| p.notifications_enabled)
                .unwrap()
        }
    }

    #[async_trait]
    impl PackageStore for FakeStore {
        async fn package(&self, id: &PackageId) -> Result<Option<Package>> {
            Ok(self
                .packages
                .lock()
                .await
                .iter()
                .find(|p| p.id == *id)
                .cloned())
        }

        async fn packages_for_user(&self, user: &UserId) -> Result<Vec<Package>> {
            Ok(self
                .packages
                .lock()
                .await
                .iter()
                .filter(|p| p.user_id == *user)
                .cloned()
                .collect())
        }

        async fn user(&self, _id: &UserId) -> Result<Option<User>> {
            Ok(None)
        }

        async fn user_by_chat(&self, _chat: ChatId) -> Result<Option<User>> {
            Ok(None)
        }

        async fn set_notifications_enabled(&self, id: &PackageId, enabled: bool) -> Result<()> {
            let mut packages = self.packages.lock().await;
            let package = packages
                .iter_mut()
                .find(|p| p.id == *id)
                .ok_or_else(|| Error::PackageNotFound(id.0.clone()))?;
            package.notifications_enabled = enabled;
            Ok(())
        }
    }

    fn package(id: &str, user: &str) -> Package {
        Package {
            id: PackageId(id.to_string()),
            user_id: UserId(user.to_string()),
            tracking_number: format!("TRK-{id}"),
            status: PackageStatus::InTransit,
            description: None,
            weight: None,
            dimensions: None,
            notifications_enabled: true,
        }
    }

    fn three_packages() -> Vec<Package> {
        vec![package("a", "u1"), package("b", "u1"), package("c", "u1")]
    }

    #[tokio::test]
    async fn open_starts_at_index_zero_and_prev_wraps() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store);
        let chat = ChatId(555);
        let user = UserId("u1".to_string());

        let view = browser.open(chat, &user).await.unwrap().unwrap();
        assert_eq!((view.index, view.total), (0, 3));

        let view = browser.navigate(chat, NavDirection::Prev).await.unwrap();
        assert_eq!(view.index, 2);

        let view = browser.navigate(chat, NavDirection::Next).await.unwrap();
        assert_eq!(view.index, 0);
        let view = browser.navigate(chat, NavDirection::Next).await.unwrap();
        assert_eq!(view.index, 1);
    }

    #[tokio::test]
    async fn a_full_lap_returns_to_the_start() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store);
        let chat = ChatId(1);
        let user = UserId("u1".to_string());

        let opened = browser.open(chat, &user).await.unwrap().unwrap();
        let mut index = opened.index;
        for _ in 0..opened.total {
            index = browser.navigate(chat, NavDirection::Next).await.unwrap().index;
        }
        assert_eq!(index, opened.index);
    }

    #[tokio::test]
    async fn toggle_is_an_involution_and_store_matches_snapshot() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store.clone());
        let chat = ChatId(1);
        let user = UserId("u1".to_string());
        let id = PackageId("a".to_string());

        browser.open(chat, &user).await.unwrap();

        let (view, enabled) = browser.toggle_notifications(chat, &id).await.unwrap();
        assert!(!enabled);
        assert_eq!(view.package.notifications_enabled, false);
        assert_eq!(store.enabled_of(&id).await, false);

        let (view, enabled) = browser.toggle_notifications(chat, &id).await.unwrap();
        assert!(enabled);
        assert_eq!(view.package.notifications_enabled, true);
        assert_eq!(store.enabled_of(&id).await, true);
    }

    #[tokio::test]
    async fn callbacks_without_a_session_report_session_expired() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store);
        let chat = ChatId(42);

        assert!(matches!(
            browser.navigate(chat, NavDirection::Next).await,
            Err(Error::SessionExpired)
        ));
        assert!(matches!(
            browser
                .toggle_notifications(chat, &PackageId("a".to_string()))
                .await,
            Err(Error::SessionExpired)
        ));
        assert!(matches!(browser.current(chat).await, Err(Error::SessionExpired)));
    }

    #[tokio::test]
    async fn empty_list_drops_the_session() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store);
        let chat = ChatId(1);

        browser.open(chat, &UserId("u1".to_string())).await.unwrap();
        let view = browser.open(chat, &UserId("nobody".to_string())).await.unwrap();
        assert!(view.is_none());
        assert!(matches!(
            browser.navigate(chat, NavDirection::Next).await,
            Err(Error::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn reopening_resets_the_cursor_and_refreshes_the_snapshot() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store.clone());
        let chat = ChatId(1);
        let user = UserId("u1".to_string());

        browser.open(chat, &user).await.unwrap();
        browser.navigate(chat, NavDirection::Next).await.unwrap();

        store.packages.lock().await.push(package("d", "u1"));
        let view = browser.open(chat, &user).await.unwrap().unwrap();
        assert_eq!((view.index, view.total), (0, 4));
    }

    #[tokio::test]
    async fn remember_message_flows_into_views() {
        let store = FakeStore::with_packages(three_packages()).await;
        let browser = PackageBrowser::new(store);
        let chat = ChatId(1);

        browser.open(chat, &UserId("u1".to_string())).await.unwrap();
        let msg = MessageRef {
            chat_id: chat,
            message_id: crate::domain::MessageId(77),
        };
        browser.remember_message(chat, msg).await;
        assert_eq!(browser.current(chat).await.unwrap().message, Some(msg));
    }
}
