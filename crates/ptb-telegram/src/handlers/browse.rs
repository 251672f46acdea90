//! Package browsing + profile flows shared by text labels and inline buttons.

use std::sync::Arc;

use ptb_core::{
    browse::{BrowseView, NavDirection},
    domain::{ChatId, UserId},
    errors::Error,
    formatting,
};

use crate::router::AppState;

const NOT_CONNECTED: &str =
    "Вы еще не подключили свой аккаунт. Пожалуйста, сделайте это на сайте.";
const NO_PACKAGES: &str = "У вас пока нет отслеживаемых посылок.";
const LIST_ERROR: &str = "Произошла ошибка при получении списка посылок.";

/// "📦 Мои посылки" from a chat: resolve the paired account first.
pub(crate) async fn open_for_chat(chat_id: ChatId, state: &Arc<AppState>) {
    match state.store.user_by_chat(chat_id).await {
        Ok(Some(user)) => open_for_user(chat_id, &user.id, state).await,
        Ok(None) => {
            let _ = state.messenger.send_html(chat_id, NOT_CONNECTED).await;
        }
        Err(e) => {
            tracing::warn!(chat = chat_id.0, "browse: user lookup failed: {e}");
            let _ = state.messenger.send_html(chat_id, LIST_ERROR).await;
        }
    }
}

/// Start (or restart) a browse session and send the first card.
pub(crate) async fn open_for_user(chat_id: ChatId, user_id: &UserId, state: &Arc<AppState>) {
    let _guard = state.chat_locks.lock_chat(chat_id.0).await;

    match state.browser.open(chat_id, user_id).await {
        Ok(Some(view)) => render(chat_id, &view, state).await,
        Ok(None) => {
            let _ = state.messenger.send_html(chat_id, NO_PACKAGES).await;
        }
        Err(e) => {
            tracing::warn!(chat = chat_id.0, user = %user_id.0, "browse open failed: {e}");
            let _ = state.messenger.send_html(chat_id, LIST_ERROR).await;
        }
    }
}

/// "⬅️ Предыдущая" / "Следующая ➡️" typed via the reply keyboard.
pub(crate) async fn navigate_from_text(
    chat_id: ChatId,
    direction: NavDirection,
    state: &Arc<AppState>,
) {
    let _guard = state.chat_locks.lock_chat(chat_id.0).await;

    match state.browser.navigate(chat_id, direction).await {
        Ok(view) => render(chat_id, &view, state).await,
        Err(Error::SessionExpired) => {
            let _ = state
                .messenger
                .send_html(chat_id, "Пожалуйста, сначала выберите \"Мои посылки\"")
                .await;
        }
        Err(e) => {
            tracing::warn!(chat = chat_id.0, "browse navigate failed: {e}");
            let _ = state.messenger.send_html(chat_id, LIST_ERROR).await;
        }
    }
}

/// "👤 Мой кабинет": the profile card with the tracked-package count.
pub(crate) async fn show_profile(chat_id: ChatId, state: &Arc<AppState>) {
    let user = match state.store.user_by_chat(chat_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let _ = state.messenger.send_html(chat_id, NOT_CONNECTED).await;
            return;
        }
        Err(e) => {
            tracing::warn!(chat = chat_id.0, "profile: user lookup failed: {e}");
            let _ = state
                .messenger
                .send_html(chat_id, "Произошла ошибка при получении данных профиля.")
                .await;
            return;
        }
    };

    let packages_count = match state.store.packages_for_user(&user.id).await {
        Ok(packages) => packages.len(),
        Err(e) => {
            tracing::warn!(chat = chat_id.0, "profile: package count failed: {e}");
            0
        }
    };

    let card = formatting::profile_card(&user, packages_count);
    if let Err(e) = state.messenger.send_html(chat_id, &card).await {
        tracing::warn!(chat = chat_id.0, "profile send failed: {e}");
    }
}

/// Render a card: edit the session's message in place when there is one,
/// otherwise send a fresh message and remember it for future edits.
pub(crate) async fn render(chat_id: ChatId, view: &BrowseView, state: &Arc<AppState>) {
    let text = formatting::package_card(&view.package);
    let keyboard = formatting::package_card_keyboard(view);

    match view.message {
        Some(msg_ref) => {
            if let Err(e) = state.messenger.edit_card(msg_ref, &text, keyboard).await {
                // "message is not modified" lands here on a no-op refresh;
                // nothing to recover.
                tracing::debug!(chat = chat_id.0, "card edit failed: {e}");
            }
        }
        None => match state.messenger.send_card(chat_id, &text, keyboard).await {
            Ok(sent) => state.browser.remember_message(chat_id, sent).await,
            Err(e) => {
                tracing::warn!(chat = chat_id.0, "card send failed: {e}");
                let _ = state
                    .messenger
                    .send_html(
                        chat_id,
                        "Произошла ошибка при отображении посылки. Пожалуйста, попробуйте снова.",
                    )
                    .await;
            }
        },
    }
}
