use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};

use ptb_core::{
    browse::NavDirection,
    domain::ChatId,
    errors::Error,
    messaging::types::CallbackAction,
};

use crate::handlers::browse;
use crate::router::AppState;

const STALE_SESSION: &str = "Список посылок пуст или устарел. Пожалуйста, обновите список.";

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let chat_id = q.message.as_ref().map(|m| ChatId(m.chat.id.0));
    let data = q.data.clone().unwrap_or_default();

    // Always answer the callback eventually, or the button spinner hangs.
    let (Some(chat_id), Some(action)) = (chat_id, CallbackAction::parse(&data)) else {
        answer(&state, &cb_id, None, false).await;
        return Ok(());
    };

    match action {
        CallbackAction::ShowPackages => {
            match state.store.user_by_chat(chat_id).await {
                Ok(Some(user)) => {
                    browse::open_for_user(chat_id, &user.id, &state).await;
                    answer(&state, &cb_id, None, false).await;
                }
                Ok(None) => {
                    answer(&state, &cb_id, Some("Вы еще не подключили свой аккаунт"), true).await;
                }
                Err(e) => {
                    tracing::warn!(chat = chat_id.0, "callback: user lookup failed: {e}");
                    answer(
                        &state,
                        &cb_id,
                        Some("Произошла ошибка при получении списка посылок"),
                        true,
                    )
                    .await;
                }
            }
        }

        CallbackAction::ShowProfile => {
            browse::show_profile(chat_id, &state).await;
            answer(&state, &cb_id, None, false).await;
        }

        CallbackAction::Prev | CallbackAction::Next | CallbackAction::Count => {
            let _guard = state.chat_locks.lock_chat(chat_id.0).await;

            let result = match action {
                CallbackAction::Prev => state.browser.navigate(chat_id, NavDirection::Prev).await,
                CallbackAction::Next => state.browser.navigate(chat_id, NavDirection::Next).await,
                _ => state.browser.current(chat_id).await,
            };

            match result {
                Ok(view) => {
                    browse::render(chat_id, &view, &state).await;
                    answer(&state, &cb_id, None, false).await;
                }
                Err(Error::SessionExpired) => {
                    answer(&state, &cb_id, Some(STALE_SESSION), true).await;
                }
                Err(e) => {
                    tracing::warn!(chat = chat_id.0, "callback navigation failed: {e}");
                    answer(
                        &state,
                        &cb_id,
                        Some("Произошла ошибка при получении списка посылок"),
                        true,
                    )
                    .await;
                }
            }
        }

        CallbackAction::ToggleNotifications(package_id) => {
            let _guard = state.chat_locks.lock_chat(chat_id.0).await;

            match state.browser.toggle_notifications(chat_id, &package_id).await {
                Ok((view, enabled)) => {
                    browse::render(chat_id, &view, &state).await;
                    let ack = if enabled {
                        "Уведомления включены"
                    } else {
                        "Уведомления отключены"
                    };
                    answer(&state, &cb_id, Some(ack), false).await;
                }
                Err(Error::SessionExpired) => {
                    answer(&state, &cb_id, Some(STALE_SESSION), true).await;
                }
                Err(e) => {
                    tracing::warn!(
                        chat = chat_id.0,
                        package = %package_id.0,
                        "notification toggle failed: {e}"
                    );
                    answer(
                        &state,
                        &cb_id,
                        Some("Произошла ошибка при обновлении статуса уведомлений"),
                        true,
                    )
                    .await;
                }
            }
        }
    }

    Ok(())
}

async fn answer(state: &Arc<AppState>, cb_id: &str, text: Option<&str>, alert: bool) {
    if let Err(e) = state.messenger.answer_callback(cb_id, text, alert).await {
        tracing::debug!("callback answer failed: {e}");
    }
}
