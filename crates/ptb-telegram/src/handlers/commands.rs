use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use ptb_core::{domain::ChatId, formatting};

use crate::router::AppState;

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let command = msg
        .text()
        .unwrap_or_default()
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or_default();

    match command {
        "/start" => start(chat_id, state).await,
        // Unknown commands are ignored, matching the reply-keyboard-driven UX.
        _ => Ok(()),
    }
}

/// `/start`: greet paired users with the main menu; point everyone else to
/// the website pairing flow.
async fn start(chat_id: ChatId, state: Arc<AppState>) -> ResponseResult<()> {
    let user = match state.store.user_by_chat(chat_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(chat = chat_id.0, "start: user lookup failed: {e}");
            let _ = state
                .messenger
                .send_html(
                    chat_id,
                    "Произошла ошибка при проверке вашего аккаунта. Пожалуйста, попробуйте позже.",
                )
                .await;
            return Ok(());
        }
    };

    let result = match user {
        None => {
            state
                .messenger
                .send_html(
                    chat_id,
                    "Вы еще не подключили свой аккаунт. Пожалуйста, сделайте это на сайте.",
                )
                .await
        }
        Some(_) => {
            state
                .messenger
                .send_reply_keyboard(
                    chat_id,
                    "Добро пожаловать! Выберите действие:",
                    formatting::main_menu_keyboard(),
                )
                .await
        }
    };

    if let Err(e) = result {
        tracing::warn!(chat = chat_id.0, "start: reply failed: {e}");
    }
    Ok(())
}
