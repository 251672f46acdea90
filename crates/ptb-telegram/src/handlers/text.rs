use std::sync::Arc;

use regex::Regex;
use teloxide::{prelude::*, types::Message};

use ptb_core::{browse::NavDirection, domain::ChatId, errors::Error, formatting};

use crate::handlers::browse;
use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let text = msg.text().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(());
    }

    match text {
        formatting::BTN_MY_PROFILE => browse::show_profile(chat_id, &state).await,
        formatting::BTN_MY_PACKAGES => browse::open_for_chat(chat_id, &state).await,
        formatting::BTN_PREV => {
            browse::navigate_from_text(chat_id, NavDirection::Prev, &state).await
        }
        formatting::BTN_NEXT => {
            browse::navigate_from_text(chat_id, NavDirection::Next, &state).await
        }
        _ if is_pairing_code(text) => pairing_attempt(chat_id, text, &state).await,
        // Free text outside the bot surface; ignore.
        _ => {}
    }

    Ok(())
}

fn is_pairing_code(text: &str) -> bool {
    let re = Regex::new(r"^\d{6}$").expect("valid regex");
    re.is_match(text)
}

/// A plain 6-digit message is a pairing attempt: confirm the code, then show
/// the sender their packages right away as a convenience.
async fn pairing_attempt(chat_id: ChatId, code: &str, state: &Arc<AppState>) {
    match state.codes.mark_verified(code, chat_id).await {
        Ok(user_id) => {
            tracing::info!(chat = chat_id.0, user = %user_id.0, "pairing code confirmed");
            if let Err(e) = state.messenger.send_html(chat_id, "Код подтвержден!").await {
                tracing::warn!(chat = chat_id.0, "pairing confirmation failed: {e}");
            }

            browse::open_for_user(chat_id, &user_id, state).await;

            if let Err(e) = state
                .messenger
                .send_reply_keyboard(
                    chat_id,
                    "Выберите действие:",
                    formatting::main_menu_keyboard(),
                )
                .await
            {
                tracing::warn!(chat = chat_id.0, "menu keyboard send failed: {e}");
            }
        }
        Err(Error::ExpiredCode) => {
            let _ = state
                .messenger
                .send_html(
                    chat_id,
                    "Срок действия этого кода истек. Пожалуйста, сгенерируйте новый код на сайте.",
                )
                .await;
        }
        Err(_) => {
            let _ = state
                .messenger
                .send_html(
                    chat_id,
                    "Неверный или истекший код. Пожалуйста, проверьте код и попробуйте снова, \
                     или сгенерируйте новый на сайте.",
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairing_code_shape() {
        assert!(is_pairing_code("482913"));
        assert!(!is_pairing_code("48291"));
        assert!(!is_pairing_code("4829133"));
        assert!(!is_pairing_code("48291a"));
        assert!(!is_pairing_code("/48291"));
    }
}
