//! Telegram update handlers.
//!
//! Dispatch is intentionally thin: commands, reply-keyboard labels, 6-digit
//! pairing attempts and inline callbacks each route to a small handler that
//! talks to the core services through `AppState`. The bot is open to any
//! chat; pairing by code is the only gate, so there is no allow-list here.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod browse;
mod callback;
mod commands;
mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(raw) = msg.text() else {
        // Stickers, photos etc. are outside the bot surface; ignore.
        return Ok(());
    };

    if raw.trim_start().starts_with('/') {
        return commands::handle_command(msg, state).await;
    }

    text::handle_text(msg, state).await
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}
