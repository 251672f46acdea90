use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, MessagingCapabilities, ReplyKeyboard},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is small enough that a
/// future adapter (or a test fake) only has to cover what the relay and the
/// browser actually do: plain sends, card send/edit, the menu keyboard, and
/// callback answers.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_card(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn edit_card(&self, msg: MessageRef, html: &str, keyboard: InlineKeyboard)
        -> Result<()>;

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef>;

    /// Answer an inline-keyboard callback. `alert` pops a modal instead of a
    /// toast; used for local/recoverable errors like an expired session.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()>;
}
