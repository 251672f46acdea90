use crate::domain::PackageId;

/// Inline keyboard attached to a card message. Row-major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }
}

/// Persistent reply keyboard (the two-button main menu).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_inline_keyboards: bool,
    pub max_message_len: usize,
}

/// Parsed inline-callback payload.
///
/// The wire values are part of the bot surface (`prev`, `next`, `count`,
/// `show_packages`, `show_profile`, `toggle_notifications:<packageId>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Prev,
    Next,
    /// The non-interactive index/count button; refreshes the card in place.
    Count,
    ShowPackages,
    ShowProfile,
    ToggleNotifications(PackageId),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "count" => Some(Self::Count),
            "show_packages" => Some(Self::ShowPackages),
            "show_profile" => Some(Self::ShowProfile),
            _ => {
                let id = data.strip_prefix("toggle_notifications:")?;
                if id.is_empty() {
                    return None;
                }
                Some(Self::ToggleNotifications(PackageId(id.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_wire_values() {
        assert_eq!(CallbackAction::parse("prev"), Some(CallbackAction::Prev));
        assert_eq!(CallbackAction::parse("next"), Some(CallbackAction::Next));
        assert_eq!(CallbackAction::parse("count"), Some(CallbackAction::Count));
        assert_eq!(
            CallbackAction::parse("show_packages"),
            Some(CallbackAction::ShowPackages)
        );
        assert_eq!(
            CallbackAction::parse("show_profile"),
            Some(CallbackAction::ShowProfile)
        );
        assert_eq!(
            CallbackAction::parse("toggle_notifications:pkg42"),
            Some(CallbackAction::ToggleNotifications(PackageId(
                "pkg42".to_string()
            )))
        );
    }

    #[test]
    fn rejects_unknown_and_empty_payloads() {
        assert_eq!(CallbackAction::parse("toggle_notifications:"), None);
        assert_eq!(CallbackAction::parse("askuser:1:2"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }
}
