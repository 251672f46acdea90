//! User-facing message texts and keyboards (Telegram HTML parse mode).

use chrono::NaiveDate;

use crate::{
    browse::BrowseView,
    messaging::types::{InlineButton, InlineKeyboard, ReplyKeyboard},
    status::PackageStatus,
    store::{Package, User},
};

// Reply-keyboard labels; these double as incoming text commands.
pub const BTN_MY_PACKAGES: &str = "📦 Мои посылки";
pub const BTN_MY_PROFILE: &str = "👤 Мой кабинет";
pub const BTN_PREV: &str = "⬅️ Предыдущая";
pub const BTN_NEXT: &str = "Следующая ➡️";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The card shown while browsing packages.
pub fn package_card(package: &Package) -> String {
    let mut out = format!(
        "📦 Посылка #{}\n\n🚚 Статус: {}",
        escape_html(&package.tracking_number),
        escape_html(package.status.label())
    );
    if let Some(description) = non_empty(&package.description) {
        out.push_str(&format!("\n📝 Описание: {}", escape_html(description)));
    }
    if let Some(weight) = package.weight {
        out.push_str(&format!("\n⚖️ Вес: {weight} кг"));
    }
    if let Some(dimensions) = non_empty(&package.dimensions) {
        out.push_str(&format!("\n📏 Размеры: {}", escape_html(dimensions)));
    }
    out
}

/// Inline keyboard under a package card: navigation row, the per-package
/// notification toggle, and the profile shortcut.
pub fn package_card_keyboard(view: &BrowseView) -> InlineKeyboard {
    let toggle_label = if view.package.notifications_enabled {
        "🔕 Отключить уведомления"
    } else {
        "🔔 Включить уведомления"
    };

    InlineKeyboard::new(vec![
        vec![
            InlineButton::new(BTN_PREV, "prev"),
            InlineButton::new(format!("{}/{}", view.index + 1, view.total), "count"),
            InlineButton::new(BTN_NEXT, "next"),
        ],
        vec![InlineButton::new(
            toggle_label,
            format!("toggle_notifications:{}", view.package.id.0),
        )],
        vec![InlineButton::new(BTN_MY_PROFILE, "show_profile")],
    ])
}

/// The persistent two-button menu shown to paired users.
pub fn main_menu_keyboard() -> ReplyKeyboard {
    ReplyKeyboard {
        rows: vec![vec![BTN_MY_PACKAGES.to_string(), BTN_MY_PROFILE.to_string()]],
        resize: true,
    }
}

/// The profile card ("Мой кабинет").
pub fn profile_card(user: &User, packages_count: usize) -> String {
    let reg_date = user
        .created_at
        .map(|ts| ts.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "Не указана".to_string());

    format!(
        "👤 Мой кабинет\n\n\
         🧑 ФИО: {}\n\
         📧 Email: {}\n\n\
         📱 Телефон: {}\n\
         🏠 Адрес: {}\n\n\
         📅 Дата регистрации: {}\n\
         📦 Количество отслеживаемых посылок: {}",
        escape_html(or_unset(&user.full_name, "Не указано")),
        escape_html(or_unset(&user.email, "Не указан")),
        escape_html(or_unset(&user.phone, "Не указан")),
        escape_html(or_unset(&user.address, "Не указан")),
        reg_date,
        packages_count
    )
}

/// The one-shot status-change notification.
pub fn status_change_message(
    package: &Package,
    new_status: &PackageStatus,
    date: NaiveDate,
) -> String {
    let mut out = format!(
        "📦 Обновление статуса посылки\n\n\
         Трек-номер: {}\n\
         Новый статус: {}",
        escape_html(&package.tracking_number),
        escape_html(new_status.label())
    );
    if let Some(description) = non_empty(&package.description) {
        out.push_str(&format!("\nОписание: {}", escape_html(description)));
    }
    if let Some(weight) = package.weight {
        out.push_str(&format!("\nВес: {weight} кг"));
    }
    if let Some(dimensions) = non_empty(&package.dimensions) {
        out.push_str(&format!("\nРазмеры: {}", escape_html(dimensions)));
    }
    out.push_str(&format!("\nДата обновления: {}", date.format("%d.%m.%Y")));
    out
}

fn non_empty(field: &Option<String>) -> Option<&String> {
    field.as_ref().filter(|s| !s.trim().is_empty())
}

fn or_unset<'a>(field: &'a Option<String>, fallback: &'a str) -> &'a str {
    non_empty(field).map(String::as_str).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{PackageId, UserId};

    fn package() -> Package {
        Package {
            id: PackageId("p1".to_string()),
            user_id: UserId("u1".to_string()),
            tracking_number: "RA123456789CN".to_string(),
            status: PackageStatus::InTransit,
            description: Some("Книги <и> журналы".to_string()),
            weight: Some(1.5),
            dimensions: Some("30x20x10".to_string()),
            notifications_enabled: true,
        }
    }

    #[test]
    fn card_contains_all_filled_fields_and_escapes_html() {
        let card = package_card(&package());
        assert!(card.contains("Посылка #RA123456789CN"));
        assert!(card.contains("Статус: В пути"));
        assert!(card.contains("Книги &lt;и&gt; журналы"));
        assert!(card.contains("Вес: 1.5 кг"));
        assert!(card.contains("Размеры: 30x20x10"));
    }

    #[test]
    fn card_omits_absent_optional_fields() {
        let mut p = package();
        p.description = None;
        p.weight = None;
        p.dimensions = Some("  ".to_string());
        let card = package_card(&p);
        assert!(!card.contains("Описание"));
        assert!(!card.contains("Вес"));
        assert!(!card.contains("Размеры"));
    }

    #[test]
    fn card_keyboard_reflects_position_and_toggle_state() {
        let mut view = BrowseView {
            index: 1,
            total: 3,
            package: package(),
            message: None,
        };
        let kb = package_card_keyboard(&view);
        assert_eq!(kb.rows[0][1].label, "2/3");
        assert_eq!(kb.rows[0][1].callback_data, "count");
        assert_eq!(kb.rows[1][0].label, "🔕 Отключить уведомления");
        assert_eq!(kb.rows[1][0].callback_data, "toggle_notifications:p1");

        view.package.notifications_enabled = false;
        let kb = package_card_keyboard(&view);
        assert_eq!(kb.rows[1][0].label, "🔔 Включить уведомления");
    }

    #[test]
    fn status_message_uses_the_shared_label_table_and_the_given_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let msg = status_change_message(&package(), &PackageStatus::Delivered, date);
        assert!(msg.contains("Новый статус: Доставлена"));
        assert!(msg.contains("Дата обновления: 07.08.2026"));
    }
}
