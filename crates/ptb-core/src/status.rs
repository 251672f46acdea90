//! Package status enum + the canonical label table.
//!
//! Stored data contains both the English status codes written by the admin
//! panel and, in older documents, the localized labels themselves. Parsing
//! accepts both; display always goes through [`PackageStatus::label`] so the
//! relay and the card renderer agree on wording.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageStatus {
    Created,
    Pending,
    Registered,
    InTransit,
    Ready,
    Delivered,
    Returned,
    Cancelled,
    /// A status this service does not know. The raw string is preserved and
    /// shown as-is instead of collapsing into a default label.
    Other(String),
}

impl PackageStatus {
    /// Case-insensitive parse of an English code or a localized label.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "created" | "создана" => Self::Created,
            "pending" => Self::Pending,
            "registered" | "зарегистрирована" => Self::Registered,
            "in_transit" | "в пути" => Self::InTransit,
            "ready" | "готова к получению" => Self::Ready,
            "delivered" | "доставлена" => Self::Delivered,
            "returned" | "возвращена" => Self::Returned,
            "cancelled" | "отменена" => Self::Cancelled,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Canonical storage code.
    pub fn code(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Registered => "registered",
            Self::InTransit => "in_transit",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// User-facing label, shared by the package card and the status relay.
    pub fn label(&self) -> &str {
        match self {
            Self::Created => "Создана",
            Self::Pending | Self::Registered => "Зарегистрирована",
            Self::InTransit => "В пути",
            Self::Ready => "Готова к получению",
            Self::Delivered => "Доставлена",
            Self::Returned => "Возвращена",
            Self::Cancelled => "Отменена",
            Self::Other(raw) => {
                if raw.is_empty() {
                    "Неизвестно"
                } else {
                    raw
                }
            }
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
