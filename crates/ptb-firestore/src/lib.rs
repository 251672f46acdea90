//! Firestore adapter (REST API).
//!
//! Implements the `ptb-core` PackageStore over the Firestore v1 REST surface:
//! document gets, `runQuery` for the two lookups by field, and a masked patch
//! for the notification opt-in flag. Only the fields the relay reads/writes
//! are decoded; everything else in the documents is ignored.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use ptb_core::{
    domain::{ChatId, PackageId, UserId},
    errors::Error,
    status::PackageStatus,
    store::{Package, PackageStore, User},
    Result,
};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Clone, Debug)]
pub struct FirestoreStore {
    base_url: String,
    project_id: String,
    database_id: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        base_url: Option<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Store(format!("http client build: {e}")))?;

        Ok(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            project_id: project_id.into(),
            database_id: database_id.into(),
            auth_token,
            http,
        })
    }

    pub fn from_config(cfg: &ptb_core::config::Config) -> Result<Self> {
        Self::new(
            cfg.firestore_project_id.clone(),
            cfg.firestore_database_id.clone(),
            cfg.firestore_base_url.clone(),
            cfg.firestore_auth_token.clone(),
            cfg.http_client_timeout,
        )
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url, self.project_id, self.database_id
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let url = format!("{}/{collection}/{id}", self.documents_url());
        let resp = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Store(format!("firestore request error: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp).await?;

        let doc: Value = resp
            .json()
            .await
            .map_err(|e| Error::Store(format!("firestore json error: {e}")))?;
        Ok(Some(doc))
    }

    /// `runQuery` with a single equality filter on `collection.field`.
    async fn query_equal(&self, collection: &str, field: &str, value: Value) -> Result<Vec<Value>> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": value,
                    }
                }
            }
        });

        let resp = self
            .authorize(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(format!("firestore request error: {e}")))?;
        let resp = check_status(resp).await?;

        let rows: Value = resp
            .json()
            .await
            .map_err(|e| Error::Store(format!("firestore json error: {e}")))?;

        // runQuery streams an array of result rows; rows without a `document`
        // key carry read time / partial progress only.
        let docs = rows
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("document").cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }
}

#[async_trait]
impl PackageStore for FirestoreStore {
    async fn package(&self, id: &PackageId) -> Result<Option<Package>> {
        let Some(doc) = self.get_document("packages", &id.0).await? else {
            return Ok(None);
        };
        decode_package(&doc).map(Some)
    }

    async fn packages_for_user(&self, user: &UserId) -> Result<Vec<Package>> {
        let docs = self
            .query_equal("packages", "userId", json!({ "stringValue": user.0 }))
            .await?;
        docs.iter().map(decode_package).collect()
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>> {
        let Some(doc) = self.get_document("users", &id.0).await? else {
            return Ok(None);
        };
        decode_user(&doc).map(Some)
    }

    async fn user_by_chat(&self, chat: ChatId) -> Result<Option<User>> {
        let docs = self
            .query_equal(
                "users",
                "telegramUserId",
                json!({ "integerValue": chat.0.to_string() }),
            )
            .await?;
        docs.first().map(decode_user).transpose()
    }

    async fn set_notifications_enabled(&self, id: &PackageId, enabled: bool) -> Result<()> {
        let url = format!(
            "{}/packages/{}?updateMask.fieldPaths=telegramNotifications.enabled&currentDocument.exists=true",
            self.documents_url(),
            id.0
        );
        let body = json!({
            "fields": {
                "telegramNotifications": {
                    "mapValue": {
                        "fields": { "enabled": { "booleanValue": enabled } }
                    }
                }
            }
        });

        let resp = self
            .authorize(self.http.patch(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Store(format!("firestore request error: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PackageNotFound(id.0.clone()));
        }
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Store(format!(
        "firestore call failed: {status} {}",
        body.chars().take(200).collect::<String>()
    )))
}

// ============== Document decoding ==============

fn decode_package(doc: &Value) -> Result<Package> {
    let id = document_id(doc)?;
    let fields = doc.get("fields").unwrap_or(&Value::Null);

    let user_id = string_field(fields, "userId")
        .ok_or_else(|| Error::Store(format!("package {id} has no userId")))?;

    Ok(Package {
        id: PackageId(id.clone()),
        user_id: UserId(user_id),
        tracking_number: string_field(fields, "trackingNumber").unwrap_or_default(),
        status: PackageStatus::parse(&string_field(fields, "status").unwrap_or_default()),
        description: string_field(fields, "description"),
        weight: number_field(fields, "weight"),
        dimensions: string_field(fields, "dimensions"),
        notifications_enabled: fields
            .pointer("/telegramNotifications/mapValue/fields/enabled/booleanValue")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn decode_user(doc: &Value) -> Result<User> {
    let id = document_id(doc)?;
    let fields = doc.get("fields").unwrap_or(&Value::Null);

    Ok(User {
        id: UserId(id),
        email: string_field(fields, "email"),
        full_name: string_field(fields, "fullName"),
        phone: string_field(fields, "phone"),
        address: string_field(fields, "address"),
        telegram_connected: bool_field(fields, "telegramConnected").unwrap_or(false),
        telegram_chat_id: int_field(fields, "telegramUserId").map(ChatId),
        created_at: timestamp_field(fields, "createdAt"),
    })
}

fn document_id(doc: &Value) -> Result<String> {
    doc.get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .map(str::to_string)
        .ok_or_else(|| Error::Store("document without a name".to_string()))
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields
        .pointer(&format!("/{name}/stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn bool_field(fields: &Value, name: &str) -> Option<bool> {
    fields
        .pointer(&format!("/{name}/booleanValue"))
        .and_then(Value::as_bool)
}

/// Numeric fields arrive as `integerValue` (string-encoded) or `doubleValue`
/// depending on what the JS client happened to write.
fn number_field(fields: &Value, name: &str) -> Option<f64> {
    let value = fields.get(name)?;
    if let Some(d) = value.get("doubleValue").and_then(Value::as_f64) {
        return Some(d);
    }
    if let Some(i) = value.get("integerValue").and_then(Value::as_str) {
        return i.parse().ok();
    }
    value
        .get("stringValue")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse().ok())
}

fn int_field(fields: &Value, name: &str) -> Option<i64> {
    let value = fields.get(name)?;
    if let Some(i) = value.get("integerValue").and_then(Value::as_str) {
        return i.parse().ok();
    }
    value.get("doubleValue").and_then(Value::as_f64).map(|d| d as i64)
}

fn timestamp_field(fields: &Value, name: &str) -> Option<DateTime<Utc>> {
    let raw = fields
        .pointer(&format!("/{name}/timestampValue"))
        .or_else(|| fields.pointer(&format!("/{name}/stringValue")))
        .and_then(Value::as_str)?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
