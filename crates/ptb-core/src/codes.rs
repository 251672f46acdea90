//! Verification-code store for Telegram pairing.
//!
//! The web client requests a 6-digit code, the user relays it to the bot as a
//! plain message, and the client polls until the bot has confirmed it. Codes
//! live for a fixed lifetime and are consumed at most once. The store is
//! process-local; a second server instance would not see these codes.
//!
//! Every operation takes its clock via an `_at` variant so expiry is testable
//! without sleeping.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use rand::Rng;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    Result,
};

#[derive(Clone, Debug)]
struct CodeEntry {
    user_id: UserId,
    issued_at: Instant,
    verified: bool,
    chat_id: Option<ChatId>,
}

/// Outcome of a polling-side read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeStatus {
    /// The bot has not seen the code yet; keep polling.
    Pending,
    /// First read after the bot confirmed the code. The entry is gone now.
    Verified { user_id: UserId, chat_id: ChatId },
}

pub struct VerificationCodeStore {
    ttl: Duration,
    codes: Mutex<HashMap<String, CodeEntry>>,
}

impl VerificationCodeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            codes: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh 6-digit code for `user_id`.
    ///
    /// Any earlier unconsumed codes for the same user are superseded, so at
    /// most one code per account is outstanding. A colliding code value is
    /// re-rolled rather than overwriting someone else's entry.
    pub async fn generate(&self, user_id: &UserId) -> String {
        self.generate_at(user_id, Instant::now()).await
    }

    pub async fn generate_at(&self, user_id: &UserId, now: Instant) -> String {
        let mut codes = self.codes.lock().await;
        codes.retain(|_, entry| entry.user_id != *user_id);

        let mut rng = rand::thread_rng();
        let code = loop {
            let candidate = format!("{}", rng.gen_range(100_000..1_000_000));
            if !codes.contains_key(&candidate) {
                break candidate;
            }
        };

        codes.insert(
            code.clone(),
            CodeEntry {
                user_id: user_id.clone(),
                issued_at: now,
                verified: false,
                chat_id: None,
            },
        );
        code
    }

    /// Bot-side confirmation: bind `chat_id` to the code and return the
    /// account that requested it.
    pub async fn mark_verified(&self, code: &str, chat_id: ChatId) -> Result<UserId> {
        self.mark_verified_at(code, chat_id, Instant::now()).await
    }

    pub async fn mark_verified_at(
        &self,
        code: &str,
        chat_id: ChatId,
        now: Instant,
    ) -> Result<UserId> {
        let mut codes = self.codes.lock().await;

        let Some(entry) = codes.get_mut(code) else {
            return Err(Error::InvalidCode);
        };

        if now.duration_since(entry.issued_at) > self.ttl {
            codes.remove(code);
            return Err(Error::ExpiredCode);
        }

        entry.verified = true;
        entry.chat_id = Some(chat_id);
        Ok(entry.user_id.clone())
    }

    /// Polling-side read. The first read after verification deletes the entry
    /// (at-most-once consumption); an expired or unknown code is an error and
    /// the expired entry is deleted on the way out.
    pub async fn consume(&self, code: &str) -> Result<CodeStatus> {
        self.consume_at(code, Instant::now()).await
    }

    pub async fn consume_at(&self, code: &str, now: Instant) -> Result<CodeStatus> {
        let mut codes = self.codes.lock().await;

        let Some(entry) = codes.get(code) else {
            return Err(Error::InvalidCode);
        };

        if entry.verified {
            let entry = codes.remove(code).expect("entry present");
            return Ok(CodeStatus::Verified {
                user_id: entry.user_id,
                chat_id: entry.chat_id.expect("verified entries carry a chat id"),
            });
        }

        if now.duration_since(entry.issued_at) > self.ttl {
            codes.remove(code);
            return Err(Error::ExpiredCode);
        }

        Ok(CodeStatus::Pending)
    }

    /// Drop entries past their lifetime. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    pub async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut codes = self.codes.lock().await;
        let before = codes.len();
        codes.retain(|_, entry| {
            entry.verified || now.duration_since(entry.issued_at) <= self.ttl
        });
        before - codes.len()
    }

    /// Test/introspection helper: number of live entries.
    pub async fn len(&self) -> usize {
        self.codes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn insert_fixed(&self, code: &str, user_id: &UserId, issued_at: Instant) {
        self.codes.lock().await.insert(
            code.to_string(),
            CodeEntry {
                user_id: user_id.clone(),
                issued_at,
                verified: false,
                chat_id: None,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn store() -> VerificationCodeStore {
        VerificationCodeStore::new(TTL)
    }

    #[tokio::test]
    async fn generated_codes_are_six_digits() {
        let store = store();
        let code = store.generate(&UserId("u1".to_string())).await;
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert_ne!(code.as_bytes()[0], b'0');
    }

    #[tokio::test]
    async fn pending_until_verified_then_consumed_exactly_once() {
        let store = store();
        let user = UserId("u1".to_string());
        let t0 = Instant::now();
        store.insert_fixed("482913", &user, t0).await;

        assert_eq!(
            store.consume_at("482913", t0).await.unwrap(),
            CodeStatus::Pending
        );

        let bound = store
            .mark_verified_at("482913", ChatId(555), t0 + Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(bound, user);

        let first = store
            .consume_at("482913", t0 + Duration::from_secs(15))
            .await
            .unwrap();
        assert_eq!(
            first,
            CodeStatus::Verified {
                user_id: user,
                chat_id: ChatId(555),
            }
        );

        let second = store
            .consume_at("482913", t0 + Duration::from_secs(20))
            .await;
        assert!(matches!(second, Err(Error::InvalidCode)));
    }

    #[tokio::test]
    async fn code_expires_after_ttl() {
        let store = store();
        let user = UserId("u1".to_string());
        let t0 = Instant::now();
        store.insert_fixed("111222", &user, t0).await;

        let late = t0 + TTL + Duration::from_secs(1);
        assert!(matches!(
            store.consume_at("111222", late).await,
            Err(Error::ExpiredCode)
        ));
        // Deleted on the expired path: a retry sees an unknown code.
        assert!(matches!(
            store.consume_at("111222", late).await,
            Err(Error::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn expired_code_cannot_be_verified() {
        let store = store();
        let user = UserId("u1".to_string());
        let t0 = Instant::now();
        store.insert_fixed("333444", &user, t0).await;

        let late = t0 + TTL + Duration::from_secs(1);
        assert!(matches!(
            store.mark_verified_at("333444", ChatId(7), late).await,
            Err(Error::ExpiredCode)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let store = store();
        assert!(matches!(
            store.mark_verified("000000", ChatId(1)).await,
            Err(Error::InvalidCode)
        ));
        assert!(matches!(
            store.consume("000000").await,
            Err(Error::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn regeneration_supersedes_prior_codes_for_the_same_user() {
        let store = store();
        let user = UserId("u1".to_string());
        let t0 = Instant::now();
        store.insert_fixed("482913", &user, t0).await;

        let fresh = store.generate_at(&user, t0 + Duration::from_secs(30)).await;
        assert_ne!(fresh, "482913");
        assert_eq!(store.len().await, 1);
        assert!(matches!(
            store.mark_verified_at("482913", ChatId(5), t0 + Duration::from_secs(31)).await,
            Err(Error::InvalidCode)
        ));

        // Another user's code is untouched by the supersede.
        let other = UserId("u2".to_string());
        store.insert_fixed("999888", &other, t0).await;
        store.generate_at(&user, t0 + Duration::from_secs(40)).await;
        assert!(store
            .mark_verified_at("999888", ChatId(6), t0 + Duration::from_secs(41))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_entries() {
        let store = store();
        let t0 = Instant::now();
        store.insert_fixed("111111", &UserId("old".to_string()), t0).await;
        store
            .insert_fixed(
                "222222",
                &UserId("new".to_string()),
                t0 + Duration::from_secs(290),
            )
            .await;

        let removed = store.purge_expired_at(t0 + TTL + Duration::from_secs(1)).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store
                .consume_at("222222", t0 + Duration::from_secs(295))
                .await
                .unwrap(),
            CodeStatus::Pending
        );
    }

    #[tokio::test]
    async fn verified_entry_survives_the_sweep_until_consumed() {
        let store = store();
        let user = UserId("u1".to_string());
        let t0 = Instant::now();
        store.insert_fixed("654321", &user, t0).await;
        store
            .mark_verified_at("654321", ChatId(9), t0 + Duration::from_secs(5))
            .await
            .unwrap();

        // The web client may be slow to poll; a verified code is not swept
        // out from under it.
        store.purge_expired_at(t0 + TTL + Duration::from_secs(60)).await;
        let got = store
            .consume_at("654321", t0 + TTL + Duration::from_secs(61))
            .await
            .unwrap();
        assert_eq!(
            got,
            CodeStatus::Verified {
                user_id: user,
                chat_id: ChatId(9),
            }
        );
    }
}
