use std::sync::Arc;

use teloxide::Bot;

use ptb_core::{
    browse::PackageBrowser, codes::VerificationCodeStore, config::Config,
    messaging::port::MessagingPort, relay::StatusRelay, store::PackageStore, Error,
};
use ptb_firestore::FirestoreStore;
use ptb_http::ApiState;
use ptb_telegram::{
    router::{AppState, ChatLocks},
    TelegramMessenger,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    ptb_core::logging::init("ptb");

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn PackageStore> = Arc::new(FirestoreStore::from_config(&cfg)?);
    let codes = Arc::new(VerificationCodeStore::new(cfg.code_ttl));
    let browser = Arc::new(PackageBrowser::new(store.clone()));

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let relay = Arc::new(StatusRelay::new(store.clone(), messenger.clone()));

    // Expiry sweep for unverified pairing codes.
    {
        let codes = codes.clone();
        let every = cfg.code_sweep_interval;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                let removed = codes.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "expired pairing codes swept");
                }
            }
        });
    }

    // HTTP API for the web client and the admin panel.
    let addr = cfg
        .http_bind
        .parse()
        .map_err(|e| Error::Config(format!("invalid HTTP_BIND {}: {e}", cfg.http_bind)))?;
    let api_state = ApiState {
        codes: codes.clone(),
        relay,
    };
    tokio::spawn(async move {
        if let Err(e) = ptb_http::serve(addr, api_state).await {
            tracing::error!("HTTP API exited: {e}");
        }
    });

    let state = Arc::new(AppState {
        cfg,
        store,
        codes,
        browser,
        messenger,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    ptb_telegram::router::run_polling(bot, state)
        .await
        .map_err(|e| Error::Delivery(format!("telegram bot failed: {e}")))
}
