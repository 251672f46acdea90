use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use ptb_core::{
    browse::PackageBrowser, codes::VerificationCodeStore, config::Config,
    messaging::port::MessagingPort, store::PackageStore,
};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn PackageStore>,
    pub codes: Arc<VerificationCodeStore>,
    pub browser: Arc<PackageBrowser>,
    pub messenger: Arc<dyn MessagingPort>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-chat mutexes serializing card edits: two rapid button presses from the
/// same chat otherwise race on "edit the last message" and the later edit can
/// land under the earlier index.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Long-polling loop. A stopped dispatcher (network trouble, update conflicts)
/// is reinitialized after a fixed delay instead of taking the process down.
pub async fn run_polling(bot: Bot, state: Arc<AppState>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!("bot started: @{}", me.username()),
        Err(e) => tracing::warn!("get_me failed at startup: {e}"),
    }

    loop {
        let handler = dptree::entry()
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
            .branch(Update::filter_message().endpoint(handlers::handle_message));

        Dispatcher::builder(bot.clone(), handler)
            .dependencies(dptree::deps![state.clone()])
            .build()
            .dispatch()
            .await;

        tracing::warn!(
            "telegram dispatcher stopped; reinitializing in {:?}",
            state.cfg.bot_reconnect_delay
        );
        tokio::time::sleep(state.cfg.bot_reconnect_delay).await;
    }
}
