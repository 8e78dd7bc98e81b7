//! Telegram adapter.
//!
//! Long-polls Telegram and feeds every text message through the
//! [`Dispatcher`] built by [`setup_bot`]. `/start` shows the main menu when no
//! module claims it.

use std::sync::Arc;

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::logging::LogRegistry;
use crate::menu::MainMenu;
use crate::modules::FsUnitSource;
use crate::routing::Dispatcher;
use crate::startup::{run_guarded, setup_bot};

const MENU_PROMPT: &str = "Main menu";

/// Reply keyboard for the main menu.
pub fn main_keyboard(menu: &MainMenu) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = menu
        .rows()
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.as_str())).collect())
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard(true)
}

/// Reply for `text`, if any: a module handler first, then the built-in
/// `/start` menu.
fn reply_for(dispatcher: &Dispatcher, text: &str) -> Option<(String, bool)> {
    if let Some(reply) = dispatcher.dispatch(text) {
        return Some((reply, false));
    }
    let command = text.trim().split_whitespace().next().unwrap_or_default();
    if command == "/start" || command.starts_with("/start@") {
        return Some((MENU_PROMPT.to_string(), true));
    }
    None
}

/// Run the startup sequence, then poll until Ctrl+C.
pub async fn run_bot(config: Config) -> Result<()> {
    let token = config
        .bot
        .token
        .clone()
        .ok_or_else(|| {
            ForgeError::Config("bot token is not set (BOTFORGE_BOT_TOKEN)".to_string())
        })?;

    let logs = LogRegistry::new(&config.paths.log_dir);
    let source = FsUnitSource::new(&config.paths.root_dir);
    let setup = run_guarded(|| setup_bot(&config, &source, &logs)).map_err(|e| {
        logs.get_loggers(&config.bot.log_name)
            .error(&format!("[{}] {}", e.code(), e));
        e
    })?;

    let bot_logs = logs.get_loggers(&config.bot.log_name);
    bot_logs.info(&format!(
        "Bot started with {} module(s), {} router(s)",
        setup.modules.len(),
        setup.dispatcher.router_count()
    ));

    let dispatcher = Arc::clone(&setup.dispatcher);
    let keyboard = main_keyboard(&setup.main_menu);
    let bot = Bot::new(token);

    info!("Polling Telegram for updates");
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let dispatcher = Arc::clone(&dispatcher);
        let keyboard = keyboard.clone();
        async move {
            let Some(text) = msg.text() else {
                return Ok(());
            };
            match reply_for(&dispatcher, text) {
                Some((reply, true)) => {
                    bot.send_message(msg.chat.id, reply)
                        .reply_markup(keyboard)
                        .await?;
                }
                Some((reply, false)) => {
                    bot.send_message(msg.chat.id, reply).await?;
                }
                None => debug!(chat = msg.chat.id.0, "No handler for message"),
            }
            Ok(())
        }
    })
    .await;

    bot_logs.info("Bot stopped");
    logs.shutdown();
    Ok(())
}
