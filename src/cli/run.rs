//! `run` command: start the bot.

use anyhow::Result;

use botforge::bot::run_bot;
use botforge::config::Config;

pub(crate) async fn cmd_run(config: Config) -> Result<()> {
    println!("Starting bot (root package {})", config.modules.root_package);
    run_bot(config).await?;
    Ok(())
}
