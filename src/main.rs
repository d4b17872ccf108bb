mod config;
mod context;
mod event;
mod handler;
mod helper;
mod logging;
mod plugin;
mod settings;
mod stats;
mod volatile_state;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let stats = crate::stats::store::StatsStore::load().await?;
    let settings = crate::settings::SettingsStore::load().await?;
    let vstate = crate::volatile_state::VolatileState::new();
    let handler = handler::Handler::new(cfg, stats, settings, vstate);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
