use crate::event::EventHandled;
use anyhow::Result;

mod cleanup;
mod debug;
mod help;
mod ignore_bots;
mod leaderboard;
mod message_stats;
mod rank;
mod ready;
mod settings;
mod voice_stats;

// Plugins take the bot's own context, not serenity's.
pub use crate::context::Context;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &crate::event::Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(ready::Ready),
        // Stat collection.  These observe without consuming, so they must run
        // before the command plugins.
        Box::new(message_stats::MessageStats),
        Box::new(voice_stats::VoiceStats),
        Box::new(cleanup::Cleanup),
        // Commands
        Box::new(help::Help),
        Box::new(rank::Rank),
        Box::new(leaderboard::Leaderboard),
        Box::new(settings::Settings),
    ]
}
