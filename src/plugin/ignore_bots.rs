use crate::{event::*, plugin::*};
use anyhow::Result;

/// Bot accounts never earn stats and never issue commands.  Drop their
/// messages and voice updates before any other plugin sees them.
pub struct IgnoreBots;

#[serenity::async_trait]
impl Plugin for IgnoreBots {
    fn name(&self) -> &'static str {
        "ignore_bots"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, _ctx: &Context, event: &Event) -> Result<EventHandled> {
        let from_bot = match event {
            Event::Message(msg) => msg.author.bot,
            Event::VoiceStateUpdate { new, .. } => {
                new.member.as_ref().is_some_and(|m| m.user.bot)
            }
            _ => false,
        };

        if from_bot {
            Ok(EventHandled::Yes)
        } else {
            Ok(EventHandled::No)
        }
    }
}
