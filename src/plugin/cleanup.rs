use crate::{event::*, log_internal, plugin::*};
use anyhow::Result;

/// Deletes stored data when a member leaves or the bot is removed from a
/// guild.
pub struct Cleanup;

#[serenity::async_trait]
impl Plugin for Cleanup {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::MemberRemoval { guild_id, user } => {
                {
                    let mut stats = ctx.stats.write().await;
                    stats.remove_member(*guild_id, user.id);
                    stats.save().await?;
                }

                log_internal!("Deleted stats for {} in guild {}", user.id, guild_id);
                Ok(EventHandled::Yes)
            }
            Event::GuildRemoval { guild_id } => {
                {
                    let mut stats = ctx.stats.write().await;
                    stats.remove_guild(*guild_id);
                    stats.save().await?;
                }
                {
                    let mut settings = ctx.settings.write().await;
                    settings.remove_guild(*guild_id);
                    settings.save().await?;
                }

                log_internal!("Deleted all data for guild {}", guild_id);
                Ok(EventHandled::Yes)
            }
            _ => Ok(EventHandled::No),
        }
    }
}
