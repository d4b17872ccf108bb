use crate::{event::*, log_internal, plugin::*, stats::level};
use anyhow::Result;
use std::time::Duration;

/// Counts guild messages per channel and grants XP, announcing level-ups.
///
/// Observes every message without consuming it, so it runs before the command
/// plugins.  Bot messages are already filtered out by `ignore_bots`.
pub struct MessageStats;

#[serenity::async_trait]
impl Plugin for MessageStats {
    fn name(&self) -> &'static str {
        "message_stats"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        // DMs have no guild and don't count for anything.
        let Some(guild_id) = msg.guild_id else {
            return Ok(EventHandled::No);
        };

        let guild_settings = ctx.settings.read().await.guild(guild_id);
        if !guild_settings.tracking.text && !guild_settings.leveling.enabled {
            return Ok(EventHandled::No);
        }

        let (cooldown_ms, xp_min, xp_max) = {
            let cfg = ctx.cfg.read().await;
            (
                cfg.leveling.cooldown_ms,
                cfg.leveling.xp_min,
                cfg.leveling.xp_max,
            )
        };

        // The cooldown advances before persistence; a failed write below is
        // allowed to cost this one grant.
        let grant_allowed = guild_settings.leveling.enabled
            && ctx.vstate.write().await.xp_cooldowns.try_grant(
                guild_id,
                msg.author.id,
                tokio::time::Instant::now(),
                Duration::from_millis(cooldown_ms),
            );

        let mut leveled_up = false;
        {
            let mut stats = ctx.stats.write().await;

            if guild_settings.tracking.text {
                stats.record_message(guild_id, msg.author.id, msg.channel_id);
            }
            if grant_allowed {
                let amount = level::roll_xp(xp_min, xp_max);
                leveled_up = stats.apply_xp(guild_id, msg.author.id, amount);
            }

            stats.save().await?;
        }

        if leveled_up && guild_settings.leveling.messages {
            let new_level = ctx
                .stats
                .read()
                .await
                .member(guild_id, msg.author.id)
                .map(|m| m.level)
                .unwrap_or(1);

            let announcement = format!(
                "Congratulations <@{}>! You reached **level {}**!",
                msg.author.id, new_level
            );
            // A configured announcement channel wins; otherwise reply where
            // the message was sent.
            let channel_id = guild_settings.leveling.channel.unwrap_or(msg.channel_id);

            if let Err(e) = channel_id.say(ctx.cache_http, announcement).await {
                log_internal!("Could not announce level-up in {}: {}", channel_id, e);
            }
        }

        // Other plugins (commands) may still want this message.
        Ok(EventHandled::No)
    }
}
