use crate::{event::*, plugin::*, stats::voice};
use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// Drives the voice session state machine from voice-state updates.
pub struct VoiceStats;

#[serenity::async_trait]
impl Plugin for VoiceStats {
    fn name(&self) -> &'static str {
        "voice_stats"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::VoiceStateUpdate { old, new } = event else {
            return Ok(EventHandled::No);
        };

        let Some(guild_id) = new.guild_id.or(old.as_ref().and_then(|o| o.guild_id)) else {
            return Ok(EventHandled::No);
        };

        if !ctx.settings.read().await.guild(guild_id).tracking.voice {
            return Ok(EventHandled::No);
        }

        let old_channel = old.as_ref().and_then(|o| o.channel_id);
        let new_channel = new.channel_id;
        // Mute/deafen and similar updates within one channel are not a move.
        if old_channel == new_channel {
            return Ok(EventHandled::No);
        }

        let now_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        {
            let mut stats = ctx.stats.write().await;
            voice::apply_transition(
                &mut stats,
                guild_id,
                new.user_id,
                old_channel,
                new_channel,
                now_unix,
            );
            stats.save().await?;
        }

        // Observed, not consumed.
        Ok(EventHandled::No)
    }
}
