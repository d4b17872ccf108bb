use crate::{event::*, helper::MessageHelper, plugin::*};
use anyhow::Result;
use serde_json::Value;

/// The `;settings` command: path-based access to per-guild feature toggles,
/// e.g. `;settings set leveling.channel 123456789`.
pub struct Settings;

#[serenity::async_trait]
impl Plugin for Settings {
    fn name(&self) -> &'static str {
        "settings"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}settings get <path> - show a guild setting (e.g. leveling.enabled)\n\
             {}settings set <path> <value> - change a guild setting (bot owners only)",
            prefix, prefix
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some(guild_id) = msg.guild_id else {
            msg.reply(ctx.cache_http, "This command only works in a server.")
                .await?;
            return Ok(EventHandled::Yes);
        };

        let reply = match (args.first(), args.get(1), args.get(2)) {
            (Some(&"get"), Some(path), None) => {
                match ctx.settings.read().await.get(guild_id, path) {
                    Some(value) => format!("`{}` = `{}`", path, value),
                    None => format!("Unknown setting `{}`", path),
                }
            }
            (Some(&"set"), Some(path), Some(raw)) => {
                if !msg.is_from_owner(ctx).await {
                    msg.reply(ctx.cache_http, "Only bot owners may change settings.")
                        .await?;
                    return Ok(EventHandled::Yes);
                }

                // Accept JSON literals (true, 42, null); anything else is a
                // plain string such as a channel id.
                let value: Value = serde_json::from_str(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));

                let changed = {
                    let mut settings = ctx.settings.write().await;
                    let changed = settings.set(guild_id, path, value);
                    if changed {
                        settings.save().await?;
                    }
                    changed
                };

                if changed {
                    format!("Updated `{}`", path)
                } else {
                    format!("Could not set `{}`: unknown setting or wrong value type", path)
                }
            }
            _ => "Invalid command.  See `;help`".to_string(),
        };

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
