use crate::{event::*, plugin::*};
use anyhow::Result;

pub struct Help;

/// Render the help reply from the collected per-plugin usage blocks.
/// Multi-line usages stay grouped, separated by a blank line.
fn render_help(bot_name: &str, usages: &[String]) -> String {
    let mut reply = format!("```\n{} - activity stats and levels\n", bot_name);
    for usage in usages {
        reply.push('\n');
        for line in usage.lines() {
            reply.push_str("  ");
            reply.push_str(line);
            reply.push('\n');
        }
    }
    reply.push_str("```\n");
    reply
}

#[serenity::async_trait]
impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} - show this help message",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let mut usages = Vec::new();
        for plugin in crate::plugin::plugins() {
            if let Some(usage) = plugin.usage(ctx).await {
                usages.push(usage);
            }
        }

        let bot_name = ctx.cache.current_user().name.to_string();
        msg.reply(ctx.cache_http, render_help(&bot_name, &usages))
            .await?;
        Ok(EventHandled::Yes)
    }
}
