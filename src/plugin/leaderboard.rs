use crate::{
    event::*,
    helper::{format_voice_time, UserIdHelper},
    plugin::*,
    stats::leaderboard,
};
use anyhow::Result;
use serenity::all::GuildId;

/// The `;leaderboard` command: paginated member ranking and guild-wide
/// channel activity.
pub struct Leaderboard;

#[serenity::async_trait]
impl Plugin for Leaderboard {
    fn name(&self) -> &'static str {
        "leaderboard"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}leaderboard [page] - rank all members by level and XP\n\
             {}leaderboard channels [page] - rank channels by activity",
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

        let (channels_view, rest) = match args.first() {
            Some(&"channels") => (true, &args[1..]),
            _ => (false, &args[..]),
        };

        // Page input is 1-based; out-of-range clamps to the last page.
        let requested = match rest.first() {
            Some(term) => match term.parse::<usize>() {
                Ok(page) => page.saturating_sub(1),
                Err(_) => {
                    msg.reply(ctx.cache_http, "Invalid page number.  See `;help`")
                        .await?;
                    return Ok(EventHandled::Yes);
                }
            },
            None => 0,
        };

        let reply = if channels_view {
            self.channels_reply(ctx, guild_id, requested).await?
        } else {
            self.members_reply(ctx, guild_id, requested).await?
        };

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}

impl Leaderboard {
    async fn members_reply(
        &self,
        ctx: &Context<'_>,
        guild_id: GuildId,
        requested: usize,
    ) -> Result<String> {
        let page_size = ctx.cfg.read().await.leaderboard.page_size;
        let page = {
            let stats = ctx.stats.read().await;
            leaderboard::page(&stats, guild_id, requested, page_size)
        };

        if page.entries.is_empty() {
            return Ok("No member stats recorded in this server yet.".to_string());
        }

        let mut reply = String::from("```\nLeaderboard:\n");
        for (i, entry) in page.entries.iter().enumerate() {
            let name = entry.user_id.nick_in_guild(ctx, Some(guild_id)).await;
            reply.push_str(&format!(
                "#{:<3} {} - level {} ({} XP, {} messages)\n",
                page.page_index * page_size + i + 1,
                name,
                entry.level,
                entry.xp,
                entry.messages,
            ));
        }
        reply.push_str(&format!(
            "Page {} of {} - {} members total\n```",
            page.page_index + 1,
            page.total_pages,
            page.total_members,
        ));
        Ok(reply)
    }

    async fn channels_reply(
        &self,
        ctx: &Context<'_>,
        guild_id: GuildId,
        requested: usize,
    ) -> Result<String> {
        let page_size = ctx.cfg.read().await.leaderboard.page_size;

        let (lines, total_messages, total_voice) = {
            let stats = ctx.stats.read().await;
            let Some(server) = stats.server(guild_id) else {
                return Ok("No channel activity recorded in this server yet.".to_string());
            };

            let lines: Vec<String> = leaderboard::channels_sorted(&server.text_channels)
                .into_iter()
                .map(|(id, count)| format!("text  <#{}> - {} messages", id, count))
                .chain(
                    leaderboard::channels_sorted(&server.voice_channels)
                        .into_iter()
                        .map(|(id, secs)| format!("voice <#{}> - {}", id, format_voice_time(secs))),
                )
                .collect();

            (lines, server.total_messages(), server.total_voice_seconds())
        };

        if lines.is_empty() {
            return Ok("No channel activity recorded in this server yet.".to_string());
        }

        let (page_index, total_pages) = leaderboard::clamp_page(lines.len(), page_size, requested);

        let mut reply = format!(
            "Channel activity ({} messages, {} in voice):\n",
            total_messages,
            format_voice_time(total_voice)
        );
        for line in lines.iter().skip(page_index * page_size).take(page_size) {
            reply.push_str(line);
            reply.push('\n');
        }
        reply.push_str(&format!("Page {} of {}", page_index + 1, total_pages));
        Ok(reply)
    }
}
