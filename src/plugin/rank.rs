use crate::{
    event::*,
    helper::{format_voice_time, parse_user_arg, UserIdHelper},
    plugin::*,
    stats::{leaderboard, level},
};
use anyhow::Result;
use serenity::all::{GuildId, UserId};

/// The `;rank` command: level, XP and activity overview for one member, plus
/// a paginated per-channel breakdown.
pub struct Rank;

#[serenity::async_trait]
impl Plugin for Rank {
    fn name(&self) -> &'static str {
        "rank"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}rank [user] - show a member's level, XP and rank\n\
             {}rank channels [user] [page] - show a member's per-channel activity",
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

        let (channels_view, mut rest) = match args.first() {
            Some(&"channels") => (true, &args[1..]),
            _ => (false, &args[..]),
        };

        // A user argument is a mention or a full snowflake; short numbers are
        // page numbers for the channels view.
        let target = match rest.first() {
            Some(term) if looks_like_user(term) => match parse_user_arg(term) {
                Some(user_id) => {
                    rest = &rest[1..];
                    user_id
                }
                None => {
                    msg.reply(ctx.cache_http, "Invalid user.  See `;help`")
                        .await?;
                    return Ok(EventHandled::Yes);
                }
            },
            _ => msg.author.id,
        };

        let reply = if channels_view {
            let page_arg = rest.first().and_then(|t| t.parse::<usize>().ok());
            self.channels_reply(ctx, guild_id, target, page_arg).await?
        } else if !rest.is_empty() {
            "Invalid user.  See `;help`".to_string()
        } else {
            self.overview_reply(ctx, guild_id, target).await?
        };

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}

fn looks_like_user(term: &str) -> bool {
    term.starts_with("<@") || (term.len() >= 17 && term.chars().all(|c| c.is_ascii_digit()))
}

impl Rank {
    async fn overview_reply(
        &self,
        ctx: &Context<'_>,
        guild_id: GuildId,
        target: UserId,
    ) -> Result<String> {
        let (member, rank, member_count) = {
            let stats = ctx.stats.read().await;
            let Some(member) = stats.member(guild_id, target).cloned() else {
                return Ok(format!("No stats recorded for <@{}> yet.", target));
            };
            let rank = leaderboard::rank_of(&stats, guild_id, target).unwrap_or(0);
            let member_count = leaderboard::ranked_members(&stats, guild_id).len();
            (member, rank, member_count)
        };

        let name = target.nick_in_guild(ctx, Some(guild_id)).await;
        let to_next = level::xp_until_next_level(member.xp, member.level);
        let progress = (level::level_progress(member.xp, member.level) * 100.0).round();

        Ok(format!(
            "```\n\
             {} - rank #{} of {}\n\
             Level {} ({} XP, {}% into this level, {} XP to next)\n\
             Messages: {}\n\
             Voice time: {}\n\
             ```",
            name,
            rank,
            member_count,
            member.level,
            member.xp,
            progress,
            to_next,
            member.messages,
            format_voice_time(member.voice_seconds),
        ))
    }

    async fn channels_reply(
        &self,
        ctx: &Context<'_>,
        guild_id: GuildId,
        target: UserId,
        page_arg: Option<usize>,
    ) -> Result<String> {
        let page_size = ctx.cfg.read().await.leaderboard.page_size;

        let lines: Vec<String> = {
            let stats = ctx.stats.read().await;
            let Some(member) = stats.member(guild_id, target) else {
                return Ok(format!("No stats recorded for <@{}> yet.", target));
            };

            leaderboard::channels_sorted(&member.text_channels)
                .into_iter()
                .map(|(id, count)| format!("text  <#{}> - {} messages", id, count))
                .chain(
                    leaderboard::channels_sorted(&member.voice_channels)
                        .into_iter()
                        .map(|(id, secs)| format!("voice <#{}> - {}", id, format_voice_time(secs))),
                )
                .collect()
        };

        if lines.is_empty() {
            return Ok(format!("No channel activity recorded for <@{}> yet.", target));
        }

        // Page input is 1-based; out-of-range clamps.
        let requested = page_arg.unwrap_or(1).saturating_sub(1);
        let (page_index, total_pages) = leaderboard::clamp_page(lines.len(), page_size, requested);
        let name = target.nick_in_guild(ctx, Some(guild_id)).await;

        let mut reply = format!("Channel activity for {}:\n", name);
        for line in lines.iter().skip(page_index * page_size).take(page_size) {
            reply.push_str(line);
            reply.push('\n');
        }
        reply.push_str(&format!("Page {} of {}", page_index + 1, total_pages));
        Ok(reply)
    }
}
