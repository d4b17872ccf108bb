//! Miscellaneous convenience methods

use crate::context::Context;
use anyhow::{anyhow, Result};
use serenity::all::{GuildId, UserId};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

const DATA_DIR_REL_HOME: &str = ".config/guildstats";

/// Persistence must not suspend forever.  A stuck disk fails the event
/// instead of wedging the task that awaited the save.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a persistence future, failing it if it exceeds the I/O deadline.
pub async fn bounded_io<T>(what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    bounded_io_within(IO_TIMEOUT, what, fut).await
}

async fn bounded_io_within<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("Timed out {}", what)),
    }
}

/// Path of a data file under the bot's config directory.
pub fn data_path(filename: &str) -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(DATA_DIR_REL_HOME).join(filename))
        .ok_or(anyhow!("Could not find home directory"))
}

#[serenity::async_trait]
pub trait UserIdHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserIdHelper for serenity::all::UserId {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let user = match self.to_user(ctx.cache_http).await {
            Ok(user) => user,
            Err(_) => return format!("<unknown-user-{}>", *self),
        };

        user.nick_in_guild(ctx, guild_id).await
    }
}

#[serenity::async_trait]
pub trait UserHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserHelper for serenity::all::User {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let nick_in_guild = match guild_id {
            Some(guild_id) => self.nick_in(ctx.cache_http, guild_id).await,
            None => None,
        };

        // May not be in a guild, e.g. DM.  Fall back to global username.
        match nick_in_guild {
            Some(nick_in_guild) => nick_in_guild,
            None => self.name.clone(),
        }
    }
}

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_owner(&self, ctx: &Context) -> bool;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    async fn is_from_owner(&self, ctx: &Context) -> bool {
        let owners = &ctx.cfg.read().await.general.bot_owners;
        let author_global_name = &self.author.name;

        owners.contains(author_global_name)
    }
}

/// Parse a command argument naming a user: either a raw id or a mention such
/// as `<@123>` / `<@!123>`.
pub fn parse_user_arg(term: &str) -> Option<UserId> {
    let raw = term
        .strip_prefix("<@!")
        .or_else(|| term.strip_prefix("<@"))
        .map(|s| s.strip_suffix('>').unwrap_or(s))
        .unwrap_or(term);

    raw.parse::<UserId>().ok()
}

/// Seconds of accumulated voice time as `2h 5m 30s`, omitting empty leading
/// units.
pub fn format_voice_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_mentions_and_ids() {
        assert_eq!(parse_user_arg("123"), Some(UserId::new(123)));
        assert_eq!(parse_user_arg("<@123>"), Some(UserId::new(123)));
        assert_eq!(parse_user_arg("<@!123>"), Some(UserId::new(123)));
        assert_eq!(parse_user_arg("abc"), None);
    }

    #[test]
    fn formats_voice_time_units() {
        assert_eq!(format_voice_time(42), "42s");
        assert_eq!(format_voice_time(150), "2m 30s");
        assert_eq!(format_voice_time(7530), "2h 5m 30s");
    }

    #[tokio::test]
    async fn bounded_io_passes_results_through() {
        let result = bounded_io_within(Duration::from_secs(1), "noop", async { Ok(7) }).await;
        assert_eq!(result.ok(), Some(7));
    }

    #[tokio::test]
    async fn bounded_io_fails_stuck_futures() {
        let result = bounded_io_within(
            Duration::from_millis(10),
            "writing nothing",
            std::future::pending::<Result<()>>(),
        )
        .await;
        assert!(result.is_err());
    }
}
