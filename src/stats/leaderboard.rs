//! Read-only views over the aggregate store: rank lookup, paginated member
//! leaderboards, and sorted channel breakdowns.

use crate::stats::store::{MemberStats, StatsStore};
use serenity::all::{ChannelId, GuildId, UserId};
use std::collections::BTreeMap;

/// One row of the member leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub level: u32,
    pub xp: u64,
    pub messages: u64,
    pub voice_seconds: u64,
}

/// A clamped slice of the ranked member list.
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// The page actually returned, after clamping.
    pub page_index: usize,
    pub total_pages: usize,
    pub total_members: usize,
}

fn entry(user_id: UserId, stats: &MemberStats) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id,
        level: stats.level,
        xp: stats.xp,
        messages: stats.messages,
        voice_seconds: stats.voice_seconds,
    }
}

/// All members of a guild ordered by (level desc, xp desc), ties broken by
/// user id so the ordering is deterministic for a fixed snapshot.
pub fn ranked_members(store: &StatsStore, guild_id: GuildId) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = store
        .guild_members(guild_id)
        .into_iter()
        .map(|(user_id, stats)| entry(user_id, stats))
        .collect();

    entries.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then(b.xp.cmp(&a.xp))
            .then(a.user_id.cmp(&b.user_id))
    });

    entries
}

/// 1-based position of a member in the ranked list, or None if they have no
/// stats in this guild.
pub fn rank_of(store: &StatsStore, guild_id: GuildId, user_id: UserId) -> Option<usize> {
    ranked_members(store, guild_id)
        .iter()
        .position(|e| e.user_id == user_id)
        .map(|pos| pos + 1)
}

/// Clamp a requested page index against the item count.  Returns the clamped
/// index and the total page count (always at least 1).
pub fn clamp_page(item_count: usize, page_size: usize, requested: usize) -> (usize, usize) {
    // A page size of 0 would divide by zero; treat it as 1.
    let page_size = page_size.max(1);
    let total_pages = item_count.div_ceil(page_size).max(1);
    (requested.min(total_pages - 1), total_pages)
}

/// A fixed-size slice of the ranked member list.  `requested_page` beyond the
/// end clamps to the last page; page 0 is never empty while the guild has any
/// member with stats.
pub fn page(
    store: &StatsStore,
    guild_id: GuildId,
    requested_page: usize,
    page_size: usize,
) -> LeaderboardPage {
    let page_size = page_size.max(1);
    let ranked = ranked_members(store, guild_id);
    let (page_index, total_pages) = clamp_page(ranked.len(), page_size, requested_page);
    let total_members = ranked.len();

    let entries = ranked
        .into_iter()
        .skip(page_index * page_size)
        .take(page_size)
        .collect();

    LeaderboardPage {
        entries,
        page_index,
        total_pages,
        total_members,
    }
}

/// Materialize a channel counter map as a list sorted by count descending.
/// Ties keep the map's channel-id iteration order.
pub fn channels_sorted(counts: &BTreeMap<ChannelId, u64>) -> Vec<(ChannelId, u64)> {
    let mut channels: Vec<(ChannelId, u64)> = counts.iter().map(|(id, n)| (*id, *n)).collect();
    channels.sort_by(|a, b| b.1.cmp(&a.1));
    channels
}
