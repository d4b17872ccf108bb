//! The aggregate store: per-member and guild-wide activity counters plus the
//! open voice sessions, persisted as one JSON file.
//!
//! All mutations are upsert-and-increment on the record for a key, so a
//! retried event never corrupts a counter.  The store is held behind a single
//! `RwLock` by the handler, which serializes updates for the same
//! (guild, user) pair.

use crate::helper::{bounded_io, data_path};
use crate::stats::level;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, GuildId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;

const STATS_FILE: &str = "stats.json";

/// Activity counters for one member of one guild.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MemberStats {
    pub xp: u64,
    pub level: u32,
    pub messages: u64,
    pub voice_seconds: u64,
    pub text_channels: BTreeMap<ChannelId, u64>,
    pub voice_channels: BTreeMap<ChannelId, u64>,
}

impl Default for MemberStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            messages: 0,
            voice_seconds: 0,
            text_channels: BTreeMap::new(),
            voice_channels: BTreeMap::new(),
        }
    }
}

/// Guild-wide channel counters, independent of the per-member breakdown.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ServerStats {
    pub text_channels: BTreeMap<ChannelId, u64>,
    pub voice_channels: BTreeMap<ChannelId, u64>,
}

impl ServerStats {
    pub fn total_messages(&self) -> u64 {
        self.text_channels.values().sum()
    }

    pub fn total_voice_seconds(&self) -> u64 {
        self.voice_channels.values().sum()
    }
}

/// An open "currently connected to a voice channel" record.  Existence of
/// this record is the single source of truth for being in voice; absence
/// means disconnected.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoiceSession {
    pub channel_id: ChannelId,
    /// Unix seconds at the moment of joining.
    pub joined_at: u64,
}

#[derive(Serialize, Deserialize, Default)]
pub struct StatsStore {
    members: HashMap<GuildId, HashMap<UserId, MemberStats>>,
    servers: HashMap<GuildId, ServerStats>,
    voice_sessions: HashMap<GuildId, HashMap<UserId, VoiceSession>>,
}

impl StatsStore {
    pub fn member(&self, guild_id: GuildId, user_id: UserId) -> Option<&MemberStats> {
        self.members.get(&guild_id)?.get(&user_id)
    }

    /// All members of a guild with stats.  Order is not significant; the
    /// leaderboard layer sorts.
    pub fn guild_members(&self, guild_id: GuildId) -> Vec<(UserId, &MemberStats)> {
        self.members
            .get(&guild_id)
            .map(|m| m.iter().map(|(id, stats)| (*id, stats)).collect())
            .unwrap_or_default()
    }

    pub fn server(&self, guild_id: GuildId) -> Option<&ServerStats> {
        self.servers.get(&guild_id)
    }

    fn member_mut(&mut self, guild_id: GuildId, user_id: UserId) -> &mut MemberStats {
        self.members
            .entry(guild_id)
            .or_default()
            .entry(user_id)
            .or_default()
    }

    fn server_mut(&mut self, guild_id: GuildId) -> &mut ServerStats {
        self.servers.entry(guild_id).or_default()
    }

    /// Count one message in `channel_id`, on both the member and the guild
    /// record.
    pub fn record_message(&mut self, guild_id: GuildId, user_id: UserId, channel_id: ChannelId) {
        let member = self.member_mut(guild_id, user_id);
        *member.text_channels.entry(channel_id).or_insert(0) += 1;
        member.messages += 1;

        let server = self.server_mut(guild_id);
        *server.text_channels.entry(channel_id).or_insert(0) += 1;
    }

    /// Add `seconds` of voice time in `channel_id`, on both the member and
    /// the guild record.
    pub fn record_voice_time(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
        seconds: u64,
    ) {
        let member = self.member_mut(guild_id, user_id);
        *member.voice_channels.entry(channel_id).or_insert(0) += seconds;
        member.voice_seconds += seconds;

        let server = self.server_mut(guild_id);
        *server.voice_channels.entry(channel_id).or_insert(0) += seconds;
    }

    /// Add XP to a member and recompute their level.  Returns whether a
    /// level-up occurred.
    pub fn apply_xp(&mut self, guild_id: GuildId, user_id: UserId, amount: u64) -> bool {
        let member = self.member_mut(guild_id, user_id);
        member.xp += amount;

        let new_level = level::level_from_xp(member.xp);
        if new_level > member.level {
            member.level = new_level;
            true
        } else {
            false
        }
    }

    pub fn voice_session(&self, guild_id: GuildId, user_id: UserId) -> Option<&VoiceSession> {
        self.voice_sessions.get(&guild_id)?.get(&user_id)
    }

    /// Open a session, replacing any previous one for this member.  The
    /// previous session's time is the caller's responsibility to flush first.
    pub fn open_voice_session(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
        now_unix: u64,
    ) {
        self.voice_sessions.entry(guild_id).or_default().insert(
            user_id,
            VoiceSession {
                channel_id,
                joined_at: now_unix,
            },
        );
    }

    /// Remove and return the open session, if any.
    pub fn close_voice_session(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Option<VoiceSession> {
        self.voice_sessions.get_mut(&guild_id)?.remove(&user_id)
    }

    /// Drop everything we know about one member of one guild.
    pub fn remove_member(&mut self, guild_id: GuildId, user_id: UserId) {
        if let Some(members) = self.members.get_mut(&guild_id) {
            members.remove(&user_id);
        }
        if let Some(sessions) = self.voice_sessions.get_mut(&guild_id) {
            sessions.remove(&user_id);
        }
    }

    /// Drop everything we know about a guild.
    pub fn remove_guild(&mut self, guild_id: GuildId) {
        self.members.remove(&guild_id);
        self.servers.remove(&guild_id);
        self.voice_sessions.remove(&guild_id);
    }

    pub async fn load() -> Result<Self> {
        let path = data_path(STATS_FILE)?;
        match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| anyhow!("Failed to deserialize stats store: {}", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow!(
                "Failed to read `{}`: {}",
                path.to_string_lossy(),
                e
            )),
        }
    }

    pub async fn save(&self) -> Result<()> {
        bounded_io("writing the stats store", self.write_to_disk()).await
    }

    async fn write_to_disk(&self) -> Result<()> {
        let path = data_path(STATS_FILE)?;
        let serialized = serde_json::to_string(self)
            .map_err(|e| anyhow!("Failed to serialize stats store: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Write to a temporary file, then atomically rename over the target.
        let tmp_path = path.with_extension("json.new");
        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            anyhow!(
                "Could not write stats to `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            anyhow!(
                "Could not rename `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (GuildId, UserId, ChannelId) {
        (GuildId::new(10), UserId::new(20), ChannelId::new(30))
    }

    #[test]
    fn record_message_updates_member_and_server() {
        let (guild, user, channel) = ids();
        let mut store = StatsStore::default();

        store.record_message(guild, user, channel);
        store.record_message(guild, user, channel);

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.messages, 2);
        assert_eq!(member.text_channels[&channel], 2);

        let server = store.server(guild).unwrap();
        assert_eq!(server.text_channels[&channel], 2);
        assert_eq!(server.total_messages(), 2);
    }

    #[test]
    fn message_count_matches_channel_sum() {
        let (guild, user, _) = ids();
        let mut store = StatsStore::default();

        for raw in 1..=5u64 {
            for _ in 0..raw {
                store.record_message(guild, user, ChannelId::new(raw));
            }
        }

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.messages, member.text_channels.values().sum::<u64>());
    }

    #[test]
    fn voice_time_matches_channel_sum() {
        let (guild, user, _) = ids();
        let mut store = StatsStore::default();

        store.record_voice_time(guild, user, ChannelId::new(1), 120);
        store.record_voice_time(guild, user, ChannelId::new(2), 180);

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.voice_seconds, 300);
        assert_eq!(
            member.voice_seconds,
            member.voice_channels.values().sum::<u64>()
        );
        assert_eq!(store.server(guild).unwrap().total_voice_seconds(), 300);
    }

    #[test]
    fn apply_xp_reports_level_up() {
        let (guild, user, _) = ids();
        let mut store = StatsStore::default();

        assert!(!store.apply_xp(guild, user, 50));
        assert_eq!(store.member(guild, user).unwrap().level, 1);

        // Crosses the 100 XP threshold for level 2.
        assert!(store.apply_xp(guild, user, 60));
        let member = store.member(guild, user).unwrap();
        assert_eq!(member.level, 2);
        assert_eq!(member.xp, 110);
    }

    #[test]
    fn apply_xp_can_cross_multiple_levels() {
        let (guild, user, _) = ids();
        let mut store = StatsStore::default();

        // 100 + 110 = 210 total XP reaches level 3 in one grant.
        assert!(store.apply_xp(guild, user, 250));
        assert_eq!(store.member(guild, user).unwrap().level, 3);
    }

    #[test]
    fn sessions_are_replaced_not_merged() {
        let (guild, user, channel) = ids();
        let mut store = StatsStore::default();

        store.open_voice_session(guild, user, channel, 1000);
        store.open_voice_session(guild, user, ChannelId::new(31), 1100);

        let session = store.voice_session(guild, user).unwrap();
        assert_eq!(session.channel_id, ChannelId::new(31));
        assert_eq!(session.joined_at, 1100);

        assert!(store.close_voice_session(guild, user).is_some());
        assert!(store.voice_session(guild, user).is_none());
    }

    #[test]
    fn remove_member_drops_stats_and_session() {
        let (guild, user, channel) = ids();
        let mut store = StatsStore::default();

        store.record_message(guild, user, channel);
        store.open_voice_session(guild, user, channel, 0);
        store.remove_member(guild, user);

        assert!(store.member(guild, user).is_none());
        assert!(store.voice_session(guild, user).is_none());
        // Guild-wide totals survive the member leaving.
        assert_eq!(store.server(guild).unwrap().total_messages(), 1);
    }

    #[test]
    fn message_scenario_two_of_three_grants() {
        use crate::stats::level::XpCooldowns;
        use std::time::Duration;
        use tokio::time::Instant;

        let (guild, user, channel) = ids();
        let mut store = StatsStore::default();
        let mut cooldowns = XpCooldowns::new();
        let window = Duration::from_millis(1000);
        let t0 = Instant::now();

        // Three messages at t=0, t=500ms, t=1100ms; the middle one is inside
        // the cooldown window.
        for (offset_ms, amount) in [(0u64, 18u64), (500, 20), (1100, 22)] {
            store.record_message(guild, user, channel);
            let now = t0 + Duration::from_millis(offset_ms);
            if cooldowns.try_grant(guild, user, now, window) {
                store.apply_xp(guild, user, amount);
            }
        }

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.messages, 3);
        assert_eq!(member.xp, 18 + 22);
    }

    #[test]
    fn remove_guild_drops_everything() {
        let (guild, user, channel) = ids();
        let mut store = StatsStore::default();

        store.record_message(guild, user, channel);
        store.open_voice_session(guild, user, channel, 0);
        store.remove_guild(guild);

        assert!(store.member(guild, user).is_none());
        assert!(store.server(guild).is_none());
        assert!(store.voice_session(guild, user).is_none());
    }
}
