//! Voice session state machine.
//!
//! Per (guild, user) a member is either disconnected (no session record) or
//! connected to exactly one channel.  Every transition that closes a span
//! flushes the elapsed time to the member and guild counters before touching
//! the session record, so a switch is leave-then-join as one logical unit.

use crate::stats::store::StatsStore;
use serenity::all::{ChannelId, GuildId, UserId};

/// Apply one voice-state change.  `old`/`new` are the channel before and
/// after the event; `now_unix` is the event time in unix seconds.
///
/// A leave or switch with no matching open session flushes nothing; a
/// non-positive elapsed span (clock skew) is dropped rather than written.
pub fn apply_transition(
    store: &mut StatsStore,
    guild_id: GuildId,
    user_id: UserId,
    old: Option<ChannelId>,
    new: Option<ChannelId>,
    now_unix: u64,
) {
    match (old, new) {
        // Fresh connect.
        (None, Some(new)) => {
            store.open_voice_session(guild_id, user_id, new, now_unix);
        }
        // Full disconnect: flush the span, drop the session.
        (Some(old), None) => {
            flush_session(store, guild_id, user_id, old, now_unix);
        }
        // Channel switch: flush the old span, then immediately reopen.
        (Some(old), Some(new)) if old != new => {
            flush_session(store, guild_id, user_id, old, now_unix);
            store.open_voice_session(guild_id, user_id, new, now_unix);
        }
        // Same channel (mute/deafen etc.) or a no-channel no-op.
        _ => {}
    }
}

fn flush_session(
    store: &mut StatsStore,
    guild_id: GuildId,
    user_id: UserId,
    channel_id: ChannelId,
    now_unix: u64,
) {
    let Some(session) = store.close_voice_session(guild_id, user_id) else {
        // Leave without a matching join; nothing to flush.
        return;
    };

    let duration = now_unix.saturating_sub(session.joined_at);
    if duration > 0 {
        store.record_voice_time(guild_id, user_id, channel_id, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (GuildId, UserId) {
        (GuildId::new(1), UserId::new(2))
    }

    #[test]
    fn join_then_leave_accrues_elapsed_time() {
        let (guild, user) = ids();
        let channel = ChannelId::new(3);
        let mut store = StatsStore::default();

        apply_transition(&mut store, guild, user, None, Some(channel), 1000);
        apply_transition(&mut store, guild, user, Some(channel), None, 1090);

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.voice_channels[&channel], 90);
        assert_eq!(member.voice_seconds, 90);
        assert!(store.voice_session(guild, user).is_none());
    }

    #[test]
    fn switch_splits_time_between_channels() {
        let (guild, user) = ids();
        let a = ChannelId::new(3);
        let b = ChannelId::new(4);
        let mut store = StatsStore::default();

        // Join A at t=0, switch to B at t=120, disconnect at t=300.
        apply_transition(&mut store, guild, user, None, Some(a), 0);
        apply_transition(&mut store, guild, user, Some(a), Some(b), 120);
        apply_transition(&mut store, guild, user, Some(b), None, 300);

        let member = store.member(guild, user).unwrap();
        assert_eq!(member.voice_channels[&a], 120);
        assert_eq!(member.voice_channels[&b], 180);
        assert_eq!(member.voice_seconds, 300);
        assert!(store.voice_session(guild, user).is_none());

        let server = store.server(guild).unwrap();
        assert_eq!(server.voice_channels[&a], 120);
        assert_eq!(server.voice_channels[&b], 180);
    }

    #[test]
    fn repeated_switches_cover_whole_span() {
        let (guild, user) = ids();
        let mut store = StatsStore::default();

        apply_transition(&mut store, guild, user, None, Some(ChannelId::new(1)), 0);
        let mut prev = ChannelId::new(1);
        for (n, at) in [(2u64, 50u64), (3, 125), (4, 300)] {
            let next = ChannelId::new(n);
            apply_transition(&mut store, guild, user, Some(prev), Some(next), at);
            prev = next;
        }
        apply_transition(&mut store, guild, user, Some(prev), None, 500);

        let member = store.member(guild, user).unwrap();
        // One segment per occupied channel, summing to the full span.
        assert_eq!(member.voice_channels.len(), 4);
        assert_eq!(member.voice_seconds, 500);
    }

    #[test]
    fn leave_without_join_is_a_no_op() {
        let (guild, user) = ids();
        let mut store = StatsStore::default();

        apply_transition(&mut store, guild, user, Some(ChannelId::new(3)), None, 100);

        assert!(store.member(guild, user).is_none());
        assert!(store.voice_session(guild, user).is_none());
    }

    #[test]
    fn same_channel_update_is_ignored() {
        let (guild, user) = ids();
        let channel = ChannelId::new(3);
        let mut store = StatsStore::default();

        apply_transition(&mut store, guild, user, None, Some(channel), 0);
        // Mute/unmute style event inside the same channel.
        apply_transition(&mut store, guild, user, Some(channel), Some(channel), 60);
        apply_transition(&mut store, guild, user, Some(channel), None, 100);

        let member = store.member(guild, user).unwrap();
        // The self-transition must not restart the session clock.
        assert_eq!(member.voice_channels[&channel], 100);
    }

    #[test]
    fn zero_or_negative_spans_are_dropped() {
        let (guild, user) = ids();
        let channel = ChannelId::new(3);
        let mut store = StatsStore::default();

        apply_transition(&mut store, guild, user, None, Some(channel), 100);
        // Event timestamp went backwards; flush nothing, still disconnect.
        apply_transition(&mut store, guild, user, Some(channel), None, 50);

        assert!(store.member(guild, user).is_none());
        assert!(store.voice_session(guild, user).is_none());
    }
}
