//! XP progression: level curve, cooldown gate, and the level-up decision.
//!
//! The scheme is cumulative: `xp` only ever grows, and `level` is recomputed
//! as the largest level whose total step cost fits inside `xp`.  The helpers
//! below must all agree on that scheme; mixing in a banked-XP "subtract on
//! level-up" mutator would silently desync `xp` and `level`.

use serenity::all::{GuildId, UserId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// XP cost of advancing from level 1 to level 2.
const XP_BASE: f64 = 100.0;
/// Per-level growth factor of the step cost.
const XP_GROWTH: f64 = 1.1;

/// XP required to advance from `level` to `level + 1`.
///
/// Level 1→2: 100, 2→3: 110, 3→4: 121, ...
pub fn xp_required_for_level(level: u32) -> u64 {
    let exp = level.saturating_sub(1) as i32;
    (XP_BASE * XP_GROWTH.powi(exp)).floor() as u64
}

/// Total XP needed to reach `level` from scratch (sum of all step costs).
pub fn total_xp_for_level(level: u32) -> u64 {
    (1..level).map(xp_required_for_level).sum()
}

/// The largest level whose total cost is covered by `xp`.  Always at least 1.
pub fn level_from_xp(xp: u64) -> u32 {
    let mut level = 1;
    let mut total = 0u64;

    loop {
        let step = xp_required_for_level(level);
        if total + step > xp {
            return level;
        }
        total += step;
        level += 1;
    }
}

/// XP still missing before the next level.
pub fn xp_until_next_level(xp: u64, level: u32) -> u64 {
    total_xp_for_level(level + 1).saturating_sub(xp)
}

/// Progress within the current level, in `[0, 1]`.
pub fn level_progress(xp: u64, level: u32) -> f64 {
    let step = xp_required_for_level(level) as f64;
    let into_level = xp.saturating_sub(total_xp_for_level(level)) as f64;
    (into_level / step).clamp(0.0, 1.0)
}

/// Roll the XP amount for a single qualifying message.
pub fn roll_xp(min: u64, max: u64) -> u64 {
    use rand::Rng;
    rand::thread_rng().gen_range(min..=max.max(min))
}

/// Per-member last-grant timestamps.
///
/// Lives in `VolatileState` and is passed by reference so multiple engine
/// instances (tests) don't share a table.  Process restart resets it, which
/// only risks one extra early grant per member.
pub struct XpCooldowns(HashMap<(GuildId, UserId), Instant>);

impl XpCooldowns {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Returns whether a grant is allowed at `now`, and if so records `now` as
    /// the new last-grant timestamp.  A denied attempt does not refresh the
    /// timestamp, so the recorded instants advance monotonically.
    pub fn try_grant(
        &mut self,
        guild_id: GuildId,
        user_id: UserId,
        now: Instant,
        window: Duration,
    ) -> bool {
        let key = (guild_id, user_id);

        if let Some(last) = self.0.get(&key) {
            if now.duration_since(*last) < window {
                return false;
            }
        }

        self.0.insert(key, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_cost_matches_curve() {
        assert_eq!(xp_required_for_level(1), 100);
        assert_eq!(xp_required_for_level(2), 110);
        assert_eq!(xp_required_for_level(3), 121);
    }

    #[test]
    fn step_cost_strictly_increasing() {
        for level in 1..100 {
            assert!(
                xp_required_for_level(level + 1) > xp_required_for_level(level),
                "curve not increasing at level {}",
                level
            );
        }
    }

    #[test]
    fn total_xp_is_sum_of_steps() {
        assert_eq!(total_xp_for_level(1), 0);
        assert_eq!(total_xp_for_level(2), 100);
        assert_eq!(total_xp_for_level(3), 210);
        assert_eq!(total_xp_for_level(4), 331);
    }

    #[test]
    fn level_from_xp_brackets() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(99), 1);
        assert_eq!(level_from_xp(100), 2);
        assert_eq!(level_from_xp(209), 2);
        assert_eq!(level_from_xp(210), 3);
    }

    #[test]
    fn level_from_xp_agrees_with_totals() {
        for level in 1..50 {
            let total = total_xp_for_level(level);
            assert_eq!(level_from_xp(total), level);
            if total > 0 {
                assert_eq!(level_from_xp(total - 1), level - 1);
            }
        }
    }

    #[test]
    fn xp_until_next_level_counts_down() {
        // Level 1 with 40 XP: next level at 100 total.
        assert_eq!(xp_until_next_level(40, 1), 60);
        // Level 2 with 150 XP: next level at 210 total.
        assert_eq!(xp_until_next_level(150, 2), 60);
    }

    #[test]
    fn progress_fraction_bounds() {
        assert_eq!(level_progress(0, 1), 0.0);
        assert_eq!(level_progress(50, 1), 0.5);
        // Stale level argument never exceeds 1.
        assert_eq!(level_progress(5000, 1), 1.0);
    }

    #[test]
    fn roll_stays_in_range() {
        for _ in 0..100 {
            let xp = roll_xp(15, 25);
            assert!((15..=25).contains(&xp));
        }
    }

    #[test]
    fn cooldown_denies_inside_window() {
        let guild = GuildId::new(1);
        let user = UserId::new(2);
        let window = Duration::from_millis(1000);
        let mut cooldowns = XpCooldowns::new();

        let t0 = Instant::now();
        assert!(cooldowns.try_grant(guild, user, t0, window));
        // 500ms later: still inside the window.
        assert!(!cooldowns.try_grant(guild, user, t0 + Duration::from_millis(500), window));
        // 1100ms after the first grant: allowed again.
        assert!(cooldowns.try_grant(guild, user, t0 + Duration::from_millis(1100), window));
    }

    #[test]
    fn cooldown_denial_does_not_refresh() {
        let guild = GuildId::new(1);
        let user = UserId::new(2);
        let window = Duration::from_millis(1000);
        let mut cooldowns = XpCooldowns::new();

        let t0 = Instant::now();
        assert!(cooldowns.try_grant(guild, user, t0, window));
        // Repeated denied attempts must not push the window forward.
        assert!(!cooldowns.try_grant(guild, user, t0 + Duration::from_millis(600), window));
        assert!(cooldowns.try_grant(guild, user, t0 + Duration::from_millis(1001), window));
    }

    #[test]
    fn cooldowns_are_per_member() {
        let guild = GuildId::new(1);
        let window = Duration::from_millis(1000);
        let mut cooldowns = XpCooldowns::new();

        let t0 = Instant::now();
        assert!(cooldowns.try_grant(guild, UserId::new(2), t0, window));
        assert!(cooldowns.try_grant(guild, UserId::new(3), t0, window));
    }
}
