use crate::stats::level::XpCooldowns;

/// State which is lost across sessions
///
/// The XP cooldowns live here on purpose: a restart forgetting them only
/// risks one extra early grant per member.
pub struct VolatileState {
    pub xp_cooldowns: XpCooldowns,
}

impl VolatileState {
    pub fn new() -> Self {
        Self {
            xp_cooldowns: XpCooldowns::new(),
        }
    }
}
