//! Member and guild activity tracking: counters, XP progression, voice
//! sessions, and the rank/leaderboard views over them.

pub mod leaderboard;
pub mod level;
pub mod store;
pub mod voice;
