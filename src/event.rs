//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! this module translates the callbacks to a distinct Event enum.

use crate::{context::Context, log_internal};
use serenity::all::{GuildId, Message, Ready, User, VoiceState};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
    VoiceStateUpdate {
        old: Option<VoiceState>,
        new: VoiceState,
    },
    /// A member left (or was removed from) a guild.
    MemberRemoval {
        guild_id: GuildId,
        user: User,
    },
    /// The bot was removed from a guild.
    GuildRemoval {
        guild_id: GuildId,
    },
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => log_internal!("Error in plugin {}: {}", plugin.name(), err),
            }
        }
    }

    // Check if a message should be interpreted as a special bot command.
    //
    // These are typically prefixed with a semicolon, e. g. `;cmd foo bar baz`.
    // Returns the message and the remaining whitespace-separated arguments.
    pub async fn is_bot_cmd<'e>(
        &'e self,
        ctx: &Context<'_>,
        cmd: &str,
    ) -> Option<(&'e Message, Vec<&'e str>)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        let mut terms = msg.content.split_ascii_whitespace();
        let first = terms.next()?.strip_prefix(prefix.as_str())?;

        if first != cmd {
            return None;
        }

        Some((msg, terms.collect()))
    }
}

pub enum EventHandled {
    Yes,
    No,
}
