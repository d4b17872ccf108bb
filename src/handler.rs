use crate::{
    config::Config, context::Context, event::Event, settings::SettingsStore,
    stats::store::StatsStore, volatile_state::VolatileState,
};
use serenity::all::{GuildId, Member, Message, Ready, UnavailableGuild, User, VoiceState};
use tokio::sync::RwLock;

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    stats: RwLock<StatsStore>,
    settings: RwLock<SettingsStore>,
    vstate: RwLock<VolatileState>,
}

impl<'a> Handler {
    pub fn new(
        cfg: Config,
        stats: StatsStore,
        settings: SettingsStore,
        vstate: VolatileState,
    ) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            stats: RwLock::new(stats),
            settings: RwLock::new(settings),
            vstate: RwLock::new(vstate),
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            stats: &self.stats,
            settings: &self.settings,
            vstate: &self.vstate,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }

    async fn voice_state_update(
        &self,
        discord_ctx: serenity::all::Context,
        old: Option<VoiceState>,
        new: VoiceState,
    ) {
        Event::VoiceStateUpdate { old, new }
            .handle(self.ctx(&discord_ctx))
            .await;
    }

    async fn guild_member_removal(
        &self,
        discord_ctx: serenity::all::Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        Event::MemberRemoval { guild_id, user }
            .handle(self.ctx(&discord_ctx))
            .await;
    }

    async fn guild_delete(
        &self,
        discord_ctx: serenity::all::Context,
        incomplete: UnavailableGuild,
        _full: Option<serenity::all::Guild>,
    ) {
        // `unavailable` means a Discord outage, not a removal; keep the data.
        if incomplete.unavailable {
            return;
        }

        Event::GuildRemoval {
            guild_id: incomplete.id,
        }
        .handle(self.ctx(&discord_ctx))
        .await;
    }
}
