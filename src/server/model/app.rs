use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::server::{
    discord::{DiscordClient, GuildGateway},
    error::external::ExternalError,
    event::{EventDispatcher, TracingEventSink},
    service::{
        allocator::TemplateAllocator, ban::BanService, cooldown::CooldownCache, gate::AccessGate,
        license::LicenseService, manager::ManagerService, premium::PremiumService,
        template::TemplateService,
    },
};

/// Shared state of the engine, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub discord: Arc<dyn GuildGateway>,
    pub events: EventDispatcher,
    pub cooldowns: CooldownCache,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        discord: Arc<dyn GuildGateway>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            db,
            discord,
            events,
            cooldowns: CooldownCache::new(),
        }
    }

    pub fn licenses(&self) -> LicenseService<'_> {
        LicenseService::new(&self.db, self.discord.as_ref(), &self.events)
    }

    pub fn templates(&self) -> TemplateService<'_> {
        TemplateService::new(&self.db, &self.events)
    }

    pub fn allocator(&self) -> TemplateAllocator<'_> {
        TemplateAllocator::new(&self.db, &self.events)
    }

    pub fn bans(&self) -> BanService<'_> {
        BanService::new(&self.db)
    }

    pub fn premium(&self) -> PremiumService<'_> {
        PremiumService::new(&self.db)
    }

    pub fn managers(&self) -> ManagerService<'_> {
        ManagerService::new(&self.db)
    }

    pub fn gate(&self) -> AccessGate<'_> {
        AccessGate::new(&self.db, &self.cooldowns)
    }
}

/// Builds state from a database connection, platform API base URL, and bot token, with
/// lifecycle events written to the log.
impl TryFrom<(DatabaseConnection, String, String)> for AppState {
    type Error = ExternalError;

    fn try_from(
        (db, api_url, token): (DatabaseConnection, String, String),
    ) -> Result<Self, Self::Error> {
        Ok(Self::new(
            db,
            Arc::new(DiscordClient::new(api_url, token)?),
            EventDispatcher::new().with_sink(Arc::new(TracingEventSink)),
        ))
    }
}
