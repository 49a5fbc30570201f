use std::sync::Arc;

use crate::clients::myanimelist::MyAnimeListClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, CommentService, Mailer, MediaStorage, MyAnimeListReleaseService,
    NoopMailer, ReleaseService, SeaOrmAuthService, SeaOrmCatalogService, SeaOrmCommentService,
    SeaOrmStaffService, SeaOrmSupportService, SeaOrmUserService, SeaOrmVoiceoverService,
    SmtpMailer, SpamGuard, StaffService, SupportService, TokenIssuer, UserService,
    VoiceoverService,
};

/// Everything the HTTP layer, the queue consumer and the management
/// commands share. Cheap to clone.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenIssuer>,

    pub spam: Arc<SpamGuard>,

    pub media: MediaStorage,

    pub mailer: Arc<dyn Mailer>,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub staff_service: Arc<dyn StaffService>,

    pub comment_service: Arc<dyn CommentService>,

    pub voiceover_service: Arc<dyn VoiceoverService>,

    pub support_service: Arc<dyn SupportService>,

    pub release_service: Arc<dyn ReleaseService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires the services over an already opened store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = if config.email.is_enabled() {
            Arc::new(SmtpMailer::new(&config.email)?)
        } else {
            Arc::new(NoopMailer)
        };

        Self::with_mailer(config, store, mailer)
    }

    pub fn with_mailer(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenIssuer::new(&config.security));
        let spam = Arc::new(SpamGuard::new(config.security.spam_timeout_seconds));
        let media = MediaStorage::new(&config.server);
        let myanimelist = MyAnimeListClient::new(&config.myanimelist)?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let user_service =
            Arc::new(SeaOrmUserService::new(store.clone(), media.clone())) as Arc<dyn UserService>;

        let catalog_service = Arc::new(SeaOrmCatalogService::new(store.clone(), media.clone()))
            as Arc<dyn CatalogService>;

        let staff_service = Arc::new(SeaOrmStaffService::new(
            store.clone(),
            media.clone(),
            config.catalog.clone(),
        )) as Arc<dyn StaffService>;

        let comment_service =
            Arc::new(SeaOrmCommentService::new(store.clone())) as Arc<dyn CommentService>;

        let voiceover_service =
            Arc::new(SeaOrmVoiceoverService::new(store.clone())) as Arc<dyn VoiceoverService>;

        let support_service = Arc::new(SeaOrmSupportService::new(
            store.clone(),
            mailer.clone(),
            config.email.clone(),
        )) as Arc<dyn SupportService>;

        let release_service = Arc::new(MyAnimeListReleaseService::new(store.clone(), myanimelist))
            as Arc<dyn ReleaseService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            spam,
            media,
            mailer,
            auth_service,
            user_service,
            catalog_service,
            staff_service,
            comment_service,
            voiceover_service,
            support_service,
            release_service,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
