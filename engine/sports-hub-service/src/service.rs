//! Request-level wrapper over the record store
//!
//! Every operation loads the document once, runs against it, and saves it
//! back at most once. Overlapping operations are not serialized: the later
//! save wins.

use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use catalog_registry::{find_sport, BulkCatalogRows, BulkUpsertReport};
use catalog_sync::{list_history, sync_state, CatalogSyncer, OpenedSport, SportsSyncOutcome, SyncError, SyncOptions, SyncOutcome};
use feed_service::{FeedAssembler, FeedError, FeedResponse, SportInterests};
use persistence::{CatalogDocument, CatalogSyncState, PersistenceError, SportRequest, StoreBackend, SyncHistoryEntry};
use sportsdb_client::{NewsProvider, RssNewsClient, SportsDataProvider, SportsDbClient};

/// Errors surfaced by service operations
#[derive(Error, Debug)]
pub enum HubError {
    #[error("record store: {0}")]
    Store(#[from] PersistenceError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Neither an id nor a known sport name
    #[error("sport not found: {0}")]
    UnknownSport(String),
}

pub type Result<T> = std::result::Result<T, HubError>;

/// The catalog and feed engine bound to one record store
pub struct HubService {
    store: Arc<dyn StoreBackend>,
    syncer: CatalogSyncer,
    feed: FeedAssembler,
    sync_options: SyncOptions,
}

impl HubService {
    pub fn new(
        store: Arc<dyn StoreBackend>,
        provider: Arc<dyn SportsDataProvider>,
        news: Arc<dyn NewsProvider>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            store,
            syncer: CatalogSyncer::with_policy(provider.clone(), config.sync_policy.clone()),
            feed: FeedAssembler::new(provider, news, config.feed.clone()),
            sync_options: config.sync.clone(),
        }
    }

    /// File-backed store plus live provider and news clients
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        info!("Opening record store at {:?}", config.store.path);
        let store = persistence::create_local_store_with_config(config.store.clone())
            .context("Failed to open record store")?;

        let provider = SportsDbClient::new(config.provider.clone()).context("Failed to build provider client")?;
        let news = RssNewsClient::new(config.provider.news.clone()).context("Failed to build news client")?;

        Ok(Self::new(Arc::new(store), Arc::new(provider), Arc::new(news), config))
    }

    async fn load(&self) -> Result<CatalogDocument> {
        Ok(self.store.load().await?)
    }

    async fn save(&self, doc: &CatalogDocument) -> Result<()> {
        self.store.save(doc).await?;
        debug!("record store saved");
        Ok(())
    }

    /// Resolve a sport by id or display name
    fn sport_id(doc: &CatalogDocument, reference: &str) -> Result<String> {
        find_sport(doc, reference)
            .map(|s| s.id.clone())
            .ok_or_else(|| HubError::UnknownSport(reference.to_string()))
    }

    pub async fn sync_sports(&self) -> Result<SportsSyncOutcome> {
        let mut doc = self.load().await?;
        let outcome = self.syncer.sync_sports(&mut doc).await;
        self.save(&doc).await?;
        Ok(outcome)
    }

    /// Catalog sync with the configured limits; `force` bypasses the cooldown
    pub async fn sync_sport(&self, sport: &str, force: bool) -> Result<SyncOutcome> {
        let mut doc = self.load().await?;
        let sport_id = Self::sport_id(&doc, sport)?;

        let mut options = self.sync_options.clone();
        if force {
            options = options.forced();
        }

        let outcome = self.syncer.sync_sport_catalog(&mut doc, &sport_id, &options).await?;
        self.save(&doc).await?;
        Ok(outcome)
    }

    pub async fn open_sport(&self, sport: &str) -> Result<OpenedSport> {
        let mut doc = self.load().await?;
        let sport_id = Self::sport_id(&doc, sport)?;
        let opened = self.syncer.open_sport(&mut doc, &sport_id).await?;
        self.save(&doc).await?;
        Ok(opened)
    }

    /// The user's feed; the store is written only when a section was refreshed
    pub async fn feed(&self, user_id: &str) -> Result<FeedResponse> {
        let mut doc = self.load().await?;
        let build = self.feed.build_feed(&mut doc, user_id).await;
        if build.refreshed > 0 {
            self.save(&doc).await?;
        }
        Ok(build.response)
    }

    pub async fn select_sports(&self, user_id: &str, sports: &[String]) -> Result<Vec<String>> {
        let mut doc = self.load().await?;
        let sport_ids = sports
            .iter()
            .map(|s| Self::sport_id(&doc, s))
            .collect::<Result<Vec<_>>>()?;
        let selected = feed_service::select_sports(&mut doc, user_id, &sport_ids)?;
        self.save(&doc).await?;
        Ok(selected)
    }

    pub async fn set_interests(
        &self,
        user_id: &str,
        sport: &str,
        team_ids: &[String],
        player_ids: &[String],
        league_ids: &[String],
    ) -> Result<SportInterests> {
        let mut doc = self.load().await?;
        let sport_id = Self::sport_id(&doc, sport)?;
        let interests =
            feed_service::set_sport_interests(&mut doc, user_id, &sport_id, team_ids, player_ids, league_ids)?;
        self.save(&doc).await?;
        Ok(interests)
    }

    /// Entries may be ids or names; an unknown entry rejects the whole order
    pub async fn set_sport_order(&self, user_id: &str, order: &[String]) -> Result<Vec<String>> {
        let mut doc = self.load().await?;
        let sport_ids = order
            .iter()
            .map(|s| Self::sport_id(&doc, s))
            .collect::<Result<Vec<_>>>()?;
        let order = feed_service::set_sport_order(&mut doc, user_id, &sport_ids)?;
        self.save(&doc).await?;
        Ok(order)
    }

    pub async fn import(&self, rows: &BulkCatalogRows) -> Result<BulkUpsertReport> {
        let mut doc = self.load().await?;
        let report = self.syncer.import_rows(&mut doc, rows)?;
        self.save(&doc).await?;
        Ok(report)
    }

    pub async fn request_sport(&self, user_id: &str, name: &str) -> Result<SportRequest> {
        let mut doc = self.load().await?;
        let request = feed_service::request_sport(&mut doc, user_id, name)?;
        self.save(&doc).await?;
        Ok(request)
    }

    pub async fn requests(&self) -> Result<Vec<SportRequest>> {
        Ok(feed_service::list_requests(&self.load().await?))
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>> {
        Ok(list_history(&self.load().await?, limit).to_vec())
    }

    pub async fn sync_state(&self, sport: &str) -> Result<Option<CatalogSyncState>> {
        let doc = self.load().await?;
        let sport_id = Self::sport_id(&doc, sport)?;
        Ok(sync_state(&doc, &sport_id).cloned())
    }
}
