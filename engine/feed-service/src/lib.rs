//! Feed Service
//!
//! Builds the personalized home feed: one section per followed sport with
//! fixture highlights and news, served from a preference-keyed TTL cache and
//! refreshed live under a per-request quota. Also owns the follow model that
//! feeds the preference keys (sport selection, per-sport interests, sport
//! order) and user requests for missing sports.

pub mod assembler;
pub mod cache;
pub mod config;
pub mod error;
pub mod interests;
pub mod preference;
pub mod requests;

pub use assembler::{FeedAssembler, FeedBuild, FeedCounts, FeedResponse, FeedSection, SectionSource, SectionSport};
pub use config::FeedConfig;
pub use error::{FeedError, Result};
pub use interests::{followed_sport_ids, select_sports, set_sport_interests, set_sport_order, unfollow_sport};
pub use preference::{build_feed_preference_key, sport_interests, SportInterests};
pub use requests::{list_requests, request_sport};
