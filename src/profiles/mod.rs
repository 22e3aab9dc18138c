//! Contributor profiles for changeset authors.
//!
//! [`ProfileApi`] is the async trait for fetching a profile by uid.
//! [`OsmCommentsClient`] implements it over HTTP.
//! [`ProfileCache`] persists fetched profiles as one JSON file per uid.
//! [`ProfileLookup`] ties the two together and never fails: a miss that
//! cannot be fetched degrades to an empty profile.

mod cache;
mod osm_comments;

pub use cache::ProfileCache;
pub use osm_comments::{DEFAULT_PROFILE_URL, OsmCommentsClient};

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

/// Activity summary for one contributor. Absent fields mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorProfile {
    #[serde(default, deserialize_with = "count")]
    pub changeset_count: Option<u64>,
    #[serde(default, deserialize_with = "count")]
    pub num_changes: Option<u64>,
}

impl ContributorProfile {
    pub fn is_empty(&self) -> bool {
        self.changeset_count.is_none() && self.num_changes.is_none()
    }
}

/// Accepts counts encoded as JSON numbers or numeric strings.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => Some(n),
        Some(Count::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Source of contributor profiles, keyed by uid.
#[async_trait::async_trait]
pub trait ProfileApi: Send + Sync {
    async fn fetch_profile(&self, uid: &str) -> Result<ContributorProfile>;
}

pub struct ProfileLookup {
    api: Box<dyn ProfileApi>,
    cache: Option<ProfileCache>,
}

impl ProfileLookup {
    pub fn new(api: Box<dyn ProfileApi>) -> Self {
        Self { api, cache: None }
    }

    pub fn with_cache(mut self, cache: ProfileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the cached profile for `uid`, fetching and caching it on a miss.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(&self, uid: &str) -> ContributorProfile {
        if let Some(cache) = &self.cache {
            match cache.get(uid).await {
                Ok(Some(profile)) => {
                    debug!("Profile cache hit");
                    return profile;
                }
                Ok(None) => debug!("Profile cache miss"),
                Err(e) => warn!(error = %e, "Unreadable profile cache entry, refetching"),
            }
        }

        match self.api.fetch_profile(uid).await {
            Ok(profile) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(uid, &profile).await {
                        warn!(error = %e, "Failed to write profile cache entry");
                    }
                }
                profile
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed");
                ContributorProfile::default()
            }
        }
    }
}
