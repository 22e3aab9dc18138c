use anyhow::Result;
use async_trait::async_trait;

use super::{ContributorProfile, ProfileApi};
use crate::fetch::{HttpClient, fetch_json};

/// Users endpoint of the OSM comments API; `{uid}` is substituted.
pub const DEFAULT_PROFILE_URL: &str = "https://osm-comments-api.mapbox.com/api/v1/users/id/{uid}";

/// Fetches `{changeset_count, num_changes}` profiles over HTTP.
pub struct OsmCommentsClient<C> {
    http: C,
    url_template: String,
}

impl<C: HttpClient> OsmCommentsClient<C> {
    pub fn new(http: C, url_template: impl Into<String>) -> Self {
        Self {
            http,
            url_template: url_template.into(),
        }
    }

    fn profile_url(&self, uid: &str) -> String {
        self.url_template.replace("{uid}", uid)
    }
}

#[async_trait]
impl<C: HttpClient> ProfileApi for OsmCommentsClient<C> {
    async fn fetch_profile(&self, uid: &str) -> Result<ContributorProfile> {
        fetch_json(&self.http, &self.profile_url(uid)).await
    }
}
