use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::ContributorProfile;
use crate::error::Result;

static NEXT_TMP: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    uid: String,
    fetched_at: DateTime<Utc>,
    profile: ContributorProfile,
}

/// Directory of `<uid>.json` profile files.
#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
    max_age: Option<Duration>,
}

impl ProfileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age: None,
        }
    }

    /// Entries older than `max_age` are reported as misses.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub async fn get(&self, uid: &str) -> Result<Option<ContributorProfile>> {
        self.get_at(uid, Utc::now()).await
    }

    async fn get_at(&self, uid: &str, now: DateTime<Utc>) -> Result<Option<ContributorProfile>> {
        let Some(path) = self.entry_path(uid) else {
            return Ok(None);
        };
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        if let Some(max_age) = self.max_age {
            if now - entry.fetched_at > max_age {
                return Ok(None);
            }
        }
        Ok(Some(entry.profile))
    }

    /// Stores `profile` for `uid`. Uids that are not safe file names are
    /// silently not cached.
    pub async fn put(&self, uid: &str, profile: &ContributorProfile) -> Result<()> {
        let Some(path) = self.entry_path(uid) else {
            return Ok(());
        };
        fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry {
            uid: uid.to_string(),
            fetched_at: Utc::now(),
            profile: profile.clone(),
        };
        // write-then-rename so concurrent readers never see a partial file;
        // each writer gets its own tmp name
        let tmp = self.dir.join(format!(
            "{uid}.json.{}.{}.tmp",
            std::process::id(),
            NEXT_TMP.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn entry_path(&self, uid: &str) -> Option<PathBuf> {
        let safe = !uid.is_empty()
            && uid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{uid}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ContributorProfile {
        ContributorProfile {
            changeset_count: Some(3),
            num_changes: Some(90),
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path());

        assert_eq!(cache.get("7").await.unwrap(), None);
        cache.put("7", &profile()).await.unwrap();
        assert_eq!(cache.get("7").await.unwrap(), Some(profile()));
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path().join("nested").join("profiles"));
        cache.put("7", &profile()).await.unwrap();
        assert_eq!(cache.get("7").await.unwrap(), Some(profile()));
    }

    #[tokio::test]
    async fn test_stale_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path()).with_max_age(Duration::days(30));
        cache.put("7", &profile()).await.unwrap();

        let later = Utc::now() + Duration::days(31);
        assert_eq!(cache.get_at("7", later).await.unwrap(), None);
        assert_eq!(cache.get_at("7", Utc::now()).await.unwrap(), Some(profile()));
    }

    #[tokio::test]
    async fn test_unsafe_uid_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path());
        cache.put("../escape", &profile()).await.unwrap();
        assert_eq!(cache.get("../escape").await.unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_puts_share_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new(dir.path());

        let writers = (0..8).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.put("7", &profile()).await })
        });
        for handle in writers.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(cache.get("7").await.unwrap(), Some(profile()));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("7.json"), b"{truncated").unwrap();
        let cache = ProfileCache::new(dir.path());
        assert!(cache.get("7").await.is_err());
    }
}
