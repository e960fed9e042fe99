// ── Query frontend ──
//
// Serves `--list`, `--host` and `--refresh-cache` from the cache, refreshing
// through a `SnapshotSource` when the cache is absent, stale, or missing the
// requested host.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::{self, MAX_AGE};
use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::options::InventoryOptions;
use crate::snapshot::Snapshot;
use crate::walker::Walker;

/// Something that can produce a fresh snapshot.
pub trait SnapshotSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, CoreError>> + Send;
}

/// Live source: authenticate, walk, build.
#[derive(Debug, Clone)]
pub struct ApiSource {
    connection: ConnectionConfig,
    options: InventoryOptions,
}

impl ApiSource {
    pub fn new(connection: ConnectionConfig, options: InventoryOptions) -> Self {
        Self {
            connection,
            options,
        }
    }
}

impl SnapshotSource for ApiSource {
    async fn fetch(&self) -> Result<Snapshot, CoreError> {
        let client = self.connection.login().await?;
        let walk = Walker::new(&client, &self.options).walk().await?;
        Ok(Snapshot::build(&walk.groups, &walk.hosts, &self.options))
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    List,
    Host(String),
    Refresh,
}

pub struct Inventory<S> {
    source: S,
    cache_path: PathBuf,
    max_age: Duration,
}

impl<S: SnapshotSource + Sync> Inventory<S> {
    pub fn new(source: S, cache_path: PathBuf) -> Self {
        Self {
            source,
            cache_path,
            max_age: MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Answer `query` with the JSON document to print.
    pub async fn run(&self, query: &Query) -> Result<Value, CoreError> {
        match query {
            Query::List => self.list().await.and_then(to_json),
            Query::Refresh => self.refresh().await.and_then(to_json),
            Query::Host(name) => self.host(name).await.map(Value::Object),
        }
    }

    /// Fetch a new snapshot and replace the cache with it.
    pub async fn refresh(&self) -> Result<Snapshot, CoreError> {
        info!(cache = %self.cache_path.display(), "refreshing inventory");
        let snapshot = self.source.fetch().await?;
        cache::write(&snapshot, &self.cache_path)?;
        Ok(snapshot)
    }

    /// The cached snapshot if fresh, otherwise a refreshed one.
    pub async fn list(&self) -> Result<Snapshot, CoreError> {
        match self.cached() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh().await,
        }
    }

    /// Variables for one host; `{}` if it is still unknown after a refresh.
    pub async fn host(&self, name: &str) -> Result<Map<String, Value>, CoreError> {
        let (snapshot, refreshed) = match self.cached() {
            Some(snapshot) => (snapshot, false),
            None => (self.refresh().await?, true),
        };
        if let Some(vars) = snapshot.hostvars(name) {
            return Ok(vars.clone());
        }
        if refreshed {
            return Ok(Map::new());
        }

        debug!(host = name, "host not in cache, refreshing once");
        let snapshot = self.refresh().await?;
        Ok(snapshot.hostvars(name).cloned().unwrap_or_default())
    }

    fn cached(&self) -> Option<Snapshot> {
        if !self.cache_path.exists() {
            debug!(cache = %self.cache_path.display(), "no cache yet");
            return None;
        }
        match cache::read(&self.cache_path) {
            Ok(record) if record.is_fresh_at(self.max_age, Utc::now()) => Some(record.snapshot),
            Ok(record) => {
                debug!(generated_at = %record.generated_at, "cache expired");
                None
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache");
                None
            }
        }
    }
}

fn to_json(snapshot: Snapshot) -> Result<Value, CoreError> {
    snapshot.to_json().map_err(|e| CoreError::InvalidResponse {
        message: format!("snapshot is not serializable: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;
    use crate::cache::CacheRecord;
    use crate::model::{Group, Host};

    /// Counts fetches and hands out a fixed snapshot.
    struct CountingSource {
        snapshot: Snapshot,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new(hosts: &[(&str, &str)]) -> Self {
            let hosts: Vec<_> = hosts
                .iter()
                .map(|(name, ip)| Host {
                    name: (*name).into(),
                    href: format!("https://vcd/api/vApp/vm-{name}"),
                    ip_address: (*ip).into(),
                    group_name: "vapp1".into(),
                    tags: vec!["prod".into()],
                })
                .collect();
            let groups = [Group {
                name: "vapp1".into(),
                href: "https://vcd/api/vApp/vapp-1".into(),
            }];
            Self {
                snapshot: Snapshot::build(&groups, &hosts, &InventoryOptions::default()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl SnapshotSource for &CountingSource {
        async fn fetch(&self) -> Result<Snapshot, CoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.snapshot.clone())
        }
    }

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        async fn fetch(&self) -> Result<Snapshot, CoreError> {
            Err(CoreError::AuthenticationFailed {
                message: "bad password".into(),
            })
        }
    }

    fn seed(path: &Path, hosts: &[(&str, &str)], age_secs: i64) {
        let record = CacheRecord {
            generated_at: Utc::now() - TimeDelta::seconds(age_secs),
            snapshot: CountingSource::new(hosts).snapshot,
        };
        cache::write_record(&record, path).unwrap();
    }

    #[test]
    fn list_serves_fresh_cache_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("cached1", "10.0.0.9")], 60);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path);
        let snapshot = tokio_test::block_on(inventory.list()).unwrap();

        assert_eq!(source.fetches(), 0);
        assert!(snapshot.hostvars("cached1").is_some());
    }

    #[test]
    fn list_refreshes_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("cached1", "10.0.0.9")], 901);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path.clone());
        let snapshot = tokio_test::block_on(inventory.list()).unwrap();

        assert_eq!(source.fetches(), 1);
        assert!(snapshot.hostvars("web1").is_some());
        assert_eq!(cache::read(&path).unwrap().snapshot, snapshot);
    }

    #[test]
    fn list_refreshes_when_cache_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("acme-ansible.cache");

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path.clone());
        tokio_test::block_on(inventory.list()).unwrap();

        assert_eq!(source.fetches(), 1);
        assert!(cache::is_valid(&path, MAX_AGE));
    }

    #[test]
    fn refresh_is_unconditional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("cached1", "10.0.0.9")], 0);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path);
        let out = tokio_test::block_on(inventory.run(&Query::Refresh)).unwrap();

        assert_eq!(source.fetches(), 1);
        assert_eq!(out["_meta"]["hostvars"]["web1"]["ansible_host"], "10.0.0.5");
        assert!(out["_meta"]["hostvars"].get("cached1").is_none());
    }

    #[test]
    fn host_hit_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 60);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path);
        let out = tokio_test::block_on(inventory.run(&Query::Host("web1".into()))).unwrap();

        assert_eq!(source.fetches(), 0);
        assert_eq!(out, json!({"ansible_host": "10.0.0.5"}));
    }

    #[test]
    fn host_miss_refreshes_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 60);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path);
        let out =
            tokio_test::block_on(inventory.run(&Query::Host("missing-host".into()))).unwrap();

        assert_eq!(source.fetches(), 1);
        assert_eq!(out, json!({}));
    }

    #[test]
    fn host_found_after_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 60);

        let source = CountingSource::new(&[("web1", "10.0.0.5"), ("web2", "10.0.0.6")]);
        let inventory = Inventory::new(&source, path);
        let vars = tokio_test::block_on(inventory.host("web2")).unwrap();

        assert_eq!(source.fetches(), 1);
        assert_eq!(vars["ansible_host"], "10.0.0.6");
    }

    #[test]
    fn host_with_stale_cache_refreshes_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 5000);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path);
        let vars = tokio_test::block_on(inventory.host("nope")).unwrap();

        assert_eq!(source.fetches(), 1);
        assert!(vars.is_empty());
    }

    #[test]
    fn failed_refresh_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 901);
        let before = std::fs::read_to_string(&path).unwrap();

        let inventory = Inventory::new(FailingSource, path.clone());
        let err = tokio_test::block_on(inventory.list()).unwrap_err();

        assert!(err.is_auth_error());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn custom_max_age_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme-ansible.cache");
        seed(&path, &[("web1", "10.0.0.5")], 120);

        let source = CountingSource::new(&[("web1", "10.0.0.5")]);
        let inventory = Inventory::new(&source, path).with_max_age(Duration::from_secs(60));
        tokio_test::block_on(inventory.list()).unwrap();

        assert_eq!(source.fetches(), 1);
    }
}
