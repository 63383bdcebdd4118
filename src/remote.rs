//! Remote realtime store interface.
//!
//! The store is a single JSON document tree addressed by slash-separated
//! paths. Write semantics: `set` is a full value replace (null deletes the
//! path), `update` shallow-merges named top-level fields. The hosted
//! backend exposes this over REST (`PUT`/`PATCH`/`GET <base>/<path>.json`);
//! tests use an in-memory tree with the same semantics.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote rejected request (HTTP {0})")]
    Status(reqwest::StatusCode),
    #[error("invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the full value at a path. Absent paths read as `Null`.
    async fn get(&self, path: &str) -> Result<Value, RemoteError>;

    /// Replace the full value at a path. `Null` deletes the path.
    async fn set(&self, path: &str, value: Value) -> Result<(), RemoteError>;

    /// Shallow merge of the given top-level fields into the path's value.
    async fn update(&self, path: &str, value: Value) -> Result<(), RemoteError>;
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// Configuration for the hosted realtime store.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Database root URL, e.g. `https://drona-pos-default-rtdb.firebaseio.com`.
    pub base_url: String,
    /// Poll cadence for inbound snapshots.
    pub poll_interval: std::time::Duration,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        SyncConfig {
            base_url: base_url.into(),
            poll_interval: std::time::Duration::from_secs(5),
        }
    }
}

/// Thin REST client for the hosted JSON-tree store.
pub struct RestRemote {
    client: reqwest::Client,
    base_url: String,
}

impl RestRemote {
    pub fn new(config: &SyncConfig) -> Self {
        RestRemote {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn get(&self, path: &str) -> Result<Value, RemoteError> {
        let resp = self.client.get(self.url(path)).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status()));
        }
        Ok(resp.json::<Value>().await?)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), RemoteError> {
        let resp = self.client.put(self.url(path)).json(&value).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status()));
        }
        Ok(())
    }

    async fn update(&self, path: &str, value: Value) -> Result<(), RemoteError> {
        let resp = self
            .client
            .patch(self.url(path))
            .json(&value)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store (tests, offline development)
// ---------------------------------------------------------------------------

/// In-memory JSON tree with the same path/merge semantics as the hosted
/// store. `fail_writes` simulates an unreachable network for failure-path
/// tests; reads keep working.
#[derive(Default)]
pub struct MemoryRemote {
    tree: Mutex<Value>,
    fail_writes: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        MemoryRemote {
            tree: Mutex::new(Value::Null),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RemoteError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    /// Snapshot of the whole tree, for assertions.
    pub fn tree(&self) -> Value {
        self.tree.lock().expect("remote tree lock").clone()
    }
}

fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.trim_matches('/').split('/') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Walk to the parent of the path's leaf, creating intermediate objects.
fn lookup_parent_mut<'a>(tree: &'a mut Value, path: &str) -> (&'a mut Map<String, Value>, String) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (leaf, parents) = segments.split_last().expect("non-empty path");

    let mut node = tree;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = node
            .as_object_mut()
            .expect("object just ensured")
            .entry(segment.to_string())
            .or_insert(Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    (
        node.as_object_mut().expect("object just ensured"),
        leaf.to_string(),
    )
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, path: &str) -> Result<Value, RemoteError> {
        let tree = self.tree.lock().expect("remote tree lock");
        Ok(lookup(&tree, path).cloned().unwrap_or(Value::Null))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), RemoteError> {
        self.check_writable()?;
        let mut tree = self.tree.lock().expect("remote tree lock");
        let (parent, leaf) = lookup_parent_mut(&mut tree, path);
        if value.is_null() {
            parent.remove(&leaf);
        } else {
            parent.insert(leaf, value);
        }
        Ok(())
    }

    async fn update(&self, path: &str, value: Value) -> Result<(), RemoteError> {
        self.check_writable()?;
        let mut tree = self.tree.lock().expect("remote tree lock");
        let (parent, leaf) = lookup_parent_mut(&mut tree, path);
        let target = parent.entry(leaf).or_insert(Value::Object(Map::new()));
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        let fields = value
            .as_object()
            .ok_or_else(|| RemoteError::Unavailable("update payload must be an object".into()))?;
        let target_map = target.as_object_mut().expect("object just ensured");
        for (key, field) in fields {
            if field.is_null() {
                target_map.remove(key);
            } else {
                target_map.insert(key.clone(), field.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get_nested_path() {
        let remote = MemoryRemote::new();
        remote
            .set("orders/abc", json!({"id": "abc", "total": 417.9}))
            .await
            .unwrap();

        let order = remote.get("orders/abc").await.unwrap();
        assert_eq!(order["total"], 417.9);

        let all = remote.get("orders").await.unwrap();
        assert!(all.as_object().unwrap().contains_key("abc"));
    }

    #[tokio::test]
    async fn test_null_write_deletes() {
        let remote = MemoryRemote::new();
        remote.set("categories/c1", json!({"id": "c1"})).await.unwrap();
        remote.set("categories/c1", Value::Null).await.unwrap();

        assert_eq!(remote.get("categories/c1").await.unwrap(), Value::Null);
        assert_eq!(
            remote.get("categories").await.unwrap(),
            json!({}),
            "parent object survives the delete"
        );
    }

    #[tokio::test]
    async fn test_update_is_shallow_merge() {
        let remote = MemoryRemote::new();
        remote
            .set("settings", json!({"taxRate": 0.05, "restaurantInfo": {"name": "A"}}))
            .await
            .unwrap();
        remote.update("settings", json!({"taxRate": 0.12})).await.unwrap();

        let settings = remote.get("settings").await.unwrap();
        assert_eq!(settings["taxRate"], 0.12);
        assert_eq!(settings["restaurantInfo"]["name"], "A");
    }

    #[tokio::test]
    async fn test_absent_path_reads_as_null() {
        let remote = MemoryRemote::new();
        assert_eq!(remote.get("tables").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_simulated_outage_fails_writes_only() {
        let remote = MemoryRemote::new();
        remote.set("tables/t1", json!({"id": "t1"})).await.unwrap();
        remote.set_fail_writes(true);

        assert!(remote.set("tables/t2", json!({"id": "t2"})).await.is_err());
        assert!(remote.get("tables/t1").await.is_ok());
    }
}
