//! Sync gateway for Drona POS.
//!
//! Bidirectional bridge between local process state and the shared remote
//! JSON-tree store, last-writer-wins with full-subtree replacement:
//!
//! - Outbound: every local mutation is a keyed write (`entity_type/id`),
//!   deletion is a null write, settings are a shallow merge, the shared
//!   `table_carts` map is always replaced whole.
//! - Inbound: each top-level path is polled and every fetched snapshot
//!   replaces local state for that path wholesale (values-of-object
//!   semantics). Each applied snapshot is persisted to the SQLite cache so
//!   the app can start offline.
//!
//! Each path is synced independently so a failure in one does not block
//! the others.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{seed_categories, seed_menu_items};
use crate::db::{self, DbState};
use crate::models::{Addon, Category, MenuItem, Order, Settings, Table, TableCart};
use crate::remote::RemoteStore;
use crate::state::{PosState, StateEvent};
use crate::tables::TableRegistry;

pub const PATH_CATEGORIES: &str = "categories";
pub const PATH_MENU_ITEMS: &str = "menu_items";
pub const PATH_ADDONS: &str = "addons";
pub const PATH_TABLES: &str = "tables";
pub const PATH_ORDERS: &str = "orders";
pub const PATH_SETTINGS: &str = "settings";
pub const PATH_TABLE_CARTS: &str = "table_carts";

/// Every top-level path the gateway mirrors.
pub const ALL_PATHS: &[&str] = &[
    PATH_CATEGORIES,
    PATH_MENU_ITEMS,
    PATH_ADDONS,
    PATH_TABLES,
    PATH_ORDERS,
    PATH_SETTINGS,
    PATH_TABLE_CARTS,
];

pub struct SyncGateway {
    state: Arc<PosState>,
    db: Arc<DbState>,
    remote: Arc<dyn RemoteStore>,
}

/// Collection snapshot as the remote stores it: an object keyed by id whose
/// child values are the records. Insertion order is not preserved, callers
/// re-derive order themselves. The cache stores plain arrays; both parse.
/// Malformed records are skipped with a warning rather than poisoning the
/// whole snapshot.
fn parse_values<T: DeserializeOwned>(path: &str, snapshot: &Value) -> Vec<T> {
    let raw: Vec<&Value> = match snapshot {
        Value::Object(map) => map.values().collect(),
        Value::Array(arr) => arr.iter().collect(),
        _ => Vec::new(),
    };
    let mut parsed = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => parsed.push(record),
            Err(e) => warn!(path, error = %e, "skipping malformed record in snapshot"),
        }
    }
    parsed
}

impl SyncGateway {
    pub fn new(state: Arc<PosState>, db: Arc<DbState>, remote: Arc<dyn RemoteStore>) -> Self {
        SyncGateway { state, db, remote }
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Initialize local state from the on-device cache, falling back to the
    /// hardcoded seeds. Orders always start empty pending the first live
    /// snapshot (the remote store is their source of truth).
    pub fn hydrate_from_cache(&self) -> Result<(), String> {
        let conn = self.db.conn.lock().map_err(|e| e.to_string())?;

        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.categories = match db::get_snapshot(&conn, PATH_CATEGORIES) {
                Some(raw) => parse_values(PATH_CATEGORIES, &parse_raw(&raw)),
                None => seed_categories(),
            };
            catalog.menu_items = match db::get_snapshot(&conn, PATH_MENU_ITEMS) {
                Some(raw) => parse_values(PATH_MENU_ITEMS, &parse_raw(&raw)),
                None => seed_menu_items(),
            };
            catalog.addons = match db::get_snapshot(&conn, PATH_ADDONS) {
                Some(raw) => parse_values(PATH_ADDONS, &parse_raw(&raw)),
                None => Vec::new(),
            };
        }

        {
            let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
            *tables = match db::get_snapshot(&conn, PATH_TABLES) {
                Some(raw) => TableRegistry {
                    tables: parse_values(PATH_TABLES, &parse_raw(&raw)),
                },
                None => TableRegistry::seeded(),
            };
        }

        {
            let mut settings = self.state.settings.lock().map_err(|e| e.to_string())?;
            *settings = db::get_snapshot(&conn, PATH_SETTINGS)
                .and_then(|raw| serde_json::from_str::<Settings>(&raw).ok())
                .unwrap_or_default();
        }

        {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            let map = db::get_snapshot(&conn, PATH_TABLE_CARTS)
                .and_then(|raw| serde_json::from_str::<HashMap<String, TableCart>>(&raw).ok())
                .unwrap_or_default();
            carts.replace_table_carts(map);
        }

        info!("Local state hydrated from cache");
        Ok(())
    }

    /// Seed the remote catalog from the default menu exactly once, checked
    /// via "does the subtree currently exist". A concurrent second client
    /// performing the same empty-check can double-seed; this race is
    /// accepted, not resolved by the protocol.
    pub async fn seed_remote_catalog_if_absent(&self) {
        let existing = match self.remote.get(PATH_CATEGORIES).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "catalog seed check failed, skipping");
                return;
            }
        };
        if !existing.is_null() {
            return;
        }

        info!("Remote catalog empty, seeding default menu");
        let categories: serde_json::Map<String, Value> = seed_categories()
            .into_iter()
            .filter_map(|c| Some((c.id.clone(), serde_json::to_value(c).ok()?)))
            .collect();
        let menu_items: serde_json::Map<String, Value> = seed_menu_items()
            .into_iter()
            .filter_map(|i| Some((i.id.clone(), serde_json::to_value(i).ok()?)))
            .collect();

        if let Err(e) = self.remote.set(PATH_CATEGORIES, Value::Object(categories)).await {
            warn!(error = %e, "catalog seed write failed (categories)");
        }
        if let Err(e) = self.remote.set(PATH_MENU_ITEMS, Value::Object(menu_items)).await {
            warn!(error = %e, "catalog seed write failed (menu items)");
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Fetch one snapshot per path and apply each as a remote notification.
    /// A failed fetch freezes that path's local state until the next round.
    pub async fn poll_once(&self) {
        for path in ALL_PATHS {
            match self.remote.get(path).await {
                Ok(snapshot) => {
                    if let Err(e) = self.apply_snapshot(path, &snapshot) {
                        warn!(path, error = %e, "snapshot apply failed");
                    }
                }
                Err(e) => warn!(path, error = %e, "snapshot fetch failed"),
            }
        }
    }

    /// Apply an inbound snapshot: local state for the path is replaced
    /// wholesale. Empty snapshots reset the path to its empty value, except
    /// categories and menu items, which keep their warm cache so a flaky
    /// reconnect cannot wipe the menu out from under an open billing
    /// screen.
    pub fn apply_snapshot(&self, path: &str, snapshot: &Value) -> Result<(), String> {
        let empty = snapshot.is_null()
            || snapshot.as_object().map(|m| m.is_empty()).unwrap_or(false);

        match path {
            PATH_CATEGORIES => {
                if empty {
                    debug!("empty categories snapshot ignored (warm-cache guard)");
                    return Ok(());
                }
                let categories: Vec<Category> = parse_values(path, snapshot);
                self.persist(path, &categories);
                self.state
                    .catalog
                    .lock()
                    .map_err(|e| e.to_string())?
                    .categories = categories;
                self.state.notify(StateEvent::Categories);
            }
            PATH_MENU_ITEMS => {
                if empty {
                    debug!("empty menu_items snapshot ignored (warm-cache guard)");
                    return Ok(());
                }
                let items: Vec<MenuItem> = parse_values(path, snapshot);
                self.persist(path, &items);
                self.state
                    .catalog
                    .lock()
                    .map_err(|e| e.to_string())?
                    .menu_items = items;
                self.state.notify(StateEvent::MenuItems);
            }
            PATH_ADDONS => {
                let addons: Vec<Addon> = parse_values(path, snapshot);
                self.persist(path, &addons);
                self.state.catalog.lock().map_err(|e| e.to_string())?.addons = addons;
                self.state.notify(StateEvent::Addons);
            }
            PATH_TABLES => {
                let tables: Vec<Table> = parse_values(path, snapshot);
                self.persist(path, &tables);
                self.state
                    .tables
                    .lock()
                    .map_err(|e| e.to_string())?
                    .replace_all(tables);
                self.state.notify(StateEvent::Tables);
            }
            PATH_ORDERS => {
                let orders: Vec<Order> = parse_values(path, snapshot);
                let mut ledger = self.state.ledger.lock().map_err(|e| e.to_string())?;
                ledger.replace_all(orders);
                // Persist in canonical order so an eventual cache read does
                // not need to re-sort.
                self.persist(path, &ledger.orders().to_vec());
                drop(ledger);
                self.state.notify(StateEvent::Orders);
            }
            PATH_SETTINGS => {
                let mut settings = self.state.settings.lock().map_err(|e| e.to_string())?;
                if empty {
                    *settings = Settings::default();
                } else {
                    // Partial document: only the fields present replace.
                    if let Some(info) = snapshot.get("restaurantInfo") {
                        if let Ok(info) = serde_json::from_value(info.clone()) {
                            settings.restaurant_info = info;
                        }
                    }
                    if let Some(rate) = snapshot.get("taxRate").and_then(Value::as_f64) {
                        settings.tax_rate = rate;
                    }
                }
                let current = settings.clone();
                drop(settings);
                self.persist(path, &current);
                self.state.notify(StateEvent::Settings);
            }
            PATH_TABLE_CARTS => {
                let map: HashMap<String, TableCart> = match snapshot {
                    Value::Object(obj) => obj
                        .iter()
                        .filter_map(|(id, v)| {
                            match serde_json::from_value::<TableCart>(v.clone()) {
                                Ok(cart) => Some((id.clone(), cart)),
                                Err(e) => {
                                    warn!(table_id = %id, error = %e, "skipping malformed table cart");
                                    None
                                }
                            }
                        })
                        .collect(),
                    _ => HashMap::new(),
                };
                self.persist(path, &map);
                self.state
                    .carts
                    .lock()
                    .map_err(|e| e.to_string())?
                    .replace_table_carts(map);
                self.state.notify(StateEvent::TableCarts);
            }
            other => warn!(path = other, "snapshot for unknown path ignored"),
        }
        Ok(())
    }

    /// Persist an applied snapshot to the on-device cache. Unchanged
    /// payloads skip the write. Cache failures never interrupt sync.
    fn persist<T: serde::Serialize>(&self, path: &str, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(path, error = %e, "cache serialize failed");
                return;
            }
        };
        let conn = match self.db.conn.lock() {
            Ok(c) => c,
            Err(e) => {
                warn!(path, "cache lock failed: {e}");
                return;
            }
        };
        if db::get_snapshot(&conn, path).as_deref() == Some(serialized.as_str()) {
            return;
        }
        if let Err(e) = db::set_snapshot(&conn, path, &serialized) {
            warn!(path, error = %e, "cache write failed");
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Keyed entity write that must surface failure to the user (order
    /// creation is the one write staff are alerted about).
    pub async fn push_order(&self, order: &Order) -> Result<(), String> {
        let value = serde_json::to_value(order).map_err(|e| e.to_string())?;
        self.remote
            .set(&format!("{PATH_ORDERS}/{}", order.id), value)
            .await
            .map_err(|e| format!("Failed to save order to the cloud: {e}"))
    }

    /// Best-effort keyed entity write. Local state stays optimistically
    /// updated; the remote copy is stale until the next edit retries.
    pub async fn push_entity<T: serde::Serialize>(&self, kind: &str, id: &str, entity: &T) {
        let value = match serde_json::to_value(entity) {
            Ok(v) => v,
            Err(e) => {
                warn!(kind, id, error = %e, "entity serialize failed");
                return;
            }
        };
        if let Err(e) = self.remote.set(&format!("{kind}/{id}"), value).await {
            warn!(kind, id, error = %e, "remote write failed");
        }
    }

    /// Best-effort shallow merge into a keyed entity (status patches).
    pub async fn update_entity(&self, kind: &str, id: &str, fields: Value) {
        if let Err(e) = self.remote.update(&format!("{kind}/{id}"), fields).await {
            warn!(kind, id, error = %e, "remote update failed");
        }
    }

    /// Best-effort delete-by-null-write.
    pub async fn delete_entity(&self, kind: &str, id: &str) {
        if let Err(e) = self.remote.set(&format!("{kind}/{id}"), Value::Null).await {
            warn!(kind, id, error = %e, "remote delete failed");
        }
    }

    /// Best-effort shallow merge into the settings document.
    pub async fn push_settings_update(&self, fields: Value) {
        if let Err(e) = self.remote.update(PATH_SETTINGS, fields).await {
            warn!(error = %e, "settings update failed");
        }
    }

    /// Full-map replace of the shared table-carts document. Callers must
    /// have read the latest map first (read-modify-write, no locking);
    /// near-simultaneous edits to different tables can lose one write.
    pub async fn push_table_carts(&self) {
        let map = match self.state.carts.lock() {
            Ok(carts) => carts.table_carts().clone(),
            Err(e) => {
                warn!("table carts lock failed: {e}");
                return;
            }
        };
        let value = match serde_json::to_value(&map) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "table carts serialize failed");
                return;
            }
        };
        if let Err(e) = self.remote.set(PATH_TABLE_CARTS, value).await {
            warn!(error = %e, "table carts write failed");
        }
    }

    // -----------------------------------------------------------------------
    // Background loop
    // -----------------------------------------------------------------------

    /// Hydrate, seed if needed, then poll until cancelled.
    pub async fn run(&self, poll_interval: std::time::Duration, cancel: CancellationToken) {
        if let Err(e) = self.hydrate_from_cache() {
            warn!("cache hydrate failed: {e}");
        }
        self.seed_remote_catalog_if_absent().await;

        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("sync loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }
}

fn parse_raw(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{OrderStatus, TableStatus};
    use crate::remote::MemoryRemote;
    use rusqlite::Connection;
    use serde_json::json;

    fn test_db() -> Arc<DbState> {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::run_migrations_for_test(&conn);
        Arc::new(DbState {
            conn: std::sync::Mutex::new(conn),
            db_path: std::path::PathBuf::from(":memory:"),
        })
    }

    fn gateway() -> (SyncGateway, Arc<PosState>, Arc<MemoryRemote>) {
        let state = Arc::new(PosState::new());
        let remote = Arc::new(MemoryRemote::new());
        let gw = SyncGateway::new(state.clone(), test_db(), remote.clone());
        (gw, state, remote)
    }

    fn order_json(id: &str, date: &str, time: &str) -> Value {
        json!({
            "id": id,
            "billNo": format!("INV-{id}"),
            "customerName": "",
            "date": date,
            "time": time,
            "items": [{
                "id": "g1", "name": "Sprouts Salad", "categoryId": "10",
                "price": 89.0, "isVeg": true, "quantity": 1
            }],
            "subtotal": 89.0,
            "tax": 4.45,
            "total": 93.45,
            "paymentMode": "CASH",
            "orderType": "PICK_UP",
            "staffName": "Admin",
            "status": "COMPLETED"
        })
    }

    #[tokio::test]
    async fn test_inbound_orders_replace_and_sort() {
        let (gw, state, remote) = gateway();
        remote
            .set(
                PATH_ORDERS,
                json!({
                    "a": order_json("a", "2/22/2026", "11:00 AM"),
                    "b": order_json("b", "2/23/2026", "09:15 AM"),
                }),
            )
            .await
            .unwrap();

        gw.poll_once().await;

        let ledger = state.ledger.lock().unwrap();
        let ids: Vec<&str> = ledger.orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_empty_snapshot_guard_for_catalog_paths() {
        let (gw, state, _remote) = gateway();
        gw.hydrate_from_cache().unwrap();
        let seeded_categories = state.catalog.lock().unwrap().categories.len();
        assert!(seeded_categories > 0);

        // Empty remote tree: categories and menu items keep the warm cache,
        // tables reset to empty.
        gw.poll_once().await;

        let catalog = state.catalog.lock().unwrap();
        assert_eq!(catalog.categories.len(), seeded_categories);
        assert!(!catalog.menu_items.is_empty());
        drop(catalog);
        assert!(state.tables.lock().unwrap().tables.is_empty());
    }

    #[tokio::test]
    async fn test_inbound_snapshot_persists_to_cache() {
        let (gw, _state, remote) = gateway();
        remote
            .set(PATH_CATEGORIES, json!({"c1": {"id": "c1", "name": "Grill"}}))
            .await
            .unwrap();

        gw.poll_once().await;

        let conn = gw.db.conn.lock().unwrap();
        let cached = db::get_snapshot(&conn, PATH_CATEGORIES).unwrap();
        let parsed: Vec<Category> = serde_json::from_str(&cached).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Grill");
    }

    #[tokio::test]
    async fn test_hydrate_prefers_cache_over_seed() {
        let (gw, state, _remote) = gateway();
        {
            let conn = gw.db.conn.lock().unwrap();
            db::set_snapshot(
                &conn,
                PATH_CATEGORIES,
                r#"[{"id":"c9","name":"Cached Only"}]"#,
            )
            .unwrap();
        }

        gw.hydrate_from_cache().unwrap();

        let catalog = state.catalog.lock().unwrap();
        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.categories[0].name, "Cached Only");
        // Menu items had no cache row: seeded.
        assert!(!catalog.menu_items.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_defaults_without_cache() {
        let (gw, state, _remote) = gateway();
        gw.hydrate_from_cache().unwrap();

        assert_eq!(state.tables.lock().unwrap().tables.len(), 6);
        assert!(state.ledger.lock().unwrap().orders().is_empty());
        assert_eq!(state.settings.lock().unwrap().tax_rate, 0.05);
    }

    #[tokio::test]
    async fn test_orders_start_empty_even_with_cached_orders() {
        let (gw, state, _remote) = gateway();
        {
            let conn = gw.db.conn.lock().unwrap();
            let cached = serde_json::to_string(&vec![order_json("a", "2/22/2026", "11:00 AM")])
                .unwrap();
            db::set_snapshot(&conn, PATH_ORDERS, &cached).unwrap();
        }

        gw.hydrate_from_cache().unwrap();

        // Remote is the source of truth for orders: empty until first live
        // snapshot.
        assert!(state.ledger.lock().unwrap().orders().is_empty());
    }

    #[tokio::test]
    async fn test_seed_remote_catalog_only_when_absent() {
        let (gw, _state, remote) = gateway();
        gw.seed_remote_catalog_if_absent().await;

        let seeded = remote.get(PATH_CATEGORIES).await.unwrap();
        assert!(seeded.as_object().unwrap().len() > 0);

        // Overwrite one category remotely; a second seed pass must not undo
        // it because the subtree now exists.
        remote
            .set(PATH_CATEGORIES, json!({"only": {"id": "only", "name": "Kept"}}))
            .await
            .unwrap();
        gw.seed_remote_catalog_if_absent().await;
        let after = remote.get(PATH_CATEGORIES).await.unwrap();
        assert_eq!(after.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_partial_snapshot() {
        let (gw, state, remote) = gateway();
        remote
            .set(PATH_SETTINGS, json!({"taxRate": 0.12}))
            .await
            .unwrap();

        gw.poll_once().await;

        let settings = state.settings.lock().unwrap();
        assert_eq!(settings.tax_rate, 0.12);
        // restaurantInfo absent from the document: default retained.
        assert_eq!(settings.restaurant_info.name, "DRONA POS CAFE");
    }

    #[tokio::test]
    async fn test_table_carts_full_map_replace() {
        let (gw, state, remote) = gateway();
        remote
            .set(
                PATH_TABLE_CARTS,
                json!({
                    "t1": {"items": [], "customerName": "Asha"},
                    "t2": {"customerName": ""}
                }),
            )
            .await
            .unwrap();

        gw.poll_once().await;

        let carts = state.carts.lock().unwrap();
        assert_eq!(carts.table_carts().len(), 2);
        assert_eq!(carts.table_carts()["t1"].customer_name, "Asha");
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped_not_fatal() {
        let (gw, state, remote) = gateway();
        remote
            .set(
                PATH_TABLES,
                json!({
                    "t1": {"id": "t1", "name": "T-1", "status": "AVAILABLE"},
                    "bad": {"name": 42}
                }),
            )
            .await
            .unwrap();

        gw.poll_once().await;

        let tables = state.tables.lock().unwrap();
        assert_eq!(tables.tables.len(), 1);
        assert_eq!(tables.tables[0].status, TableStatus::Available);
    }

    #[tokio::test]
    async fn test_push_order_surfaces_failure() {
        let (gw, _state, remote) = gateway();
        let order: Order =
            serde_json::from_value(order_json("x", "2/23/2026", "09:15 AM")).unwrap();

        remote.set_fail_writes(true);
        assert!(gw.push_order(&order).await.is_err());

        remote.set_fail_writes(false);
        gw.push_order(&order).await.unwrap();
        assert_eq!(remote.get("orders/x").await.unwrap()["id"], "x");
        assert_eq!(
            remote.get("orders/x").await.unwrap()["status"],
            serde_json::to_value(OrderStatus::Completed).unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_entity_writes_null() {
        let (gw, _state, remote) = gateway();
        remote
            .set("menu_items/m1", json!({"id": "m1"}))
            .await
            .unwrap();

        gw.delete_entity(PATH_MENU_ITEMS, "m1").await;
        assert!(remote.get("menu_items/m1").await.unwrap().is_null());
    }
}
