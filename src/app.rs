//! Application facade: the operations a front end calls.
//!
//! Each handler follows the same shape: validate, mutate local state under
//! the mutex, broadcast the change, then mirror it to the remote store.
//! Lock failures surface as errors the same way database access does.
//! Remote writes are best-effort; only order creation surfaces a failure to
//! the caller (the cart is kept so staff can retry).

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::cart::Selection;
use crate::catalog::CascadeDelete;
use crate::db::DbState;
use crate::models::{
    new_entity_id, Addon, Category, MenuItem, Order, OrderStatus, OrderType, PaymentMode,
    RestaurantInfo, SelectedAddon, Table, TableStatus, VegChoice,
};
use crate::orders::build_order;
use crate::remote::RemoteStore;
use crate::state::{PosState, StateEvent};
use crate::sync::{
    SyncGateway, PATH_ADDONS, PATH_CATEGORIES, PATH_MENU_ITEMS, PATH_ORDERS, PATH_TABLES,
};
use crate::tables::TableEvent;

const STAFF_NAME_KEY: (&str, &str) = ("local", "staff_name");
const DEFAULT_STAFF_NAME: &str = "Admin";

pub struct PosApp {
    state: Arc<PosState>,
    sync: Arc<SyncGateway>,
    db: Arc<DbState>,
    /// Name stamped on every order; kept in the local settings table.
    staff_name: std::sync::Mutex<String>,
}

impl PosApp {
    pub fn new(state: Arc<PosState>, db: Arc<DbState>, remote: Arc<dyn RemoteStore>) -> Self {
        let staff_name = db
            .conn
            .lock()
            .ok()
            .and_then(|conn| crate::db::get_setting(&conn, STAFF_NAME_KEY.0, STAFF_NAME_KEY.1))
            .unwrap_or_else(|| DEFAULT_STAFF_NAME.to_string());
        let sync = Arc::new(SyncGateway::new(state.clone(), db.clone(), remote));
        PosApp {
            state,
            sync,
            db,
            staff_name: std::sync::Mutex::new(staff_name),
        }
    }

    pub fn state(&self) -> &Arc<PosState> {
        &self.state
    }

    pub fn sync(&self) -> &Arc<SyncGateway> {
        &self.sync
    }

    pub fn staff_name(&self) -> Result<String, String> {
        Ok(self.staff_name.lock().map_err(|e| e.to_string())?.clone())
    }

    /// Persisted locally only; never synced.
    pub fn set_staff_name(&self, name: &str) -> Result<(), String> {
        let conn = self.db.conn.lock().map_err(|e| e.to_string())?;
        crate::db::set_setting(&conn, STAFF_NAME_KEY.0, STAFF_NAME_KEY.1, name)?;
        drop(conn);
        *self.staff_name.lock().map_err(|e| e.to_string())? = name.to_string();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Billing / cart
    // -----------------------------------------------------------------------

    /// What the UI must collect before `add_to_cart` for this item: nothing,
    /// or a choice step (veg choice and/or addons).
    pub fn selection_for(&self, menu_item_id: &str) -> Result<Selection, String> {
        let catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
        let item = catalog
            .menu_item(menu_item_id)
            .ok_or_else(|| format!("Menu item not found: {menu_item_id}"))?;
        let addon_ids = catalog
            .addons_for_category(&item.category_id)
            .iter()
            .map(|a| a.id.clone())
            .collect();
        Ok(crate::cart::selection_for(item, addon_ids))
    }

    /// Add one unit of a menu item to the active cart. Addon ids must belong
    /// to the item's category.
    pub async fn add_to_cart(
        &self,
        menu_item_id: &str,
        veg_choice: Option<VegChoice>,
        addon_ids: &[String],
    ) -> Result<(), String> {
        let (item, addons) = {
            let catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            if catalog.categories.is_empty() {
                return Err("Please select a category first.".to_string());
            }
            let item = catalog
                .menu_item(menu_item_id)
                .ok_or_else(|| format!("Menu item not found: {menu_item_id}"))?
                .clone();
            let available = catalog.addons_for_category(&item.category_id);
            let mut addons = Vec::with_capacity(addon_ids.len());
            for id in addon_ids {
                let addon = available
                    .iter()
                    .find(|a| &a.id == id)
                    .ok_or_else(|| format!("Add-on not found: {id}"))?;
                addons.push(SelectedAddon {
                    id: addon.id.clone(),
                    name: addon.name.clone(),
                    price: addon.price,
                });
            }
            (item, addons)
        };

        let update = {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            carts.add_line(&item, veg_choice, addons)?
        };
        self.state.notify(StateEvent::TableCarts);
        self.after_cart_change(update.table_id, update.event).await
    }

    pub async fn change_cart_quantity(&self, line_id: &str, delta: i32) -> Result<(), String> {
        let update = {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            carts.change_quantity(line_id, delta)
        };
        self.state.notify(StateEvent::TableCarts);
        self.after_cart_change(update.table_id, update.event).await
    }

    pub async fn remove_cart_line(&self, line_id: &str) -> Result<(), String> {
        let update = {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            carts.remove_line(line_id)
        };
        self.state.notify(StateEvent::TableCarts);
        self.after_cart_change(update.table_id, update.event).await
    }

    pub async fn set_customer_name(&self, name: &str) -> Result<(), String> {
        let table_bound = {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            carts.set_customer_name(name);
            carts.selected_table_id().is_some() && carts.order_type() == OrderType::DineIn
        };
        self.state.notify(StateEvent::TableCarts);
        if table_bound {
            self.sync.push_table_carts().await;
        }
        Ok(())
    }

    /// Switch the active cart context. Selecting a table does not touch its
    /// cart; deselecting returns to the ephemeral cart.
    pub fn select_table(&self, table_id: Option<String>) -> Result<(), String> {
        let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
        carts.select_table(table_id);
        Ok(())
    }

    pub fn set_order_type(&self, order_type: OrderType) -> Result<(), String> {
        let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
        carts.set_order_type(order_type);
        Ok(())
    }

    /// Mirror a table-cart change and its table-status side effect out.
    async fn after_cart_change(
        &self,
        table_id: Option<String>,
        event: Option<TableEvent>,
    ) -> Result<(), String> {
        let changed_table = match (&table_id, event) {
            (Some(id), Some(event)) => {
                let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
                tables.apply_event(id, event)
            }
            _ => None,
        };
        if table_id.is_some() {
            self.sync.push_table_carts().await;
        }
        if let Some(table) = changed_table {
            self.state.notify(StateEvent::Tables);
            self.sync.push_entity(PATH_TABLES, &table.id, &table).await;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    /// Finalize the active cart into an order. The remote write must succeed
    /// before anything local is cleared; on failure the cart is untouched so
    /// staff can retry. The local ledger is NOT updated here: orders come
    /// back through the next inbound snapshot.
    pub async fn checkout(&self, payment_mode: PaymentMode) -> Result<Order, String> {
        let staff_name = self.staff_name()?;
        let order = {
            let carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            let tables = self.state.tables.lock().map_err(|e| e.to_string())?;
            let tax_rate = self
                .state
                .settings
                .lock()
                .map_err(|e| e.to_string())?
                .tax_rate;
            let table = match carts.order_type() {
                OrderType::DineIn => carts.selected_table_id().and_then(|id| tables.table(id)),
                _ => None,
            };
            build_order(
                carts.active_cart(),
                carts.order_type(),
                payment_mode,
                table,
                tax_rate,
                &staff_name,
            )?
        };

        self.sync.push_order(&order).await?;
        info!(bill_no = %order.bill_no, total = order.total, "order placed");

        let cleared_table = {
            let mut carts = self.state.carts.lock().map_err(|e| e.to_string())?;
            carts.clear_active()
        };
        self.state.notify(StateEvent::TableCarts);

        if let Some(table_id) = cleared_table {
            let released = {
                let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
                tables.apply_event(&table_id, TableEvent::OrderCommitted)
            };
            self.sync.push_table_carts().await;
            if let Some(table) = released {
                self.state.notify(StateEvent::Tables);
                self.sync.push_entity(PATH_TABLES, &table_id, &table).await;
            }
        }

        Ok(order)
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Status is the only mutable order field. Completed and Cancelled are
    /// terminal here even though the data model does not hard-block them.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), String> {
        {
            let mut ledger = self.state.ledger.lock().map_err(|e| e.to_string())?;
            let current = ledger
                .order(order_id)
                .ok_or_else(|| format!("Order not found: {order_id}"))?;
            if current.status.is_terminal() {
                return Err("This order is already completed or cancelled.".to_string());
            }
            ledger.update_status(order_id, status)?;
        }
        self.state.notify(StateEvent::Orders);
        self.sync
            .update_entity(PATH_ORDERS, order_id, json!({ "status": status }))
            .await;
        Ok(())
    }

    pub async fn delete_order(&self, order_id: &str) -> Result<(), String> {
        {
            let mut ledger = self.state.ledger.lock().map_err(|e| e.to_string())?;
            ledger.delete(order_id)?;
        }
        self.state.notify(StateEvent::Orders);
        self.sync.delete_entity(PATH_ORDERS, order_id).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Menu management
    // -----------------------------------------------------------------------

    /// Create-or-update; a blank id means create.
    pub async fn save_category(&self, mut category: Category) -> Result<Category, String> {
        if category.id.is_empty() {
            category.id = new_entity_id();
        }
        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.upsert_category(category.clone());
        }
        self.state.notify(StateEvent::Categories);
        self.sync
            .push_entity(PATH_CATEGORIES, &category.id, &category)
            .await;
        Ok(category)
    }

    /// Deleting a category cascades to its menu items and addons, locally
    /// and remotely.
    pub async fn delete_category(&self, category_id: &str) -> Result<(), String> {
        let CascadeDelete {
            menu_item_ids,
            addon_ids,
        } = {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.delete_category(category_id)
        };
        self.state.notify(StateEvent::Categories);
        self.state.notify(StateEvent::MenuItems);
        self.state.notify(StateEvent::Addons);

        self.sync.delete_entity(PATH_CATEGORIES, category_id).await;
        for id in &menu_item_ids {
            self.sync.delete_entity(PATH_MENU_ITEMS, id).await;
        }
        for id in &addon_ids {
            self.sync.delete_entity(PATH_ADDONS, id).await;
        }
        Ok(())
    }

    pub async fn save_menu_item(&self, mut item: MenuItem) -> Result<MenuItem, String> {
        if item.id.is_empty() {
            item.id = new_entity_id();
        }
        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.upsert_menu_item(item.clone());
        }
        self.state.notify(StateEvent::MenuItems);
        self.sync
            .push_entity(PATH_MENU_ITEMS, &item.id, &item)
            .await;
        Ok(item)
    }

    pub async fn delete_menu_item(&self, item_id: &str) -> Result<(), String> {
        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.delete_menu_item(item_id);
        }
        self.state.notify(StateEvent::MenuItems);
        self.sync.delete_entity(PATH_MENU_ITEMS, item_id).await;
        Ok(())
    }

    pub async fn save_addon(&self, mut addon: Addon) -> Result<Addon, String> {
        if addon.id.is_empty() {
            addon.id = new_entity_id();
        }
        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.upsert_addon(addon.clone());
        }
        self.state.notify(StateEvent::Addons);
        self.sync
            .push_entity(PATH_ADDONS, &addon.id, &addon)
            .await;
        Ok(addon)
    }

    pub async fn delete_addon(&self, addon_id: &str) -> Result<(), String> {
        {
            let mut catalog = self.state.catalog.lock().map_err(|e| e.to_string())?;
            catalog.delete_addon(addon_id);
        }
        self.state.notify(StateEvent::Addons);
        self.sync.delete_entity(PATH_ADDONS, addon_id).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    pub async fn add_table(&self, name: &str) -> Result<Table, String> {
        let table = {
            let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
            tables.add(name)
        };
        self.state.notify(StateEvent::Tables);
        self.sync
            .push_entity(PATH_TABLES, &table.id, &table)
            .await;
        Ok(table)
    }

    /// Only available tables may be deleted.
    pub async fn delete_table(&self, table_id: &str) -> Result<(), String> {
        {
            let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
            tables.delete(table_id)?;
        }
        self.state.notify(StateEvent::Tables);
        self.sync.delete_entity(PATH_TABLES, table_id).await;
        Ok(())
    }

    pub async fn set_table_status(
        &self,
        table_id: &str,
        status: TableStatus,
    ) -> Result<(), String> {
        let table = {
            let mut tables = self.state.tables.lock().map_err(|e| e.to_string())?;
            tables.set_status(table_id, status, None)?
        };
        self.state.notify(StateEvent::Tables);
        self.sync.push_entity(PATH_TABLES, table_id, &table).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub async fn save_settings(&self, info: RestaurantInfo, tax_rate: f64) -> Result<(), String> {
        {
            let mut settings = self.state.settings.lock().map_err(|e| e.to_string())?;
            settings.restaurant_info = info.clone();
            settings.tax_rate = tax_rate;
        }
        self.state.notify(StateEvent::Settings);
        self.sync
            .push_settings_update(json!({
                "restaurantInfo": info,
                "taxRate": tax_rate,
            }))
            .await;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::VegPricing;
    use crate::remote::MemoryRemote;
    use rusqlite::Connection;

    fn test_app() -> (PosApp, Arc<MemoryRemote>) {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::run_migrations_for_test(&conn);
        let db = Arc::new(DbState {
            conn: std::sync::Mutex::new(conn),
            db_path: std::path::PathBuf::from(":memory:"),
        });
        let remote = Arc::new(MemoryRemote::new());
        let app = PosApp::new(Arc::new(PosState::new()), db, remote.clone());
        app.sync().hydrate_from_cache().unwrap();
        (app, remote)
    }

    #[tokio::test]
    async fn test_staff_name_persists_locally() {
        let (app, _remote) = test_app();
        assert_eq!(app.staff_name().unwrap(), "Admin");

        app.set_staff_name("Ravi").unwrap();
        assert_eq!(app.staff_name().unwrap(), "Ravi");

        app.set_order_type(OrderType::PickUp).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();
        let order = app.checkout(PaymentMode::Cash).await.unwrap();
        assert_eq!(order.staff_name, "Ravi");
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let (app, _remote) = test_app();
        let err = app.checkout(PaymentMode::Cash).await.unwrap_err();
        assert_eq!(err, "Please add items to the cart first.");
    }

    #[tokio::test]
    async fn test_checkout_rejects_dine_in_without_table() {
        let (app, _remote) = test_app();
        app.set_order_type(OrderType::DineIn).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();

        let err = app.checkout(PaymentMode::Cash).await.unwrap_err();
        assert_eq!(err, "Please select a table first.");
        // Rejection mutates nothing.
        let state = app.state();
        let carts = state.carts.lock().unwrap();
        assert_eq!(carts.active_cart().items.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_pushes_order_without_local_insert() {
        let (app, remote) = test_app();
        app.set_order_type(OrderType::PickUp).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();

        let order = app.checkout(PaymentMode::Upi).await.unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        let stored = remote.get(&format!("orders/{}", order.id)).await.unwrap();
        assert_eq!(stored["billNo"], order.bill_no);
        // The ledger waits for the inbound echo.
        assert!(app.state().ledger.lock().unwrap().orders().is_empty());
        // Cart cleared.
        assert!(app.state().carts.lock().unwrap().active_cart().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart() {
        let (app, remote) = test_app();
        app.set_order_type(OrderType::Delivery).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();

        remote.set_fail_writes(true);
        assert!(app.checkout(PaymentMode::Cash).await.is_err());
        assert_eq!(app.state().carts.lock().unwrap().active_cart().items.len(), 1);

        // Retry once the connection is back.
        remote.set_fail_writes(false);
        app.checkout(PaymentMode::Cash).await.unwrap();
        assert!(app.state().carts.lock().unwrap().active_cart().is_empty());
    }

    #[tokio::test]
    async fn test_dine_in_checkout_releases_table_and_cart() {
        let (app, remote) = test_app();
        app.set_order_type(OrderType::DineIn).unwrap();
        app.select_table(Some("t1".to_string())).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();

        // Adding to a table cart occupies the table and syncs both.
        assert_eq!(
            app.state().tables.lock().unwrap().table("t1").unwrap().status,
            TableStatus::Occupied
        );
        assert!(remote.get("table_carts").await.unwrap()["t1"].is_object());
        assert_eq!(remote.get("tables/t1").await.unwrap()["status"], "OCCUPIED");

        let order = app.checkout(PaymentMode::Card).await.unwrap();
        assert_eq!(order.table_id.as_deref(), Some("t1"));
        assert_eq!(order.table_name.as_deref(), Some("T-1"));

        assert_eq!(
            app.state().tables.lock().unwrap().table("t1").unwrap().status,
            TableStatus::Available
        );
        assert_eq!(remote.get("tables/t1").await.unwrap()["status"], "AVAILABLE");
        assert!(remote.get("table_carts").await.unwrap()["t1"].is_null());
    }

    #[tokio::test]
    async fn test_selection_step_reflects_item_and_addons() {
        let (app, _remote) = test_app();
        // Plain item, no addons in its category: add directly.
        assert_eq!(app.selection_for("g1").unwrap(), Selection::Direct);

        let addon = app
            .save_addon(Addon {
                id: String::new(),
                name: "Extra Egg".to_string(),
                price: 15.0,
                category_id: "10".to_string(),
            })
            .await
            .unwrap();
        match app.selection_for("g1").unwrap() {
            Selection::Choice {
                needs_veg_choice,
                addon_ids,
            } => {
                assert!(!needs_veg_choice);
                assert_eq!(addon_ids, vec![addon.id]);
            }
            other => panic!("expected choice step, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_to_cart_requires_categories() {
        let (app, _remote) = test_app();
        {
            let mut catalog = app.state().catalog.lock().unwrap();
            catalog.categories.clear();
        }
        let err = app.add_to_cart("g1", None, &[]).await.unwrap_err();
        assert_eq!(err, "Please select a category first.");
    }

    #[tokio::test]
    async fn test_category_cascade_deletes_remotely() {
        let (app, remote) = test_app();
        let category = app
            .save_category(Category {
                id: String::new(),
                name: "Specials".to_string(),
            })
            .await
            .unwrap();
        let item = app
            .save_menu_item(MenuItem {
                id: String::new(),
                name: "Chef Bowl".to_string(),
                category_id: category.id.clone(),
                pricing: VegPricing::Veg { price: 149.0 },
                image: None,
            })
            .await
            .unwrap();
        let addon = app
            .save_addon(Addon {
                id: String::new(),
                name: "Extra Paneer".to_string(),
                price: 30.0,
                category_id: category.id.clone(),
            })
            .await
            .unwrap();
        assert!(remote
            .get(&format!("menu_items/{}", item.id))
            .await
            .unwrap()
            .is_object());

        app.delete_category(&category.id).await.unwrap();

        let state = app.state();
        let catalog = state.catalog.lock().unwrap();
        assert!(catalog.category(&category.id).is_none());
        assert!(catalog.menu_item(&item.id).is_none());
        assert!(catalog.addons_for_category(&category.id).is_empty());
        drop(catalog);

        assert!(remote
            .get(&format!("categories/{}", category.id))
            .await
            .unwrap()
            .is_null());
        assert!(remote
            .get(&format!("menu_items/{}", item.id))
            .await
            .unwrap()
            .is_null());
        assert!(remote
            .get(&format!("addons/{}", addon.id))
            .await
            .unwrap()
            .is_null());
    }

    #[tokio::test]
    async fn test_status_update_terminal_guard() {
        let (app, remote) = test_app();
        {
            let mut ledger = app.state().ledger.lock().unwrap();
            let cart = crate::models::TableCart {
                items: vec![crate::models::CartItem {
                    id: "g1".to_string(),
                    name: "Sprouts Salad".to_string(),
                    category_id: "10".to_string(),
                    price: 89.0,
                    is_veg: true,
                    quantity: 1,
                    selected_veg_choice: None,
                    selected_addons: vec![],
                }],
                customer_name: String::new(),
            };
            let mut order = build_order(
                &cart,
                OrderType::PickUp,
                PaymentMode::Cash,
                None,
                0.05,
                "Admin",
            )
            .unwrap();
            order.status = OrderStatus::Placed;
            order.id = "o1".to_string();
            ledger.replace_all(vec![order]);
        }

        app.update_order_status("o1", OrderStatus::Preparing)
            .await
            .unwrap();
        assert_eq!(
            remote.get("orders/o1").await.unwrap()["status"],
            "PREPARING"
        );

        app.update_order_status("o1", OrderStatus::Cancelled)
            .await
            .unwrap();
        let err = app
            .update_order_status("o1", OrderStatus::Placed)
            .await
            .unwrap_err();
        assert_eq!(err, "This order is already completed or cancelled.");
    }

    #[tokio::test]
    async fn test_delete_order_removes_locally_and_remotely() {
        let (app, remote) = test_app();
        remote
            .set("orders/o9", serde_json::json!({"stale": true}))
            .await
            .unwrap();
        {
            let mut ledger = app.state().ledger.lock().unwrap();
            let cart = crate::models::TableCart {
                items: vec![crate::models::CartItem {
                    id: "g1".to_string(),
                    name: "Sprouts Salad".to_string(),
                    category_id: "10".to_string(),
                    price: 89.0,
                    is_veg: true,
                    quantity: 1,
                    selected_veg_choice: None,
                    selected_addons: vec![],
                }],
                customer_name: String::new(),
            };
            let mut order = build_order(
                &cart,
                OrderType::PickUp,
                PaymentMode::Cash,
                None,
                0.05,
                "Admin",
            )
            .unwrap();
            order.id = "o9".to_string();
            ledger.replace_all(vec![order]);
        }

        app.delete_order("o9").await.unwrap();
        assert!(app.state().ledger.lock().unwrap().orders().is_empty());
        assert!(remote.get("orders/o9").await.unwrap().is_null());

        assert!(app.delete_order("o9").await.is_err());
    }

    #[tokio::test]
    async fn test_save_settings_merges_remotely() {
        let (app, remote) = test_app();
        let info = RestaurantInfo {
            name: "New Name".to_string(),
            phone: "000".to_string(),
            address: "Elsewhere".to_string(),
        };
        app.save_settings(info, 0.18).await.unwrap();

        assert_eq!(app.state().settings.lock().unwrap().tax_rate, 0.18);
        let stored = remote.get("settings").await.unwrap();
        assert_eq!(stored["taxRate"], 0.18);
        assert_eq!(stored["restaurantInfo"]["name"], "New Name");
    }

    #[tokio::test]
    async fn test_emptying_table_cart_releases_table() {
        let (app, remote) = test_app();
        app.set_order_type(OrderType::DineIn).unwrap();
        app.select_table(Some("t2".to_string())).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();
        let line = app.state().carts.lock().unwrap().active_cart().items[0].line_id();

        app.change_cart_quantity(&line, -1).await.unwrap();

        assert_eq!(
            app.state().tables.lock().unwrap().table("t2").unwrap().status,
            TableStatus::Available
        );
        assert_eq!(remote.get("tables/t2").await.unwrap()["status"], "AVAILABLE");
        // The emptied cart is gone from the shared map, not left as an
        // empty shell.
        assert!(remote.get("table_carts").await.unwrap()["t2"].is_null());
    }

    #[tokio::test]
    async fn test_emptied_cart_drops_customer_name_from_next_order() {
        let (app, remote) = test_app();
        app.set_order_type(OrderType::DineIn).unwrap();
        app.select_table(Some("t1".to_string())).unwrap();
        app.add_to_cart("g1", None, &[]).await.unwrap();
        app.set_customer_name("Asha").await.unwrap();
        let line = app.state().carts.lock().unwrap().active_cart().items[0].line_id();

        app.change_cart_quantity(&line, -1).await.unwrap();
        assert!(remote.get("table_carts").await.unwrap()["t1"].is_null());

        app.add_to_cart("g1", None, &[]).await.unwrap();
        let order = app.checkout(PaymentMode::Cash).await.unwrap();
        assert_eq!(order.customer_name, "");
    }

    #[tokio::test]
    async fn test_poisoned_state_lock_is_an_error() {
        let (app, _remote) = test_app();
        let state = app.state().clone();
        let _ = std::thread::spawn(move || {
            let _guard = state.catalog.lock().unwrap();
            panic!("poison the catalog lock");
        })
        .join();

        assert!(app.selection_for("g1").is_err());
        assert!(app.add_to_cart("g1", None, &[]).await.is_err());
    }
}
