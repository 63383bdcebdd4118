//! Cart engine: per-table (or per-session) in-progress order state.
//!
//! Exactly one cart is active at a time: the selected table's cart when the
//! order type is dine-in and a table is chosen, otherwise a single shared
//! ephemeral cart (delivery, pick-up, or dine-in before a table is picked).
//! Line identity is the composite of menu item, veg choice, and addon set;
//! identical combinations merge into one line, different combinations stay
//! distinct.

use std::collections::HashMap;

use crate::models::{
    line_id, CartItem, MenuItem, OrderType, SelectedAddon, TableCart, VegChoice, VegPricing,
};
use crate::tables::TableEvent;

/// What the caller must collect before a menu item can be added.
#[derive(Debug, PartialEq)]
pub enum Selection {
    /// Add directly, no modal step.
    Direct,
    /// A choice step is required first: veg choice is mandatory only for
    /// BOTH-priced items; addons are always optional.
    Choice {
        needs_veg_choice: bool,
        addon_ids: Vec<String>,
    },
}

/// How a mutated cart should be reflected in the table registry.
#[derive(Debug, PartialEq)]
pub struct CartUpdate {
    /// Table bound to the mutated cart, if any.
    pub table_id: Option<String>,
    pub event: Option<TableEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// `subtotal = Σ(line price × quantity)`, tax on top. No rounding here;
/// presentation layers round for display only.
pub fn totals(items: &[CartItem], tax_rate: f64) -> Totals {
    let subtotal: f64 = items
        .iter()
        .map(|line| line.price * f64::from(line.quantity))
        .sum();
    let tax = subtotal * tax_rate;
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Decide whether adding this item needs a selection step: a veg choice for
/// BOTH-priced items, an addon pick when its category has any addons.
pub fn selection_for(item: &MenuItem, category_addon_ids: Vec<String>) -> Selection {
    let needs_veg_choice = item.pricing.needs_veg_choice();
    if !needs_veg_choice && category_addon_ids.is_empty() {
        Selection::Direct
    } else {
        Selection::Choice {
            needs_veg_choice,
            addon_ids: category_addon_ids,
        }
    }
}

#[derive(Debug, Default)]
pub struct CartEngine {
    table_carts: HashMap<String, TableCart>,
    ephemeral: TableCart,
    selected_table_id: Option<String>,
    order_type: OrderType,
}

impl CartEngine {
    pub fn new() -> Self {
        CartEngine::default()
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order_type = order_type;
    }

    pub fn selected_table_id(&self) -> Option<&str> {
        self.selected_table_id.as_deref()
    }

    /// Switch which cart subsequent operations apply to. `None` falls back
    /// to the shared ephemeral cart.
    pub fn select_table(&mut self, table_id: Option<String>) {
        self.selected_table_id = table_id;
    }

    /// The table the active cart is bound to, if any.
    fn active_table_id(&self) -> Option<String> {
        if self.order_type == OrderType::DineIn {
            self.selected_table_id.clone()
        } else {
            None
        }
    }

    pub fn active_cart(&self) -> &TableCart {
        match self.active_table_id() {
            Some(id) => self.table_carts.get(&id).unwrap_or(&EMPTY_CART),
            None => &self.ephemeral,
        }
    }

    fn active_cart_mut(&mut self) -> &mut TableCart {
        match self.active_table_id() {
            Some(id) => self.table_carts.entry(id).or_default(),
            None => &mut self.ephemeral,
        }
    }

    pub fn set_customer_name(&mut self, name: &str) {
        self.active_cart_mut().customer_name = name.to_string();
    }

    /// Add one unit of the item with the given selection. An existing line
    /// with the same composite identity gains quantity; otherwise a new line
    /// is appended with the computed effective unit price.
    pub fn add_line(
        &mut self,
        item: &MenuItem,
        veg_choice: Option<VegChoice>,
        addons: Vec<SelectedAddon>,
    ) -> Result<CartUpdate, String> {
        let base = item.pricing.unit_price(veg_choice)?;
        let unit_price = base + addons.iter().map(|a| a.price).sum::<f64>();
        let is_veg = match (&item.pricing, veg_choice) {
            (VegPricing::Both { .. }, Some(choice)) => choice == VegChoice::Veg,
            _ => item.pricing.is_veg(),
        };

        let id = line_id(&item.id, veg_choice, &addons);
        let table_id = self.active_table_id();
        let cart = self.active_cart_mut();

        match cart.items.iter_mut().find(|line| line.line_id() == id) {
            Some(line) => line.quantity += 1,
            None => cart.items.push(CartItem {
                id: item.id.clone(),
                name: item.name.clone(),
                category_id: item.category_id.clone(),
                price: unit_price,
                is_veg,
                quantity: 1,
                selected_veg_choice: veg_choice,
                selected_addons: addons,
            }),
        }

        Ok(CartUpdate {
            event: table_id.as_ref().map(|_| TableEvent::ItemAdded),
            table_id,
        })
    }

    /// Adjust a line's quantity by `delta`, clamping at zero. Zero removes
    /// the line; a cart emptied this way is destroyed and its table released.
    pub fn change_quantity(&mut self, line_id: &str, delta: i32) -> CartUpdate {
        let table_id = self.active_table_id();
        let cart = self.active_cart_mut();

        if let Some(line) = cart.items.iter_mut().find(|l| l.line_id() == line_id) {
            let quantity = i64::from(line.quantity) + i64::from(delta);
            line.quantity = quantity.max(0) as u32;
        }
        cart.items.retain(|line| line.quantity > 0);

        let emptied = cart.items.is_empty();
        let event = self.destroy_if_emptied(&table_id, emptied);
        CartUpdate { table_id, event }
    }

    /// Remove a line outright; same empty-cart-is-destroyed rule.
    pub fn remove_line(&mut self, line_id: &str) -> CartUpdate {
        let table_id = self.active_table_id();
        let cart = self.active_cart_mut();
        cart.items.retain(|line| line.line_id() != line_id);

        let emptied = cart.items.is_empty();
        let event = self.destroy_if_emptied(&table_id, emptied);
        CartUpdate { table_id, event }
    }

    /// A cart with no lines left is destroyed outright, not kept as an empty
    /// shell: otherwise the stale entry (and its customer name) would linger
    /// in the shared `table_carts` map and leak onto the next order at that
    /// table.
    fn destroy_if_emptied(
        &mut self,
        table_id: &Option<String>,
        emptied: bool,
    ) -> Option<TableEvent> {
        if !emptied {
            return None;
        }
        match table_id {
            Some(id) => {
                self.table_carts.remove(id);
                Some(TableEvent::CartEmptied)
            }
            None => {
                self.ephemeral = TableCart::default();
                None
            }
        }
    }

    /// Clear the active cart after checkout. Returns the table it was bound
    /// to so the caller can release it.
    pub fn clear_active(&mut self) -> Option<String> {
        let table_id = self.active_table_id();
        match &table_id {
            Some(id) => {
                self.table_carts.remove(id);
            }
            None => self.ephemeral = TableCart::default(),
        }
        table_id
    }

    pub fn totals(&self, tax_rate: f64) -> Totals {
        totals(&self.active_cart().items, tax_rate)
    }

    /// Full table-cart map for the shared `table_carts` remote document.
    /// The ephemeral cart is local-only and never synced.
    pub fn table_carts(&self) -> &HashMap<String, TableCart> {
        &self.table_carts
    }

    /// Inbound replacement: the remote map becomes the new local map. The
    /// ephemeral cart and selection context are untouched.
    pub fn replace_table_carts(&mut self, carts: HashMap<String, TableCart>) {
        self.table_carts = carts;
    }
}

static EMPTY_CART: TableCart = TableCart {
    items: Vec::new(),
    customer_name: String::new(),
};
