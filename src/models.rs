//! Shared data model for Drona POS.
//!
//! Field names follow the remote store's JSON documents (camelCase), which
//! are a persisted-format contract shared with other clients. Menu pricing
//! is a tagged union so the veg/non-veg/both cases cannot be half-populated,
//! while (de)serialization still speaks the flat legacy wire shape.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    Delivery,
    PickUp,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::DineIn
    }
}

impl OrderType {
    pub fn label(self) -> &'static str {
        match self {
            OrderType::DineIn => "DINE_IN",
            OrderType::Delivery => "DELIVERY",
            OrderType::PickUp => "PICK_UP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Completed and Cancelled are terminal: no transition out of them is
    /// offered to the user.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    Due,
    Part,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 5] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::Upi,
        PaymentMode::Due,
        PaymentMode::Part,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::Upi => "UPI",
            PaymentMode::Due => "DUE",
            PaymentMode::Part => "PART",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VegChoice {
    Veg,
    NonVeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Menu pricing as a tagged union: a BOTH item always carries both prices,
/// a single-variant item exactly one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VegPricing {
    Veg { price: f64 },
    NonVeg { price: f64 },
    Both { veg_price: f64, non_veg_price: f64 },
}

impl VegPricing {
    /// Effective unit base price for a given veg choice. A BOTH item
    /// requires a choice; single-variant items ignore it.
    pub fn unit_price(&self, choice: Option<VegChoice>) -> Result<f64, String> {
        match (self, choice) {
            (VegPricing::Both { veg_price, .. }, Some(VegChoice::Veg)) => Ok(*veg_price),
            (VegPricing::Both { non_veg_price, .. }, Some(VegChoice::NonVeg)) => {
                Ok(*non_veg_price)
            }
            (VegPricing::Both { .. }, None) => {
                Err("Please choose Veg or Non-Veg for this item.".to_string())
            }
            (VegPricing::Veg { price }, _) | (VegPricing::NonVeg { price }, _) => Ok(*price),
        }
    }

    pub fn needs_veg_choice(&self) -> bool {
        matches!(self, VegPricing::Both { .. })
    }

    /// Veg marker shown before a choice is made. BOTH items default to the
    /// veg marker by convention.
    pub fn is_veg(&self) -> bool {
        !matches!(self, VegPricing::NonVeg { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "MenuItemWire", try_from = "MenuItemWire")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub pricing: VegPricing,
    pub image: Option<String>,
}

/// Flat legacy wire shape for `MenuItem`. Records written by older clients
/// carry no `vegType`; `isVeg` + `price` decide the variant in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuItemWire {
    id: String,
    name: String,
    category_id: String,
    price: f64,
    is_veg: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    veg_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    veg_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    non_veg_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl From<MenuItem> for MenuItemWire {
    fn from(item: MenuItem) -> Self {
        let (price, is_veg, veg_type, veg_price, non_veg_price) = match item.pricing {
            VegPricing::Veg { price } => (price, true, "VEG", None, None),
            VegPricing::NonVeg { price } => (price, false, "NON_VEG", None, None),
            VegPricing::Both {
                veg_price,
                non_veg_price,
            } => (veg_price, true, "BOTH", Some(veg_price), Some(non_veg_price)),
        };
        MenuItemWire {
            id: item.id,
            name: item.name,
            category_id: item.category_id,
            price,
            is_veg,
            veg_type: Some(veg_type.to_string()),
            veg_price,
            non_veg_price,
            image: item.image,
        }
    }
}

impl TryFrom<MenuItemWire> for MenuItem {
    type Error = String;

    fn try_from(wire: MenuItemWire) -> Result<Self, String> {
        let pricing = match wire.veg_type.as_deref() {
            Some("BOTH") => match (wire.veg_price, wire.non_veg_price) {
                (Some(veg_price), Some(non_veg_price)) => VegPricing::Both {
                    veg_price,
                    non_veg_price,
                },
                _ => {
                    return Err(format!(
                        "menu item {}: vegType BOTH requires vegPrice and nonVegPrice",
                        wire.id
                    ))
                }
            },
            Some("VEG") => VegPricing::Veg { price: wire.price },
            Some("NON_VEG") => VegPricing::NonVeg { price: wire.price },
            // Legacy records: no vegType, isVeg decides the variant.
            None => {
                if wire.is_veg {
                    VegPricing::Veg { price: wire.price }
                } else {
                    VegPricing::NonVeg { price: wire.price }
                }
            }
            Some(other) => return Err(format!("menu item {}: unknown vegType {other}", wire.id)),
        };
        Ok(MenuItem {
            id: wire.id,
            name: wire.name,
            category_id: wire.category_id,
            pricing,
            image: wire.image,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category_id: String,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub name: String,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_order_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAddon {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// One distinct cart line: flattened menu-item fields plus quantity and the
/// veg/addon selection. `price` is the computed effective unit price (base
/// variant price + addon surcharges).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub price: f64,
    pub is_veg: bool,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_veg_choice: Option<VegChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_addons: Vec<SelectedAddon>,
}

impl CartItem {
    /// Composite line identity: item id + veg choice + sorted addon ids.
    /// Two lines with the same base item but a different combination are
    /// distinct; an identical combination merges into one line.
    pub fn line_id(&self) -> String {
        line_id(self.id.as_str(), self.selected_veg_choice, &self.selected_addons)
    }
}

pub fn line_id(
    menu_item_id: &str,
    veg_choice: Option<VegChoice>,
    addons: &[SelectedAddon],
) -> String {
    let choice = match veg_choice {
        Some(VegChoice::Veg) => "VEG",
        Some(VegChoice::NonVeg) => "NON_VEG",
        None => "",
    };
    let mut addon_ids: Vec<&str> = addons.iter().map(|a| a.id.as_str()).collect();
    addon_ids.sort_unstable();
    format!("{menu_item_id}|{choice}|{}", addon_ids.join("+"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub customer_name: String,
}

impl TableCart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub bill_no: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub date: String,
    pub time: String,
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub payment_mode: PaymentMode,
    pub order_type: OrderType,
    pub staff_name: String,
    pub status: OrderStatus,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl Default for RestaurantInfo {
    fn default() -> Self {
        RestaurantInfo {
            name: "DRONA POS CAFE".to_string(),
            phone: "+91 9876543210".to_string(),
            address: "123 Main Street, Food Park, City".to_string(),
        }
    }
}

pub const DEFAULT_TAX_RATE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub restaurant_info: RestaurantInfo,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            restaurant_info: RestaurantInfo::default(),
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

// ---------------------------------------------------------------------------
// Id and timestamp helpers
// ---------------------------------------------------------------------------

/// Random opaque entity id, 9 chars to match ids minted by other clients.
pub fn new_entity_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}

/// Human-facing bill number: `INV-` + last six digits of epoch millis.
/// Collision-improbable within a shift, not globally unique.
pub fn make_bill_no() -> String {
    let millis = Local::now().timestamp_millis().to_string();
    let suffix = &millis[millis.len().saturating_sub(6)..];
    format!("INV-{suffix}")
}

/// Wall-clock date in the locale style other clients write (`1/5/2026`).
pub fn today_date_string() -> String {
    Local::now().format("%-m/%-d/%Y").to_string()
}

/// Wall-clock time, two-digit hour/minute with AM/PM (`09:45 PM`).
pub fn now_time_string() -> String {
    Local::now().format("%I:%M %p").to_string()
}

/// Parse an order's `(date, time)` pair into a combined timestamp for the
/// ledger's canonical sort. Unparseable stamps yield `None` and sort last.
pub fn parse_order_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%m/%d/%Y %I:%M %p").ok()
}
