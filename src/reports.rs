//! Sales analytics: pure, read-only projections over the order ledger,
//! re-derived on every call. Cancelled orders never count toward revenue.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::{today_date_string, Order, OrderStatus, PaymentMode};

/// Business hours shown on the hourly chart.
const HOUR_BUCKETS: [&str; 14] = [
    "09 AM", "10 AM", "11 AM", "12 PM", "01 PM", "02 PM", "03 PM", "04 PM", "05 PM", "06 PM",
    "07 PM", "08 PM", "09 PM", "10 PM",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub total_sales: f64,
    pub total_orders: usize,
    pub avg_order_value: f64,
    /// Orders in a non-terminal status, over the whole ledger.
    pub active_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBucket {
    pub hour: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSlice {
    pub mode: PaymentMode,
    /// Whole-percent share of non-cancelled orders.
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportEntry {
    pub date: String,
    pub total_orders: usize,
    pub total_sales: f64,
    /// Amount collected per payment mode, in `PaymentMode::ALL` order.
    pub payment_modes: Vec<(PaymentMode, f64)>,
}

fn countable(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

pub fn today_stats(orders: &[Order]) -> TodayStats {
    let today = today_date_string();
    let todays: Vec<&Order> = orders
        .iter()
        .filter(|o| o.date == today && countable(o))
        .collect();
    let total_sales: f64 = todays.iter().map(|o| o.total).sum();
    let total_orders = todays.len();
    TodayStats {
        total_sales,
        total_orders,
        avg_order_value: if total_orders > 0 {
            total_sales / total_orders as f64
        } else {
            0.0
        },
        active_orders: orders.iter().filter(|o| !o.status.is_terminal()).count(),
    }
}

/// Today's revenue bucketed by hour of day. The bucket key is the zero
/// padded hour plus meridiem from the order's `time` field; stamps outside
/// business hours fall off the chart.
pub fn hourly_sales(orders: &[Order]) -> Vec<HourlyBucket> {
    let today = today_date_string();
    let mut buckets: Vec<HourlyBucket> = HOUR_BUCKETS
        .iter()
        .map(|h| HourlyBucket {
            hour: (*h).to_string(),
            sales: 0.0,
        })
        .collect();

    for order in orders.iter().filter(|o| o.date == today && countable(o)) {
        let hour_part = order.time.split(':').next().unwrap_or("");
        let meridiem = order.time.split(' ').nth(1).unwrap_or("");
        let key = format!("{hour_part:0>2} {meridiem}");
        if let Some(bucket) = buckets.iter_mut().find(|b| b.hour == key) {
            bucket.sales += order.total;
        }
    }
    buckets
}

/// Revenue per category name over all non-cancelled orders, top 5
/// descending. Line items whose category no longer exists pool under
/// "Other".
pub fn category_distribution(orders: &[Order], catalog: &Catalog) -> Vec<CategorySlice> {
    let mut revenue: HashMap<String, f64> = HashMap::new();
    for order in orders.iter().filter(|o| countable(o)) {
        for item in &order.items {
            let name = catalog
                .category_name(&item.category_id)
                .unwrap_or("Other")
                .to_string();
            *revenue.entry(name).or_insert(0.0) += item.price * f64::from(item.quantity);
        }
    }
    let mut slices: Vec<CategorySlice> = revenue
        .into_iter()
        .map(|(name, value)| CategorySlice { name, value })
        .collect();
    slices.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    slices.truncate(5);
    slices
}

/// Share of non-cancelled orders per payment mode, rounded to whole
/// percent. Every mode appears even at zero.
pub fn payment_distribution(orders: &[Order]) -> Vec<PaymentSlice> {
    let counted: Vec<&Order> = orders.iter().filter(|o| countable(o)).collect();
    let total = counted.len();
    PaymentMode::ALL
        .iter()
        .map(|&mode| {
            let count = counted.iter().filter(|o| o.payment_mode == mode).count();
            PaymentSlice {
                mode,
                percent: if total > 0 {
                    ((count as f64 / total as f64) * 100.0).round() as u32
                } else {
                    0
                },
            }
        })
        .collect()
}

/// Item names ranked by quantity sold over non-cancelled orders, top 5.
pub fn top_items(orders: &[Order]) -> Vec<TopItem> {
    let mut quantities: HashMap<String, u32> = HashMap::new();
    for order in orders.iter().filter(|o| countable(o)) {
        for item in &order.items {
            *quantities.entry(item.name.clone()).or_insert(0) += item.quantity;
        }
    }
    let mut ranked: Vec<TopItem> = quantities
        .into_iter()
        .map(|(name, quantity)| TopItem { name, quantity })
        .collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(5);
    ranked
}

/// One entry per calendar date, in ledger (most-recent-first) order.
pub fn sales_report(orders: &[Order]) -> Vec<SalesReportEntry> {
    let mut entries: Vec<SalesReportEntry> = Vec::new();
    for order in orders.iter().filter(|o| countable(o)) {
        let idx = match entries.iter().position(|e| e.date == order.date) {
            Some(idx) => idx,
            None => {
                entries.push(SalesReportEntry {
                    date: order.date.clone(),
                    total_orders: 0,
                    total_sales: 0.0,
                    payment_modes: PaymentMode::ALL.iter().map(|&m| (m, 0.0)).collect(),
                });
                entries.len() - 1
            }
        };
        let entry = &mut entries[idx];
        entry.total_orders += 1;
        entry.total_sales += order.total;
        if let Some(slot) = entry
            .payment_modes
            .iter_mut()
            .find(|(m, _)| *m == order.payment_mode)
        {
            slot.1 += order.total;
        }
    }
    entries
}

/// Items cell for one order: `Name (xQty)` semicolon-joined, addon names in
/// parens before the quantity.
fn items_cell(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|item| {
            let mut name = item.name.clone();
            if !item.selected_addons.is_empty() {
                let addons: Vec<&str> =
                    item.selected_addons.iter().map(|a| a.name.as_str()).collect();
                name.push_str(&format!(" ({})", addons.join(", ")));
            }
            format!("{name} (x{})", item.quantity)
        })
        .collect::<Vec<String>>()
        .join("; ")
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// CSV export of the given orders, one row each, every value quoted.
pub fn export_csv(orders: &[Order]) -> Result<String, String> {
    if orders.is_empty() {
        return Err("No data available for export.".to_string());
    }

    let mut lines = vec![
        "Bill No,Date,Time,Customer,Items,Subtotal,Tax,Total,Payment Mode,Order Type,Status"
            .to_string(),
    ];
    for order in orders {
        let row = [
            order.bill_no.clone(),
            order.date.clone(),
            order.time.clone(),
            order.customer_name.clone(),
            items_cell(order),
            format!("{:.2}", order.subtotal),
            format!("{:.2}", order.tax),
            format!("{:.2}", order.total),
            order.payment_mode.label().to_string(),
            order.order_type.label().to_string(),
            order.status.label().to_string(),
        ];
        lines.push(
            row.iter()
                .map(|v| csv_quote(v))
                .collect::<Vec<String>>()
                .join(","),
        );
    }
    Ok(lines.join("\n"))
}

// ===========================================================================
// Tests
// ===========================================================================
