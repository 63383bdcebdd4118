//! Order ledger: immutable checkout snapshots plus their status lifecycle.
//!
//! `build_order` freezes a cart into an `Order` at checkout time. The
//! ledger itself is fed by inbound sync snapshots (orders are
//! remote-sourced-of-truth after commit); status updates and deletes apply
//! locally first and are mirrored out by the caller.

use std::cmp::Reverse;

use crate::cart::totals;
use crate::models::{
    make_bill_no, new_entity_id, now_time_string, parse_order_timestamp, today_date_string, Order,
    OrderStatus, OrderType, PaymentMode, Table, TableCart,
};

/// Freeze a cart snapshot into a durable order.
///
/// Validates a non-empty cart and, for dine-in, a selected table. Lines are
/// deep-copied; totals use the cart formula; status starts `Completed` (the
/// checkout flow finalizes immediately, there is no kitchen queue).
pub fn build_order(
    cart: &TableCart,
    order_type: OrderType,
    payment_mode: PaymentMode,
    table: Option<&Table>,
    tax_rate: f64,
    staff_name: &str,
) -> Result<Order, String> {
    if cart.items.is_empty() {
        return Err("Please add items to the cart first.".to_string());
    }
    if order_type == OrderType::DineIn && table.is_none() {
        return Err("Please select a table first.".to_string());
    }

    let sums = totals(&cart.items, tax_rate);
    Ok(Order {
        id: new_entity_id(),
        bill_no: make_bill_no(),
        customer_name: cart.customer_name.trim().to_string(),
        table_id: table.map(|t| t.id.clone()),
        table_name: table.map(|t| t.name.clone()),
        date: today_date_string(),
        time: now_time_string(),
        items: cart.items.clone(),
        subtotal: sums.subtotal,
        tax: sums.tax,
        total: sums.total,
        payment_mode,
        order_type,
        staff_name: staff_name.to_string(),
        status: OrderStatus::Completed,
    })
}

/// Canonical ledger order: descending by `(date, time)` parsed as a
/// combined timestamp. Unparseable stamps sort last; ties stay stable.
pub fn canonical_sort(orders: &mut [Order]) {
    orders.sort_by_key(|o| Reverse(parse_order_timestamp(&o.date, &o.time)));
}

#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
}

impl OrderLedger {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Inbound replacement: the snapshot becomes the ledger, re-sorted by
    /// the canonical rule (remote value-of-object order is arbitrary).
    pub fn replace_all(&mut self, mut orders: Vec<Order>) {
        canonical_sort(&mut orders);
        self.orders = orders;
    }

    /// In-place mutation of only the `status` field.
    pub fn update_status(&mut self, order_id: &str, status: OrderStatus) -> Result<Order, String> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| format!("Order not found: {order_id}"))?;
        order.status = status;
        Ok(order.clone())
    }

    /// Irreversible removal. Confirmation is a UI-boundary concern.
    pub fn delete(&mut self, order_id: &str) -> Result<(), String> {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != order_id);
        if self.orders.len() == before {
            return Err(format!("Order not found: {order_id}"));
        }
        Ok(())
    }
}
