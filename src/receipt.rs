//! Plain-text bill rendering for 2-inch thermal paper (32 characters).
//!
//! Printing itself is outside this crate; callers hand the rendered text to
//! whatever print path the host has. Money on the bill is shown in whole
//! rupees; the underlying order keeps full precision.

use crate::models::{Order, RestaurantInfo};

const WIDTH: usize = 32;
const QTY_COL: usize = 4;
const AMT_COL: usize = 7;

fn center(text: &str) -> String {
    let text = truncate(text, WIDTH);
    let pad = (WIDTH.saturating_sub(text.chars().count())) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn divider() -> String {
    "-".repeat(WIDTH)
}

/// Label left, value right, gap-padded to the full width.
fn pair(label: &str, value: &str) -> String {
    let used = label.chars().count() + value.chars().count();
    let gap = WIDTH.saturating_sub(used).max(1);
    format!("{label}{}{value}", " ".repeat(gap))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

/// Greedy word wrap; a word longer than the width is hard-split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn rupees(value: f64) -> String {
    format!("Rs{value:.0}")
}

/// Item row: name in the left column (wrapped), quantity centered, line
/// amount right-aligned on the first line.
fn item_row(name: &str, quantity: u32, amount: f64) -> Vec<String> {
    let name_width = WIDTH - QTY_COL - AMT_COL;
    let qty = format!("{quantity:^QTY_COL$}");
    let amt = format!("{:>AMT_COL$}", format!("{amount:.0}"));
    wrap(name, name_width)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{line:<name_width$}{qty}{amt}")
            } else {
                line
            }
        })
        .collect()
}

/// Render an order as the printed bill. `duplicate` adds the reprint banner
/// used when re-printing from the order list.
pub fn render_receipt(
    order: &Order,
    info: &RestaurantInfo,
    tax_rate: f64,
    duplicate: bool,
) -> String {
    let mut out: Vec<String> = Vec::new();

    out.push(center(&info.name.to_uppercase()));
    for line in wrap(&info.address, WIDTH) {
        out.push(center(&line));
    }
    out.push(center(&format!("Tel: {}", info.phone)));
    out.push(divider());

    if duplicate {
        out.push(center("DUPLICATE BILL"));
        out.push(divider());
    }

    out.push(format!("Bill: {}", order.bill_no));
    if !order.customer_name.is_empty() {
        out.push(format!("Cust: {}", order.customer_name));
    }
    out.push(format!("Date: {}", order.date));
    out.push(format!("Time: {}", order.time));
    out.push(format!("Type: {}", order.order_type.label()));
    if let Some(table_name) = &order.table_name {
        out.push(format!("Table: {table_name}"));
    }
    out.push(divider());

    let name_width = WIDTH - QTY_COL - AMT_COL;
    out.push(format!(
        "{:<name_width$}{:^QTY_COL$}{:>AMT_COL$}",
        "Item", "Qty", "Amt"
    ));
    for item in &order.items {
        let mut name = item.name.clone();
        if !item.selected_addons.is_empty() {
            let addons: Vec<&str> = item.selected_addons.iter().map(|a| a.name.as_str()).collect();
            name.push_str(&format!(" ({})", addons.join(", ")));
        }
        out.extend(item_row(&name, item.quantity, item.price * f64::from(item.quantity)));
    }
    out.push(divider());

    out.push(pair("Subtotal:", &rupees(order.subtotal)));
    out.push(pair(
        &format!("Tax ({:.0}%):", tax_rate * 100.0),
        &rupees(order.tax),
    ));
    out.push(pair("TOTAL:", &rupees(order.total)));
    out.push(divider());

    out.push(center(&format!("Paid via {}", order.payment_mode.label())));
    out.push(String::new());
    out.push(center("Thank you!"));
    out.push(center("Visit again."));

    out.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================
