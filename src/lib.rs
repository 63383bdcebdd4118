//! Drona POS core.
//!
//! Restaurant point-of-sale engine: menu catalog, per-table carts, checkout
//! into an order ledger, table occupancy, sales analytics, and a sync
//! gateway that mirrors everything to a shared remote JSON store with a
//! SQLite offline cache. A front end (desktop shell, HTTP layer) drives it
//! through [`app::PosApp`] and observes changes via [`state::PosState`]
//! events.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod app;
pub mod cart;
pub mod catalog;
pub mod db;
pub mod models;
pub mod orders;
pub mod receipt;
pub mod remote;
pub mod reports;
pub mod state;
pub mod sync;
pub mod tables;

pub use app::PosApp;
pub use models::{
    Addon, Category, MenuItem, Order, OrderStatus, OrderType, PaymentMode, RestaurantInfo,
    Settings, Table, TableCart, TableStatus, VegChoice, VegPricing,
};
pub use remote::{MemoryRemote, RemoteStore, RestRemote, SyncConfig};
pub use state::{PosState, StateEvent};
pub use sync::SyncGateway;

/// Initialize structured logging: console always, plus a daily rolling file
/// when `log_dir` is given. Call once at process start.
pub fn init_logging(log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drona_pos=debug"));

    let console_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            let file_appender = tracing_appender::rolling::daily(dir, "pos");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            registry.with(file_layer).init();
            // Keep the guard alive for the lifetime of the process; dropping
            // it flushes and stops the writer thread.
            std::mem::forget(_guard);
        }
        None => registry.init(),
    }
}
