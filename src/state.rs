//! Process-wide shared state with subscribe/notify semantics.
//!
//! Every screen reads from this one store; the sync gateway is the sole
//! writer for inbound remote events, local actions write through the app
//! facade. Change notifications fan out over a broadcast channel so views
//! can re-derive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::cart::CartEngine;
use crate::catalog::Catalog;
use crate::models::Settings;
use crate::orders::OrderLedger;
use crate::tables::TableRegistry;

/// Which slice of the store changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    Categories,
    MenuItems,
    Addons,
    Tables,
    Orders,
    TableCarts,
    Settings,
    Connectivity,
}

pub struct PosState {
    pub catalog: Mutex<Catalog>,
    pub tables: Mutex<TableRegistry>,
    pub ledger: Mutex<OrderLedger>,
    pub carts: Mutex<CartEngine>,
    pub settings: Mutex<Settings>,
    online: AtomicBool,
    events: broadcast::Sender<StateEvent>,
}

impl PosState {
    /// Empty store; collections are hydrated from the cache or seeds by the
    /// sync gateway at startup.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        PosState {
            catalog: Mutex::new(Catalog::default()),
            tables: Mutex::new(TableRegistry::default()),
            ledger: Mutex::new(OrderLedger::default()),
            carts: Mutex::new(CartEngine::new()),
            settings: Mutex::new(Settings::default()),
            online: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Broadcast a change. Fine with zero subscribers.
    pub fn notify(&self, event: StateEvent) {
        let _ = self.events.send(event);
    }

    /// Display-only connectivity flag from network presence events. Never
    /// gates whether writes are attempted.
    pub fn set_online(&self, online: bool) {
        if self.online.swap(online, Ordering::Relaxed) != online {
            self.notify(StateEvent::Connectivity);
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

impl Default for PosState {
    fn default() -> Self {
        PosState::new()
    }
}
