//! Table registry: named seating units with an explicit status state machine.
//!
//! Status transitions are driven by named events applied in one place
//! instead of being inferred from cart emptiness at every call site:
//! `ItemAdded` seats a table, `CartEmptied` releases it, `OrderCommitted`
//! releases it and clears the active order link.

use tracing::debug;

use crate::models::{new_entity_id, Table, TableStatus};

/// Named events that drive table status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A line was added to the table's cart.
    ItemAdded,
    /// The table's cart dropped to zero lines.
    CartEmptied,
    /// The table's cart was committed into an order.
    OrderCommitted,
}

#[derive(Debug, Default, Clone)]
pub struct TableRegistry {
    pub tables: Vec<Table>,
}

impl TableRegistry {
    /// Fixed default seating: six tables T-1..T-6, all available. Used on
    /// first start before any cache or remote snapshot exists.
    pub fn seeded() -> Self {
        let tables = (1..=6)
            .map(|n| Table {
                id: format!("t{n}"),
                name: format!("T-{n}"),
                status: TableStatus::Available,
                current_order_id: None,
            })
            .collect();
        TableRegistry { tables }
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, name: &str) -> Table {
        let table = Table {
            id: new_entity_id(),
            name: name.trim().to_string(),
            status: TableStatus::Available,
            current_order_id: None,
        };
        self.tables.push(table.clone());
        table
    }

    /// Delete a table. Only permitted while it is available.
    pub fn delete(&mut self, id: &str) -> Result<(), String> {
        let table = self
            .table(id)
            .ok_or_else(|| format!("Table not found: {id}"))?;
        if table.status != TableStatus::Available {
            return Err("Cannot delete a table that is occupied or reserved.".to_string());
        }
        self.tables.retain(|t| t.id != id);
        Ok(())
    }

    /// Explicit staff override (e.g. marking a table reserved).
    pub fn set_status(
        &mut self,
        id: &str,
        status: TableStatus,
        current_order_id: Option<String>,
    ) -> Result<Table, String> {
        let table = self
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| format!("Table not found: {id}"))?;
        table.status = status;
        table.current_order_id = current_order_id;
        Ok(table.clone())
    }

    /// Apply a named event to a table. Returns the updated table when the
    /// event changed anything, so callers can mirror it to the remote store.
    pub fn apply_event(&mut self, id: &str, event: TableEvent) -> Option<Table> {
        let table = self.tables.iter_mut().find(|t| t.id == id)?;
        let before = (table.status, table.current_order_id.clone());
        match event {
            TableEvent::ItemAdded => {
                if table.status == TableStatus::Available {
                    table.status = TableStatus::Occupied;
                }
            }
            TableEvent::CartEmptied => {
                if table.status == TableStatus::Occupied {
                    table.status = TableStatus::Available;
                    table.current_order_id = None;
                }
            }
            TableEvent::OrderCommitted => {
                table.status = TableStatus::Available;
                table.current_order_id = None;
            }
        }
        if (table.status, table.current_order_id.clone()) == before {
            return None;
        }
        debug!(table_id = id, status = ?table.status, "table transition");
        Some(table.clone())
    }

    pub fn replace_all(&mut self, tables: Vec<Table>) {
        self.tables = tables;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_registry() {
        let registry = TableRegistry::seeded();
        assert_eq!(registry.tables.len(), 6);
        assert_eq!(registry.tables[0].name, "T-1");
        assert_eq!(registry.tables[5].name, "T-6");
        assert!(registry
            .tables
            .iter()
            .all(|t| t.status == TableStatus::Available));
    }

    #[test]
    fn test_item_added_seats_available_table() {
        let mut registry = TableRegistry::seeded();
        let updated = registry.apply_event("t1", TableEvent::ItemAdded).unwrap();
        assert_eq!(updated.status, TableStatus::Occupied);

        // Already occupied: no transition, nothing to mirror.
        assert!(registry.apply_event("t1", TableEvent::ItemAdded).is_none());
    }

    #[test]
    fn test_item_added_leaves_reserved_table() {
        let mut registry = TableRegistry::seeded();
        registry
            .set_status("t2", TableStatus::Reserved, None)
            .unwrap();
        assert!(registry.apply_event("t2", TableEvent::ItemAdded).is_none());
        assert_eq!(registry.table("t2").unwrap().status, TableStatus::Reserved);
    }

    #[test]
    fn test_cart_emptied_releases_occupied_table() {
        let mut registry = TableRegistry::seeded();
        registry.apply_event("t3", TableEvent::ItemAdded);
        let updated = registry.apply_event("t3", TableEvent::CartEmptied).unwrap();
        assert_eq!(updated.status, TableStatus::Available);
        assert!(updated.current_order_id.is_none());

        // Idempotent on an already-available table.
        assert!(registry.apply_event("t3", TableEvent::CartEmptied).is_none());
    }

    #[test]
    fn test_order_committed_releases_and_clears_order_link() {
        let mut registry = TableRegistry::seeded();
        registry
            .set_status("t4", TableStatus::Occupied, Some("ord1".to_string()))
            .unwrap();
        let updated = registry
            .apply_event("t4", TableEvent::OrderCommitted)
            .unwrap();
        assert_eq!(updated.status, TableStatus::Available);
        assert!(updated.current_order_id.is_none());
    }

    #[test]
    fn test_delete_only_when_available() {
        let mut registry = TableRegistry::seeded();
        registry.apply_event("t1", TableEvent::ItemAdded);
        assert!(registry.delete("t1").is_err());

        registry.apply_event("t1", TableEvent::CartEmptied);
        assert!(registry.delete("t1").is_ok());
        assert_eq!(registry.tables.len(), 5);
    }
}
