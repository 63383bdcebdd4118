//! Catalog store: categories, menu items, and category-scoped addons.
//!
//! Read-mostly; edited through the configuration screens. Deleting a
//! category cascades to every menu item and addon referencing it.

use tracing::debug;

use crate::models::{Addon, Category, MenuItem, VegPricing};

/// Ids removed by a category cascade delete, for outbound null-writes.
#[derive(Debug, Default, PartialEq)]
pub struct CascadeDelete {
    pub menu_item_ids: Vec<String>,
    pub addon_ids: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub menu_items: Vec<MenuItem>,
    pub addons: Vec<Addon>,
}

impl Catalog {
    /// Catalog pre-loaded with the default menu, used on first start before
    /// any cache or remote snapshot exists.
    pub fn seeded() -> Self {
        Catalog {
            categories: seed_categories(),
            menu_items: seed_menu_items(),
            addons: Vec::new(),
        }
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.category(id).map(|c| c.name.as_str())
    }

    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|i| i.id == id)
    }

    pub fn items_in_category(&self, category_id: &str) -> Vec<&MenuItem> {
        self.menu_items
            .iter()
            .filter(|i| i.category_id == category_id)
            .collect()
    }

    /// Addons offered when adding an item from this category.
    pub fn addons_for_category(&self, category_id: &str) -> Vec<&Addon> {
        self.addons
            .iter()
            .filter(|a| a.category_id == category_id)
            .collect()
    }

    pub fn upsert_category(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    /// Remove a category and everything referencing it. Returns the
    /// dependent ids so callers can issue the matching remote deletes.
    pub fn delete_category(&mut self, id: &str) -> CascadeDelete {
        self.categories.retain(|c| c.id != id);

        let mut cascade = CascadeDelete::default();
        self.menu_items.retain(|item| {
            if item.category_id == id {
                cascade.menu_item_ids.push(item.id.clone());
                false
            } else {
                true
            }
        });
        self.addons.retain(|addon| {
            if addon.category_id == id {
                cascade.addon_ids.push(addon.id.clone());
                false
            } else {
                true
            }
        });

        debug!(
            category_id = id,
            items = cascade.menu_item_ids.len(),
            addons = cascade.addon_ids.len(),
            "category cascade delete"
        );
        cascade
    }

    pub fn upsert_menu_item(&mut self, item: MenuItem) {
        match self.menu_items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.menu_items.push(item),
        }
    }

    pub fn delete_menu_item(&mut self, id: &str) {
        self.menu_items.retain(|i| i.id != id);
    }

    pub fn upsert_addon(&mut self, addon: Addon) {
        match self.addons.iter_mut().find(|a| a.id == addon.id) {
            Some(existing) => *existing = addon,
            None => self.addons.push(addon),
        }
    }

    pub fn delete_addon(&mut self, id: &str) {
        self.addons.retain(|a| a.id != id);
    }
}

// ---------------------------------------------------------------------------
// Default menu seed
// ---------------------------------------------------------------------------

fn cat(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn veg(id: &str, name: &str, price: f64, category_id: &str) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
        pricing: VegPricing::Veg { price },
        image: None,
    }
}

fn non_veg(id: &str, name: &str, price: f64, category_id: &str) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
        pricing: VegPricing::NonVeg { price },
        image: None,
    }
}

pub fn seed_categories() -> Vec<Category> {
    vec![
        cat("10", "Power Up W Greens"),
        cat("11", "Eggilicious"),
        cat("12", "Pasta"),
        cat("13", "Sandwiches"),
        cat("14", "Smokin Grill"),
        cat("15", "House of Keema"),
        cat("16", "Wraps Rolls Quesadilla"),
        cat("17", "Meals & More"),
        cat("18", "Beverages"),
        cat("19", "Smoothies & Bowls"),
        cat("20", "Dessert"),
        cat("21", "Add-ons"),
    ]
}

pub fn seed_menu_items() -> Vec<MenuItem> {
    vec![
        veg("g1", "Sprouts Salad", 89.0, "10"),
        veg("g2", "Soya Chunks", 89.0, "10"),
        veg("g3", "Broccoli Corn Salad", 149.0, "10"),
        veg("g4", "Wild Mushrooms", 129.0, "10"),
        veg("g5", "High Protein Salad", 149.0, "10"),
        veg("g6", "Caesar Salad", 149.0, "10"),
        veg("g7", "American Salad", 169.0, "10"),
        veg("g8", "Garden Chickpea Salad", 199.0, "10"),
        veg("g9", "Greens N More", 179.0, "10"),
        non_veg("g10", "Egg Salad", 189.0, "10"),
        non_veg("g11", "Lime Chicken Salad", 189.0, "10"),
        non_veg("g12", "Stir Fried Salad", 189.0, "10"),
        veg("g13", "Hummus Salad", 199.0, "10"),
        non_veg("g14", "Chicken Curry Salad", 199.0, "10"),
        non_veg("e1", "Boil Eggs (Pack of 5)", 49.0, "11"),
        non_veg("e2", "Sunny Side Up", 79.0, "11"),
        non_veg("e3", "Scrambled Eggs (3 eggs)", 89.0, "11"),
        non_veg("e4", "Mushroom Scrambled Eggs", 119.0, "11"),
        non_veg("e5", "Chicken Scrambled Eggs", 129.0, "11"),
        non_veg("e6", "Omelet", 79.0, "11"),
        non_veg("e7", "Chicken Omelet", 129.0, "11"),
        veg("p1", "Burnt Garlic Pasta", 179.0, "12"),
        veg("p2", "White Sauce Pasta", 229.0, "12"),
        veg("p3", "Peri Peri Pasta", 229.0, "12"),
        veg("p4", "Pesto Pasta", 289.0, "12"),
        veg("p5", "Mexico Pasta", 289.0, "12"),
        veg("s1", "Russian Sandwich", 59.0, "13"),
        veg("s2", "Peanut Butter Sandwich", 69.0, "13"),
        non_veg("s3", "Chicken Russian Sandwich", 89.0, "13"),
        non_veg("s4", "Egg Russian Sandwich", 79.0, "13"),
        non_veg("s5", "Eggwich", 69.0, "13"),
        veg("s6", "Veg Protein Sandwich (Soya)", 69.0, "13"),
        veg("s7", "Paneer Sandwich", 79.0, "13"),
        veg("s8", "Mushroom Sandwich", 79.0, "13"),
        non_veg("s9", "Chicken Sandwich", 79.0, "13"),
        veg("s10", "Hummus Sandwich", 139.0, "13"),
        veg("s11", "Veg Keema Sandwich", 139.0, "13"),
        non_veg("s12", "Chicken Keema Sandwich", 149.0, "13"),
        non_veg("s13", "Egg Keema Sandwich", 129.0, "13"),
        non_veg("s14", "Chicken Salami Sandwich", 149.0, "13"),
        veg("s15", "Open Pesto Toast", 169.0, "13"),
        veg("s16", "Avocado Open Toast", 199.0, "13"),
        non_veg("sg1", "Egg Grilled", 119.0, "14"),
        veg("sg2", "Soya Grilled", 119.0, "14"),
        veg("sg3", "Paneer Grilled", 159.0, "14"),
        non_veg("sg4", "Chicken Grilled", 179.0, "14"),
        non_veg("sg5", "Fish Grilled", 249.0, "14"),
        non_veg("hk1", "Egg Keema", 179.0, "15"),
        veg("hk2", "Soya Mushroom Keema", 199.0, "15"),
        veg("hk3", "Paneer Keema", 249.0, "15"),
        non_veg("hk4", "Chicken Keema", 249.0, "15"),
        veg("wr1", "Fiery Grilled Paneer Wrap", 199.0, "16"),
        non_veg("wr2", "Fiery Grilled Chicken Wrap", 199.0, "16"),
        non_veg("wr3", "Fiery Grilled Fish Wrap", 299.0, "16"),
        non_veg("wr4", "Egg Roll", 199.0, "16"),
        non_veg("wr5", "Chicken Salami Roll", 249.0, "16"),
        veg("wr6", "Falafel Hummus Roll", 249.0, "16"),
        veg("wr7", "Mexican Paneer Roll", 269.0, "16"),
        non_veg("wr8", "Mexican Chicken Roll", 269.0, "16"),
        non_veg("wr9", "Mexican Fish Roll", 349.0, "16"),
        veg("wr10", "Paneer Quesadilla", 279.0, "16"),
    ]
}
