// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Value, json};
use tabula_app::{ColumnType, RowValues};

use crate::{Store, StoreResult};

pub const DEMO_DATABASE: &str = "warehouse";

const PRODUCTS: [&str; 12] = [
    "Hex Bolt",
    "Wing Nut",
    "Flat Washer",
    "Wood Screw",
    "Anchor Plug",
    "Hinge",
    "Drawer Slide",
    "Cable Tie",
    "Pipe Clamp",
    "Spring Pin",
    "Rivet",
    "Shelf Bracket",
];

const FIRST_NAMES: [&str; 10] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Quinn", "Parker", "Rowan", "Hayden",
];
const LAST_NAMES: [&str; 10] = [
    "Walker", "Martin", "Evans", "Lopez", "Gray", "Reed", "Turner", "Price", "Foster", "Brooks",
];

const GRADES: [&str; 4] = ["A", "B", "C", "D"];

const INVENTORY_COLUMNS: [(&str, ColumnType); 5] = [
    ("product", ColumnType::String),
    ("quantity", ColumnType::Integer),
    ("unit_price", ColumnType::Real),
    ("grade", ColumnType::Char),
    ("restocked_at", ColumnType::Time),
];

const STAFF_COLUMNS: [(&str, ColumnType); 3] = [
    ("name", ColumnType::String),
    ("age", ColumnType::Integer),
    ("shift", ColumnType::TimeInterval),
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Generates plausible rows for the demo tables. Same seed, same rows.
#[derive(Debug, Clone)]
pub struct WarehouseFaker {
    rng: DeterministicRng,
}

impl WarehouseFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn inventory_row(&mut self) -> RowValues {
        let product = self.pick(&PRODUCTS);
        let quantity = self.int_range(0, 500);
        let cents = self.int_range(5, 4_999);
        let grade = self.pick(&GRADES);
        let hour = self.int_range(6, 18);
        let minute = self.int_range(0, 59);
        to_values(json!({
            "product": product,
            "quantity": quantity.to_string(),
            "unit_price": format!("{}.{:02}", cents / 100, cents % 100),
            "grade": grade,
            "restocked_at": format!("{hour}:{minute:02}:00"),
        }))
    }

    pub fn staff_row(&mut self) -> RowValues {
        let name = format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES));
        let age = self.int_range(18, 67);
        let start = self.int_range(6, 12);
        let length = self.int_range(4, 9);
        to_values(json!({
            "name": name,
            "age": age.to_string(),
            "shift": format!("{start}:00:00-{}:00:00", start + length),
        }))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

fn to_values(value: Value) -> RowValues {
    match value {
        Value::Object(map) => map,
        _ => RowValues::new(),
    }
}

/// Builds the demo database: `inventory`, an `inventory_archive` that shares
/// most of its rows, and `staff`.
pub fn seed_demo(store: &mut Store, seed: u64) -> StoreResult<()> {
    let mut faker = WarehouseFaker::new(seed);
    store.create_database(DEMO_DATABASE)?;

    for (table, columns) in [
        ("inventory", &INVENTORY_COLUMNS[..]),
        ("inventory_archive", &INVENTORY_COLUMNS[..]),
        ("staff", &STAFF_COLUMNS[..]),
    ] {
        store.create_table(DEMO_DATABASE, table)?;
        for (name, column_type) in columns {
            store.add_column(DEMO_DATABASE, table, name, column_type.as_str())?;
        }
    }

    for index in 0..12 {
        let row = faker.inventory_row();
        store.add_row(DEMO_DATABASE, "inventory", &row)?;
        if index % 4 != 0 {
            store.add_row(DEMO_DATABASE, "inventory_archive", &row)?;
        }
    }
    for _ in 0..6 {
        let row = faker.staff_row();
        store.add_row(DEMO_DATABASE, "staff", &row)?;
    }
    Ok(())
}

pub fn demo_store(seed: u64) -> StoreResult<Store> {
    let mut store = Store::default();
    seed_demo(&mut store, seed)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::{DEMO_DATABASE, WarehouseFaker, demo_store};

    #[test]
    fn same_seed_same_rows() {
        let mut left = WarehouseFaker::new(42);
        let mut right = WarehouseFaker::new(42);
        assert_eq!(left.inventory_row(), right.inventory_row());
        assert_eq!(left.staff_row(), right.staff_row());
    }

    #[test]
    fn demo_store_passes_server_validation() {
        let store = demo_store(7).expect("demo data should be valid");
        assert_eq!(store.list_databases(), vec![DEMO_DATABASE]);
        assert_eq!(
            store.list_tables(DEMO_DATABASE).expect("tables"),
            vec!["inventory", "inventory_archive", "staff"]
        );
        let inventory = store.rows(DEMO_DATABASE, "inventory").expect("rows");
        assert_eq!(inventory.rows.len(), 12);
        assert_eq!(
            store
                .rows(DEMO_DATABASE, "staff")
                .expect("staff rows")
                .rows
                .len(),
            6
        );
    }

    #[test]
    fn archive_differs_by_a_few_rows() {
        let store = demo_store(7).expect("demo data should be valid");
        let diff = store
            .compare(DEMO_DATABASE, "inventory", "inventory_archive")
            .expect("same columns");
        assert!(!diff.rows.is_empty());
        assert!(diff.rows.len() <= 3);
    }
}
