// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Number, Value};
use tabula_app::{
    Column, ColumnType, ComparisonResult, Row, RowId, RowValues, Schema, TableRows,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Malformed(String),
}

impl StoreError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Invalid(_) => 400,
            Self::Malformed(_) => 422,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
struct StoredTable {
    name: String,
    schema: Schema,
    rows: Vec<Row>,
    next_id: i64,
}

impl StoredTable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            schema: Schema::default(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn row_mut(&mut self, row_id: RowId) -> StoreResult<&mut Row> {
        self.rows
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or_else(|| StoreError::NotFound("row not found".to_owned()))
    }
}

#[derive(Debug, Clone)]
struct StoredDatabase {
    name: String,
    tables: Vec<StoredTable>,
}

/// In-memory databases with the table server's validation rules.
#[derive(Debug, Clone, Default)]
pub struct Store {
    databases: Vec<StoredDatabase>,
}

impl Store {
    pub fn list_databases(&self) -> Vec<String> {
        self.databases.iter().map(|db| db.name.clone()).collect()
    }

    pub fn create_database(&mut self, name: &str) -> StoreResult<()> {
        require_name("database", name)?;
        if self.databases.iter().any(|db| db.name == name) {
            return Err(StoreError::Invalid("database already exists".to_owned()));
        }
        self.databases.push(StoredDatabase {
            name: name.to_owned(),
            tables: Vec::new(),
        });
        Ok(())
    }

    pub fn list_tables(&self, database: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .database(database)?
            .tables
            .iter()
            .map(|table| table.name.clone())
            .collect())
    }

    pub fn create_table(&mut self, database: &str, table: &str) -> StoreResult<()> {
        let db = self.database_mut(database)?;
        require_name("table", table)?;
        if db.tables.iter().any(|t| t.name == table) {
            return Err(StoreError::Invalid("table already exists".to_owned()));
        }
        db.tables.push(StoredTable::new(table));
        Ok(())
    }

    pub fn delete_table(&mut self, database: &str, table: &str) -> StoreResult<()> {
        let db = self.database_mut(database)?;
        let before = db.tables.len();
        db.tables.retain(|t| t.name != table);
        if db.tables.len() == before {
            return Err(table_not_found());
        }
        Ok(())
    }

    pub fn columns(&self, database: &str, table: &str) -> StoreResult<Schema> {
        Ok(self.table(database, table)?.schema.clone())
    }

    pub fn rows(&self, database: &str, table: &str) -> StoreResult<TableRows> {
        let table = self.table(database, table)?;
        Ok(TableRows {
            columns: table.schema.names(),
            rows: table.rows.clone(),
        })
    }

    pub fn row(&self, database: &str, table: &str, row_id: RowId) -> StoreResult<RowValues> {
        self.table(database, table)?
            .rows
            .iter()
            .find(|row| row.id == row_id)
            .map(|row| row.values.clone())
            .ok_or_else(|| StoreError::NotFound("row not found".to_owned()))
    }

    /// Adds a column; existing rows get `null` for it.
    pub fn add_column(
        &mut self,
        database: &str,
        table: &str,
        name: &str,
        type_name: &str,
    ) -> StoreResult<()> {
        let table = self.table_mut(database, table)?;
        require_name("column", name)?;
        let column_type = ColumnType::parse(type_name).ok_or_else(|| {
            StoreError::Invalid(format!("unknown column type {type_name:?}"))
        })?;
        if table.schema.contains(name) {
            return Err(StoreError::Invalid("column already exists".to_owned()));
        }
        table.schema.push(Column::new(name, column_type));
        for row in &mut table.rows {
            row.values.insert(name.to_owned(), Value::Null);
        }
        Ok(())
    }

    /// Drops a column, then any row left with nothing but nulls.
    pub fn delete_column(&mut self, database: &str, table: &str, name: &str) -> StoreResult<()> {
        let table = self.table_mut(database, table)?;
        if !table.schema.contains(name) {
            return Err(StoreError::NotFound(format!("column {name:?} not found")));
        }
        let remaining = table
            .schema
            .columns()
            .iter()
            .filter(|column| column.name != name)
            .cloned()
            .collect();
        table.schema = Schema::new(remaining);
        for row in &mut table.rows {
            row.values.remove(name);
        }
        table
            .rows
            .retain(|row| row.values.values().any(|value| !value.is_null()));
        Ok(())
    }

    pub fn add_row(
        &mut self,
        database: &str,
        table: &str,
        submitted: &RowValues,
    ) -> StoreResult<RowId> {
        let table = self.table_mut(database, table)?;
        if table.schema.is_empty() {
            return Err(StoreError::Invalid(
                "cannot add a row -- create at least one column first".to_owned(),
            ));
        }
        let values = normalize_row(&table.schema, submitted)?;
        let id = RowId::new(table.next_id);
        table.next_id += 1;
        table.rows.push(Row { id, values });
        Ok(id)
    }

    pub fn edit_row(
        &mut self,
        database: &str,
        table: &str,
        row_id: RowId,
        submitted: &RowValues,
    ) -> StoreResult<()> {
        let table = self.table_mut(database, table)?;
        let values = normalize_row(&table.schema, submitted)?;
        table.row_mut(row_id)?.values = values;
        Ok(())
    }

    pub fn delete_row(&mut self, database: &str, table: &str, row_id: RowId) -> StoreResult<()> {
        let table = self.table_mut(database, table)?;
        let before = table.rows.len();
        table.rows.retain(|row| row.id != row_id);
        if table.rows.len() == before {
            return Err(StoreError::NotFound("row not found".to_owned()));
        }
        Ok(())
    }

    /// Rows of `left` with no equal-valued row in `right`.
    pub fn compare(&self, database: &str, left: &str, right: &str) -> StoreResult<ComparisonResult> {
        let db = self.database(database)?;
        let find = |name: &str| db.tables.iter().find(|t| t.name == name);
        let (Some(a), Some(b)) = (find(left), find(right)) else {
            return Err(StoreError::NotFound(
                "one or both tables not found".to_owned(),
            ));
        };
        if !same_columns(&a.schema, &b.schema) {
            return Err(StoreError::Invalid(
                "tables have different columns -- choose other tables".to_owned(),
            ));
        }
        if a.name == b.name {
            return Err(StoreError::Invalid(
                "choose two different tables to compare".to_owned(),
            ));
        }

        let rows = a
            .rows
            .iter()
            .filter(|row| !b.rows.iter().any(|other| other.values == row.values))
            .map(|row| row.values.clone())
            .collect();
        Ok(ComparisonResult {
            columns: a.schema.clone(),
            rows,
        })
    }

    fn database(&self, name: &str) -> StoreResult<&StoredDatabase> {
        self.databases
            .iter()
            .find(|db| db.name == name)
            .ok_or_else(database_not_found)
    }

    fn database_mut(&mut self, name: &str) -> StoreResult<&mut StoredDatabase> {
        self.databases
            .iter_mut()
            .find(|db| db.name == name)
            .ok_or_else(database_not_found)
    }

    fn table(&self, database: &str, table: &str) -> StoreResult<&StoredTable> {
        self.database(database)?
            .tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(table_not_found)
    }

    fn table_mut(&mut self, database: &str, table: &str) -> StoreResult<&mut StoredTable> {
        self.database_mut(database)?
            .tables
            .iter_mut()
            .find(|t| t.name == table)
            .ok_or_else(table_not_found)
    }
}

fn database_not_found() -> StoreError {
    StoreError::NotFound("database not found".to_owned())
}

fn table_not_found() -> StoreError {
    StoreError::NotFound("table not found".to_owned())
}

fn require_name(kind: &str, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Invalid(format!(
            "{kind} name is required -- enter a name and retry"
        )));
    }
    Ok(())
}

fn same_columns(a: &Schema, b: &Schema) -> bool {
    a.len() == b.len()
        && a.columns().iter().all(|column| {
            b.get(&column.name)
                .is_some_and(|other| other.type_name == column.type_name)
        })
}

/// Trims, nulls blanks, and converts each submitted value to its stored
/// form. Columns left out of the submission are stored as `null`.
fn normalize_row(schema: &Schema, submitted: &RowValues) -> StoreResult<RowValues> {
    let mut values: RowValues = schema
        .columns()
        .iter()
        .map(|column| (column.name.clone(), Value::Null))
        .collect();
    let mut invalid = Vec::new();
    let mut all_empty = true;

    for (name, raw) in submitted {
        let Some(column) = schema.get(name) else {
            return Err(StoreError::Invalid(format!("column {name:?} not found")));
        };
        let column_type = column.column_type();
        let Some(text) = submitted_text(raw, column_type) else {
            continue;
        };
        all_empty = false;
        match convert_cell(column_type, &text) {
            Some(value) => {
                values.insert(name.clone(), value);
            }
            None => invalid.push(name.clone()),
        }
    }

    if all_empty {
        return Err(StoreError::Invalid(
            "all fields are empty -- enter at least one value".to_owned(),
        ));
    }
    if !invalid.is_empty() {
        return Err(StoreError::Invalid(format!(
            "invalid data type in columns: {}",
            invalid.join(", ")
        )));
    }
    Ok(values)
}

fn submitted_text(raw: &Value, column_type: Option<ColumnType>) -> Option<String> {
    let text = match raw {
        Value::Null => return None,
        Value::String(text) => text.trim().to_owned(),
        other => other.to_string(),
    };
    if text.is_empty() || (column_type == Some(ColumnType::TimeInterval) && text == "-") {
        return None;
    }
    Some(text)
}

fn convert_cell(column_type: Option<ColumnType>, text: &str) -> Option<Value> {
    match column_type {
        Some(ColumnType::Integer) => text.parse::<i64>().ok().map(Value::from),
        Some(ColumnType::Real) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Some(ColumnType::Char) => (text.chars().count() == 1).then(|| Value::from(text)),
        Some(ColumnType::Time) => parse_time(text).map(|_| Value::from(text)),
        Some(ColumnType::TimeInterval) => {
            let (start, end) = text.split_once('-')?;
            let start = parse_time(start)?;
            let end = parse_time(end)?;
            (end >= start).then(|| Value::from(text))
        }
        Some(ColumnType::String) | None => Some(Value::from(text)),
    }
}

/// Parses `H:MM:SS` (one to three hour digits) into seconds.
fn parse_time(text: &str) -> Option<u32> {
    let mut parts = text.split(':');
    let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(hours, 1, 3) || !digits(minutes, 2, 2) || !digits(seconds, 2, 2) {
        return None;
    }
    let (hours, minutes, seconds): (u32, u32, u32) =
        (hours.parse().ok()?, minutes.parse().ok()?, seconds.parse().ok()?);
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}
