// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    Char,
    String,
    Time,
    TimeInterval,
}

impl ColumnType {
    pub const ALL: [Self; 6] = [
        Self::Integer,
        Self::Real,
        Self::Char,
        Self::String,
        Self::Time,
        Self::TimeInterval,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Char => "char",
            Self::String => "string",
            Self::Time => "time",
            Self::TimeInterval => "timeInvl",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "integer" => Some(Self::Integer),
            "real" => Some(Self::Real),
            "char" => Some(Self::Char),
            "string" => Some(Self::String),
            "time" => Some(Self::Time),
            "timeInvl" => Some(Self::TimeInterval),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column. The type is kept as the server sent it so that a schema
/// with a type this console does not know still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_name: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            type_name: column_type.as_str().to_owned(),
        }
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::parse(&self.type_name)
    }
}

/// Column name to type mapping, in the order the server listed it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut schema = Self::default();
        for column in columns {
            schema.push(column);
        }
        schema
    }

    /// Appends a column; a repeated name replaces the earlier type in place.
    pub fn push(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => existing.type_name = column.type_name,
            None => self.columns.push(column),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.type_name)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from column name to column type")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut schema = Schema::default();
                while let Some((name, type_name)) = access.next_entry::<String, String>()? {
                    schema.push(Column { name, type_name });
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

pub type RowValues = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default)]
    pub values: RowValues,
}

/// Result of the canonical read path: header order plus every row.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TableRows {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub columns: Schema,
    #[serde(default)]
    pub rows: Vec<RowValues>,
}

/// Body of add-row and edit-row requests. `None` is sent as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RowPayload {
    pub values: BTreeMap<String, Option<String>>,
}

/// Text shown for a cell: empty for null or missing, strings verbatim.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
