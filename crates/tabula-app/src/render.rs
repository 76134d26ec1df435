// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ComparisonResult, Row, RowId, display_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Delete,
    Edit,
}

impl RowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delete => "D",
            Self::Edit => "E",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRow {
    pub row_id: RowId,
    pub cells: Vec<String>,
    pub height: u16,
}

/// Action block drawn beside a data row; `height` always equals the data
/// row's height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowActions {
    pub row_id: RowId,
    pub height: u16,
    pub actions: [RowAction; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedTable {
    pub header: Vec<String>,
    pub body: Vec<BodyRow>,
    pub actions: Vec<RowActions>,
}

impl RenderedTable {
    pub fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.body.get(index).map(|row| row.row_id)
    }
}

pub fn render_table(columns: &[String], rows: &[Row]) -> RenderedTable {
    let body = rows
        .iter()
        .map(|row| {
            let cells = columns
                .iter()
                .map(|column| display_value(row.values.get(column)))
                .collect::<Vec<_>>();
            BodyRow {
                row_id: row.id,
                height: row_height(&cells),
                cells,
            }
        })
        .collect::<Vec<_>>();

    let actions = body
        .iter()
        .map(|row| RowActions {
            row_id: row.row_id,
            height: row.height,
            actions: [RowAction::Delete, RowAction::Edit],
        })
        .collect();

    RenderedTable {
        header: columns.to_vec(),
        body,
        actions,
    }
}

/// Appends an empty cell to every row for a freshly added column.
pub fn append_column(table: &mut RenderedTable, name: &str) {
    table.header.push(name.to_owned());
    for row in &mut table.body {
        row.cells.push(String::new());
    }
}

fn row_height(cells: &[String]) -> u16 {
    cells
        .iter()
        .map(|cell| cell.lines().count())
        .max()
        .unwrap_or(1)
        .clamp(1, u16::MAX as usize) as u16
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonView {
    pub left: String,
    pub right: String,
    pub header: Vec<String>,
    pub body: Vec<Vec<String>>,
}

pub fn render_comparison(left: &str, right: &str, result: &ComparisonResult) -> ComparisonView {
    let header = result.columns.names();
    let body = result
        .rows
        .iter()
        .map(|row| {
            header
                .iter()
                .map(|column| display_value(row.get(column)))
                .collect()
        })
        .collect();

    ComparisonView {
        left: left.to_owned(),
        right: right.to_owned(),
        header,
        body,
    }
}
