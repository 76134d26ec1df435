// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ColumnType, FormMode, RowId};

pub const PLACEHOLDER_LABEL: &str = "-- Select or Create a Table --";
pub const CREATE_LABEL: &str = "+ create table";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    NoTableSelected,
    CreatingTable,
    TableSelected(String),
}

impl Selection {
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::TableSelected(table) => Some(table),
            Self::NoTableSelected | Self::CreatingTable => None,
        }
    }
}

/// One entry of the table selector. `Placeholder` and `Create` are the
/// reserved values; everything else is a real table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorChoice {
    Placeholder,
    Create,
    Table(String),
}

impl SelectorChoice {
    pub fn label(&self) -> &str {
        match self {
            Self::Placeholder => PLACEHOLDER_LABEL,
            Self::Create => CREATE_LABEL,
            Self::Table(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelector {
    tables: Vec<String>,
    show_placeholder: bool,
}

impl Default for TableSelector {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            show_placeholder: true,
        }
    }
}

impl TableSelector {
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn set_tables(&mut self, tables: Vec<String>) {
        self.tables = tables;
    }

    pub fn add_table(&mut self, name: &str) {
        if !self.tables.iter().any(|t| t == name) {
            self.tables.push(name.to_owned());
        }
    }

    pub fn remove_table(&mut self, name: &str) {
        self.tables.retain(|t| t != name);
    }

    pub fn hide_placeholder(&mut self) {
        self.show_placeholder = false;
    }

    pub fn restore_placeholder(&mut self) {
        self.show_placeholder = true;
    }

    pub fn options(&self) -> Vec<SelectorChoice> {
        let mut options = Vec::with_capacity(self.tables.len() + 2);
        if self.show_placeholder {
            options.push(SelectorChoice::Placeholder);
        }
        options.extend(self.tables.iter().cloned().map(SelectorChoice::Table));
        options.push(SelectorChoice::Create);
        options
    }
}

/// Destructive operation waiting for an explicit yes/no. Row and column
/// deletes remember the table whose rows were on screen when staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteRow { table: String, row_id: RowId },
    DeleteColumn { table: String, name: String },
    DeleteTable(String),
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            Self::DeleteRow { .. } => "Delete this row?".to_owned(),
            Self::DeleteColumn { name, .. } => format!("Delete column {name:?}?"),
            Self::DeleteTable(name) => format!("Delete table {name:?}?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    RefreshTables,
    Select(SelectorChoice),
    CreateTable(String),
    Reload,
    OpenAddRow,
    OpenEditRow(RowId),
    SubmitRow,
    CancelForm,
    DeleteRow(RowId),
    AddColumn {
        name: String,
        column_type: ColumnType,
    },
    DeleteColumn(String),
    DeleteTable,
    Confirm,
    Decline,
    Compare {
        left: String,
        right: String,
    },
    DismissComparison,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    TablesListed(usize),
    SelectionChanged(Selection),
    RowsLoaded { table: String, rows: usize },
    StaleLoadDiscarded { table: String },
    ViewCleared,
    FormOpened(FormMode),
    FormRejected(String),
    FormClosed,
    SubmitIgnored,
    ConfirmationRequested(PendingAction),
    ConfirmationDeclined,
    ColumnAppended(String),
    TableRegistered(String),
    TableRemoved(String),
    ComparisonReady { rows: usize },
    ComparisonDismissed,
    Notice(Notice),
}
