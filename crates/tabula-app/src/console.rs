// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, warn};

use crate::{
    ColumnType, ComparisonView, ConsoleCommand, ConsoleEvent, FormMode, Notice, PendingAction,
    RenderedTable, RowForm, RowId, Selection, SelectorChoice, ServiceResult, TableRows,
    TableSelector, TableService, append_column, render_comparison, render_table, validate_name,
};

/// Identifies one row load. Only the newest ticket may update the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub table: String,
    pub rows: TableRows,
    pub rendered: RenderedTable,
}

/// Orchestrates one database: owns the selection, the displayed table, and
/// any open form, confirmation, or comparison result.
pub struct DatabaseConsole<S> {
    service: S,
    database: String,
    selector: TableSelector,
    selection: Selection,
    view: Option<TableView>,
    form: Option<RowForm>,
    pending: Option<PendingAction>,
    comparison: Option<ComparisonView>,
    notice: Option<Notice>,
    load_seq: u64,
}

impl<S: TableService> DatabaseConsole<S> {
    pub fn new(service: S, database: impl Into<String>) -> Self {
        Self {
            service,
            database: database.into(),
            selector: TableSelector::default(),
            selection: Selection::NoTableSelected,
            view: None,
            form: None,
            pending: None,
            comparison: None,
            notice: None,
            load_seq: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn selector(&self) -> &TableSelector {
        &self.selector
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> Option<&TableView> {
        self.view.as_ref()
    }

    pub fn form(&self) -> Option<&RowForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut RowForm> {
        self.form.as_mut()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn comparison(&self) -> Option<&ComparisonView> {
        self.comparison.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn dispatch(&mut self, command: ConsoleCommand) -> Vec<ConsoleEvent> {
        debug!(database = %self.database, ?command, "dispatch");
        match command {
            ConsoleCommand::RefreshTables => self.refresh_tables(),
            ConsoleCommand::Select(choice) => {
                let (mut events, ticket) = self.begin_selection(choice);
                if let Some(ticket) = ticket {
                    events.extend(self.run_load(ticket));
                }
                events
            }
            ConsoleCommand::CreateTable(name) => self.create_table(&name),
            ConsoleCommand::Reload => self.reload(),
            ConsoleCommand::OpenAddRow => self.open_add_row(),
            ConsoleCommand::OpenEditRow(row_id) => self.open_edit_row(row_id),
            ConsoleCommand::SubmitRow => self.submit_row(),
            ConsoleCommand::CancelForm => {
                if self.form.take().is_some() {
                    vec![ConsoleEvent::FormClosed]
                } else {
                    Vec::new()
                }
            }
            ConsoleCommand::DeleteRow(row_id) => match self.displayed_table() {
                Ok(table) => self.stage(PendingAction::DeleteRow { table, row_id }),
                Err(event) => vec![event],
            },
            ConsoleCommand::AddColumn { name, column_type } => self.add_column(&name, column_type),
            ConsoleCommand::DeleteColumn(name) => match self.displayed_table() {
                Ok(table) => self.stage(PendingAction::DeleteColumn { table, name }),
                Err(event) => vec![event],
            },
            ConsoleCommand::DeleteTable => match self.selection.table() {
                Some(table) => {
                    let table = table.to_owned();
                    self.stage(PendingAction::DeleteTable(table))
                }
                None => vec![self.set_notice(Notice::error("select a table to delete"))],
            },
            ConsoleCommand::Confirm => self.confirm(),
            ConsoleCommand::Decline => {
                if self.pending.take().is_some() {
                    vec![ConsoleEvent::ConfirmationDeclined]
                } else {
                    Vec::new()
                }
            }
            ConsoleCommand::Compare { left, right } => self.compare(&left, &right),
            ConsoleCommand::DismissComparison => {
                if self.comparison.take().is_some() {
                    vec![ConsoleEvent::ComparisonDismissed]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Applies a selector change. A returned ticket means a row load is
    /// owed; pass its result to [`Self::finish_load`].
    pub fn begin_selection(
        &mut self,
        choice: SelectorChoice,
    ) -> (Vec<ConsoleEvent>, Option<LoadTicket>) {
        match choice {
            SelectorChoice::Placeholder => {
                self.selection = Selection::NoTableSelected;
                self.form = None;
                let mut events = vec![ConsoleEvent::SelectionChanged(self.selection.clone())];
                events.extend(self.clear_view());
                (events, None)
            }
            SelectorChoice::Create => {
                self.selection = Selection::CreatingTable;
                self.selector.hide_placeholder();
                (
                    vec![ConsoleEvent::SelectionChanged(self.selection.clone())],
                    None,
                )
            }
            SelectorChoice::Table(table) => {
                if !self.selector.tables().contains(&table) {
                    warn!(database = %self.database, %table, "selected table is not listed");
                    self.selection = Selection::NoTableSelected;
                    let mut events = self.clear_view();
                    events.push(self.set_notice(Notice::error(format!(
                        "table {table:?} not found -- refresh the table list"
                    ))));
                    return (events, None);
                }
                self.selector.hide_placeholder();
                self.form = None;
                self.pending = None;
                self.selection = Selection::TableSelected(table);
                let mut events = vec![ConsoleEvent::SelectionChanged(self.selection.clone())];
                // The previous table's rows must not stay actionable while
                // the new load is outstanding.
                events.extend(self.clear_view());
                (events, self.begin_load())
            }
        }
    }

    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        let table = self.selection.table()?.to_owned();
        self.load_seq = self.load_seq.wrapping_add(1);
        Some(LoadTicket {
            seq: self.load_seq,
            table,
        })
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: ServiceResult<TableRows>,
    ) -> Vec<ConsoleEvent> {
        if ticket.seq != self.load_seq || self.selection.table() != Some(ticket.table.as_str()) {
            debug!(table = %ticket.table, seq = ticket.seq, "discarding stale row load");
            return vec![ConsoleEvent::StaleLoadDiscarded {
                table: ticket.table,
            }];
        }

        match result {
            Ok(rows) => {
                let count = rows.rows.len();
                let rendered = render_table(&rows.columns, &rows.rows);
                self.view = Some(TableView {
                    table: ticket.table.clone(),
                    rows,
                    rendered,
                });
                vec![ConsoleEvent::RowsLoaded {
                    table: ticket.table,
                    rows: count,
                }]
            }
            Err(error) => {
                warn!(database = %self.database, table = %ticket.table, %error, "row load failed");
                let mut events = self.clear_view();
                events.push(self.set_notice(Notice::error(format!(
                    "failed to load table {:?}: {error}",
                    ticket.table
                ))));
                events
            }
        }
    }

    fn run_load(&mut self, ticket: LoadTicket) -> Vec<ConsoleEvent> {
        let result = self.service.load_rows(&self.database, &ticket.table);
        self.finish_load(ticket, result)
    }

    fn reload(&mut self) -> Vec<ConsoleEvent> {
        match self.begin_load() {
            Some(ticket) => self.run_load(ticket),
            None => Vec::new(),
        }
    }

    fn clear_view(&mut self) -> Vec<ConsoleEvent> {
        if self.view.take().is_some() {
            vec![ConsoleEvent::ViewCleared]
        } else {
            Vec::new()
        }
    }

    fn set_notice(&mut self, notice: Notice) -> ConsoleEvent {
        self.notice = Some(notice.clone());
        ConsoleEvent::Notice(notice)
    }

    fn selected_table(&mut self) -> Result<String, ConsoleEvent> {
        match self.selection.table() {
            Some(table) => Ok(table.to_owned()),
            None => Err(self.set_notice(Notice::error("select a table first"))),
        }
    }

    /// The selected table, provided its rows are the ones on screen. Row ids
    /// and column names only mean something against the view they came from.
    fn displayed_table(&mut self) -> Result<String, ConsoleEvent> {
        let table = self.selected_table()?;
        if self.view.as_ref().is_some_and(|view| view.table == table) {
            Ok(table)
        } else {
            Err(self.set_notice(Notice::error(format!(
                "rows for {table:?} are still loading -- try again once they appear"
            ))))
        }
    }

    fn refresh_tables(&mut self) -> Vec<ConsoleEvent> {
        match self.service.list_tables(&self.database) {
            Ok(tables) => {
                let count = tables.len();
                self.selector.set_tables(tables);
                vec![ConsoleEvent::TablesListed(count)]
            }
            Err(error) => {
                warn!(database = %self.database, %error, "list tables failed");
                vec![self.set_notice(Notice::error(format!("failed to load tables: {error}")))]
            }
        }
    }

    fn create_table(&mut self, raw_name: &str) -> Vec<ConsoleEvent> {
        let name = match validate_name("table", raw_name) {
            Ok(name) => name,
            Err(error) => return vec![self.set_notice(Notice::error(error.to_string()))],
        };

        if let Err(error) = self.service.create_table(&self.database, &name) {
            warn!(database = %self.database, table = %name, %error, "create table failed");
            return vec![self.set_notice(Notice::error(format!(
                "failed to create table: {error}"
            )))];
        }

        self.selector.add_table(&name);
        let mut events = vec![ConsoleEvent::TableRegistered(name.clone())];
        events.extend(self.dispatch(ConsoleCommand::Select(SelectorChoice::Table(name))));
        events
    }

    fn open_add_row(&mut self) -> Vec<ConsoleEvent> {
        let table = match self.selected_table() {
            Ok(table) => table,
            Err(event) => return vec![event],
        };
        match self.service.get_columns(&self.database, &table) {
            Ok(schema) => {
                self.form = Some(RowForm::build(&schema, FormMode::Create, None));
                vec![ConsoleEvent::FormOpened(FormMode::Create)]
            }
            Err(error) => {
                warn!(database = %self.database, %table, %error, "get columns failed");
                vec![self.set_notice(Notice::error(format!("failed to load columns: {error}")))]
            }
        }
    }

    fn open_edit_row(&mut self, row_id: RowId) -> Vec<ConsoleEvent> {
        let table = match self.displayed_table() {
            Ok(table) => table,
            Err(event) => return vec![event],
        };
        let loaded = self
            .service
            .get_columns(&self.database, &table)
            .and_then(|schema| {
                let values = self.service.get_row(&self.database, &table, row_id)?;
                Ok((schema, values))
            });
        match loaded {
            Ok((schema, values)) => {
                let mode = FormMode::Edit(row_id);
                self.form = Some(RowForm::build(&schema, mode, Some(&values)));
                vec![ConsoleEvent::FormOpened(mode)]
            }
            Err(error) => {
                warn!(database = %self.database, %table, %row_id, %error, "open edit failed");
                vec![self.set_notice(Notice::error(format!("failed to load row: {error}")))]
            }
        }
    }

    fn submit_row(&mut self) -> Vec<ConsoleEvent> {
        let Some(table) = self.selection.table().map(str::to_owned) else {
            return vec![ConsoleEvent::SubmitIgnored];
        };
        let Some(form) = self.form.as_mut() else {
            return vec![ConsoleEvent::SubmitIgnored];
        };
        // Dispatch runs the request inline, so this only trips once a
        // submit is handed to a background worker.
        if form.submitting {
            return vec![ConsoleEvent::SubmitIgnored];
        }
        form.submitting = true;
        form.error = None;
        let mode = form.mode;
        let payload = form.payload();

        let result = match mode {
            FormMode::Create => self.service.add_row(&self.database, &table, &payload),
            FormMode::Edit(row_id) => {
                self.service
                    .edit_row(&self.database, &table, row_id, &payload)
            }
        };

        match result {
            Ok(()) => {
                self.form = None;
                let message = match mode {
                    FormMode::Create => "row added",
                    FormMode::Edit(_) => "row updated",
                };
                let mut events = vec![
                    ConsoleEvent::FormClosed,
                    self.set_notice(Notice::info(message)),
                ];
                events.extend(self.reload());
                events
            }
            Err(error) => {
                warn!(database = %self.database, %table, %error, "row submit rejected");
                let message = error.to_string();
                if let Some(form) = self.form.as_mut() {
                    form.submitting = false;
                    form.error = Some(message.clone());
                }
                vec![
                    ConsoleEvent::FormRejected(message.clone()),
                    self.set_notice(Notice::error(message)),
                ]
            }
        }
    }

    fn stage(&mut self, action: PendingAction) -> Vec<ConsoleEvent> {
        self.pending = Some(action.clone());
        vec![ConsoleEvent::ConfirmationRequested(action)]
    }

    fn confirm(&mut self) -> Vec<ConsoleEvent> {
        let Some(action) = self.pending.take() else {
            return Vec::new();
        };

        match action {
            PendingAction::DeleteRow { table, row_id } => {
                if let Err(event) = self.confirm_target(&table) {
                    return vec![event];
                }
                match self.service.delete_row(&self.database, &table, row_id) {
                    Ok(()) => {
                        let mut events = vec![self.set_notice(Notice::info("row deleted"))];
                        events.extend(self.reload());
                        events
                    }
                    Err(error) => {
                        warn!(database = %self.database, %table, %row_id, %error, "delete row failed");
                        let mut events = vec![self.set_notice(Notice::error(format!(
                            "failed to delete row: {error}"
                        )))];
                        if error.is_not_found() {
                            events.extend(self.reload());
                        }
                        events
                    }
                }
            }
            PendingAction::DeleteColumn { table, name } => {
                if let Err(event) = self.confirm_target(&table) {
                    return vec![event];
                }
                match self.service.delete_column(&self.database, &table, &name) {
                    Ok(()) => {
                        let mut events = vec![self.set_notice(Notice::info(format!(
                            "column {name:?} deleted"
                        )))];
                        events.extend(self.reload());
                        events
                    }
                    Err(error) => {
                        warn!(database = %self.database, %table, column = %name, %error, "delete column failed");
                        vec![self.set_notice(Notice::error(format!(
                            "failed to delete column: {error}"
                        )))]
                    }
                }
            }
            PendingAction::DeleteTable(table) => {
                match self.service.delete_table(&self.database, &table) {
                    Ok(()) => {
                        self.selector.remove_table(&table);
                        self.selector.restore_placeholder();
                        self.form = None;
                        let mut events = vec![ConsoleEvent::TableRemoved(table.clone())];
                        if self.selection.table() == Some(table.as_str()) {
                            self.selection = Selection::NoTableSelected;
                            events.push(ConsoleEvent::SelectionChanged(self.selection.clone()));
                            events.extend(self.clear_view());
                        }
                        events.push(
                            self.set_notice(Notice::info(format!("table {table:?} deleted"))),
                        );
                        events
                    }
                    Err(error) => {
                        warn!(database = %self.database, %table, %error, "delete table failed");
                        vec![self.set_notice(Notice::error(format!(
                            "failed to delete table: {error}"
                        )))]
                    }
                }
            }
        }
    }

    fn confirm_target(&mut self, staged: &str) -> Result<(), ConsoleEvent> {
        let current = self.displayed_table()?;
        if current == staged {
            return Ok(());
        }
        warn!(database = %self.database, %staged, %current, "staged delete targets another table");
        Err(self.set_notice(Notice::error(format!(
            "table {staged:?} is no longer on screen -- nothing was deleted"
        ))))
    }

    fn add_column(&mut self, raw_name: &str, column_type: ColumnType) -> Vec<ConsoleEvent> {
        let table = match self.selected_table() {
            Ok(table) => table,
            Err(event) => return vec![event],
        };
        let name = match validate_name("column", raw_name) {
            Ok(name) => name,
            Err(error) => return vec![self.set_notice(Notice::error(error.to_string()))],
        };

        match self
            .service
            .add_column(&self.database, &table, &name, column_type)
        {
            Ok(()) => {
                let mut events = Vec::new();
                if let Some(view) = self.view.as_mut().filter(|view| view.table == table) {
                    append_column(&mut view.rendered, &name);
                    events.push(ConsoleEvent::ColumnAppended(name.clone()));
                }
                events.push(self.set_notice(Notice::info(format!(
                    "column {name:?} ({column_type}) added"
                ))));
                events
            }
            Err(error) => {
                warn!(database = %self.database, %table, column = %name, %error, "add column failed");
                vec![self.set_notice(Notice::error(format!("failed to add column: {error}")))]
            }
        }
    }

    fn compare(&mut self, left: &str, right: &str) -> Vec<ConsoleEvent> {
        match self.service.compare(&self.database, left, right) {
            Ok(result) => {
                let view = render_comparison(left, right, &result);
                let rows = view.body.len();
                self.comparison = Some(view);
                vec![ConsoleEvent::ComparisonReady { rows }]
            }
            Err(error) => {
                warn!(database = %self.database, %left, %right, %error, "compare failed");
                vec![self.set_notice(Notice::error(format!(
                    "error comparing tables: {error}"
                )))]
            }
        }
    }
}
