// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tabula_app::{
    ColumnFormInput, ColumnType, CompareFormInput, ComparisonView, ConsoleCommand, ConsoleEvent,
    DatabaseConsole, DatabaseDirectory, DatabaseService, LoadTicket, Notice, NoticeLevel,
    PendingAction, RowForm, RowId, Selection, SelectorChoice, ServiceResult, TableRows,
    TableService,
};
use tracing::{debug, warn};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const ACTIONS_WIDTH: u16 = 8;

/// Backend seam for the terminal console.
pub trait ConsoleRuntime {
    type Service: TableService + DatabaseService;

    /// A fresh handle on the backend. Cheap to call.
    fn service(&self) -> Self::Service;

    /// Loads rows for `ticket` and reports back over `tx`. The default runs
    /// inline; runtimes with a `Send` service should move this off-thread.
    fn spawn_load(
        &mut self,
        database: &str,
        ticket: LoadTicket,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.service().load_rows(database, &ticket.table);
        tx.send(InternalEvent::RowsLoaded {
            database: database.to_owned(),
            ticket,
            result,
        })
        .map_err(|_| anyhow!("row load channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    RowsLoaded {
        database: String,
        ticket: LoadTicket,
        result: ServiceResult<TableRows>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Selector,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ComparePicker {
    left: usize,
    right: usize,
    editing_right: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Help,
    ColumnForm(ColumnFormInput),
    Compare(ComparePicker),
    CreateDatabase(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleIntent {
    Up,
    Down,
    Left,
    Right,
    ToggleFocus,
    Back,
    Choose,
    AddRow,
    EditRow,
    DeleteRow,
    AddColumn,
    DeleteColumn,
    DeleteTable,
    Reload,
    Compare,
    Databases,
    Help,
    Quit,
}

struct ViewData<S> {
    directory: DatabaseDirectory,
    console: Option<DatabaseConsole<S>>,
    focus: Focus,
    selector_cursor: usize,
    selected_row: usize,
    selected_col: usize,
    table_name_input: String,
    overlay: Option<Overlay>,
    status: Option<Notice>,
    status_token: u64,
}

impl<S> ViewData<S> {
    fn new() -> Self {
        Self {
            directory: DatabaseDirectory::default(),
            console: None,
            focus: Focus::Selector,
            selector_cursor: 0,
            selected_row: 0,
            selected_col: 0,
            table_name_input: String::new(),
            overlay: None,
            status: None,
            status_token: 0,
        }
    }
}

/// Runs the console until the operator quits. Opens `database` directly when
/// given, otherwise starts on the database picker.
pub fn run_app<R: ConsoleRuntime>(runtime: &mut R, database: Option<&str>) -> Result<()> {
    let mut view = ViewData::new();
    let (internal_tx, internal_rx) = mpsc::channel();

    refresh_directory(runtime, &mut view, &internal_tx);
    if let Some(database) = database {
        open_database(runtime, &mut view, &internal_tx, database);
    }

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut result = Ok(());
    loop {
        process_internal_events(&mut view, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(runtime, &mut view, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<S: TableService>(
    view: &mut ViewData<S>,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view.status_token => {
                view.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::RowsLoaded {
                database,
                ticket,
                result,
            } => {
                let Some(console) = view.console.as_mut() else {
                    continue;
                };
                if console.database() != database {
                    debug!(%database, table = %ticket.table, "dropping rows for a closed database");
                    continue;
                }
                let events = console.finish_load(ticket, result);
                apply_events(view, tx, events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status<S>(view: &mut ViewData<S>, internal_tx: &Sender<InternalEvent>, notice: Notice) {
    view.status = Some(notice);
    view.status_token = view.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view.status_token);
}

fn refresh_directory<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
) {
    if let Err(error) = view.directory.refresh(&runtime.service()) {
        warn!(error = %format!("{error:#}"), "database listing failed");
        emit_status(view, tx, Notice::error(format!("{error:#}")));
    }
}

fn open_database<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    database: &str,
) {
    debug!(database, "opening database");
    view.directory.select(database);
    view.console = Some(DatabaseConsole::new(runtime.service(), database));
    view.focus = Focus::Selector;
    view.selector_cursor = 0;
    view.selected_row = 0;
    view.selected_col = 0;
    view.table_name_input.clear();
    dispatch(view, tx, ConsoleCommand::RefreshTables);
}

fn dispatch<S: TableService>(
    view: &mut ViewData<S>,
    tx: &Sender<InternalEvent>,
    command: ConsoleCommand,
) {
    let Some(console) = view.console.as_mut() else {
        return;
    };
    let events = console.dispatch(command);
    apply_events(view, tx, events);
}

fn apply_events<S: TableService>(
    view: &mut ViewData<S>,
    tx: &Sender<InternalEvent>,
    events: Vec<ConsoleEvent>,
) {
    for event in events {
        match event {
            ConsoleEvent::Notice(notice) => emit_status(view, tx, notice),
            ConsoleEvent::ViewCleared => {
                view.selected_row = 0;
                view.selected_col = 0;
            }
            ConsoleEvent::TableRegistered(_) => view.table_name_input.clear(),
            ConsoleEvent::SelectionChanged(Selection::TableSelected(_)) => {
                view.selected_row = 0;
                view.selected_col = 0;
            }
            _ => {}
        }
    }
    clamp_table_cursor(view);
    sync_selector_cursor(view);
}

fn clamp_table_cursor<S: TableService>(view: &mut ViewData<S>) {
    let (rows, columns) = view
        .console
        .as_ref()
        .and_then(DatabaseConsole::view)
        .map_or((0, 0), |table| {
            (table.rendered.body.len(), table.rendered.header.len())
        });
    view.selected_row = view.selected_row.min(rows.saturating_sub(1));
    view.selected_col = view.selected_col.min(columns.saturating_sub(1));
}

fn sync_selector_cursor<S: TableService>(view: &mut ViewData<S>) {
    let Some(console) = view.console.as_ref() else {
        return;
    };
    let options = console.selector().options();
    let current = match console.selection() {
        Selection::NoTableSelected => SelectorChoice::Placeholder,
        Selection::CreatingTable => SelectorChoice::Create,
        Selection::TableSelected(table) => SelectorChoice::Table(table.clone()),
    };
    view.selector_cursor = options
        .iter()
        .position(|option| *option == current)
        .unwrap_or_else(|| view.selector_cursor.min(options.len().saturating_sub(1)));
}

/// Applies a selector choice. Row loads run through the runtime so a slow
/// backend never blocks key handling.
fn choose<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    choice: SelectorChoice,
) {
    let Some(console) = view.console.as_mut() else {
        return;
    };
    let database = console.database().to_owned();
    let (events, ticket) = console.begin_selection(choice);
    apply_events(view, tx, events);
    if let Some(ticket) = ticket {
        spawn_load(runtime, view, tx, &database, ticket);
    }
}

fn reload<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
) {
    let Some(console) = view.console.as_mut() else {
        return;
    };
    let database = console.database().to_owned();
    match console.begin_load() {
        Some(ticket) => spawn_load(runtime, view, tx, &database, ticket),
        None => emit_status(view, tx, Notice::error("select a table first")),
    }
}

fn spawn_load<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    database: &str,
    ticket: LoadTicket,
) {
    let table = ticket.table.clone();
    if let Err(error) = runtime.spawn_load(database, ticket, tx.clone()) {
        warn!(%database, %table, %error, "could not start row load");
        emit_status(view, tx, Notice::error(format!("load {table:?} failed: {error}")));
    }
}

fn selected_row_id<S: TableService>(view: &ViewData<S>) -> Option<RowId> {
    view.console
        .as_ref()?
        .view()?
        .rendered
        .row_id_at(view.selected_row)
}

fn selected_column<S: TableService>(view: &ViewData<S>) -> Option<String> {
    view.console
        .as_ref()?
        .view()?
        .rendered
        .header
        .get(view.selected_col)
        .cloned()
}

fn handle_key_event<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if let Some(overlay) = view.overlay.take() {
        handle_overlay_key(runtime, view, tx, overlay, key);
        return false;
    }

    if view.console.is_some() {
        handle_console_key(runtime, view, tx, key)
    } else {
        handle_picker_key(runtime, view, tx, key)
    }
}

fn handle_picker_key<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('j') | KeyCode::Down => view.directory.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => view.directory.move_cursor(-1),
        KeyCode::Char('n') => view.overlay = Some(Overlay::CreateDatabase(String::new())),
        KeyCode::Char('r') => refresh_directory(runtime, view, tx),
        KeyCode::Char('?') => view.overlay = Some(Overlay::Help),
        KeyCode::Enter => {
            if let Some(database) = view.directory.selected().map(str::to_owned) {
                open_database(runtime, view, tx, &database);
            } else {
                emit_status(
                    view,
                    tx,
                    Notice::error("no databases yet -- press n to create one"),
                );
            }
        }
        _ => {}
    }
    false
}

fn handle_console_key<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let Some(console) = view.console.as_ref() else {
        return false;
    };

    if console.pending().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => dispatch(view, tx, ConsoleCommand::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                dispatch(view, tx, ConsoleCommand::Decline);
            }
            _ => {}
        }
        return false;
    }
    if console.comparison().is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            dispatch(view, tx, ConsoleCommand::DismissComparison);
        }
        return false;
    }
    if console.form().is_some() {
        handle_form_key(view, tx, key);
        return false;
    }
    if *console.selection() == Selection::CreatingTable {
        handle_table_name_key(view, tx, key);
        return false;
    }

    let Some(intent) = intent_for_key(key) else {
        return false;
    };
    match intent {
        ConsoleIntent::Quit => return true,
        ConsoleIntent::Help => view.overlay = Some(Overlay::Help),
        ConsoleIntent::Databases => {
            view.console = None;
            refresh_directory(runtime, view, tx);
        }
        ConsoleIntent::ToggleFocus => {
            view.focus = match view.focus {
                Focus::Selector => Focus::Table,
                Focus::Table => Focus::Selector,
            };
        }
        ConsoleIntent::Back => view.focus = Focus::Selector,
        ConsoleIntent::Up | ConsoleIntent::Down | ConsoleIntent::Left | ConsoleIntent::Right => {
            move_cursor(view, intent);
        }
        ConsoleIntent::Choose => match view.focus {
            Focus::Selector => {
                let choice = console.selector().options().get(view.selector_cursor).cloned();
                if let Some(choice) = choice {
                    if choice != SelectorChoice::Create && choice != SelectorChoice::Placeholder {
                        view.focus = Focus::Table;
                    }
                    choose(runtime, view, tx, choice);
                }
            }
            Focus::Table => {
                if let Some(row_id) = selected_row_id(view) {
                    dispatch(view, tx, ConsoleCommand::OpenEditRow(row_id));
                }
            }
        },
        ConsoleIntent::AddRow => dispatch(view, tx, ConsoleCommand::OpenAddRow),
        ConsoleIntent::EditRow => {
            if let Some(row_id) = selected_row_id(view) {
                dispatch(view, tx, ConsoleCommand::OpenEditRow(row_id));
            }
        }
        ConsoleIntent::DeleteRow => {
            if let Some(row_id) = selected_row_id(view) {
                dispatch(view, tx, ConsoleCommand::DeleteRow(row_id));
            }
        }
        ConsoleIntent::AddColumn => {
            if console.selection().table().is_some() {
                view.overlay = Some(Overlay::ColumnForm(ColumnFormInput::default()));
            } else {
                emit_status(view, tx, Notice::error("select a table first"));
            }
        }
        ConsoleIntent::DeleteColumn => {
            if let Some(column) = selected_column(view) {
                dispatch(view, tx, ConsoleCommand::DeleteColumn(column));
            }
        }
        ConsoleIntent::DeleteTable => dispatch(view, tx, ConsoleCommand::DeleteTable),
        ConsoleIntent::Reload => reload(runtime, view, tx),
        ConsoleIntent::Compare => {
            if console.selector().tables().len() < 2 {
                emit_status(view, tx, Notice::error("comparing needs at least two tables"));
            } else {
                view.overlay = Some(Overlay::Compare(ComparePicker {
                    left: 0,
                    right: 1,
                    editing_right: false,
                }));
            }
        }
    }
    false
}

fn intent_for_key(key: KeyEvent) -> Option<ConsoleIntent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let intent = match key.code {
        KeyCode::Char('k') | KeyCode::Up => ConsoleIntent::Up,
        KeyCode::Char('j') | KeyCode::Down => ConsoleIntent::Down,
        KeyCode::Char('h') | KeyCode::Left => ConsoleIntent::Left,
        KeyCode::Char('l') | KeyCode::Right => ConsoleIntent::Right,
        KeyCode::Tab | KeyCode::BackTab => ConsoleIntent::ToggleFocus,
        KeyCode::Esc => ConsoleIntent::Back,
        KeyCode::Enter => ConsoleIntent::Choose,
        KeyCode::Char('a') => ConsoleIntent::AddRow,
        KeyCode::Char('e') => ConsoleIntent::EditRow,
        KeyCode::Char('d') => ConsoleIntent::DeleteRow,
        KeyCode::Char('c') => ConsoleIntent::AddColumn,
        KeyCode::Char('x') => ConsoleIntent::DeleteColumn,
        KeyCode::Char('D') => ConsoleIntent::DeleteTable,
        KeyCode::Char('r') => ConsoleIntent::Reload,
        KeyCode::Char('m') => ConsoleIntent::Compare,
        KeyCode::Char('b') => ConsoleIntent::Databases,
        KeyCode::Char('?') => ConsoleIntent::Help,
        KeyCode::Char('q') => ConsoleIntent::Quit,
        _ => return None,
    };
    Some(intent)
}

fn move_cursor<S: TableService>(view: &mut ViewData<S>, intent: ConsoleIntent) {
    let Some(console) = view.console.as_ref() else {
        return;
    };
    match view.focus {
        Focus::Selector => {
            let len = console.selector().options().len();
            let delta: isize = match intent {
                ConsoleIntent::Up | ConsoleIntent::Left => -1,
                _ => 1,
            };
            view.selector_cursor = step(view.selector_cursor, delta, len);
        }
        Focus::Table => {
            let Some(table) = console.view() else {
                return;
            };
            match intent {
                ConsoleIntent::Up => {
                    view.selected_row = step(view.selected_row, -1, table.rendered.body.len());
                }
                ConsoleIntent::Down => {
                    view.selected_row = step(view.selected_row, 1, table.rendered.body.len());
                }
                ConsoleIntent::Left => {
                    view.selected_col = step(view.selected_col, -1, table.rendered.header.len());
                }
                _ => {
                    view.selected_col = step(view.selected_col, 1, table.rendered.header.len());
                }
            }
        }
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).clamp(0, len as isize - 1) as usize
}

fn handle_form_key<S: TableService>(
    view: &mut ViewData<S>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => dispatch(view, tx, ConsoleCommand::CancelForm),
        KeyCode::Enter => dispatch(view, tx, ConsoleCommand::SubmitRow),
        code => {
            let Some(form) = view.console.as_mut().and_then(|c| c.form_mut()) else {
                return;
            };
            match code {
                KeyCode::Tab | KeyCode::Down => form.move_cursor(1),
                KeyCode::BackTab | KeyCode::Up => form.move_cursor(-1),
                KeyCode::Backspace => form.pop_char(),
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    form.push_char(ch);
                }
                _ => {}
            }
        }
    }
}

fn handle_table_name_key<S: TableService>(
    view: &mut ViewData<S>,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view.table_name_input.clear();
            dispatch(
                view,
                tx,
                ConsoleCommand::Select(SelectorChoice::Placeholder),
            );
        }
        KeyCode::Enter => {
            let name = view.table_name_input.clone();
            dispatch(view, tx, ConsoleCommand::CreateTable(name));
            if view
                .console
                .as_ref()
                .is_some_and(|c| c.selection().table().is_some())
            {
                view.focus = Focus::Table;
            }
        }
        KeyCode::Backspace => {
            view.table_name_input.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.table_name_input.push(ch);
        }
        _ => {}
    }
}

fn handle_overlay_key<R: ConsoleRuntime>(
    runtime: &mut R,
    view: &mut ViewData<R::Service>,
    tx: &Sender<InternalEvent>,
    overlay: Overlay,
    key: KeyEvent,
) {
    match overlay {
        Overlay::Help => {}
        Overlay::ColumnForm(mut input) => match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match input.validate() {
                Ok(name) => dispatch(
                    view,
                    tx,
                    ConsoleCommand::AddColumn {
                        name,
                        column_type: input.column_type,
                    },
                ),
                Err(error) => {
                    emit_status(view, tx, Notice::error(error.to_string()));
                    view.overlay = Some(Overlay::ColumnForm(input));
                }
            },
            code => {
                match code {
                    KeyCode::Tab | KeyCode::Right | KeyCode::Down => input.cycle_type(1),
                    KeyCode::BackTab | KeyCode::Left | KeyCode::Up => input.cycle_type(-1),
                    KeyCode::Backspace => {
                        input.name.pop();
                    }
                    KeyCode::Char(ch) => input.name.push(ch),
                    _ => {}
                }
                view.overlay = Some(Overlay::ColumnForm(input));
            }
        },
        Overlay::Compare(mut picker) => {
            let tables = view
                .console
                .as_ref()
                .map(|c| c.selector().tables().to_vec())
                .unwrap_or_default();
            match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => {
                    let input = CompareFormInput {
                        left: tables.get(picker.left).cloned().unwrap_or_default(),
                        right: tables.get(picker.right).cloned().unwrap_or_default(),
                    };
                    match input.validate() {
                        Ok(()) => dispatch(
                            view,
                            tx,
                            ConsoleCommand::Compare {
                                left: input.left,
                                right: input.right,
                            },
                        ),
                        Err(error) => {
                            emit_status(view, tx, Notice::error(error.to_string()));
                            view.overlay = Some(Overlay::Compare(picker));
                        }
                    }
                }
                code => {
                    let side = if picker.editing_right {
                        &mut picker.right
                    } else {
                        &mut picker.left
                    };
                    match code {
                        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                            picker.editing_right = !picker.editing_right;
                        }
                        KeyCode::Up | KeyCode::Char('k') => *side = step(*side, -1, tables.len()),
                        KeyCode::Down | KeyCode::Char('j') => *side = step(*side, 1, tables.len()),
                        _ => {}
                    }
                    view.overlay = Some(Overlay::Compare(picker));
                }
            }
        }
        Overlay::CreateDatabase(mut name) => match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match view.directory.create(&runtime.service(), &name) {
                Ok(database) => open_database(runtime, view, tx, &database),
                Err(error) => {
                    emit_status(view, tx, Notice::error(format!("{error:#}")));
                    view.overlay = Some(Overlay::CreateDatabase(name));
                }
            },
            code => {
                match code {
                    KeyCode::Backspace => {
                        name.pop();
                    }
                    KeyCode::Char(ch) => name.push(ch),
                    _ => {}
                }
                view.overlay = Some(Overlay::CreateDatabase(name));
            }
        },
    }
}

fn render<S: TableService>(frame: &mut ratatui::Frame<'_>, view: &ViewData<S>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    match &view.console {
        None => render_picker(frame, layout[0], layout[1], view),
        Some(console) => {
            render_selector(frame, layout[0], console, view);
            render_table_area(frame, layout[1], console, view);
        }
    }

    let status_style = match view.status.as_ref().map(|notice| notice.level) {
        Some(NoticeLevel::Error) => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Yellow),
    };
    let status = Paragraph::new(status_text(view))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(console) = &view.console {
        render_console_overlays(frame, console, view);
    }

    match &view.overlay {
        None => {}
        Some(Overlay::Help) => {
            render_text_overlay(frame, "help", help_overlay_text().to_owned(), (70, 70));
        }
        Some(Overlay::ColumnForm(input)) => {
            render_text_overlay(frame, "add column", render_column_form_text(input), (50, 50));
        }
        Some(Overlay::Compare(picker)) => {
            let tables = view
                .console
                .as_ref()
                .map(|c| c.selector().tables().to_vec())
                .unwrap_or_default();
            render_text_overlay(
                frame,
                "compare tables",
                render_compare_picker_text(&tables, picker),
                (60, 60),
            );
        }
        Some(Overlay::CreateDatabase(name)) => {
            render_text_overlay(
                frame,
                "create database",
                format!("name: {name}_\n\nenter create | esc cancel"),
                (50, 25),
            );
        }
    }
}

fn render_picker<S>(frame: &mut ratatui::Frame<'_>, header: Rect, body: Rect, view: &ViewData<S>) {
    let title = Paragraph::new("pick a database")
        .block(Block::default().title("tabula").borders(Borders::ALL));
    frame.render_widget(title, header);

    let list = Paragraph::new(render_picker_text(&view.directory))
        .block(Block::default().title("databases").borders(Borders::ALL));
    frame.render_widget(list, body);
}

fn render_picker_text(directory: &DatabaseDirectory) -> String {
    if directory.databases().is_empty() {
        return "no databases yet -- press n to create one".to_owned();
    }
    directory
        .databases()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let marker = if index == directory.cursor() { ">" } else { " " };
            format!("{marker} {name}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_selector<S: TableService>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    console: &DatabaseConsole<S>,
    view: &ViewData<S>,
) {
    let labels = selector_labels(console);
    let highlight = if view.focus == Focus::Selector {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    };
    let tabs = Tabs::new(labels)
        .block(
            Block::default()
                .title(format!("tabula | {}", console.database()))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(highlight)
        .select(view.selector_cursor);
    frame.render_widget(tabs, area);
}

fn selector_labels<S: TableService>(console: &DatabaseConsole<S>) -> Vec<String> {
    console
        .selector()
        .options()
        .iter()
        .map(|option| option.label().to_owned())
        .collect()
}

fn render_table_area<S: TableService>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    console: &DatabaseConsole<S>,
    view: &ViewData<S>,
) {
    let Some(table) = console.view() else {
        let hint = match console.selection() {
            Selection::NoTableSelected => "select a table or create one",
            Selection::CreatingTable => "name the new table",
            Selection::TableSelected(_) => "loading rows...",
        };
        let empty = Paragraph::new(hint).block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(ACTIONS_WIDTH)])
        .split(area);

    let rendered = &table.rendered;
    let table_focused = view.focus == Focus::Table;
    let widths = vec![Constraint::Min(8); rendered.header.len().max(1)];
    let header = Row::new(rendered.header.iter().enumerate().map(|(index, name)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if table_focused && index == view.selected_col {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(name.clone()).style(style)
    }));

    let rows = rendered.body.iter().enumerate().map(|(row_index, row)| {
        let selected_row = table_focused && row_index == view.selected_row;
        let cells = row
            .cells
            .iter()
            .enumerate()
            .map(|(column_index, text)| {
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == view.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(text.clone()).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells).height(row.height)
    });

    let data = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(format!("{} ({} rows)", table.table, rendered.body.len()))
                .borders(Borders::ALL),
        );

    let actions = Table::new(
        rendered.actions.iter().map(|block| {
            Row::new(block.actions.iter().map(|action| {
                Cell::from(action.label()).style(Style::default().fg(Color::Magenta))
            }))
            .height(block.height)
        }),
        [Constraint::Length(1), Constraint::Length(1)],
    )
    .header(Row::new(["", ""]))
    .column_spacing(1)
    .block(Block::default().borders(Borders::ALL));

    let selected = (!rendered.body.is_empty()).then_some(view.selected_row);
    let mut data_state = TableState::default().with_selected(selected);
    let mut actions_state = TableState::default().with_selected(selected);
    frame.render_stateful_widget(data, split[0], &mut data_state);
    frame.render_stateful_widget(actions, split[1], &mut actions_state);
}

fn render_console_overlays<S: TableService>(
    frame: &mut ratatui::Frame<'_>,
    console: &DatabaseConsole<S>,
    view: &ViewData<S>,
) {
    if *console.selection() == Selection::CreatingTable {
        render_text_overlay(
            frame,
            "create table",
            format!(
                "name: {}_\n\nenter create | esc cancel",
                view.table_name_input
            ),
            (50, 25),
        );
    }

    if let Some(form) = console.form() {
        render_text_overlay(frame, form.mode.title(), render_form_text(form), (60, 70));
    }

    if let Some(comparison) = console.comparison() {
        render_comparison(frame, comparison);
    }

    if let Some(pending) = console.pending() {
        render_text_overlay(frame, "confirm", render_confirm_text(pending), (40, 20));
    }
}

fn render_text_overlay(
    frame: &mut ratatui::Frame<'_>,
    title: &str,
    text: String,
    (percent_x, percent_y): (u16, u16),
) {
    let area = centered_rect(percent_x, percent_y, frame.area());
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_owned())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(widget, area);
}

fn render_comparison(frame: &mut ratatui::Frame<'_>, comparison: &ComparisonView) {
    let area = centered_rect(80, 70, frame.area());
    frame.render_widget(Clear, area);
    let widths = vec![Constraint::Min(8); comparison.header.len().max(1)];
    let header = Row::new(comparison.header.iter().map(|name| {
        Cell::from(name.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = comparison
        .body
        .iter()
        .map(|cells| Row::new(cells.iter().cloned().map(Cell::from)));
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(comparison_title(comparison))
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(table, area);
}

fn comparison_title(comparison: &ComparisonView) -> String {
    format!(
        "rows in {} not in {} ({}) | esc close",
        comparison.left,
        comparison.right,
        comparison.body.len()
    )
}

fn render_form_text(form: &RowForm) -> String {
    let mut lines = Vec::with_capacity(form.fields.len() + 4);
    if form.fields.is_empty() {
        lines.push("this table has no columns yet -- add one with c".to_owned());
    }
    for (index, field) in form.fields.iter().enumerate() {
        let marker = if index == form.cursor { ">" } else { " " };
        let value = if field.value.is_empty() {
            format!("<{}>", field.placeholder)
        } else {
            field.value.clone()
        };
        lines.push(format!("{marker} {} [{}]: {value}", field.name, field.type_name));
    }
    if let Some(error) = &form.error {
        lines.push(String::new());
        lines.push(format!("error: {error}"));
    }
    lines.push(String::new());
    lines.push("enter save | tab next | esc cancel".to_owned());
    lines.join("\n")
}

fn render_column_form_text(input: &ColumnFormInput) -> String {
    let types = ColumnType::ALL
        .iter()
        .map(|column_type| {
            if *column_type == input.column_type {
                format!("[{column_type}]")
            } else {
                column_type.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "name: {}_\ntype: {types}\n      {}\n\nenter add | tab type | esc cancel",
        input.name,
        input.column_type.placeholder()
    )
}

fn render_compare_picker_text(tables: &[String], picker: &ComparePicker) -> String {
    let column = |selected: usize, active: bool| {
        tables
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let marker = match (index == selected, active) {
                    (true, true) => ">",
                    (true, false) => "*",
                    _ => " ",
                };
                format!("{marker} {name}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "rows of:\n{}\n\nmissing from:\n{}\n\nenter compare | tab switch side | esc cancel",
        column(picker.left, !picker.editing_right),
        column(picker.right, picker.editing_right),
    )
}

fn render_confirm_text(pending: &PendingAction) -> String {
    format!("{}\n\ny confirm | n cancel", pending.prompt())
}

fn help_overlay_text() -> &'static str {
    "tab          switch selector / table
j/k h/l      move
enter        choose table / edit row
a            add row
e            edit row
d            delete row
c            add column
x            delete column under cursor
D            delete table
r            reload rows
m            compare two tables
b            back to databases
q ctrl+q     quit"
}

fn status_text<S: TableService>(view: &ViewData<S>) -> String {
    if let Some(notice) = &view.status {
        return notice.message.clone();
    }
    match &view.console {
        None => "j/k move | enter open | n new database | r refresh | q quit".to_owned(),
        Some(console) if console.selection().table().is_some() => {
            "tab focus | a add | e edit | d delete | c column | x drop column | D drop table | m compare | ? help".to_owned()
        }
        Some(_) => "h/l choose | enter select | m compare | b databases | ? help | q quit".to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
