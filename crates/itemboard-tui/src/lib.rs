// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use itemboard_app::{
    FormField, Item, ItemDraft, ItemForm, ItemId, ListCommand, ListEvent, ListState, LoadStatus,
    NOTICE_TTL, NoticeKind, RepoError, SaveCandidate, SaveKind, UserId,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState as ListWidgetState, Paragraph, Wrap,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const PAGE_ROWS: isize = 5;
const READ_MORE: &str = "[enter] read more";
const SHOW_LESS: &str = "[enter] show less";

/// Where repository calls go. The `spawn_*` methods must eventually post
/// exactly one result event to `tx`; the defaults run the call inline.
pub trait ItemRuntime {
    fn list_items(&mut self, user_id: Option<UserId>) -> Result<Vec<Item>, RepoError>;
    fn create_item(&mut self, draft: &ItemDraft) -> Result<Item, RepoError>;
    fn update_item(&mut self, item: &Item) -> Result<Item, RepoError>;
    fn delete_item(&mut self, id: ItemId) -> Result<(), RepoError>;

    fn spawn_list(
        &mut self,
        seq: u64,
        user_id: Option<UserId>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.list_items(user_id);
        post(
            &tx,
            InternalEvent::ListLoaded {
                seq,
                user_id,
                result,
            },
        )
    }

    fn spawn_delete(&mut self, id: ItemId, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.delete_item(id);
        post(&tx, InternalEvent::Deleted { id, result })
    }

    fn spawn_save(
        &mut self,
        seq: u64,
        candidate: SaveCandidate,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let kind = candidate.kind();
        let result = match &candidate {
            SaveCandidate::Create(draft) => self.create_item(draft),
            SaveCandidate::Update(item) => self.update_item(item),
        };
        post(&tx, InternalEvent::Saved { seq, kind, result })
    }
}

pub fn post(tx: &Sender<InternalEvent>, event: InternalEvent) -> Result<()> {
    tx.send(event)
        .map_err(|_| anyhow::anyhow!("item event channel closed"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ListLoaded {
        seq: u64,
        user_id: Option<UserId>,
        result: Result<Vec<Item>, RepoError>,
    },
    Deleted {
        id: ItemId,
        result: Result<(), RepoError>,
    },
    Saved {
        seq: u64,
        kind: SaveKind,
        result: Result<Item, RepoError>,
    },
    NoticeExpired {
        token: u64,
    },
}

impl InternalEvent {
    fn into_command(self) -> ListCommand {
        match self {
            Self::ListLoaded {
                seq,
                user_id,
                result,
            } => ListCommand::ListLoaded {
                seq,
                user_id,
                result,
            },
            Self::Deleted { id, result } => ListCommand::Deleted { id, result },
            Self::Saved { seq, kind, result } => ListCommand::Saved { seq, kind, result },
            Self::NoticeExpired { token } => ListCommand::NoticeExpired { token },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    List,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected: usize,
    input: InputMode,
    help_visible: bool,
}

pub fn run_app<R: ItemRuntime>(state: &mut ListState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    dispatch_and_run(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        ListCommand::Mount,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: ItemRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        dispatch_and_run(state, runtime, view_data, tx, event.into_command());
    }
}

fn schedule_notice_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(NOTICE_TTL);
        let _ = sender.send(InternalEvent::NoticeExpired { token });
    });
}

/// Applies one command and carries out the effects it asks for.
fn dispatch_and_run<R: ItemRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ListCommand,
) {
    for event in state.dispatch(command) {
        let spawned = match event {
            ListEvent::FetchRequested { seq, user_id } => {
                runtime.spawn_list(seq, user_id, internal_tx.clone())
            }
            ListEvent::DeleteRequested(id) => runtime.spawn_delete(id, internal_tx.clone()),
            ListEvent::SaveRequested { seq, candidate } => {
                runtime.spawn_save(seq, candidate, internal_tx.clone())
            }
            ListEvent::NoticeShown(notice) => {
                schedule_notice_clear(internal_tx, notice.token);
                Ok(())
            }
            ListEvent::SearchChanged
            | ListEvent::UserFilterChanged(_)
            | ListEvent::CollectionReplaced(_) => {
                view_data.selected = 0;
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(error) = spawned {
            tracing::error!(%error, "could not start repository call");
        }
    }
    clamp_selection(state, view_data);
}

fn clamp_selection(state: &ListState, view_data: &mut ViewData) {
    let len = state.visible_items().len();
    view_data.selected = view_data.selected.min(len.saturating_sub(1));
}

fn selected_item_id(state: &ListState, view_data: &ViewData) -> Option<ItemId> {
    state
        .visible_items()
        .get(view_data.selected)
        .map(|item| item.id)
}

fn move_selection(state: &ListState, view_data: &mut ViewData, delta: isize) {
    let len = state.visible_items().len();
    if len == 0 {
        view_data.selected = 0;
        return;
    }
    let next = (view_data.selected as isize + delta).clamp(0, len as isize - 1);
    view_data.selected = next as usize;
}

fn handle_key_event<R: ItemRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.form.is_some() {
        if let Some(command) = form_command_for_key(key) {
            dispatch_and_run(state, runtime, view_data, internal_tx, command);
        }
        return false;
    }

    if view_data.input == InputMode::Search {
        let mut term = state.search.clone();
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                view_data.input = InputMode::List;
                return false;
            }
            KeyCode::Backspace => {
                term.pop();
            }
            KeyCode::Char(value) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                term.push(value);
            }
            _ => return false,
        }
        dispatch_and_run(
            state,
            runtime,
            view_data,
            internal_tx,
            ListCommand::SetSearch(term),
        );
        return false;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
            return false;
        }
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            move_selection(state, view_data, 1);
            return false;
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            move_selection(state, view_data, -1);
            return false;
        }
        (KeyCode::PageDown, _) => {
            move_selection(state, view_data, PAGE_ROWS);
            return false;
        }
        (KeyCode::PageUp, _) => {
            move_selection(state, view_data, -PAGE_ROWS);
            return false;
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            view_data.selected = 0;
            return false;
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            move_selection(state, view_data, isize::MAX / 2);
            return false;
        }
        (KeyCode::Char('/'), _) => {
            view_data.input = InputMode::Search;
            return false;
        }
        (KeyCode::Esc, _) if !state.search.is_empty() => ListCommand::SetSearch(String::new()),
        (KeyCode::Char('u'), KeyModifiers::NONE) => ListCommand::CycleUserFilter(1),
        (KeyCode::Char('U'), _) => ListCommand::CycleUserFilter(-1),
        (KeyCode::Char('r'), KeyModifiers::NONE) => ListCommand::Reload,
        (KeyCode::Char('a'), KeyModifiers::NONE) => ListCommand::OpenAddForm,
        (KeyCode::Enter | KeyCode::Char(' '), _) => {
            let Some(id) = selected_item_id(state, view_data) else {
                return false;
            };
            ListCommand::ToggleExpand(id)
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            let Some(id) = selected_item_id(state, view_data) else {
                return false;
            };
            ListCommand::OpenEditForm(id)
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(id) = selected_item_id(state, view_data) else {
                return false;
            };
            ListCommand::Delete(id)
        }
        _ => return false,
    };

    dispatch_and_run(state, runtime, view_data, internal_tx, command);
    false
}

fn form_command_for_key(key: KeyEvent) -> Option<ListCommand> {
    match key.code {
        KeyCode::Esc => Some(ListCommand::CancelForm),
        KeyCode::Enter => Some(ListCommand::SubmitForm),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ListCommand::SubmitForm)
        }
        KeyCode::Tab | KeyCode::Down => Some(ListCommand::FormNextField),
        KeyCode::BackTab | KeyCode::Up => Some(ListCommand::FormPrevField),
        KeyCode::Backspace => Some(ListCommand::FormBackspace),
        KeyCode::Char(value) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ListCommand::FormChar(value))
        }
        _ => None,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &ListState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data))
        .block(Block::default().title("itemboard").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_items(frame, layout[1], state, view_data);

    let (status, style) = match &state.notice {
        Some(notice) => (
            notice.text.clone(),
            match notice.kind {
                NoticeKind::Success => Style::default().fg(Color::Black).bg(Color::Green),
                NoticeKind::Error => Style::default().fg(Color::White).bg(Color::Red),
            },
        ),
        None => (status_text(state, view_data), Style::default().fg(Color::Yellow)),
    };
    let status_widget = Paragraph::new(status)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(form) = &state.form {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_form_text(form))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(form.heading())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_items(frame: &mut ratatui::Frame<'_>, area: Rect, state: &ListState, view_data: &ViewData) {
    let block = Block::default()
        .title(list_title(state))
        .borders(Borders::ALL);

    if let Some(message) = load_message(state) {
        let style = match state.load {
            LoadStatus::Failed(_) => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::Gray),
        };
        let paragraph = Paragraph::new(message).style(style).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let width = usize::from(area.width.saturating_sub(4)).max(10);
    let visible = state.visible_items();
    let rows = visible
        .iter()
        .map(|item| {
            let mut lines = Vec::new();
            for (index, text) in item_lines(item, state.is_expanded(item.id), width)
                .into_iter()
                .enumerate()
            {
                let line = match index {
                    0 => Line::from(Span::styled(
                        text,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    1 => Line::from(Span::styled(text, Style::default().fg(Color::Gray))),
                    _ if text == READ_MORE || text == SHOW_LESS => {
                        Line::from(Span::styled(text, Style::default().fg(Color::Blue)))
                    }
                    _ => Line::from(text),
                };
                lines.push(line);
            }
            lines.push(Line::from(String::new()));
            ListItem::new(lines)
        })
        .collect::<Vec<_>>();

    let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut widget_state = ListWidgetState::default().with_selected(if visible.is_empty() {
        None
    } else {
        Some(view_data.selected)
    });
    frame.render_stateful_widget(list, area, &mut widget_state);
}

fn list_title(state: &ListState) -> String {
    let visible = state.visible_items().len();
    let total = state.items.len();
    if visible == total {
        format!("items ({total})")
    } else {
        format!("items ({visible} of {total})")
    }
}

fn load_message(state: &ListState) -> Option<String> {
    match &state.load {
        LoadStatus::Loading => Some("loading items...".to_owned()),
        LoadStatus::Failed(message) => Some(format!("{message}\npress r to retry")),
        LoadStatus::Idle if state.visible_items().is_empty() => {
            if state.items.is_empty() {
                Some("no items".to_owned())
            } else {
                Some(format!("no titles match {:?}", state.search))
            }
        }
        LoadStatus::Idle => None,
    }
}

fn header_text(state: &ListState, view_data: &ViewData) -> String {
    let cursor = if view_data.input == InputMode::Search {
        "_"
    } else {
        ""
    };
    format!(
        "search: {}{cursor} | user: {}",
        state.search,
        user_filter_label(state.user_filter)
    )
}

fn user_filter_label(user_id: Option<UserId>) -> String {
    match user_id {
        Some(user_id) => format!("user {user_id}"),
        None => "all users".to_owned(),
    }
}

/// Display lines for one item: title, owner, wrapped body, and the toggle
/// hint when the body is long.
fn item_lines(item: &Item, expanded: bool, width: usize) -> Vec<String> {
    let mut lines = vec![item.title.clone(), format!("user {} | #{}", item.user_id, item.id)];
    lines.extend(wrap_text(&item.body_preview(expanded), width));
    if item.body_is_long() {
        lines.push(if expanded { SHOW_LESS } else { READ_MORE }.to_owned());
    }
    lines
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            // Words wider than the line are split by character.
            for value in word.chars() {
                if line_len == width {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                line.push(value);
                line_len += 1;
            }
        }
        lines.push(line);
    }
    lines
}

fn render_form_text(form: &ItemForm) -> String {
    let mut out = String::new();
    for field in FormField::ALL {
        let marker = if field == form.focus { ">" } else { " " };
        out.push_str(&format!("{marker} {}: {}\n", field.label(), form.field(field)));
        if field == FormField::UserId
            && let Some(hint) = form.user_id_hint()
        {
            out.push_str(&format!("    {hint}\n"));
        }
    }
    out.push('\n');
    if let Some(error) = &form.error {
        out.push_str(&format!("! {error}\n"));
    }
    if form.is_submitting() {
        out.push_str("saving...\n");
    } else {
        out.push_str("enter save | esc cancel | tab next field\n");
    }
    out
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit\n\
list: j/k move | pgup/pgdn | g/G top/bottom | enter/space read more | ? help | q quit\n\
list: / search | esc clear search | u/U cycle user filter | r reload\n\
list: a add | e edit | d delete\n\
search: type to filter titles | enter/esc done\n\
form: tab/shift+tab field | ctrl+s or enter submit | esc cancel"
}

fn status_text(state: &ListState, view_data: &ViewData) -> String {
    if state.form.is_some() {
        return "FORM | tab field | enter save | esc cancel".to_owned();
    }
    match view_data.input {
        InputMode::Search => "SEARCH | type to filter | enter/esc done".to_owned(),
        InputMode::List => {
            let loading = if state.is_loading() { " | loading" } else { "" };
            format!("LIST{loading} | j/k | enter more | / search | u user | a/e/d | r | ? | q")
        }
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

#[cfg(test)]
mod tests {
    use super::{
        InputMode, InternalEvent, ItemRuntime, READ_MORE, SHOW_LESS, ViewData, handle_key_event,
        header_text, help_overlay_text, item_lines, load_message, process_internal_events,
        render_form_text, status_text, wrap_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use itemboard_app::{
        Item, ItemDraft, ItemId, ListCommand, ListState, LoadStatus, NoticeKind, RepoError,
        UserId,
    };
    use itemboard_testkit::{body_of_len, item, sample_items};
    use std::collections::VecDeque;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        list_results: VecDeque<Result<Vec<Item>, RepoError>>,
        create_results: VecDeque<Result<Item, RepoError>>,
        update_results: VecDeque<Result<Item, RepoError>>,
        delete_results: VecDeque<Result<(), RepoError>>,
        list_calls: Vec<Option<UserId>>,
        created: Vec<ItemDraft>,
        updated: Vec<Item>,
        deleted: Vec<ItemId>,
    }

    fn unscripted() -> RepoError {
        RepoError::Network("no scripted response".to_owned())
    }

    impl ItemRuntime for TestRuntime {
        fn list_items(&mut self, user_id: Option<UserId>) -> Result<Vec<Item>, RepoError> {
            self.list_calls.push(user_id);
            self.list_results.pop_front().unwrap_or_else(|| Err(unscripted()))
        }

        fn create_item(&mut self, draft: &ItemDraft) -> Result<Item, RepoError> {
            self.created.push(draft.clone());
            self.create_results.pop_front().unwrap_or_else(|| Err(unscripted()))
        }

        fn update_item(&mut self, item: &Item) -> Result<Item, RepoError> {
            self.updated.push(item.clone());
            self.update_results.pop_front().unwrap_or_else(|| Err(unscripted()))
        }

        fn delete_item(&mut self, id: ItemId) -> Result<(), RepoError> {
            self.deleted.push(id);
            self.delete_results.pop_front().unwrap_or_else(|| Err(unscripted()))
        }
    }

    struct Harness {
        state: ListState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn mounted(items: Vec<Item>) -> Self {
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: ListState::default(),
                runtime: TestRuntime {
                    list_results: VecDeque::from([Ok(items)]),
                    ..TestRuntime::default()
                },
                view_data: ViewData::default(),
                tx,
                rx,
            };
            super::dispatch_and_run(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
                ListCommand::Mount,
            );
            harness.drain();
            harness
        }

        fn drain(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.drain();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for value in text.chars() {
                self.press(KeyCode::Char(value));
            }
        }

        fn ids(&self) -> Vec<i64> {
            self.state.items.iter().map(|item| item.id.get()).collect()
        }
    }

    #[test]
    fn mount_loads_items_through_runtime() {
        let harness = Harness::mounted(sample_items(2));
        assert_eq!(harness.runtime.list_calls, vec![None]);
        assert_eq!(harness.state.items.len(), 20);
        assert_eq!(harness.state.load, LoadStatus::Idle);
        assert_eq!(
            harness.state.known_user_ids.len(),
            2,
            "known users come from the unfiltered fetch"
        );
    }

    #[test]
    fn failed_mount_shows_retry_hint_and_reload_recovers() {
        let (tx, rx) = mpsc::channel();
        let mut harness = Harness {
            state: ListState::default(),
            runtime: TestRuntime {
                list_results: VecDeque::from([
                    Err(RepoError::Network("server returned 500".to_owned())),
                    Ok(vec![item(1, "a", "b", 1)]),
                ]),
                ..TestRuntime::default()
            },
            view_data: ViewData::default(),
            tx,
            rx,
        };
        super::dispatch_and_run(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            ListCommand::Mount,
        );
        harness.drain();

        let message = load_message(&harness.state).expect("error message shown");
        assert!(message.contains("server returned 500"));
        assert!(message.contains("press r to retry"));

        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.ids(), vec![1]);
        assert_eq!(load_message(&harness.state), None);
    }

    #[test]
    fn user_filter_key_scopes_request() {
        let mut harness = Harness::mounted(sample_items(3));
        harness
            .runtime
            .list_results
            .push_back(Ok(vec![item(11, "scoped", "b", 2)]));

        harness.press(KeyCode::Char('u'));
        harness.press(KeyCode::Char('u'));
        assert_eq!(
            harness.runtime.list_calls,
            vec![None, Some(UserId::new(1)), Some(UserId::new(2))]
        );
        assert_eq!(harness.state.user_filter, Some(UserId::new(2)));
        assert_eq!(harness.state.known_user_ids.len(), 3);
        assert!(header_text(&harness.state, &harness.view_data).contains("user 2"));
    }

    #[test]
    fn search_mode_filters_and_escape_clears() {
        let mut harness = Harness::mounted(vec![
            item(1, "Alpha", "b", 1),
            item(2, "Beta", "b", 1),
        ]);

        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.view_data.input, InputMode::Search);
        harness.type_text("ALP");
        assert_eq!(harness.state.search, "ALP");
        assert_eq!(harness.state.visible_items().len(), 1);
        assert!(header_text(&harness.state, &harness.view_data).contains("search: ALP_"));

        harness.press(KeyCode::Backspace);
        assert_eq!(harness.state.search, "AL");
        harness.press(KeyCode::Enter);
        assert_eq!(harness.view_data.input, InputMode::List);

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.search, "");
        assert_eq!(harness.runtime.list_calls.len(), 1, "search never fetches");
    }

    #[test]
    fn enter_toggles_read_more_on_selected_item() {
        let mut harness = Harness::mounted(vec![
            item(1, "short", "b", 1),
            item(2, "long", &body_of_len(150), 1),
        ]);
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);
        assert!(harness.state.is_expanded(ItemId::new(2)));
        assert!(!harness.state.is_expanded(ItemId::new(1)));
        harness.press(KeyCode::Char(' '));
        assert!(!harness.state.is_expanded(ItemId::new(2)));
    }

    #[test]
    fn delete_key_removes_selected_item_and_shows_notice() {
        let mut harness = Harness::mounted(vec![
            item(1, "a", "b", 1),
            item(5, "e", "b", 1),
            item(9, "i", "b", 2),
        ]);
        harness.runtime.delete_results.push_back(Ok(()));

        harness.press(KeyCode::Char('G'));
        harness.press(KeyCode::Char('k'));
        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.runtime.deleted, vec![ItemId::new(5)]);
        assert_eq!(harness.ids(), vec![1, 9]);
        let notice = harness.state.notice.as_ref().expect("notice shown");
        assert_eq!(notice.kind, NoticeKind::Success);
    }

    #[test]
    fn failed_delete_keeps_items_and_notice_expires_by_token() {
        let mut harness = Harness::mounted(vec![item(5, "e", "b", 1)]);
        harness
            .runtime
            .delete_results
            .push_back(Err(RepoError::Network("server returned 500".to_owned())));

        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.ids(), vec![5]);
        let token = match &harness.state.notice {
            Some(notice) if notice.kind == NoticeKind::Error => notice.token,
            other => panic!("expected error notice, got {other:?}"),
        };

        harness
            .tx
            .send(InternalEvent::NoticeExpired { token })
            .expect("channel open");
        harness.drain();
        assert_eq!(harness.state.notice, None);
    }

    #[test]
    fn selection_clamps_after_last_item_is_deleted() {
        let mut harness = Harness::mounted(vec![item(1, "a", "b", 1), item(2, "b", "b", 1)]);
        harness.runtime.delete_results.push_back(Ok(()));
        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.selected, 1);
        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.view_data.selected, 0);
    }

    #[test]
    fn add_form_flow_creates_and_prepends() {
        let mut harness = Harness::mounted(vec![item(1, "a", "b", 1)]);
        harness
            .runtime
            .create_results
            .push_back(Ok(item(99, "T", "B", 2)));

        harness.press(KeyCode::Char('a'));
        assert!(harness.state.form.is_some());
        harness.type_text("T");
        harness.press(KeyCode::Tab);
        harness.type_text("B");
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Backspace);
        harness.type_text("2");
        harness.press(KeyCode::Enter);

        assert_eq!(
            harness.runtime.created,
            vec![ItemDraft {
                title: "T".to_owned(),
                body: "B".to_owned(),
                user_id: UserId::new(2),
            }]
        );
        assert_eq!(harness.ids(), vec![99, 1]);
        assert!(harness.state.known_user_ids.contains(&UserId::new(2)));
        assert_eq!(harness.state.form, None);
    }

    #[test]
    fn invalid_form_is_never_sent() {
        let mut harness = Harness::mounted(vec![]);
        harness.press(KeyCode::Char('a'));
        harness.press(KeyCode::Enter);

        assert!(harness.runtime.created.is_empty());
        let form = harness.state.form.as_ref().expect("form stays open");
        assert!(render_form_text(form).contains("title is required"));
    }

    #[test]
    fn failed_edit_keeps_form_open_and_escape_discards() {
        let mut harness = Harness::mounted(vec![item(3, "old", "b", 1)]);
        harness
            .runtime
            .update_results
            .push_back(Err(RepoError::Network("server returned 500".to_owned())));

        harness.press(KeyCode::Char('e'));
        harness.type_text("er");
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(harness.runtime.updated.len(), 1);
        assert_eq!(harness.runtime.updated[0].title, "older");
        assert_eq!(harness.state.items[0].title, "old");
        assert!(harness.state.form.is_some());
        assert!(
            harness
                .state
                .notice
                .as_ref()
                .is_some_and(|notice| notice.kind == NoticeKind::Error)
        );

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.form, None);
        assert_eq!(harness.state.items[0].title, "old");
    }

    #[test]
    fn form_captures_quit_letter_but_not_ctrl_q() {
        let mut harness = Harness::mounted(vec![]);
        harness.press(KeyCode::Char('a'));
        assert!(!harness.press(KeyCode::Char('q')));
        assert_eq!(
            harness.state.form.as_ref().map(|form| form.title.as_str()),
            Some("q")
        );
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn item_lines_show_preview_and_toggle_hint_for_long_bodies() {
        let long = item(1, "Alpha", &"x".repeat(150), 1);
        let collapsed = item_lines(&long, false, 200);
        assert_eq!(collapsed[0], "Alpha");
        assert_eq!(collapsed[2], format!("{}...", "x".repeat(100)));
        assert_eq!(collapsed.last().map(String::as_str), Some(READ_MORE));

        let expanded = item_lines(&long, true, 200);
        assert_eq!(expanded[2], "x".repeat(150));
        assert_eq!(expanded.last().map(String::as_str), Some(SHOW_LESS));

        let short = item(2, "Beta", "tiny", 1);
        let lines = item_lines(&short, false, 200);
        assert_eq!(lines, vec!["Beta", "user 1 | #2", "tiny"]);
    }

    #[test]
    fn wrap_text_breaks_on_words_and_keeps_newlines() {
        assert_eq!(
            wrap_text("aaa bbb ccc\nddd", 7),
            vec!["aaa bbb", "ccc", "ddd"]
        );
        assert_eq!(wrap_text("", 5), vec![""]);
    }

    #[test]
    fn wrap_text_splits_words_wider_than_the_line() {
        let lines = wrap_text(&"x".repeat(150), 76);
        assert!(lines.iter().all(|line| line.chars().count() <= 76));
        assert_eq!(
            lines.iter().map(|line| line.chars().count()).sum::<usize>(),
            150
        );
        assert_eq!(wrap_text("ab cdefgh", 3), vec!["ab", "cde", "fgh"]);
    }

    #[test]
    fn expanded_long_word_body_fits_list_width() {
        let long = item(1, "Alpha", &"x".repeat(150), 1);
        let lines = item_lines(&long, true, 76);
        let body_chars: usize = lines[2..lines.len() - 1]
            .iter()
            .map(|line| line.chars().count())
            .sum();
        assert_eq!(body_chars, 150);
        assert!(lines.iter().all(|line| line.chars().count() <= 76));
    }

    #[test]
    fn help_and_status_mention_core_shortcuts() {
        let help = help_overlay_text();
        assert!(help.contains("a add | e edit | d delete"));
        assert!(help.contains("u/U cycle user filter"));

        let state = ListState::default();
        let view_data = ViewData::default();
        assert!(status_text(&state, &view_data).starts_with("LIST"));
    }
}
