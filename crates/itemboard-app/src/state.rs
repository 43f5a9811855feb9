// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use crate::{
    Item, ItemForm, ItemId, Notice, NoticeKind, RepoError, SaveCandidate, SaveKind, UserId,
    ValidationError,
};

/// How long a notice stays up before the front-end asks to clear it.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

/// The item list controller. Owns the authoritative collection and every
/// piece of state that survives between interactions; the front-end only
/// renders it and carries out the effect events returned by `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListState {
    pub items: Vec<Item>,
    pub search: String,
    pub user_filter: Option<UserId>,
    pub known_user_ids: BTreeSet<UserId>,
    pub expanded: HashMap<ItemId, bool>,
    pub load: LoadStatus,
    pub notice: Option<Notice>,
    pub form: Option<ItemForm>,
    latest_fetch: u64,
    save_seq: u64,
    notice_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Mount,
    Reload,
    SetUserFilter(Option<UserId>),
    CycleUserFilter(isize),
    SetSearch(String),
    ToggleExpand(ItemId),
    Delete(ItemId),
    OpenAddForm,
    OpenEditForm(ItemId),
    CancelForm,
    FormChar(char),
    FormBackspace,
    FormNextField,
    FormPrevField,
    SubmitForm,
    Save(SaveCandidate),
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    FetchRequested { seq: u64, user_id: Option<UserId> },
    DeleteRequested(ItemId),
    SaveRequested {
        seq: u64,
        candidate: SaveCandidate,
    },
    CollectionReplaced(usize),
    ItemRemoved(ItemId),
    ItemAdded(ItemId),
    ItemReplaced(ItemId),
    LoadFailed(String),
    StaleResponseDropped { seq: u64 },
    SearchChanged,
    UserFilterChanged(Option<UserId>),
    ExpandToggled { id: ItemId, expanded: bool },
    FormOpened,
    FormEdited,
    FormRejected(ValidationError),
    FormClosed,
    NoticeShown(Notice),
    NoticeCleared,
}

impl ListState {
    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::Mount | ListCommand::Reload => vec![self.begin_fetch()],
            ListCommand::SetUserFilter(user_id) => self.set_user_filter(user_id),
            ListCommand::CycleUserFilter(delta) => {
                let next = self.cycled_user_filter(delta);
                self.set_user_filter(next)
            }
            ListCommand::SetSearch(term) => {
                self.search = term;
                vec![ListEvent::SearchChanged]
            }
            ListCommand::ToggleExpand(id) => {
                let flag = self.expanded.entry(id).or_insert(false);
                *flag = !*flag;
                vec![ListEvent::ExpandToggled {
                    id,
                    expanded: *flag,
                }]
            }
            ListCommand::Delete(id) => vec![ListEvent::DeleteRequested(id)],
            ListCommand::OpenAddForm => {
                self.form = Some(ItemForm::blank());
                vec![ListEvent::FormOpened]
            }
            ListCommand::OpenEditForm(id) => {
                let Some(item) = self.items.iter().find(|item| item.id == id) else {
                    return Vec::new();
                };
                self.form = Some(ItemForm::for_item(item));
                vec![ListEvent::FormOpened]
            }
            ListCommand::CancelForm => match self.form.take() {
                Some(_) => vec![ListEvent::FormClosed],
                None => Vec::new(),
            },
            ListCommand::FormChar(value) => self.edit_form(|form| form.push_char(value)),
            ListCommand::FormBackspace => self.edit_form(ItemForm::backspace),
            ListCommand::FormNextField => self.edit_form(ItemForm::focus_next),
            ListCommand::FormPrevField => self.edit_form(ItemForm::focus_prev),
            ListCommand::SubmitForm => self.submit_form(),
            ListCommand::Save(candidate) => {
                let seq = self.next_save_seq();
                vec![ListEvent::SaveRequested { seq, candidate }]
            }
            ListCommand::ListLoaded {
                seq,
                user_id,
                result,
            } => self.apply_list(seq, user_id, result),
            ListCommand::Deleted { id, result } => self.apply_delete(id, result),
            ListCommand::Saved { seq, kind, result } => self.apply_save(seq, kind, result),
            ListCommand::NoticeExpired { token } => match &self.notice {
                Some(notice) if notice.token == token => {
                    self.notice = None;
                    vec![ListEvent::NoticeCleared]
                }
                _ => Vec::new(),
            },
        }
    }

    /// Items whose title contains the search term, in collection order.
    pub fn visible_items(&self) -> Vec<&Item> {
        let needle = self.search.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.title_matches(&needle))
            .collect()
    }

    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadStatus::Loading
    }

    pub fn latest_fetch(&self) -> u64 {
        self.latest_fetch
    }

    fn begin_fetch(&mut self) -> ListEvent {
        self.latest_fetch = self.latest_fetch.saturating_add(1);
        self.load = LoadStatus::Loading;
        ListEvent::FetchRequested {
            seq: self.latest_fetch,
            user_id: self.user_filter,
        }
    }

    fn set_user_filter(&mut self, user_id: Option<UserId>) -> Vec<ListEvent> {
        if self.user_filter == user_id {
            return Vec::new();
        }
        self.user_filter = user_id;
        vec![
            ListEvent::UserFilterChanged(user_id),
            self.begin_fetch(),
        ]
    }

    fn cycled_user_filter(&self, delta: isize) -> Option<UserId> {
        let options: Vec<Option<UserId>> = std::iter::once(None)
            .chain(self.known_user_ids.iter().copied().map(Some))
            .collect();
        let current = options
            .iter()
            .position(|option| *option == self.user_filter)
            .unwrap_or(0) as isize;
        let len = options.len() as isize;
        options[(current + delta).rem_euclid(len) as usize]
    }

    fn edit_form(&mut self, edit: impl FnOnce(&mut ItemForm)) -> Vec<ListEvent> {
        match self.form.as_mut() {
            Some(form) if !form.is_submitting() => {
                edit(form);
                vec![ListEvent::FormEdited]
            }
            _ => Vec::new(),
        }
    }

    fn submit_form(&mut self) -> Vec<ListEvent> {
        let seq = self.save_seq.saturating_add(1);
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        if form.is_submitting() {
            return Vec::new();
        }
        match form.validate() {
            Ok(candidate) => {
                form.pending_save = Some(seq);
                form.error = None;
                self.save_seq = seq;
                vec![ListEvent::SaveRequested { seq, candidate }]
            }
            Err(error) => {
                form.error = Some(error.clone());
                vec![ListEvent::FormRejected(error)]
            }
        }
    }

    fn apply_list(
        &mut self,
        seq: u64,
        user_id: Option<UserId>,
        result: Result<Vec<Item>, RepoError>,
    ) -> Vec<ListEvent> {
        if seq != self.latest_fetch {
            tracing::debug!(seq, latest = self.latest_fetch, "dropping stale list response");
            return vec![ListEvent::StaleResponseDropped { seq }];
        }

        match result {
            Ok(items) => {
                let mut seen = HashSet::with_capacity(items.len());
                self.items = items
                    .into_iter()
                    .filter(|item| seen.insert(item.id))
                    .collect();
                self.load = LoadStatus::Idle;
                if user_id.is_none() {
                    self.known_user_ids = self.items.iter().map(|item| item.user_id).collect();
                }
                tracing::info!(count = self.items.len(), ?user_id, "items loaded");
                vec![ListEvent::CollectionReplaced(self.items.len())]
            }
            Err(error) => {
                tracing::warn!(%error, ?user_id, "list request failed");
                self.items.clear();
                let message = format!("failed to fetch items: {error}");
                self.load = LoadStatus::Failed(message.clone());
                vec![ListEvent::LoadFailed(message)]
            }
        }
    }

    fn apply_delete(&mut self, id: ItemId, result: Result<(), RepoError>) -> Vec<ListEvent> {
        match result {
            Ok(()) => {
                self.items.retain(|item| item.id != id);
                vec![
                    ListEvent::ItemRemoved(id),
                    self.show_notice(NoticeKind::Success, format!("item {id} deleted")),
                ]
            }
            Err(error) => {
                tracing::warn!(%error, %id, "delete failed");
                vec![self.show_notice(
                    NoticeKind::Error,
                    format!("failed to delete item {id}: {error}; try again"),
                )]
            }
        }
    }

    fn next_save_seq(&mut self) -> u64 {
        self.save_seq = self.save_seq.saturating_add(1);
        self.save_seq
    }

    /// The open form, if it is the one that issued save `seq`. A form opened
    /// after its predecessor was cancelled mid-save never matches.
    fn form_awaiting(&mut self, seq: u64) -> Option<&mut ItemForm> {
        self.form
            .as_mut()
            .filter(|form| form.pending_save == Some(seq))
    }

    fn apply_save(
        &mut self,
        seq: u64,
        kind: SaveKind,
        result: Result<Item, RepoError>,
    ) -> Vec<ListEvent> {
        let item = match result {
            Ok(item) => item,
            Err(error) => {
                tracing::warn!(%error, seq, kind = kind.as_str(), "save failed");
                if let Some(form) = self.form_awaiting(seq) {
                    form.pending_save = None;
                }
                return vec![self.show_notice(
                    NoticeKind::Error,
                    format!("failed to {} item: {error}; try again", kind.as_str()),
                )];
            }
        };

        let id = item.id;
        let mut events = match kind {
            SaveKind::Update => {
                if let Some(slot) = self.items.iter_mut().find(|existing| existing.id == id) {
                    *slot = item;
                }
                vec![
                    ListEvent::ItemReplaced(id),
                    self.show_notice(NoticeKind::Success, format!("item {id} updated")),
                ]
            }
            SaveKind::Create => {
                self.items.retain(|existing| existing.id != id);
                self.known_user_ids.insert(item.user_id);
                self.items.insert(0, item);
                vec![
                    ListEvent::ItemAdded(id),
                    self.show_notice(NoticeKind::Success, format!("item {id} added")),
                ]
            }
        };
        if self.form_awaiting(seq).is_some() {
            self.form = None;
            events.push(ListEvent::FormClosed);
        }
        events
    }

    fn show_notice(&mut self, kind: NoticeKind, text: String) -> ListEvent {
        self.notice_seq = self.notice_seq.saturating_add(1);
        let notice = Notice {
            kind,
            text,
            token: self.notice_seq,
        };
        self.notice = Some(notice.clone());
        ListEvent::NoticeShown(notice)
    }
}
