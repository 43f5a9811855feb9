// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Item, ItemDraft, ItemId, SaveCandidate, UserId, ValidationError};

pub const DEFAULT_FORM_USER_ID: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Body,
    UserId,
}

impl FormField {
    pub const ALL: [Self; 3] = [Self::Title, Self::Body, Self::UserId];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "description",
            Self::UserId => "user id",
        }
    }

    fn rotate(self, delta: isize) -> Self {
        let fields = Self::ALL;
        let current = fields
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0) as isize;
        let len = fields.len() as isize;
        fields[(current + delta).rem_euclid(len) as usize]
    }
}

/// Input collected by the add/edit surface. The raw user id is kept as text
/// so a half-typed value can be shown and corrected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    pub editing: Option<ItemId>,
    pub title: String,
    pub body: String,
    pub user_id: String,
    pub focus: FormField,
    /// Tag of the save request in flight for this form, if any.
    pub pending_save: Option<u64>,
    pub error: Option<ValidationError>,
}

impl ItemForm {
    pub fn blank() -> Self {
        Self {
            editing: None,
            title: String::new(),
            body: String::new(),
            user_id: DEFAULT_FORM_USER_ID.to_owned(),
            focus: FormField::Title,
            pending_save: None,
            error: None,
        }
    }

    pub fn for_item(item: &Item) -> Self {
        Self {
            editing: Some(item.id),
            title: item.title.clone(),
            body: item.body.clone(),
            user_id: item.user_id.to_string(),
            focus: FormField::Title,
            pending_save: None,
            error: None,
        }
    }

    pub const fn is_submitting(&self) -> bool {
        self.pending_save.is_some()
    }

    pub const fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn heading(&self) -> &'static str {
        if self.is_edit() {
            "edit item"
        } else {
            "add new item"
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Body => &self.body,
            FormField::UserId => &self.user_id,
        }
    }

    fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Title => &mut self.title,
            FormField::Body => &mut self.body,
            FormField::UserId => &mut self.user_id,
        }
    }

    pub fn push_char(&mut self, value: char) {
        let focus = self.focus;
        self.field_mut(focus).push(value);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        self.field_mut(focus).pop();
        self.error = None;
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.rotate(1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.rotate(-1);
    }

    /// Live hint shown under the user id field while typing.
    pub fn user_id_hint(&self) -> Option<&'static str> {
        match parse_user_id(&self.user_id) {
            Some(_) => None,
            None => Some("user id must be 1 or greater"),
        }
    }

    pub fn validate(&self) -> Result<SaveCandidate, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        let user_id = parse_user_id(&self.user_id)
            .ok_or_else(|| ValidationError::InvalidUserId(self.user_id.clone()))?;

        let draft = ItemDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            user_id,
        };
        Ok(match self.editing {
            Some(id) => SaveCandidate::Update(Item {
                id,
                title: draft.title,
                body: draft.body,
                user_id: draft.user_id,
            }),
            None => SaveCandidate::Create(draft),
        })
    }
}

pub fn parse_user_id(raw: &str) -> Option<UserId> {
    let value: i64 = raw.trim().parse().ok()?;
    (value >= 1).then_some(UserId::new(value))
}
