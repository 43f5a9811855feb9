// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::ids::*;

pub const BODY_PREVIEW_CHARS: usize = 100;
pub const PREVIEW_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

impl Item {
    pub fn title_matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.title.to_lowercase().contains(needle_lower)
    }

    /// True when the body is longer than the collapsed preview and needs a
    /// read-more toggle.
    pub fn body_is_long(&self) -> bool {
        self.body.chars().count() > BODY_PREVIEW_CHARS
    }

    pub fn body_preview(&self, expanded: bool) -> Cow<'_, str> {
        if expanded || !self.body_is_long() {
            return Cow::Borrowed(&self.body);
        }
        let mut preview: String = self.body.chars().take(BODY_PREVIEW_CHARS).collect();
        preview.push_str(PREVIEW_ELLIPSIS);
        Cow::Owned(preview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCandidate {
    Create(ItemDraft),
    Update(Item),
}

impl SaveCandidate {
    pub const fn kind(&self) -> SaveKind {
        match self {
            Self::Create(_) => SaveKind::Create,
            Self::Update(_) => SaveKind::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Create,
    Update,
}

impl SaveKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "add",
            Self::Update => "update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub token: u64,
}
