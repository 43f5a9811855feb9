// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use itemboard_api::Client;
use itemboard_app::{Item, ItemDraft, ItemId, RepoError, SaveCandidate, UserId};
use itemboard_tui::{InternalEvent, ItemRuntime, post};
use std::sync::mpsc::Sender;
use std::thread;

/// Runs each repository call on its own short-lived thread so the UI keeps
/// drawing while requests are in flight. Workers get a clone of the runtime
/// and go through the same synchronous calls the trait defaults use.
#[derive(Debug, Clone)]
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn spawn_worker<F>(&self, name: &str, tx: Sender<InternalEvent>, job: F) -> Result<()>
    where
        F: FnOnce(&mut HttpRuntime) -> InternalEvent + Send + 'static,
    {
        let mut worker = self.clone();
        thread::Builder::new()
            .name(format!("itemboard-{name}"))
            .spawn(move || {
                let event = job(&mut worker);
                if let Err(error) = post(&tx, event) {
                    tracing::debug!(%error, "ui exited before result arrived");
                }
            })
            .with_context(|| format!("spawn {name} worker"))?;
        Ok(())
    }
}

impl ItemRuntime for HttpRuntime {
    fn list_items(&mut self, user_id: Option<UserId>) -> Result<Vec<Item>, RepoError> {
        self.client.list(user_id)
    }

    fn create_item(&mut self, draft: &ItemDraft) -> Result<Item, RepoError> {
        self.client.create(draft)
    }

    fn update_item(&mut self, item: &Item) -> Result<Item, RepoError> {
        self.client.update(item)
    }

    fn delete_item(&mut self, id: ItemId) -> Result<(), RepoError> {
        self.client.delete(id)
    }

    fn spawn_list(
        &mut self,
        seq: u64,
        user_id: Option<UserId>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        self.spawn_worker("list", tx, move |worker| InternalEvent::ListLoaded {
            seq,
            user_id,
            result: worker.list_items(user_id),
        })
    }

    fn spawn_delete(&mut self, id: ItemId, tx: Sender<InternalEvent>) -> Result<()> {
        self.spawn_worker("delete", tx, move |worker| InternalEvent::Deleted {
            id,
            result: worker.delete_item(id),
        })
    }

    fn spawn_save(
        &mut self,
        seq: u64,
        candidate: SaveCandidate,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        self.spawn_worker("save", tx, move |worker| {
            let kind = candidate.kind();
            let result = match &candidate {
                SaveCandidate::Create(draft) => worker.create_item(draft),
                SaveCandidate::Update(item) => worker.update_item(item),
            };
            InternalEvent::Saved { seq, kind, result }
        })
    }
}
