// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use itemboard_app::{Item, ItemId, UserId};
use std::io::Read;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Response, Server};

const TITLE_WORDS: [&str; 12] = [
    "sunt", "qui", "est", "ea", "eum", "dolorem", "nesciunt", "magnam", "facilis", "optio",
    "voluptate", "alias",
];

const BODY_WORDS: [&str; 10] = [
    "quia", "et", "suscipit", "recusandae", "consequuntur", "expedita", "reprehenderit",
    "molestiae", "ut", "quas",
];

/// Items per user in the demo collection the public API serves.
pub const ITEMS_PER_USER: i64 = 10;

pub fn item(id: i64, title: &str, body: &str, user_id: i64) -> Item {
    Item {
        id: ItemId::new(id),
        title: title.to_owned(),
        body: body.to_owned(),
        user_id: UserId::new(user_id),
    }
}

/// Deterministic lorem-style text with exactly `chars` characters.
pub fn body_of_len(chars: usize) -> String {
    let mut out = String::new();
    let mut index = 0;
    while out.chars().count() < chars {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(BODY_WORDS[index % BODY_WORDS.len()]);
        index += 1;
    }
    out.chars().take(chars).collect()
}

/// A collection shaped like the public demo data: `users` users with
/// `ITEMS_PER_USER` items each, ids ascending from 1.
pub fn sample_items(users: i64) -> Vec<Item> {
    (1..=users)
        .flat_map(|user_id| {
            (0..ITEMS_PER_USER).map(move |offset| {
                let id = (user_id - 1) * ITEMS_PER_USER + offset + 1;
                let title = format!(
                    "{} {} {}",
                    TITLE_WORDS[(id as usize) % TITLE_WORDS.len()],
                    TITLE_WORDS[(id as usize * 7) % TITLE_WORDS.len()],
                    id
                );
                let body = body_of_len(40 + (id as usize * 13) % 140);
                item(id, &title, &body, user_id)
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn items(items: &[Item]) -> Result<Self> {
        Ok(Self::json(
            200,
            serde_json::to_string(items).context("encode items")?,
        ))
    }

    pub fn item(item: &Item) -> Result<Self> {
        Ok(Self::json(
            200,
            serde_json::to_string(item).context("encode item")?,
        ))
    }
}

/// A one-shot HTTP server that answers the scripted responses in order and
/// records what it received.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Result<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start(path: &str, responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}{}", server.server_addr(), path);

        let handle = thread::spawn(move || -> Result<Vec<RecordedRequest>> {
            let mut recorded = Vec::with_capacity(responses.len());
            for scripted in responses {
                let mut request = server.recv().context("receive mock request")?;
                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("read mock request body")?;
                let content_type = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Content-Type"))
                    .map(|header| header.value.as_str().to_owned());
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                    content_type,
                });

                let header = Header::from_bytes("Content-Type", "application/json")
                    .map_err(|()| anyhow!("build content type header"))?;
                let response = Response::from_string(scripted.body)
                    .with_status_code(scripted.status)
                    .with_header(header);
                request.respond(response).context("send mock response")?;
            }
            Ok(recorded)
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for every scripted response to be served.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}
