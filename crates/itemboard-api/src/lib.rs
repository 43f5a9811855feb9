// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use itemboard_app::{Item, ItemDraft, ItemId, RepoError, UserId};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Blocking client for a REST item collection. Every call is one round trip
/// with no retry and no caching.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(trimmed).with_context(|| format!("parse base url {trimmed:?}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url {trimmed:?} uses scheme {:?}; use http or https",
                parsed.scheme()
            );
        }
        if parsed.cannot_be_a_base() {
            bail!("api.base_url {trimmed:?} cannot carry item paths");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url: parsed,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn list(&self, user_id: Option<UserId>) -> Result<Vec<Item>, RepoError> {
        let mut url = self.base_url.clone();
        if let Some(user_id) = user_id {
            url.query_pairs_mut()
                .append_pair("userId", &user_id.to_string());
        }

        let body = self.send("GET", self.http.get(url.clone()), &url)?;
        let items: Vec<Item> = decode(&body, "item list")?;
        items.into_iter().map(check_item).collect()
    }

    pub fn create(&self, draft: &ItemDraft) -> Result<Item, RepoError> {
        let url = self.base_url.clone();
        let body = self.send("POST", self.http.post(url.clone()).json(draft), &url)?;
        check_item(decode(&body, "created item")?)
    }

    pub fn update(&self, item: &Item) -> Result<Item, RepoError> {
        let url = self.item_url(item.id)?;
        let body = self.send("PUT", self.http.put(url.clone()).json(item), &url)?;
        let updated = check_item(decode(&body, "updated item")?)?;
        if updated.id != item.id {
            return Err(RepoError::Decode(format!(
                "update of item {} returned item {}",
                item.id, updated.id
            )));
        }
        Ok(updated)
    }

    pub fn delete(&self, id: ItemId) -> Result<(), RepoError> {
        let url = self.item_url(id)?;
        self.send("DELETE", self.http.delete(url.clone()), &url)?;
        Ok(())
    }

    fn item_url(&self, id: ItemId) -> Result<Url, RepoError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepoError::Network(format!("{} cannot carry item paths", self.base_url)))?
            .pop_if_empty()
            .push(&id.to_string());
        Ok(url)
    }

    fn send(&self, method: &str, request: RequestBuilder, url: &Url) -> Result<String, RepoError> {
        tracing::debug!(method, %url, "sending request");
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|error| connection_error(url, error))?;
        read_success_body(method, url, response)
    }
}

fn read_success_body(method: &str, url: &Url, response: Response) -> Result<String, RepoError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        tracing::warn!(method, %url, status = status.as_u16(), "request rejected");
        return Err(clean_error_response(status, &body));
    }

    response
        .text()
        .map_err(|error| RepoError::Network(format!("read response from {url}: {error}")))
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, RepoError> {
    serde_json::from_str(body).map_err(|error| RepoError::Decode(format!("{what}: {error}")))
}

fn check_item(item: Item) -> Result<Item, RepoError> {
    if item.id.get() < 1 {
        return Err(RepoError::Decode(format!(
            "item id must be positive, got {}",
            item.id
        )));
    }
    if item.user_id.get() < 1 {
        return Err(RepoError::Decode(format!(
            "item {} has userId {}; expected 1 or greater",
            item.id, item.user_id
        )));
    }
    Ok(item)
}

fn connection_error(url: &Url, error: reqwest::Error) -> RepoError {
    tracing::warn!(%url, %error, "transport failure");
    let host = url.host_str().unwrap_or("server");
    RepoError::Network(format!("cannot reach {host} -- check your connection ({error})"))
}

fn clean_error_response(status: StatusCode, body: &str) -> RepoError {
    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return RepoError::Network(format!("server error ({}): {}", status.as_u16(), body));
    }
    RepoError::Network(format!("server returned {}", status.as_u16()))
}
