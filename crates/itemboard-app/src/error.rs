// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Failure of a single repository round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    /// Transport failure or a non-success status.
    #[error("network error: {0}")]
    Network(String),
    /// The response body was not a well-formed item payload.
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required -- enter a title and retry")]
    EmptyTitle,
    #[error("body is required -- enter a description and retry")]
    EmptyBody,
    #[error("user id must be 1 or greater, got {0:?}")]
    InvalidUserId(String),
}
