// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use std::fmt;

/// The error taxonomy shared by every tablet-core crate.
///
/// Kinds mirror the kinds a `Status` carries in the upstream engine this
/// core is modeled on: callers match on [`ErrorKind`] to decide whether an
/// operation is retryable, a protocol violation, or an expected-missing
/// condition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalState, message)
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corruption, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimedOut, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

/// See spec §7. `Corruption` only ever surfaces from an out-of-scope
/// collaborator (on-disk formats, wire messages) that this core does not
/// itself implement, but the variant exists so those collaborators have a
/// kind to report through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    IllegalState,
    Corruption,
    ServiceUnavailable,
    TimedOut,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::IllegalState => "illegal state",
            ErrorKind::Corruption => "corruption",
            ErrorKind::ServiceUnavailable => "service unavailable",
            ErrorKind::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}
