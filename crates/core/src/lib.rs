// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod config;
pub mod logging;

pub use error::{Error, ErrorKind};

mod error;

pub type Result<T> = std::result::Result<T, Error>;
