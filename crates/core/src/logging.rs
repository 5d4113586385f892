// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

//! Structured logging bootstrap.
//!
//! No process-wide mutable singletons beyond what `tracing`'s global
//! dispatcher itself requires; everything tunable lives in
//! [`crate::config::TabletCoreConfig`] and is threaded through explicitly.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a `tracing_subscriber::fmt` subscriber once per process.
///
/// Safe to call from multiple tests concurrently; only the first call
/// takes effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
