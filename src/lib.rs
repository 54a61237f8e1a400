//! request-debug is an HTTP request/response introspection middleware.
//!
//! Inserted into a `tower` / axum handler chain, it captures headers,
//! cookies, query parameters, form fields and size metadata of each request
//! (and optionally of its response) and emits them as structured records
//! for troubleshooting. It never alters what the client sees.
//!
//! # Architecture
//!
//! - [`middleware`] -- The [`DebugLayer`](middleware::DebugLayer) itself:
//!   directive parsing, handler configuration, field extraction, correlation
//!   IDs, response capture and record sinks.
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, parse).
//! - [`config`] -- Host configuration file model, loading and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`server`] -- Axum server that serves static routes behind debug chains,
//!   with graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod server;
