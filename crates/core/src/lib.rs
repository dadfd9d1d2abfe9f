//! Core library for apiwrap
//!
//! This crate implements the **Functional Core** of the apiwrap application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`apiwrap_core`** (this crate): Pure transformation functions with zero I/O
//! - **`apiwrap`**: HTTP adapters, CLI and MCP server (the Imperative Shell)
//!
//! The shell fetches provider data, hands it to the functions here, and sends
//! whatever they produce. Nothing in this crate opens a socket or reads the
//! environment, so every function is tested with plain fixture data.
//!
//! # Module Organization
//!
//! - [`error`]: Provider tags, the shared error taxonomy and success-status policies
//! - [`mapping`]: Symbol to wire value lookup tables with pass-through
//! - [`freshrss`]: Fever API models and the feed/category resolver
//! - [`ticktick`]: Task models, checklist reconciliation and cascade planning
//! - [`pocket`]: Request builders and deleted-item filtering
//! - [`hass`]: Entity and service identifier normalization
//! - [`groq`]: Chat-completion request validation
//! - [`time`]: Unix timestamp rendering
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use apiwrap_core::ticktick::{reconcile_checklist, ChecklistIntent};
//!
//! let current = task.items;
//! let next = reconcile_checklist(current, &ChecklistIntent::Complete(None));
//!
//! assert!(next.iter().all(|item| item.is_completed()));
//! ```

pub mod error;
pub mod freshrss;
pub mod groq;
pub mod hass;
pub mod mapping;
pub mod pocket;
pub mod ticktick;
pub mod time;
