//! # Shelf Architecture
//!
//! Shelf is a **resource store library**: notes, blog posts, file records and
//! the vice bank's users, deposits and purchases, each kept behind one storage
//! contract whose backend is chosen at startup. The `shelf` binary is a thin
//! client of the library; any other front end (an HTTP service, say) would
//! wire it up the same way.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Binary (main.rs, args.rs, print.rs)                        │
//! │  - Reads the environment, installs tracing, prints output   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Services + Factory (services.rs, factory.rs)               │
//! │  - One SharedStore per entity kind                          │
//! │  - Backend chosen per module, memory as the fallback        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - Store trait, MemoryStore                                 │
//! │  - Repository = MemoryStore + Persistence strategy          │
//! │    (none, JSON file, sled document tree)                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model (model/)                                             │
//! │  - Entity trait, schema validation, the six entity kinds    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Beside the request flow, [`schedule`] runs the periodic backup of every
//! store and the log cycling of the [`logging::Logger`].
//!
//! ## Key Principle: Explicit Configuration
//!
//! The environment is read exactly once, by [`config::ShelfConfig::from_env`].
//! Everything below receives the resulting value (or a piece of it) as an
//! argument, so tests build configurations with
//! [`config::ShelfConfig::from_vars`] and never touch process state.
//!
//! ## Module Overview
//!
//! - [`model`]: `Entity` trait, field schemas and the entity kinds
//! - [`store`]: `Store` trait, memory store, file and document persistence
//! - [`factory`]: Backend selection with memory fallback
//! - [`services`]: All stores opened together
//! - [`schedule`]: Schedules, backup runs and the recurring tasks
//! - [`logging`]: The `Logger` capability and its sinks
//! - [`config`]: Environment-driven configuration
//! - [`error`]: Error types and their HTTP mapping

pub mod config;
pub mod error;
pub mod factory;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod services;
pub mod store;
