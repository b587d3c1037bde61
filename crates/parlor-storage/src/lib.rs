// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Parlor support-chat service.
//!
//! Sessions and their message ledgers are stored in two tables with a
//! monotonic per-session sequence number as the chronological sort key.
//! All access goes through [`SqliteStorage`], which implements the
//! [`parlor_core::ChatStorage`] trait.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
