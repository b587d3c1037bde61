// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle, live delivery, and background sweeps for Parlor.
//!
//! The [`ChatService`] is the single entry point for customer and admin
//! operations; the [`InactivityReaper`] and [`RetentionPurger`] run as
//! independent periodic tasks; the [`ChatFanout`] pushes events to
//! connected clients.

pub mod clock;
pub mod fanout;
pub mod purger;
pub mod reaper;
pub mod service;
pub mod shutdown;
pub mod transition;
pub mod triage;

pub use fanout::{ChatFanout, LiveEvent};
pub use purger::RetentionPurger;
pub use reaper::InactivityReaper;
pub use service::{ChatService, SessionDetail};
pub use transition::{SessionEvent, transition};
pub use triage::{Pagination, TriageFilter, TriagePage};
