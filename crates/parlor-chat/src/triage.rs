// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin triage projection: queue classification, ordering, pagination.
//!
//! Works over [`TriageRow`]s the storage layer derives by scanning each
//! session's ledger; classification and ordering here are pure functions of
//! those rows.

use parlor_core::types::{SenderRole, TriageRow};
use serde::Serialize;
use strum::{Display, EnumString};

/// Which admin queue to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TriageFilter {
    /// Live sessions (pending or open) with at least one visible message.
    #[default]
    All,
    /// Live sessions whose most recent visible message is from the customer.
    Unreplied,
    /// Live sessions whose most recent visible message is from an admin.
    Replied,
    /// The trash queue: closed sessions.
    Deleted,
}

impl TriageFilter {
    /// Whether this filter reads from the closed-session set.
    pub fn is_closed_queue(self) -> bool {
        matches!(self, TriageFilter::Deleted)
    }
}

/// Pagination envelope for a triage page.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of the requested queue, newest activity first.
#[derive(Debug, Serialize)]
pub struct TriagePage {
    pub sessions: Vec<TriageRow>,
    pub pagination: Pagination,
}

/// Classifies, orders, and paginates projection rows into a queue page.
///
/// Rows are sorted descending by the timestamp of their most recent visible
/// message, falling back to the session's `updated_at` when no visible
/// message remains. `page` is 1-based; out-of-range pages yield an empty
/// list with correct totals.
pub fn project(rows: Vec<TriageRow>, filter: TriageFilter, page: u64, limit: u64) -> TriagePage {
    let page = page.max(1);
    let limit = limit.max(1);

    let mut rows: Vec<TriageRow> = rows
        .into_iter()
        .filter(|row| matches_filter(row, filter))
        .collect();

    rows.sort_by(|a, b| sort_key(b).cmp(sort_key(a)));

    let total = rows.len() as u64;
    let total_pages = total.div_ceil(limit);
    let start = ((page - 1) * limit) as usize;
    let sessions: Vec<TriageRow> = if start >= rows.len() {
        Vec::new()
    } else {
        rows.drain(start..).take(limit as usize).collect()
    };

    TriagePage {
        sessions,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
    }
}

fn matches_filter(row: &TriageRow, filter: TriageFilter) -> bool {
    match filter {
        // The trash queue shows every closed session, even when moderation
        // has hidden its whole transcript.
        TriageFilter::Deleted => true,
        TriageFilter::All => row.visible_count > 0,
        TriageFilter::Unreplied => {
            row.visible_count > 0 && row.last_visible_role == Some(SenderRole::Customer)
        }
        TriageFilter::Replied => {
            row.visible_count > 0 && row.last_visible_role == Some(SenderRole::Admin)
        }
    }
}

fn sort_key(row: &TriageRow) -> &str {
    row.last_visible_at
        .as_deref()
        .unwrap_or(&row.session.updated_at)
}
