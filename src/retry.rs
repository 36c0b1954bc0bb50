// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deferred retries for forbidden calls.
//!
//! The vendor API answers HTTP 403 when a call arrives at a bad moment
//! (device busy, backend throttling). The original caller gets no result;
//! instead the identical call is queued to be replayed after a fixed delay.
//!
//! Retries are plain queue entries with a deadline rather than detached
//! timers: callers can inspect them ([`Session::pending_retries`]), cancel
//! them ([`Session::cancel_retries`]) and drive them
//! ([`Session::run_due_retries`]), including under a paused test clock.
//!
//! [`Session::pending_retries`]: crate::Session::pending_retries
//! [`Session::cancel_retries`]: crate::Session::cancel_retries
//! [`Session::run_due_retries`]: crate::Session::run_due_retries

use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::{Payload, RequestKind};

/// Default delay before a forbidden call is replayed.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// A queued replay of a forbidden call.
#[derive(Debug, Clone)]
pub struct PendingRetry {
    kind: RequestKind,
    payload: Payload,
    deadline: Instant,
}

impl PendingRetry {
    /// Returns the request kind to replay.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the payload to replay.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the instant at which this retry becomes due.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Splits the entry into the call to replay.
    pub(crate) fn into_parts(self) -> (RequestKind, Payload) {
        (self.kind, self.payload)
    }
}

/// FIFO queue of pending retries.
#[derive(Debug, Default)]
pub(crate) struct RetryQueue {
    entries: Vec<PendingRetry>,
}

impl RetryQueue {
    /// Queues exactly one replay of `(kind, payload)`, due after `delay`.
    pub(crate) fn schedule(&mut self, kind: RequestKind, payload: Payload, delay: Duration) {
        self.entries.push(PendingRetry {
            kind,
            payload,
            deadline: Instant::now() + delay,
        });
    }

    /// Returns the queued retries, oldest first.
    pub(crate) fn pending(&self) -> &[PendingRetry] {
        &self.entries
    }

    /// Returns the earliest deadline, if any retry is queued.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(PendingRetry::deadline).min()
    }

    /// Removes and returns every retry whose deadline has passed.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<PendingRetry> {
        let (due, pending) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.deadline <= now);
        self.entries = pending;
        due
    }

    /// Puts taken entries back, keeping their original deadlines.
    pub(crate) fn restore(&mut self, entries: impl IntoIterator<Item = PendingRetry>) {
        self.entries.extend(entries);
    }

    /// Drops every queued retry.
    pub(crate) fn cancel_all(&mut self) {
        self.entries.clear();
    }
}
