// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for epoch timestamps.

use chrono::Utc;

/// Current wall-clock time in epoch seconds.
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Absolute expiration (epoch seconds) for a token valid `expires_in` seconds from `now`.
pub fn expiration_from(now: i64, expires_in: i64) -> i64 {
    now.saturating_add(expires_in)
}
