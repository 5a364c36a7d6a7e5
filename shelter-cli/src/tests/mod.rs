//! Shared test harness modules for the shelter-map CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod convert_steps;
mod helpers;
