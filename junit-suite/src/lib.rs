// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read and write JUnit `<testsuite>` documents.
//!
//! This crate models a single testsuite report file: its properties, its
//! testcases in document order, and the pass/fail/skip status of each case.
//! Parsing tolerates the raw ESC bytes that some producers leave in their
//! output, and serializing omits absent `<failure>`/`<skipped>` elements
//! entirely instead of emitting empty placeholder tags.

mod errors;
mod parse;
mod report;
mod serialize;

pub use errors::*;
pub use report::*;
