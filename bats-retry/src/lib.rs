// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-run failed and skipped testcases from BATS JUnit reports.
//!
//! Given a directory of JUnit XML reports produced by a BATS run, this tool
//! selects the testcases that did not pass and either writes a shell script
//! that re-runs exactly those cases, or re-runs them directly and rewrites
//! each report in place so that now-passing cases look like they passed all
//! along.

mod dispatch;
mod errors;
mod output;
mod plan;
mod reexec;

pub use dispatch::BatsRetryApp;
pub use errors::ExpectedError;
pub use output::OutputContext;

pub(crate) use errors::Result;
