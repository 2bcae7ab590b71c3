// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::{error::Error, process::ExitStatus};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the
// expected way to print out errors is with the display_to_stderr method.

/// A fatal error: either bad invocation or a structural problem that makes the
/// retry plan untrustworthy. Always aborts the run with a non-zero exit.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("no test directory specified")]
    NoTestDirectory,

    #[error("no test script location specified")]
    NoTestScriptLocation,

    #[error("error reading test directory")]
    TestDirectoryRead {
        dir: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("error processing file")]
    ReportProcess {
        #[from]
        err: ReportError,
    },

    #[error("error writing test script")]
    ScriptWrite {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("error executing bats commands")]
    RetryFailed {
        #[from]
        errors: RetryErrors,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        // Every fatal and aggregated failure exits 1; success paths
        // (including "nothing to retry") exit 0 before reaching here.
        1
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::NoTestDirectory => {
                tracing::error!("No test directory specified");
                None
            }
            Self::NoTestScriptLocation => {
                tracing::error!("No test script location specified");
                None
            }
            Self::TestDirectoryRead { dir, err } => {
                tracing::error!("Error reading test directory `{}`", dir.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::ReportProcess { err } => {
                tracing::error!("Error processing file");
                Some(err as &dyn Error)
            }
            Self::ScriptWrite { path, err } => {
                tracing::error!("Error writing test script `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::RetryFailed { errors } => {
                tracing::error!("Error executing bats commands");
                for error in &errors.errors {
                    tracing::error!(target: "bats_retry::no_heading", "- {error}");
                    let mut source = error.source();
                    while let Some(err) = source {
                        tracing::error!(target: "bats_retry::no_heading", "  caused by: {err}");
                        source = err.source();
                    }
                }
                None
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "bats_retry::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

/// A per-report failure while building the retry plan.
///
/// These are fatal to the whole run: silently skipping a broken report would
/// hide a real result.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("malformed report `{path}`")]
    Malformed {
        path: Utf8PathBuf,
        #[source]
        err: junit_suite::ParseError,
    },

    #[error("report `{path}` has no usable BATS_CWD property; unable to resolve the test file")]
    UnresolvableSource { path: Utf8PathBuf },
}

/// A per-testcase failure during direct re-execution.
///
/// These are recorded and aggregated; the run continues with the next case so
/// that a single flaky subprocess does not mask results for other cases.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("failed to execute `{command}`")]
    Exec {
        command: String,
        #[source]
        err: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("failed to update report for testcase `{testcase}`")]
    Rewrite {
        testcase: String,
        #[source]
        err: RewriteError,
    },
}

/// A failure while rewriting a report after a successful re-run.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("malformed report `{path}`")]
    Malformed {
        path: Utf8PathBuf,
        #[source]
        err: junit_suite::ParseError,
    },

    #[error("testcase `{testcase}` appears {count} times in `{path}`; refusing to update an ambiguous report")]
    DuplicateTestcase {
        path: Utf8PathBuf,
        testcase: String,
        count: usize,
    },

    #[error("testcase `{testcase}` not found in `{path}`")]
    TestcaseNotFound {
        path: Utf8PathBuf,
        testcase: String,
    },

    #[error("failed to serialize report for `{path}`")]
    Serialize {
        path: Utf8PathBuf,
        #[source]
        err: junit_suite::SerializeError,
    },

    #[error("failed to write `{path}`")]
    Write {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
}

/// The collection of all per-testcase failures from a direct-execution run.
///
/// Non-empty iff at least one re-run command or report rewrite failed after
/// every case was attempted.
#[derive(Debug, Error)]
#[error("{} testcase retries failed", .errors.len())]
pub struct RetryErrors {
    pub errors: Vec<RetryError>,
}
