// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-run testcases directly and reconcile their reports.

use crate::{
    errors::{RetryError, RetryErrors, RewriteError},
    plan::{RetryPlan, escape_testcase},
};
use camino::Utf8Path;
use junit_suite::Testsuite;
use std::time::{Duration, Instant};
use tracing::{info, info_span};

const BATS_PROGRAM: &str = "bats";

/// Runs every entry of the plan sequentially: one bats invocation, then one
/// report rewrite, before the next entry begins.
///
/// Per-testcase failures are recorded and the run continues, so a single
/// flaky subprocess does not mask results for other cases. Returns the
/// aggregated failures, if any, after all cases were attempted.
pub(crate) fn execute_plan(plan: &RetryPlan) -> Result<(), RetryErrors> {
    let mut errors = Vec::new();

    for report in &plan.reports {
        let report_span = info_span!("report", file = %report.report_path);
        let _report_guard = report_span.enter();

        for entry in &report.entries {
            let testcase_span = info_span!("testcase", name = %entry.testcase);
            let _testcase_guard = testcase_span.enter();

            let filter = escape_testcase(&entry.testcase);
            let command = shell_words::join([
                BATS_PROGRAM,
                "--filter",
                filter.as_str(),
                entry.test_file.as_str(),
            ]);
            info!("executing `{command}`");

            let start = Instant::now();
            let run_result = duct::cmd(
                BATS_PROGRAM,
                ["--filter", filter.as_str(), entry.test_file.as_str()],
            )
            .unchecked()
            .run();

            match run_result {
                Err(err) => {
                    errors.push(RetryError::Exec { command, err });
                    continue;
                }
                Ok(output) if !output.status.success() => {
                    errors.push(RetryError::CommandFailed {
                        command,
                        status: output.status,
                    });
                    continue;
                }
                Ok(_) => {}
            }
            let elapsed = start.elapsed();

            if let Err(err) = reconcile_report(&report.report_path, &entry.testcase, elapsed) {
                errors.push(RetryError::Rewrite {
                    testcase: entry.testcase.clone(),
                    err,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RetryErrors { errors })
    }
}

/// Rewrites a report after a successful re-run: the named testcase loses its
/// failure/skipped markers and takes the elapsed duration; everything else in
/// the document is preserved.
///
/// A testcase name that is missing or appears more than once is an error --
/// updating an ambiguous report would silently guess which result to keep.
pub(crate) fn reconcile_report(
    report_path: &Utf8Path,
    testcase: &str,
    elapsed: Duration,
) -> Result<(), RewriteError> {
    info!("updating report for testcase");

    let contents =
        fs_err::read_to_string(report_path).map_err(|err| RewriteError::Read {
            path: report_path.to_owned(),
            err,
        })?;
    let mut suite = Testsuite::parse(&contents).map_err(|err| RewriteError::Malformed {
        path: report_path.to_owned(),
        err,
    })?;

    let mut indexes = suite
        .testcases
        .iter()
        .enumerate()
        .filter(|(_, case)| case.name == testcase)
        .map(|(index, _)| index);
    let index = indexes.next().ok_or_else(|| RewriteError::TestcaseNotFound {
        path: report_path.to_owned(),
        testcase: testcase.to_owned(),
    })?;
    let extra_matches = indexes.count();
    if extra_matches > 0 {
        return Err(RewriteError::DuplicateTestcase {
            path: report_path.to_owned(),
            testcase: testcase.to_owned(),
            count: extra_matches + 1,
        });
    }

    suite.testcases[index].mark_passed(elapsed);

    let serialized = suite.to_string().map_err(|err| RewriteError::Serialize {
        path: report_path.to_owned(),
        err,
    })?;
    fs_err::write(report_path, serialized).map_err(|err| RewriteError::Write {
        path: report_path.to_owned(),
        err,
    })?;

    Ok(())
}
