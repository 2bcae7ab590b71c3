// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Select non-passing testcases and build the retry plan.

use crate::{
    Result,
    errors::{ExpectedError, ReportError},
};
use camino::{Utf8Path, Utf8PathBuf};
use junit_suite::{TestcaseStatus, Testsuite};
use tracing::{debug, info, info_span};

/// The reserved property that locates the directory the tests ran from. The
/// test source file for a report is this value joined with the suite name.
pub(crate) const BATS_CWD_PROPERTY: &str = "BATS_CWD";

const REPORT_SUFFIX: &str = ".xml";

/// The ordered set of testcases to re-run, grouped by originating report.
///
/// Iteration order is report-discovery order (lexicographic by filename),
/// then document order within each report. Built fresh on every invocation
/// and never persisted.
#[derive(Clone, Debug)]
pub(crate) struct RetryPlan {
    pub(crate) reports: Vec<ReportPlan>,
}

/// The retry entries for one report document.
#[derive(Clone, Debug)]
pub(crate) struct ReportPlan {
    /// Path to the report document itself (rewritten after a successful
    /// re-run in direct mode).
    pub(crate) report_path: Utf8PathBuf,
    pub(crate) entries: Vec<RetryEntry>,
}

/// One testcase to re-run, with the test source file that defines it.
#[derive(Clone, Debug)]
pub(crate) struct RetryEntry {
    pub(crate) testcase: String,
    pub(crate) test_file: Utf8PathBuf,
}

impl RetryPlan {
    /// True if no report documents were found at all. This is the valid
    /// "nothing to retry" terminal state, distinct from reports that exist
    /// but have no non-passing cases.
    pub(crate) fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Renders the plan as a deferred execution script: a bash header
    /// followed by one re-run command per non-passing testcase.
    pub(crate) fn render_script(&self) -> String {
        let mut lines = vec![
            "#!/usr/bin/env bash".to_owned(),
            "set -eo pipefail".to_owned(),
            String::new(),
        ];
        for report in &self.reports {
            for entry in &report.entries {
                lines.push(format!(
                    "bats --filter '{}' {}",
                    escape_testcase(&entry.testcase),
                    entry.test_file
                ));
            }
        }

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }
}

/// Builds the retry plan from every report document in the test directory.
///
/// Files without the report suffix are ignored without error. Any failure to
/// read, parse or resolve a retained report is fatal to the whole run.
pub(crate) fn build_plan(test_directory: &Utf8Path) -> Result<RetryPlan> {
    let read_err = |err| ExpectedError::TestDirectoryRead {
        dir: test_directory.to_owned(),
        err,
    };

    let mut file_names = Vec::new();
    for entry in test_directory.read_dir_utf8().map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        if name.ends_with(REPORT_SUFFIX) {
            file_names.push(name.to_owned());
        }
    }
    // Deterministic discovery order, independent of directory iteration.
    file_names.sort_unstable();

    let mut reports = Vec::with_capacity(file_names.len());
    for file_name in file_names {
        let span = info_span!("report", file = %file_name);
        let _guard = span.enter();
        info!("processing");

        let report_path = test_directory.join(&file_name);
        let contents = fs_err::read_to_string(&report_path).map_err(|err| ReportError::Read {
            path: report_path.clone(),
            err,
        })?;
        let suite = Testsuite::parse(&contents).map_err(|err| ReportError::Malformed {
            path: report_path.clone(),
            err,
        })?;

        let (test_file, testcases) = select_cases(&suite, &report_path)?;
        let entries = testcases
            .into_iter()
            .map(|testcase| RetryEntry {
                testcase,
                test_file: test_file.clone(),
            })
            .collect();
        reports.push(ReportPlan {
            report_path,
            entries,
        });
    }

    Ok(RetryPlan { reports })
}

/// Resolves the test source file for a suite and returns the names of its
/// non-passing testcases, in document order.
///
/// Failed and skipped cases are treated identically; passing cases are
/// dropped silently.
pub(crate) fn select_cases(
    suite: &Testsuite,
    report_path: &Utf8Path,
) -> Result<(Utf8PathBuf, Vec<String>), ReportError> {
    let base_dir = suite
        .property(BATS_CWD_PROPERTY)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReportError::UnresolvableSource {
            path: report_path.to_owned(),
        })?;
    let test_file = Utf8PathBuf::from(base_dir).join(&suite.name);

    let mut testcases = Vec::new();
    for testcase in &suite.testcases {
        match &testcase.status {
            TestcaseStatus::Failure { .. } => {
                info!("adding failed testcase `{}`", testcase.name);
                testcases.push(testcase.name.clone());
            }
            TestcaseStatus::Skipped { .. } => {
                info!("adding skipped testcase `{}`", testcase.name);
                testcases.push(testcase.name.clone());
            }
            TestcaseStatus::Success => {
                debug!("testcase `{}` passed; nothing to retry", testcase.name);
            }
        }
    }

    Ok((test_file, testcases))
}

/// Escapes a testcase name for use as a `bats --filter` argument. The filter
/// is a regex, where unescaped parentheses are metacharacters.
pub(crate) fn escape_testcase(testcase: &str) -> String {
    testcase.replace('(', "\\(").replace(')', "\\)")
}

/// Writes the rendered script to disk, executable by its owner.
pub(crate) fn write_script(path: &Utf8Path, contents: &str) -> Result<()> {
    let script_err = |err| ExpectedError::ScriptWrite {
        path: path.to_owned(),
        err,
    };

    fs_err::write(path, contents).map_err(script_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs_err::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .map_err(script_err)?;
    }

    Ok(())
}
