// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    Result,
    errors::ExpectedError,
    output::{OutputContext, OutputOpts},
    plan, reexec,
};
use camino::Utf8PathBuf;
use tracing::{info, info_span};

/// Re-run failed and skipped testcases from BATS JUnit reports.
///
/// Scans a directory of JUnit XML reports, selects every testcase that failed
/// or was skipped, and either writes a script that re-runs exactly those
/// cases or re-runs them directly, rewriting each report in place as cases
/// start passing.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct BatsRetryApp {
    /// Directory containing the JUnit XML reports
    test_directory: Option<Utf8PathBuf>,

    /// Location to write the retry script to
    test_script: Option<Utf8PathBuf>,

    /// Execute bats commands directly instead of writing a script
    #[arg(long)]
    execute: bool,

    #[command(flatten)]
    output: OutputOpts,
}

impl BatsRetryApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, _output: OutputContext) -> Result<i32> {
        let Some(test_directory) = self.test_directory else {
            return Err(ExpectedError::NoTestDirectory);
        };
        // In script mode the output location must be known before any work
        // happens; in direct mode a provided script path is ignored.
        let test_script = if self.execute {
            None
        } else {
            Some(
                self.test_script
                    .ok_or(ExpectedError::NoTestScriptLocation)?,
            )
        };

        let span = info_span!("run", test_directory = %test_directory);
        let _guard = span.enter();

        let retry_plan = plan::build_plan(&test_directory)?;
        if retry_plan.is_empty() {
            info!("No testsuites found");
            return Ok(0);
        }

        match test_script {
            Some(script_path) => {
                plan::write_script(&script_path, &retry_plan.render_script())?;
                info!("wrote retry script `{script_path}`");
            }
            None => {
                reexec::execute_plan(&retry_plan)?;
            }
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::tempdir;
    use clap::Parser;

    fn test_output() -> OutputContext {
        OutputContext {
            color: Color::Never,
        }
    }

    fn parse_app(args: &[&str]) -> BatsRetryApp {
        BatsRetryApp::try_parse_from(
            std::iter::once("bats-retry").chain(args.iter().copied()),
        )
        .expect("arguments parse")
    }

    #[test]
    fn missing_test_directory_is_an_error() {
        let app = parse_app(&[]);
        let err = app.exec(test_output()).unwrap_err();
        assert!(matches!(err, ExpectedError::NoTestDirectory));
        assert_eq!(err.process_exit_code(), 1);
    }

    #[test]
    fn missing_script_location_is_an_error_without_execute() {
        let app = parse_app(&["reports"]);
        let err = app.exec(test_output()).unwrap_err();
        assert!(matches!(err, ExpectedError::NoTestScriptLocation));

        // --execute does not need a script location.
        let dir = tempdir().expect("tempdir created");
        let app = parse_app(&[dir.path().as_str(), "--execute"]);
        assert_eq!(app.exec(test_output()).expect("empty run succeeds"), 0);
    }

    #[test]
    fn empty_report_directory_exits_zero() {
        let dir = tempdir().expect("tempdir created");
        let script = dir.path().join("retry.sh");
        let app = parse_app(&[dir.path().as_str(), script.as_str()]);
        assert_eq!(app.exec(test_output()).expect("empty run succeeds"), 0);
        // Nothing to retry means no script is written either.
        assert!(!script.exists());
    }

    #[test]
    fn script_mode_writes_the_retry_script() {
        let dir = tempdir().expect("tempdir created");
        fs_err::write(
            dir.path().join("nginx.xml"),
            r#"<testsuite name="nginx.bats">
                <properties><property name="BATS_CWD" value="/home/ci/project"/></properties>
                <testcase name="nginx:set proxy-busy-buffers-size">
                    <failure type="failure">exit status 1</failure>
                </testcase>
            </testsuite>"#,
        )
        .expect("fixture written");

        let script_path = dir.path().join("retry.sh");
        let app = parse_app(&[dir.path().as_str(), script_path.as_str()]);
        assert_eq!(app.exec(test_output()).expect("script run succeeds"), 0);

        let script = fs_err::read_to_string(&script_path).expect("script readable");
        let lines: Vec<_> = script.lines().collect();
        assert_eq!(lines.len(), 4, "script: {script}");
        assert_eq!(lines[0], "#!/usr/bin/env bash");
        assert!(
            lines[3].contains("nginx:set proxy-busy-buffers-size")
                && lines[3].contains("/home/ci/project/nginx.bats")
        );
    }
}
