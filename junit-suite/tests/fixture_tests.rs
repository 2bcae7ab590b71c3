// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use junit_suite::{ParseError, TestcaseStatus, Testsuite};
use std::time::Duration;

static BASIC_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="app_tests.bats" tests="4" failures="1" errors="0" skipped="2" time="11.5" hostname="ci-runner">
    <properties>
        <property name="BATS_CWD" value="/home/ci/project"/>
        <property name="BATS_VERSION" value="1.11.0"/>
    </properties>
    <testcase classname="app_tests.bats" name="app create succeeds" time="2.5"/>
    <testcase classname="app_tests.bats" name="nginx:set proxy-busy-buffers-size" time="3.0">
        <failure type="failure">expected 0, got 1</failure>
    </testcase>
    <testcase classname="app_tests.bats" name="app destroy (force)" time="0.0">
        <skipped/>
    </testcase>
    <testcase classname="app_tests.bats" name="app rename" time="6.0">
        <skipped>requires the ps plugin</skipped>
    </testcase>
    <system-out>run logs here</system-out>
</testsuite>
"#;

#[test]
fn parse_basic_report() {
    let suite = Testsuite::parse(BASIC_REPORT).expect("fixture parses");

    assert_eq!(suite.name, "app_tests.bats");
    assert_eq!(suite.property("BATS_CWD"), Some("/home/ci/project"));
    assert_eq!(suite.property("BATS_VERSION"), Some("1.11.0"));
    assert_eq!(suite.property("MISSING"), None);
    assert_eq!(suite.extra.get("tests").map(String::as_str), Some("4"));
    assert_eq!(suite.extra.get("failures").map(String::as_str), Some("1"));
    assert_eq!(suite.extra.get("hostname").map(String::as_str), Some("ci-runner"));
    assert_eq!(suite.system_out.as_deref(), Some("run logs here"));

    assert_eq!(suite.testcases.len(), 4);
    let names: Vec<_> = suite.testcases.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "app create succeeds",
            "nginx:set proxy-busy-buffers-size",
            "app destroy (force)",
            "app rename",
        ]
    );

    assert!(suite.testcases[0].is_passing());
    assert_eq!(suite.testcases[0].time, Some(Duration::from_secs_f64(2.5)));

    match &suite.testcases[1].status {
        TestcaseStatus::Failure {
            ty, description, ..
        } => {
            assert_eq!(ty.as_deref(), Some("failure"));
            assert_eq!(description.as_deref(), Some("expected 0, got 1"));
        }
        other => panic!("expected failure status, got {other:?}"),
    }
    assert!(!suite.testcases[1].is_passing());

    // A bare <skipped/> marker is a skip even without a description.
    assert_eq!(
        suite.testcases[2].status,
        TestcaseStatus::Skipped { description: None }
    );

    assert_eq!(
        suite.testcases[3].status,
        TestcaseStatus::Skipped {
            description: Some("requires the ps plugin".to_owned())
        }
    );
}

#[test]
fn parse_strips_esc_bytes() {
    let input = "<?xml version=\"1.0\"?>\n<testsuite name=\"t.bats\">\n\
         <testcase name=\"case1\"><failure>\u{1b}[31mred output\u{1b}[0m</failure></testcase>\n\
         </testsuite>";
    let suite = Testsuite::parse(input).expect("ESC bytes are normalized before parsing");
    match &suite.testcases[0].status {
        TestcaseStatus::Failure { description, .. } => {
            let description = description.as_deref().unwrap();
            assert!(
                !description.contains('\u{1b}'),
                "no ESC byte survives parsing: {description:?}"
            );
            assert!(
                description.contains("red output    [0m"),
                "each ESC byte becomes four spaces: {description:?}"
            );
        }
        other => panic!("expected failure status, got {other:?}"),
    }
}

#[test]
fn parse_empty_testsuite() {
    let suite = Testsuite::parse(r#"<testsuite name="empty.bats"/>"#).expect("parses");
    assert_eq!(suite.name, "empty.bats");
    assert!(suite.testcases.is_empty());

    let suite = Testsuite::parse(r#"<testsuite name="empty.bats"></testsuite>"#).expect("parses");
    assert!(suite.testcases.is_empty());
}

#[test]
fn parse_malformed_report() {
    let err = Testsuite::parse("<testsuite name=\"broken\"><testcase").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Xml(_) | ParseError::InvalidDocument(_)
    ));

    let err = Testsuite::parse("<notasuite/>").unwrap_err();
    assert!(matches!(err, ParseError::InvalidDocument(_)));

    let err = Testsuite::parse("").unwrap_err();
    assert!(matches!(err, ParseError::InvalidDocument(_)));
}

#[test]
fn parse_rejects_negative_time() {
    let err =
        Testsuite::parse(r#"<testsuite name="t"><testcase name="c" time="-1"/></testsuite>"#)
            .unwrap_err();
    assert!(matches!(err, ParseError::InvalidTime { .. }));
}

#[test]
fn round_trip_preserves_structure() {
    let suite = Testsuite::parse(BASIC_REPORT).expect("fixture parses");
    let serialized = suite.to_string().expect("serializes");
    let reparsed = Testsuite::parse(&serialized).expect("serialized output reparses");

    assert_eq!(reparsed.name, suite.name);
    assert_eq!(reparsed.properties, suite.properties);
    assert_eq!(reparsed.extra, suite.extra);
    assert_eq!(reparsed.testcases.len(), suite.testcases.len());
    for (reparsed_case, case) in reparsed.testcases.iter().zip(&suite.testcases) {
        assert_eq!(reparsed_case.name, case.name);
        assert_eq!(reparsed_case.classname, case.classname);
        assert_eq!(reparsed_case.status, case.status);
        assert_eq!(reparsed_case.extra, case.extra);
    }

    // Round-tripping again is a fixpoint: durations are already integral.
    let again = Testsuite::parse(&reparsed.to_string().expect("serializes")).expect("parses");
    for (a, b) in again.testcases.iter().zip(&reparsed.testcases) {
        assert_eq!(a.time, b.time);
    }
}

#[test]
fn serialize_emits_integer_durations() {
    let suite = Testsuite::parse(BASIC_REPORT).expect("fixture parses");
    let serialized = suite.to_string().expect("serializes");

    // 2.5 rounds half away from zero to 3; 3.0 stays 3; 0.0 stays 0.
    assert!(serialized.contains(r#"time="3""#));
    assert!(serialized.contains(r#"time="0""#));
    assert!(!serialized.contains("2.5"));

    let reparsed = Testsuite::parse(&serialized).expect("reparses");
    assert_eq!(reparsed.testcases[0].time, Some(Duration::from_secs(3)));
    assert_eq!(reparsed.testcases[1].time, Some(Duration::from_secs(3)));
    assert_eq!(reparsed.testcases[2].time, Some(Duration::from_secs(0)));
    assert_eq!(reparsed.testcases[3].time, Some(Duration::from_secs(6)));
}

#[test]
fn serialize_omits_markers_for_passing_cases() {
    let mut suite = Testsuite::parse(BASIC_REPORT).expect("fixture parses");
    for testcase in &mut suite.testcases {
        testcase.mark_passed(Duration::from_secs(90));
    }

    let serialized = suite.to_string().expect("serializes");
    assert!(
        !serialized.contains("<failure") && !serialized.contains("<skipped"),
        "cleared markers must not leave residual tags: {serialized}"
    );
    assert!(serialized.contains(r#"time="90""#));

    let reparsed = Testsuite::parse(&serialized).expect("reparses");
    assert!(reparsed.testcases.iter().all(|t| t.is_passing()));
    // Unrelated fields survive the rewrite.
    assert_eq!(reparsed.property("BATS_CWD"), Some("/home/ci/project"));
    assert_eq!(reparsed.extra.get("hostname").map(String::as_str), Some("ci-runner"));
}

#[test]
fn serialize_has_no_trailing_blank_lines() {
    let suite = Testsuite::parse(BASIC_REPORT).expect("fixture parses");
    let serialized = suite.to_string().expect("serializes");
    assert!(!serialized.ends_with('\n') || !serialized.trim_end_matches('\n').is_empty());
    assert!(!serialized.ends_with("\n\n"), "no trailing blank lines");
    assert!(serialized.starts_with("<?xml"));
}
