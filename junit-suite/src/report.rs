// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ParseError, SerializeError, parse::parse_report, serialize::serialize_report};
use indexmap::map::IndexMap;
use std::{io, time::Duration};

/// The root element of a testsuite report document.
///
/// A `Testsuite` groups together several [`Testcase`] instances in document
/// order, along with the properties declared for the run. Case order is the
/// document's canonical order and is preserved on rewrite.
#[derive(Clone, Debug)]
pub struct Testsuite {
    /// The name of this testsuite.
    pub name: String,

    /// Custom properties set during test execution, e.g. environment variables.
    pub properties: Vec<Property>,

    /// The testcases that form this testsuite, in document order.
    pub testcases: Vec<Testcase>,

    /// Data written to standard output while the testsuite was executed.
    pub system_out: Option<String>,

    /// Data written to standard error while the testsuite was executed.
    pub system_err: Option<String>,

    /// Other fields that may be set as attributes, such as "hostname" or
    /// aggregate counts. Preserved verbatim on rewrite.
    pub extra: IndexMap<String, String>,
}

impl Testsuite {
    /// Creates a new `Testsuite` with the given name.
    ///
    /// A testsuite with zero cases is valid.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: vec![],
            testcases: vec![],
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }

    /// Parses a testsuite document from a string.
    ///
    /// Raw ESC bytes (`0x1b`), which some producers leave in otherwise
    /// well-formed documents, are replaced with four spaces before structural
    /// parsing.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_report(input)
    }

    /// Adds a property to this testsuite.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties.push(property.into());
        self
    }

    /// Adds a testcase to this testsuite.
    pub fn add_testcase(&mut self, testcase: Testcase) -> &mut Self {
        self.testcases.push(testcase);
        self
    }

    /// Returns the value of the first property with the given name, if any.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }

    /// Serialize this testsuite to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_report(self, writer).map_err(SerializeError::from)
    }

    /// Serialize this testsuite to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Represents a single testcase.
#[derive(Clone, Debug)]
pub struct Testcase {
    /// The name of the testcase.
    ///
    /// Used both as the retry filter key and as the lookup key on rewrite, so
    /// it is expected to be unique within its testsuite.
    pub name: String,

    /// The "classname" of the testcase, if declared.
    pub classname: Option<String>,

    /// The time it took to execute this testcase.
    pub time: Option<Duration>,

    /// The status of this testcase.
    pub status: TestcaseStatus,

    /// Data written to standard output while the testcase was executed.
    pub system_out: Option<String>,

    /// Data written to standard error while the testcase was executed.
    pub system_err: Option<String>,

    /// Other fields that may be set as attributes. Preserved verbatim on
    /// rewrite.
    pub extra: IndexMap<String, String>,
}

impl Testcase {
    /// Creates a new testcase.
    pub fn new(name: impl Into<String>, status: TestcaseStatus) -> Self {
        Self {
            name: name.into(),
            classname: None,
            time: None,
            status,
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }

    /// Sets the classname of the testcase.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = Some(classname.into());
        self
    }

    /// Sets the time taken for the testcase.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Returns true if this testcase carries neither a failure nor a skipped
    /// marker.
    pub fn is_passing(&self) -> bool {
        matches!(self.status, TestcaseStatus::Success)
    }

    /// Marks this testcase as passing with the given duration.
    ///
    /// This is the only in-place mutation performed on a decoded testcase:
    /// both the failure and skipped markers are cleared, and the duration is
    /// replaced. The case keeps its name and position.
    pub fn mark_passed(&mut self, time: Duration) -> &mut Self {
        self.status = TestcaseStatus::Success;
        self.time = Some(time);
        self
    }
}

/// Represents the outcome of a testcase.
///
/// The presence of a failure or skipped marker is what makes a case
/// non-passing; the message, type and description are informational.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestcaseStatus {
    /// This testcase passed. Serialized without any status element.
    Success,

    /// This testcase failed.
    Failure {
        /// The failure message.
        message: Option<String>,

        /// The "type" of failure that occurred.
        ty: Option<String>,

        /// The description of the failure, from the element's text node.
        description: Option<String>,
    },

    /// This testcase was not run.
    Skipped {
        /// The description of the skip, from the element's text node.
        description: Option<String>,
    },
}

impl TestcaseStatus {
    /// Creates a new `TestcaseStatus` that represents a failed testcase.
    pub fn failure() -> Self {
        TestcaseStatus::Failure {
            message: None,
            ty: None,
            description: None,
        }
    }

    /// Creates a new `TestcaseStatus` that represents a skipped testcase.
    pub fn skipped() -> Self {
        TestcaseStatus::Skipped { description: None }
    }
}

/// Custom properties set during test execution, e.g. environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The name of the property.
    pub name: String,

    /// The value of the property.
    pub value: String,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<T> From<(T, T)> for Property
where
    T: Into<String>,
{
    fn from((k, v): (T, T)) -> Self {
        Property::new(k, v)
    }
}
