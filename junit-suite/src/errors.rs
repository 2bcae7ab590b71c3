// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// An error that occurs while parsing a [`Testsuite`](crate::Testsuite)
/// document.
///
/// Returned by [`Testsuite::parse`](crate::Testsuite::parse).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The byte stream was not parseable as XML, even after control-character
    /// normalization.
    #[error("error parsing testsuite XML")]
    Xml(#[from] quick_xml::Error),

    /// An element carried a malformed attribute.
    #[error("invalid attribute in testsuite XML")]
    Attr(#[from] AttrError),

    /// The document was well-formed XML but not a testsuite report.
    #[error("invalid testsuite document: {0}")]
    InvalidDocument(String),

    /// A `time` attribute did not contain a non-negative number of seconds.
    #[error("invalid time attribute `{value}`")]
    InvalidTime {
        /// The attribute value as it appeared in the document.
        value: String,
    },
}

/// An error that occurs while serializing a [`Testsuite`](crate::Testsuite).
///
/// Returned by [`Testsuite::serialize`](crate::Testsuite::serialize) and
/// [`Testsuite::to_string`](crate::Testsuite::to_string).
#[derive(Debug, Error)]
pub enum SerializeError {
    /// An error occurred while writing XML events.
    #[error("error serializing testsuite report")]
    Xml(#[from] quick_xml::Error),

    /// The serialized document was not valid UTF-8.
    #[error("serialized testsuite report is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
