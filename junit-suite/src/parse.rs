// Copyright (c) The bats-retry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse a `Testsuite` from XML.

use crate::{ParseError, Property, Testcase, TestcaseStatus, Testsuite};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::time::Duration;

static TESTSUITE_TAG: &[u8] = b"testsuite";
static TESTCASE_TAG: &[u8] = b"testcase";
static PROPERTIES_TAG: &[u8] = b"properties";
static PROPERTY_TAG: &[u8] = b"property";
static FAILURE_TAG: &[u8] = b"failure";
static SKIPPED_TAG: &[u8] = b"skipped";
static SYSTEM_OUT_TAG: &[u8] = b"system-out";
static SYSTEM_ERR_TAG: &[u8] = b"system-err";

/// Some producers emit raw ESC bytes in failure output, which makes the
/// document invalid XML. They are replaced with four spaces before parsing.
const ESC: char = '\u{1b}';
const ESC_REPLACEMENT: &str = "    ";

pub(crate) fn parse_report(input: &str) -> Result<Testsuite, ParseError> {
    let normalized = input.replace(ESC, ESC_REPLACEMENT);

    let mut reader = Reader::from_str(&normalized);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Start(start) => {
                if start.name().as_ref() == TESTSUITE_TAG {
                    return parse_testsuite(&mut reader, &start);
                }
                return Err(ParseError::InvalidDocument(format!(
                    "unexpected root element `{}`",
                    String::from_utf8_lossy(start.name().as_ref())
                )));
            }
            Event::Empty(start) => {
                if start.name().as_ref() == TESTSUITE_TAG {
                    // A childless testsuite is valid and selects zero cases.
                    let mut suite = Testsuite::new("");
                    read_testsuite_attrs(&mut suite, &start)?;
                    return Ok(suite);
                }
                return Err(ParseError::InvalidDocument(format!(
                    "unexpected root element `{}`",
                    String::from_utf8_lossy(start.name().as_ref())
                )));
            }
            Event::Eof => {
                return Err(ParseError::InvalidDocument(
                    "missing testsuite root element".to_owned(),
                ));
            }
            _ => {
                return Err(ParseError::InvalidDocument(
                    "unexpected content before testsuite root element".to_owned(),
                ));
            }
        }
    }
}

fn parse_testsuite(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Testsuite, ParseError> {
    let mut suite = Testsuite::new("");
    read_testsuite_attrs(&mut suite, start)?;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                tag if tag == PROPERTIES_TAG => parse_properties(reader, &mut suite)?,
                tag if tag == TESTCASE_TAG => {
                    let testcase = parse_testcase(reader, &element, false)?;
                    suite.add_testcase(testcase);
                }
                tag if tag == SYSTEM_OUT_TAG => {
                    suite.system_out = read_text(reader, SYSTEM_OUT_TAG)?;
                }
                tag if tag == SYSTEM_ERR_TAG => {
                    suite.system_err = read_text(reader, SYSTEM_ERR_TAG)?;
                }
                _ => {
                    reader.read_to_end(element.name())?;
                }
            },
            Event::Empty(element) => {
                if element.name().as_ref() == TESTCASE_TAG {
                    let testcase = parse_testcase(reader, &element, true)?;
                    suite.add_testcase(testcase);
                }
            }
            Event::End(end) if end.name().as_ref() == TESTSUITE_TAG => return Ok(suite),
            Event::Eof => {
                return Err(ParseError::InvalidDocument(
                    "unexpected end of document inside testsuite".to_owned(),
                ));
            }
            // Stray character data between elements carries no meaning here.
            _ => {}
        }
    }
}

fn read_testsuite_attrs(suite: &mut Testsuite, start: &BytesStart<'_>) -> Result<(), ParseError> {
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"name" => suite.name = value.into_owned(),
            key => {
                suite
                    .extra
                    .insert(String::from_utf8_lossy(key).into_owned(), value.into_owned());
            }
        }
    }
    Ok(())
}

fn parse_properties(reader: &mut Reader<&[u8]>, suite: &mut Testsuite) -> Result<(), ParseError> {
    loop {
        match reader.read_event()? {
            Event::Empty(element) | Event::Start(element)
                if element.name().as_ref() == PROPERTY_TAG =>
            {
                let mut name = String::new();
                let mut value = String::new();
                for attr in element.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"name" => name = attr.unescape_value()?.into_owned(),
                        b"value" => value = attr.unescape_value()?.into_owned(),
                        _ => {}
                    }
                }
                suite.add_property(Property::new(name, value));
            }
            Event::Start(element) => {
                reader.read_to_end(element.name())?;
            }
            Event::End(end) if end.name().as_ref() == PROPERTIES_TAG => return Ok(()),
            Event::Eof => {
                return Err(ParseError::InvalidDocument(
                    "unexpected end of document inside properties".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_testcase(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<Testcase, ParseError> {
    let mut testcase = Testcase::new("", TestcaseStatus::Success);
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"name" => testcase.name = value.into_owned(),
            b"classname" => testcase.classname = Some(value.into_owned()),
            b"time" => testcase.time = Some(parse_time(&value)?),
            key => {
                testcase
                    .extra
                    .insert(String::from_utf8_lossy(key).into_owned(), value.into_owned());
            }
        }
    }

    if empty {
        return Ok(testcase);
    }

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                parse_testcase_child(reader, &element, false, &mut testcase)?;
            }
            Event::Empty(element) => {
                parse_testcase_child(reader, &element, true, &mut testcase)?;
            }
            Event::End(end) if end.name().as_ref() == TESTCASE_TAG => return Ok(testcase),
            Event::Eof => {
                return Err(ParseError::InvalidDocument(
                    "unexpected end of document inside testcase".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

fn parse_testcase_child(
    reader: &mut Reader<&[u8]>,
    element: &BytesStart<'_>,
    is_empty: bool,
    testcase: &mut Testcase,
) -> Result<(), ParseError> {
    match element.name().as_ref() {
        tag if tag == FAILURE_TAG => {
            let (message, ty) = read_status_attrs(element)?;
            let description = if is_empty {
                None
            } else {
                read_text(reader, FAILURE_TAG)?
            };
            testcase.status = TestcaseStatus::Failure {
                message,
                ty,
                description,
            };
        }
        tag if tag == SKIPPED_TAG => {
            let description = if is_empty {
                None
            } else {
                read_text(reader, SKIPPED_TAG)?
            };
            testcase.status = TestcaseStatus::Skipped { description };
        }
        tag if tag == SYSTEM_OUT_TAG => {
            if !is_empty {
                testcase.system_out = read_text(reader, SYSTEM_OUT_TAG)?;
            }
        }
        tag if tag == SYSTEM_ERR_TAG => {
            if !is_empty {
                testcase.system_err = read_text(reader, SYSTEM_ERR_TAG)?;
            }
        }
        _ => {
            if !is_empty {
                reader.read_to_end(element.name())?;
            }
        }
    }
    Ok(())
}

fn read_status_attrs(
    element: &BytesStart<'_>,
) -> Result<(Option<String>, Option<String>), ParseError> {
    let mut message = None;
    let mut ty = None;
    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"message" => message = Some(attr.unescape_value()?.into_owned()),
            b"type" => ty = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok((message, ty))
}

/// Reads the text content of the current element up to its end tag. Returns
/// `None` for an element with no text content.
fn read_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<Option<String>, ParseError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(content) => text.push_str(&content.unescape()?),
            Event::CData(content) => {
                text.push_str(&String::from_utf8_lossy(&content));
            }
            Event::Start(element) => {
                reader.read_to_end(element.name())?;
            }
            Event::End(end) if end.name().as_ref() == tag => {
                return Ok((!text.is_empty()).then_some(text));
            }
            Event::Eof => {
                return Err(ParseError::InvalidDocument(format!(
                    "unexpected end of document inside `{}`",
                    String::from_utf8_lossy(tag)
                )));
            }
            _ => {}
        }
    }
}

fn parse_time(value: &str) -> Result<Duration, ParseError> {
    let seconds: f64 = value.parse().map_err(|_| ParseError::InvalidTime {
        value: value.to_owned(),
    })?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ParseError::InvalidTime {
            value: value.to_owned(),
        });
    }
    Ok(Duration::from_secs_f64(seconds))
}
