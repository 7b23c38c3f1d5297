//! Analytic Request/Reply Wire Codec
//!
//! Builds the XML status-request document and decodes status-reply documents.
//! Decoding is total: every byte input maps to a [`StatusResult`], malformed
//! input included.

use crate::core::probe::types::StatusResult;
use quick_xml::events::Event;
use quick_xml::Reader;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Synthetic reply decoded whenever no reply bytes could be obtained
///
/// The operation name is fixed regardless of the request; only `status` and
/// `pid` are ever read back.
pub const FALLBACK_REPLY: &str = r#"<?xml version="1.0" encoding="utf-8"?><analyticreply><operation>AnalyticServerStatus</operation><status>Unknown</status><pid>0</pid></analyticreply>"#;

const REPLY_ROOT: &[u8] = b"analyticreply";
const STATUS_TAG: &[u8] = b"status";
const PID_TAG: &[u8] = b"pid";
const RUNNING: &str = "Running";

/// Reasons a reply could not be read; always absorbed into the fallback result
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("reply is empty")]
    Empty,
    #[error("reply does not start with '<'")]
    NotMarkup,
    #[error("reply is not valid UTF-8")]
    InvalidUtf8,
    #[error("malformed markup: {0}")]
    Markup(String),
    #[error("document ended with {0} unclosed element(s)")]
    Unclosed(usize),
    #[error("no <{0}> element under <analyticreply>")]
    MissingField(&'static str),
}

/// Raw reading of a reply document, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedReply {
    /// Trimmed text of the first `status` and `pid` elements under `analyticreply`
    Parsed { status: String, pid: String },
    /// The document could not be read
    Fallback,
}

impl DecodedReply {
    /// Map raw fields to the public result
    ///
    /// Only an exact `Running` paired with an all-digit pid that fits `u32` is
    /// reported as running.
    pub fn into_result(self) -> StatusResult {
        match self {
            DecodedReply::Parsed { status, pid } if status == RUNNING => {
                parse_pid(&pid).map_or_else(StatusResult::unknown, StatusResult::running)
            }
            _ => StatusResult::unknown(),
        }
    }
}

fn parse_pid(pid: &str) -> Option<u32> {
    if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    pid.parse().ok()
}

/// Build the status-request document for `operation`
///
/// Only markup-significant characters are escaped, so plain identifiers such as
/// `AnalyticServerStatus` appear verbatim.
pub fn encode_request(operation: &str) -> Vec<u8> {
    format!(
        "{}<analyticrequest><operation>{}</operation></analyticrequest>",
        XML_DECLARATION,
        quick_xml::escape::escape(operation)
    )
    .into_bytes()
}

/// Decode a status-reply document into a normalized result
pub fn decode_reply(bytes: &[u8]) -> StatusResult {
    read_reply(bytes).into_result()
}

/// Read the `status`/`pid` fields of a reply without normalizing them
pub fn read_reply(bytes: &[u8]) -> DecodedReply {
    match parse_reply(bytes) {
        Ok(reply) => reply,
        Err(_) => DecodedReply::Fallback,
    }
}

/// Same as [`read_reply`] but keeps the failure reason for diagnostics
pub(crate) fn parse_reply(bytes: &[u8]) -> Result<DecodedReply, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes[0] != b'<' {
        return Err(DecodeError::NotMarkup);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;

    let mut reader = Reader::from_str(text);
    let mut open: Vec<Tag> = Vec::new();
    let mut status = FieldCapture::default();
    let mut pid = FieldCapture::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Markup(e.to_string()))?;

        match event {
            Event::Start(start) => {
                let tag = Tag::from_name(start.local_name().as_ref());
                let in_reply = open.contains(&Tag::Reply);
                let depth = open.len();
                if in_reply {
                    match tag {
                        Tag::Status => status.begin(depth),
                        Tag::Pid => pid.begin(depth),
                        _ => {}
                    }
                }
                open.push(tag);
            }
            Event::Empty(empty) => {
                if open.contains(&Tag::Reply) {
                    match Tag::from_name(empty.local_name().as_ref()) {
                        Tag::Status => status.empty(),
                        Tag::Pid => pid.empty(),
                        _ => {}
                    }
                }
            }
            Event::End(_) => {
                // Mismatched names are rejected by the reader itself
                open.pop();
                let depth = open.len();
                status.end(depth);
                pid.end(depth);
            }
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .map_err(|e| DecodeError::Markup(e.to_string()))?;
                status.push(&content);
                pid.push(&content);
            }
            Event::CData(content) => {
                let content = std::str::from_utf8(&content)
                    .map_err(|_| DecodeError::InvalidUtf8)?;
                status.push(content);
                pid.push(content);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(DecodeError::Unclosed(open.len()));
    }

    let status = status.finish().ok_or(DecodeError::MissingField("status"))?;
    let pid = pid.finish().ok_or(DecodeError::MissingField("pid"))?;
    Ok(DecodedReply::Parsed { status, pid })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Reply,
    Status,
    Pid,
    Other,
}

impl Tag {
    fn from_name(name: &[u8]) -> Self {
        match name {
            REPLY_ROOT => Tag::Reply,
            STATUS_TAG => Tag::Status,
            PID_TAG => Tag::Pid,
            _ => Tag::Other,
        }
    }
}

/// Collects the text content of the first matching element
#[derive(Debug, Default)]
struct FieldCapture {
    /// Depth of the element currently being captured
    active: Option<usize>,
    text: String,
    done: Option<String>,
}

impl FieldCapture {
    fn begin(&mut self, depth: usize) {
        if self.done.is_none() && self.active.is_none() {
            self.active = Some(depth);
        }
    }

    fn empty(&mut self) {
        if self.done.is_none() && self.active.is_none() {
            self.done = Some(String::new());
        }
    }

    fn push(&mut self, content: &str) {
        if self.active.is_some() {
            self.text.push_str(content);
        }
    }

    fn end(&mut self, depth: usize) {
        if self.active == Some(depth) {
            self.active = None;
            self.done = Some(self.text.trim().to_string());
        }
    }

    fn finish(self) -> Option<String> {
        self.done
    }
}
