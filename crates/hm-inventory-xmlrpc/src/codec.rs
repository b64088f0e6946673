//! XML-RPC wire codec
//!
//! Encodes `methodCall` documents and decodes `methodResponse` documents.
//! Only the subset of XML the BidCos services emit is understood: elements,
//! text, the XML declaration and comments. Attributes are skipped, CDATA
//! and DTDs are rejected as malformed.

use crate::value::{Value, unescape};
use thiserror::Error;

/// Codec failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// The service answered with a `<fault>`
    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The document is not a well-formed XML-RPC response
    #[error("Malformed XML-RPC response: {0}")]
    Malformed(String),
}

impl CodecError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Encode a `methodCall` document
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&crate::value::escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

/// Decode a `methodResponse` document
///
/// A `<fault>` response becomes [`CodecError::Fault`]. An empty `<params/>`
/// decodes to [`Value::Nil`].
pub fn parse_response(xml: &str) -> Result<Value, CodecError> {
    let mut parser = Parser::new(xml);
    parser.expect_open("methodResponse")?;

    let value = match parser.next_tag()? {
        Tag::Empty("params") => Value::Nil,
        Tag::Open("params") => {
            let value = match parser.next_tag()? {
                Tag::Open("param") => {
                    let value = parser.parse_value()?;
                    parser.expect_close("param")?;
                    value
                }
                Tag::Close("params") => {
                    parser.expect_close("methodResponse")?;
                    return Ok(Value::Nil);
                }
                other => return Err(unexpected("<param>", other)),
            };
            parser.expect_close("params")?;
            value
        }
        Tag::Open("fault") => {
            let fault = parser.parse_value()?;
            parser.expect_close("fault")?;
            return Err(CodecError::Fault {
                code: fault.get("faultCode").and_then(Value::as_i64).unwrap_or(0),
                message: fault
                    .get("faultString")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        other => return Err(unexpected("<params> or <fault>", other)),
    };

    parser.expect_close("methodResponse")?;
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag<'a> {
    Open(&'a str),
    Close(&'a str),
    Empty(&'a str),
}

impl std::fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Open(name) => write!(f, "<{}>", name),
            Tag::Close(name) => write!(f, "</{}>", name),
            Tag::Empty(name) => write!(f, "<{}/>", name),
        }
    }
}

fn unexpected(expected: &str, found: Tag<'_>) -> CodecError {
    CodecError::malformed(format!("expected {}, found {}", expected, found))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Raw text up to the next `<`
    fn read_text(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.find('<').unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Next tag, skipping declarations, comments and whitespace
    fn next_tag(&mut self) -> Result<Tag<'a>, CodecError> {
        loop {
            let text = self.read_text();
            if !text.trim().is_empty() {
                return Err(CodecError::malformed(format!(
                    "unexpected text {:?}",
                    text.trim()
                )));
            }

            let rest = self.rest();
            if rest.is_empty() {
                return Err(CodecError::malformed("unexpected end of document"));
            }

            if rest.starts_with("<?") {
                self.skip_past("?>")?;
                continue;
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
                continue;
            }
            if rest.starts_with("<!") {
                return Err(CodecError::malformed("CDATA and DTDs are not supported"));
            }

            return self.read_tag();
        }
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), CodecError> {
        match self.rest().find(terminator) {
            Some(end) => {
                self.pos += end + terminator.len();
                Ok(())
            }
            None => Err(CodecError::malformed(format!("missing {}", terminator))),
        }
    }

    /// Read the tag at the current position, which must be `<`
    fn read_tag(&mut self) -> Result<Tag<'a>, CodecError> {
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or_else(|| CodecError::malformed("unterminated tag"))?;
        let inner = &rest[1..end];
        self.pos += end + 1;

        if let Some(name) = inner.strip_prefix('/') {
            return Ok(Tag::Close(name.trim()));
        }

        let (inner, empty) = match inner.strip_suffix('/') {
            Some(inner) => (inner, true),
            None => (inner, false),
        };
        let name = inner
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            return Err(CodecError::malformed("tag without a name"));
        }

        Ok(if empty { Tag::Empty(name) } else { Tag::Open(name) })
    }

    fn expect_open(&mut self, name: &str) -> Result<(), CodecError> {
        match self.next_tag()? {
            Tag::Open(found) if found == name => Ok(()),
            other => Err(unexpected(&format!("<{}>", name), other)),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<(), CodecError> {
        match self.next_tag()? {
            Tag::Close(found) if found == name => Ok(()),
            other => Err(unexpected(&format!("</{}>", name), other)),
        }
    }

    /// Text content of an element whose open tag was consumed, including
    /// its close tag
    fn element_text(&mut self, name: &str) -> Result<String, CodecError> {
        let text = self.read_text();
        self.expect_close(name)?;
        Ok(unescape(text))
    }

    /// Parse a `<value>` element
    fn parse_value(&mut self) -> Result<Value, CodecError> {
        match self.next_tag()? {
            Tag::Open("value") => {}
            Tag::Empty("value") => return Ok(Value::String(String::new())),
            other => return Err(unexpected("<value>", other)),
        }

        // A value without a type element is a string
        let start = self.pos;
        let text = self.read_text();
        if self.rest().starts_with("</") {
            let save = self.pos;
            if let Tag::Close("value") = self.read_tag()? {
                return Ok(Value::String(unescape(text)));
            }
            self.pos = save;
        }
        self.pos = start;

        let value = match self.next_tag()? {
            Tag::Empty("nil") => Value::Nil,
            Tag::Empty("string") => Value::String(String::new()),
            Tag::Empty("array") => Value::Array(Vec::new()),
            Tag::Empty("struct") => Value::Struct(Vec::new()),
            Tag::Open("nil") => {
                self.expect_close("nil")?;
                Value::Nil
            }
            Tag::Open(name @ ("i4" | "int" | "i8")) => {
                let text = self.element_text(name)?;
                Value::Int(text.trim().parse().map_err(|_| {
                    CodecError::malformed(format!("invalid integer {:?}", text))
                })?)
            }
            Tag::Open("boolean") => {
                let text = self.element_text("boolean")?;
                match text.trim() {
                    "1" | "true" => Value::Bool(true),
                    "0" | "false" => Value::Bool(false),
                    other => {
                        return Err(CodecError::malformed(format!("invalid boolean {:?}", other)));
                    }
                }
            }
            Tag::Open("double") => {
                let text = self.element_text("double")?;
                Value::Double(text.trim().parse().map_err(|_| {
                    CodecError::malformed(format!("invalid double {:?}", text))
                })?)
            }
            Tag::Open("string") => Value::String(self.element_text("string")?),
            Tag::Open("base64") => Value::Base64(self.element_text("base64")?.trim().to_string()),
            Tag::Open("dateTime.iso8601") => {
                Value::DateTime(self.element_text("dateTime.iso8601")?.trim().to_string())
            }
            Tag::Open("array") => self.parse_array()?,
            Tag::Open("struct") => self.parse_struct()?,
            other => return Err(unexpected("a value type", other)),
        };

        self.expect_close("value")?;
        Ok(value)
    }

    /// Body of `<array>` after its open tag
    fn parse_array(&mut self) -> Result<Value, CodecError> {
        let mut items = Vec::new();
        match self.next_tag()? {
            Tag::Empty("data") => {}
            Tag::Open("data") => loop {
                let save = self.pos;
                if let Tag::Close("data") = self.next_tag()? {
                    break;
                }
                self.pos = save;
                items.push(self.parse_value()?);
            },
            other => return Err(unexpected("<data>", other)),
        }
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }

    /// Body of `<struct>` after its open tag
    fn parse_struct(&mut self) -> Result<Value, CodecError> {
        let mut members = Vec::new();
        loop {
            match self.next_tag()? {
                Tag::Close("struct") => break,
                Tag::Open("member") => {
                    self.expect_open("name")?;
                    let name = self.element_text("name")?;
                    let value = self.parse_value()?;
                    self.expect_close("member")?;
                    members.push((name, value));
                }
                other => return Err(unexpected("<member>", other)),
            }
        }
        Ok(Value::Struct(members))
    }
}
