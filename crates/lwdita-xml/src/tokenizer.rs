//! Event tokenizer over quick-xml.
//!
//! Emits open-tag, text, close-tag and error events to an
//! [`XmlEventHandler`]. The tokenizer keeps its own stack of open elements
//! so that close tags reaching the handler are always balanced:
//!
//! - a close tag matching an outer element closes every element in between,
//!   reporting each as unclosed
//! - a close tag matching no open element is reported and dropped
//! - elements still open at the end of input are reported and closed
//!
//! Self-closing tags produce an open-tag event followed by a close-tag event.

use crate::error::{Position, TokenizationError, TokenizationErrorKind};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::ops::ControlFlow;
use tracing::trace;

/// An open tag with its attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
    pub position: Position,
}

/// Receiver of tokenizer events. Returning `Break` stops tokenization.
pub trait XmlEventHandler {
    fn open_tag(&mut self, tag: OpenTag) -> ControlFlow<()>;

    fn text(&mut self, text: &str, position: Position) -> ControlFlow<()>;

    fn close_tag(&mut self, name: &str, position: Position) -> ControlFlow<()>;

    fn error(&mut self, error: TokenizationError) -> ControlFlow<()>;
}

/// Maps byte offsets to lines and columns.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count())
            + 1;
        Position {
            offset,
            line,
            column,
        }
    }
}

/// Tokenize `input`, feeding every event to `handler`.
pub fn tokenize<H: XmlEventHandler>(input: &str, handler: &mut H) -> ControlFlow<()> {
    let index = LineIndex::new(input);
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text_start = false;
    config.trim_text_end = false;
    // Mismatched close tags are recovered below instead of failing the reader.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut open: Vec<String> = Vec::new();
    loop {
        let start = reader.buffer_position() as usize;
        let position = index.position(start);
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = open_tag(&e, position, false, handler)?;
                open.push(tag.name.clone());
                handler.open_tag(tag)?;
            }
            Ok(Event::Empty(e)) => {
                let tag = open_tag(&e, position, true, handler)?;
                let name = tag.name.clone();
                handler.open_tag(tag)?;
                handler.close_tag(&name, position)?;
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                close_tag(&name, position, &mut open, handler)?;
            }
            Ok(Event::Text(e)) => {
                let text = match e.unescape() {
                    Ok(text) => text,
                    Err(err) => {
                        handler.error(TokenizationError {
                            kind: TokenizationErrorKind::Text(err.to_string()),
                            position,
                        })?;
                        Cow::Owned(String::from_utf8_lossy(&e).into_owned())
                    }
                };
                handler.text(&text, position)?;
            }
            Ok(Event::CData(e)) => {
                handler.text(&String::from_utf8_lossy(&e), position)?;
            }
            Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(err) => {
                let at = index.position(reader.error_position() as usize);
                handler.error(TokenizationError {
                    kind: TokenizationErrorKind::Syntax(err.to_string()),
                    position: at,
                })?;
                // The reader may not move past some errors.
                if reader.buffer_position() as usize <= start {
                    break;
                }
            }
        }
    }

    let end = index.position(input.len());
    while let Some(name) = open.pop() {
        handler.error(TokenizationError {
            kind: TokenizationErrorKind::Unclosed(name.clone()),
            position: end,
        })?;
        handler.close_tag(&name, end)?;
    }
    ControlFlow::Continue(())
}

fn open_tag<H: XmlEventHandler>(
    e: &BytesStart<'_>,
    position: Position,
    self_closing: bool,
    handler: &mut H,
) -> ControlFlow<(), OpenTag> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in e.attributes() {
        let attribute = match attribute {
            Ok(attribute) => attribute,
            Err(err) => {
                handler.error(TokenizationError {
                    kind: TokenizationErrorKind::Attribute(err.to_string()),
                    position,
                })?;
                continue;
            }
        };
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        match attribute.unescape_value() {
            Ok(value) => attributes.push((key, value.into_owned())),
            Err(err) => {
                handler.error(TokenizationError {
                    kind: TokenizationErrorKind::Attribute(format!("{key}: {err}")),
                    position,
                })?;
                let raw = String::from_utf8_lossy(&attribute.value).into_owned();
                attributes.push((key, raw));
            }
        }
    }
    trace!(tag = %name, attributes = attributes.len(), "open tag");
    ControlFlow::Continue(OpenTag {
        name,
        attributes,
        self_closing,
        position,
    })
}

fn close_tag<H: XmlEventHandler>(
    name: &str,
    position: Position,
    open: &mut Vec<String>,
    handler: &mut H,
) -> ControlFlow<()> {
    let Some(depth) = open.iter().rposition(|n| n == name) else {
        return handler.error(TokenizationError {
            kind: TokenizationErrorKind::UnexpectedClose(name.to_string()),
            position,
        });
    };
    while open.len() > depth + 1 {
        if let Some(inner) = open.pop() {
            handler.error(TokenizationError {
                kind: TokenizationErrorKind::Unclosed(inner.clone()),
                position,
            })?;
            handler.close_tag(&inner, position)?;
        }
    }
    open.pop();
    handler.close_tag(name, position)
}

/// A recorded tokenizer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Open(OpenTag),
    Text(String),
    Close(String),
    Error(TokenizationErrorKind),
}

/// Collects every event; useful for inspecting what the tokenizer emits.
#[derive(Debug, Default)]
pub struct EventCollector {
    pub events: Vec<XmlEvent>,
}

impl XmlEventHandler for EventCollector {
    fn open_tag(&mut self, tag: OpenTag) -> ControlFlow<()> {
        self.events.push(XmlEvent::Open(tag));
        ControlFlow::Continue(())
    }

    fn text(&mut self, text: &str, _position: Position) -> ControlFlow<()> {
        self.events.push(XmlEvent::Text(text.to_string()));
        ControlFlow::Continue(())
    }

    fn close_tag(&mut self, name: &str, _position: Position) -> ControlFlow<()> {
        self.events.push(XmlEvent::Close(name.to_string()));
        ControlFlow::Continue(())
    }

    fn error(&mut self, error: TokenizationError) -> ControlFlow<()> {
        self.events.push(XmlEvent::Error(error.kind));
        ControlFlow::Continue(())
    }
}

/// Tokenize `input` into a list of events.
pub fn collect_events(input: &str) -> Vec<XmlEvent> {
    let mut collector = EventCollector::default();
    let _ = tokenize(input, &mut collector);
    collector.events
}
