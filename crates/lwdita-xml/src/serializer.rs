//! Tree to XDITA serializer.
//!
//! A depth-first visitor whose only state is the current depth. Text and
//! attribute values are written as stored; attributes with falsy values
//! (empty string, `null`, `false`, `0`) are left out, as are objects.

use crate::sink::{OutputSink, StringSink, WriterSink};
use lwdita_ast::attributes::values::{is_truthy, to_attribute_text};
use lwdita_ast::{Document, NodeId, NodeKind};
use std::io::{self, Write};
use tracing::debug;

/// Default number of repetitions of an indentation unit per level.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// How nested content is indented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indentation {
    /// Everything on one line.
    #[default]
    None,
    /// One tab per level.
    Tab,
    /// `unit` repeated `size` times per level.
    Repeat { unit: String, size: usize },
}

impl Indentation {
    /// `size` spaces per level.
    pub fn spaces(size: usize) -> Self {
        Indentation::Repeat {
            unit: " ".to_string(),
            size,
        }
    }

    /// Indentation from a unit string: `"\t"` means tabs, an empty string
    /// means none, anything else is repeated `size` times (default
    /// [`DEFAULT_TAB_SIZE`], also used for a size of zero).
    pub fn from_unit(unit: &str, size: Option<usize>) -> Self {
        match unit {
            "" => Indentation::None,
            "\t" => Indentation::Tab,
            _ => Indentation::Repeat {
                unit: unit.to_string(),
                size: size.filter(|&n| n > 0).unwrap_or(DEFAULT_TAB_SIZE),
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Indentation::None)
    }

    fn prefix(&self, depth: usize) -> String {
        match self {
            Indentation::None => String::new(),
            Indentation::Tab => "\t".repeat(depth),
            Indentation::Repeat { unit, size } => unit.repeat(depth * size),
        }
    }

    fn eol(&self) -> &'static str {
        if self.is_enabled() { "\n" } else { "" }
    }
}

/// Writes a [`Document`] to an [`OutputSink`].
pub struct XditaSerializer<'s, S: OutputSink> {
    sink: &'s mut S,
    indentation: Indentation,
    depth: usize,
}

impl<'s, S: OutputSink> XditaSerializer<'s, S> {
    pub fn new(sink: &'s mut S, indentation: Indentation) -> Self {
        Self {
            sink,
            indentation,
            depth: 0,
        }
    }

    /// Serialize the whole document and close the sink.
    pub fn serialize(&mut self, document: &Document) -> Result<(), S::Error> {
        self.visit(document, Document::ROOT)
    }

    /// Serialize one subtree without closing the sink.
    pub fn serialize_node(&mut self, document: &Document, id: NodeId) -> Result<(), S::Error> {
        match document.node(id).kind() {
            NodeKind::Document => self.children(document, id),
            _ => self.visit(document, id),
        }
    }

    fn visit(&mut self, document: &Document, id: NodeId) -> Result<(), S::Error> {
        let node = document.node(id);
        match node.kind() {
            NodeKind::Document => {
                self.children(document, id)?;
                self.sink.close()
            }
            NodeKind::Text(content) => {
                self.indent()?;
                if !content.is_empty() {
                    self.sink.emit(content)?;
                }
                self.eol()
            }
            NodeKind::Element(_) | NodeKind::Unknown(_) => {
                let tag = document.node_name(id);
                self.indent()?;
                self.sink.emit("<")?;
                self.sink.emit(tag)?;
                for (name, value) in node.props() {
                    if !is_truthy(value) {
                        continue;
                    }
                    // Objects have no attribute text form.
                    if value.is_object() {
                        debug!(tag = %tag, attribute = %name, "skipping object-valued attribute");
                        continue;
                    }
                    self.sink.emit(" ")?;
                    self.sink.emit(name)?;
                    self.sink.emit("=\"")?;
                    self.sink.emit(&to_attribute_text(value))?;
                    self.sink.emit("\"")?;
                }
                if node.children().is_empty() {
                    self.sink.emit("/>")?;
                } else {
                    self.sink.emit(">")?;
                    self.eol()?;
                    self.depth += 1;
                    self.children(document, id)?;
                    self.depth -= 1;
                    self.indent()?;
                    self.sink.emit("</")?;
                    self.sink.emit(tag)?;
                    self.sink.emit(">")?;
                }
                self.eol()
            }
        }
    }

    fn children(&mut self, document: &Document, id: NodeId) -> Result<(), S::Error> {
        for &child in document.children(id) {
            self.visit(document, child)?;
        }
        Ok(())
    }

    fn indent(&mut self) -> Result<(), S::Error> {
        if self.indentation.is_enabled() && self.depth > 0 {
            self.sink.emit(&self.indentation.prefix(self.depth))?;
        }
        Ok(())
    }

    fn eol(&mut self) -> Result<(), S::Error> {
        let eol = self.indentation.eol();
        if eol.is_empty() {
            return Ok(());
        }
        self.sink.emit(eol)
    }
}

/// Serialize `document` to a string.
pub fn serialize_to_xdita(document: &Document, indentation: Indentation) -> String {
    let mut sink = StringSink::new();
    let Ok(()) = XditaSerializer::new(&mut sink, indentation).serialize(document);
    sink.into_string()
}

/// Serialize `document` into `writer`, flushing at the end.
pub fn serialize_to_writer<W: Write>(
    document: &Document,
    indentation: Indentation,
    writer: W,
) -> io::Result<W> {
    let mut sink = WriterSink::new(writer);
    XditaSerializer::new(&mut sink, indentation).serialize(document)?;
    Ok(sink.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lwdita_ast::catalog::lwdita_registry;
    use serde_json::json;

    fn small_topic() -> Document {
        let mut doc = Document::new(lwdita_registry());
        let topic = doc
            .create_element("topic", &[("id".to_string(), "t1".to_string())])
            .unwrap();
        let title = doc.create_element("title", &[]).unwrap();
        let text = doc.create_text("Hi");
        doc.add(Document::ROOT, topic, true).unwrap();
        doc.add(topic, title, true).unwrap();
        doc.add(title, text, true).unwrap();
        doc
    }

    #[test]
    fn test_compact() {
        assert_eq!(
            serialize_to_xdita(&small_topic(), Indentation::None),
            r#"<topic id="t1"><title>Hi</title></topic>"#
        );
    }

    #[test]
    fn test_repeated_spaces() {
        assert_eq!(
            serialize_to_xdita(&small_topic(), Indentation::spaces(2)),
            "<topic id=\"t1\">\n  <title>\n    Hi\n  </title>\n</topic>\n"
        );
    }

    #[test]
    fn test_tabs() {
        assert_eq!(
            serialize_to_xdita(&small_topic(), Indentation::Tab),
            "<topic id=\"t1\">\n\t<title>\n\t\tHi\n\t</title>\n</topic>\n"
        );
    }

    #[test]
    fn test_falsy_attributes_are_omitted() {
        let mut doc = Document::new(lwdita_registry());
        let p = doc.create_element("p", &[]).unwrap();
        doc.add(Document::ROOT, p, false).unwrap();
        doc.set_prop(p, "dir", json!("")).unwrap();
        doc.set_prop(p, "outputclass", json!("lead")).unwrap();
        assert_eq!(
            serialize_to_xdita(&doc, Indentation::None),
            r#"<p outputclass="lead"/>"#
        );
    }

    #[test]
    fn test_object_attributes_are_omitted() {
        let mut doc = Document::new(lwdita_registry());
        let p = doc.create_element("p", &[]).unwrap();
        doc.add(Document::ROOT, p, false).unwrap();
        doc.set_prop(p, "dir", json!("ltr")).unwrap();
        doc.set_prop(p, "outputclass", json!({"a": "b"})).unwrap();
        assert_eq!(
            serialize_to_xdita(&doc, Indentation::None),
            r#"<p dir="ltr"/>"#
        );
    }

    #[test]
    fn test_from_unit() {
        assert_eq!(Indentation::from_unit("\t", Some(8)), Indentation::Tab);
        assert_eq!(Indentation::from_unit("", None), Indentation::None);
        assert_eq!(Indentation::from_unit(" ", None), Indentation::spaces(4));
        assert_eq!(Indentation::from_unit(" ", Some(0)), Indentation::spaces(4));
        assert_eq!(
            Indentation::from_unit("-", Some(2)),
            Indentation::Repeat {
                unit: "-".to_string(),
                size: 2
            }
        );
    }

    #[test]
    fn test_writer_sink() {
        let bytes = serialize_to_writer(&small_topic(), Indentation::None, Vec::new()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"<topic id="t1"><title>Hi</title></topic>"#
        );
    }

    #[test]
    fn test_string_sink_is_closed() {
        let mut sink = StringSink::new();
        XditaSerializer::new(&mut sink, Indentation::None)
            .serialize(&small_topic())
            .unwrap();
        assert!(sink.is_closed());
    }
}
