//! XML to tree builder.
//!
//! Drives the tokenizer and materializes nodes through the registry and
//! [`Document::add`]. The open-element stack starts at the document root.
//! Close tags finalize the element they close; end of input finalizes the
//! root.
//!
//! With `abort_on_error` the first unknown tag or content-model violation
//! stops the parse, and any tokenizer error fails it at the end. Without it
//! every problem is recorded as a [`Diagnostic`] and the parse goes on:
//! unknown elements are skipped (their children attach to the nearest kept
//! ancestor) and misplaced elements are kept.

use crate::error::{Diagnostic, ParseError, Position, TokenizationError};
use crate::tokenizer::{LineIndex, OpenTag, XmlEventHandler, tokenize};
use lwdita_ast::catalog::lwdita_registry;
use lwdita_ast::{
    Attachment, ContentModelViolation, Document, Error, JsonNode, NodeId, NodeRegistry,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parse policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fail on the first violation instead of recording it.
    pub abort_on_error: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            abort_on_error: true,
        }
    }

    pub fn lenient() -> Self {
        Self {
            abort_on_error: false,
        }
    }
}

/// A successfully built document and what was tolerated along the way.
#[derive(Debug)]
pub struct Parsed {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Node(NodeId),
    /// An element that could not be created; its children go to the
    /// nearest `Node` below it.
    Skipped,
}

/// Tokenizer event handler that builds a [`Document`].
pub struct TreeBuilder {
    document: Document,
    stack: Vec<Frame>,
    options: ParseOptions,
    diagnostics: Vec<Diagnostic>,
    tokenization_errors: Vec<TokenizationError>,
    failure: Option<ParseError>,
}

impl TreeBuilder {
    pub fn new(registry: Arc<NodeRegistry>, options: ParseOptions) -> Self {
        Self {
            document: Document::new(registry),
            stack: vec![Frame::Node(Document::ROOT)],
            options,
            diagnostics: Vec::new(),
            tokenization_errors: Vec::new(),
            failure: None,
        }
    }

    fn current_parent(&self) -> NodeId {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Node(id) => Some(*id),
                Frame::Skipped => None,
            })
            .unwrap_or(Document::ROOT)
    }

    fn fail(&mut self, error: ParseError) -> ControlFlow<()> {
        self.failure = Some(error);
        ControlFlow::Break(())
    }

    fn tolerate(&mut self, violation: ContentModelViolation, position: Position) {
        warn!(%position, %violation, "tolerated content-model violation");
        self.diagnostics.push(Diagnostic::ContentModel {
            violation,
            position,
        });
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: Position) -> ControlFlow<()> {
        match self.document.add(parent, child, self.options.abort_on_error) {
            Ok(Attachment::Accepted) => ControlFlow::Continue(()),
            Ok(Attachment::Tolerated(violation)) => {
                self.tolerate(violation, position);
                ControlFlow::Continue(())
            }
            Err(Error::ContentModel(violation)) => {
                self.fail(ParseError::ContentModel {
                    violation,
                    position,
                })
            }
            Err(err) => self.fail(err.into()),
        }
    }

    fn finalize(&mut self, id: NodeId, position: Position) -> ControlFlow<()> {
        for violation in self.document.missing_required(id) {
            if self.options.abort_on_error {
                return self.fail(ParseError::ContentModel {
                    violation,
                    position,
                });
            }
            self.tolerate(violation, position);
        }
        ControlFlow::Continue(())
    }

    /// Finalize the root and hand over the document.
    pub fn finish(mut self, end: Position) -> Result<Parsed, ParseError> {
        if self.options.abort_on_error && !self.tokenization_errors.is_empty() {
            return Err(ParseError::Tokenization(self.tokenization_errors));
        }
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if self.finalize(Document::ROOT, end).is_break() {
            if let Some(failure) = self.failure.take() {
                return Err(failure);
            }
        }
        Ok(Parsed {
            document: self.document,
            diagnostics: self.diagnostics,
        })
    }
}

impl XmlEventHandler for TreeBuilder {
    fn open_tag(&mut self, tag: OpenTag) -> ControlFlow<()> {
        let parent = self.current_parent();
        let child = match self.document.create_element(&tag.name, &tag.attributes) {
            Ok(id) => id,
            Err(Error::UnknownTag(error)) if !self.options.abort_on_error => {
                warn!(position = %tag.position, %error, "skipping element");
                self.diagnostics.push(Diagnostic::UnknownTag {
                    error,
                    position: tag.position,
                });
                self.stack.push(Frame::Skipped);
                return ControlFlow::Continue(());
            }
            Err(Error::UnknownTag(error)) => {
                return self.fail(ParseError::UnknownTag {
                    error,
                    position: tag.position,
                });
            }
            Err(err) => return self.fail(err.into()),
        };
        self.attach(parent, child, tag.position)?;
        self.stack.push(Frame::Node(child));
        ControlFlow::Continue(())
    }

    fn text(&mut self, text: &str, position: Position) -> ControlFlow<()> {
        let parent = self.current_parent();
        if text.trim().is_empty() && !self.document.accepts_text(parent) {
            debug!(%position, "dropping ignorable whitespace");
            return ControlFlow::Continue(());
        }
        let child = self.document.create_text(text);
        self.attach(parent, child, position)
    }

    fn close_tag(&mut self, _name: &str, position: Position) -> ControlFlow<()> {
        // The root frame is never popped; the tokenizer balances close tags.
        if self.stack.len() <= 1 {
            return ControlFlow::Continue(());
        }
        match self.stack.pop() {
            Some(Frame::Node(id)) => self.finalize(id, position),
            _ => ControlFlow::Continue(()),
        }
    }

    fn error(&mut self, error: TokenizationError) -> ControlFlow<()> {
        warn!(%error, "tokenizer error");
        if !self.options.abort_on_error {
            self.diagnostics.push(Diagnostic::Tokenization(error.clone()));
        }
        self.tokenization_errors.push(error);
        ControlFlow::Continue(())
    }
}

/// Parse `input` against `registry`.
pub fn parse(
    input: &str,
    registry: Arc<NodeRegistry>,
    options: ParseOptions,
) -> Result<Parsed, ParseError> {
    let mut builder = TreeBuilder::new(registry, options);
    let _ = tokenize(input, &mut builder);
    let end = LineIndex::new(input).position(input.len());
    builder.finish(end)
}

/// Parse `input` against the bundled XDITA catalogue.
pub fn xdita_to_ast(input: &str, options: ParseOptions) -> Result<Document, ParseError> {
    parse(input, lwdita_registry(), options).map(|parsed| parsed.document)
}

/// Parse `input` and project the result.
pub fn xdita_to_json(input: &str, options: ParseOptions) -> Result<JsonNode, ParseError> {
    xdita_to_ast(input, options).map(|document| document.to_json())
}

/// Project a document.
pub fn ast_to_json(document: &Document) -> JsonNode {
    document.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenizationErrorKind;
    use lwdita_ast::{NodeKind, ViolationKind};

    fn lenient(input: &str) -> Parsed {
        parse(input, lwdita_registry(), ParseOptions::lenient()).unwrap()
    }

    #[test]
    fn test_default_aborts() {
        assert!(ParseOptions::default().abort_on_error);
    }

    #[test]
    fn test_builds_tree() {
        let doc = xdita_to_ast(
            r#"<topic id="t1"><title>Hi</title><body><p>Hello <b>world</b></p></body></topic>"#,
            ParseOptions::default(),
        )
        .unwrap();
        let topic = doc.children(Document::ROOT)[0];
        assert_eq!(doc.node_name(topic), "topic");
        assert_eq!(doc.prop(topic, "id"), Some(&serde_json::json!("t1")));
        let [title, body] = doc.children(topic) else {
            panic!("expected title and body");
        };
        assert_eq!(doc.text_content(*title), "Hi");
        let p = doc.children(*body)[0];
        assert_eq!(doc.text_content(p), "Hello world");
    }

    #[test]
    fn test_unknown_tag_aborts_with_position() {
        let err = xdita_to_ast("<topic><title/><body><bogus/></body></topic>", ParseOptions::default())
            .unwrap_err();
        let ParseError::UnknownTag { error, position } = err else {
            panic!("expected an unknown tag error");
        };
        assert_eq!(error.tag, "bogus");
        assert_eq!(position.offset, 21);
    }

    #[test]
    fn test_unknown_tag_skipped_when_lenient() {
        let parsed = lenient("<topic><body><bogus/></body></topic>");
        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        let body = doc.children(topic)[0];
        assert_eq!(doc.node_name(body), "body");
        assert!(doc.children(body).is_empty());
        assert!(parsed.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnknownTag { error, .. } if error.tag == "bogus"
        )));
    }

    #[test]
    fn test_skipped_element_children_attach_to_ancestor() {
        let parsed = lenient("<topic><title/><body><bogus><p>x</p></bogus></body></topic>");
        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        let body = doc.children(topic)[1];
        let p = doc.children(body)[0];
        assert_eq!(doc.node_name(p), "p");
        assert_eq!(doc.text_content(p), "x");
    }

    #[test]
    fn test_missing_required_fails_at_close() {
        let err = xdita_to_ast("<topic><body/></topic>", ParseOptions::default()).unwrap_err();
        let ParseError::ContentModel { violation, .. } = err else {
            panic!("expected a content-model violation");
        };
        assert_eq!(violation.kind, ViolationKind::MissingRequired);
        assert_eq!(violation.parent_tag, "topic");
        assert_eq!(violation.child_tag, "title");
    }

    #[test]
    fn test_misplaced_element_kept_when_lenient() {
        let parsed = lenient("<topic><title>A</title><title>B</title></topic>");
        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        assert_eq!(doc.children(topic).len(), 2);
        let kinds: Vec<_> = parsed
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::ContentModel { violation, .. } => Some(violation.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![ViolationKind::TooMany]);
    }

    #[test]
    fn test_ignorable_whitespace_dropped() {
        let doc = xdita_to_ast(
            "<topic id=\"a\">\n  <title>Hi there</title>\n  <body>\n    <p> x </p>\n  </body>\n</topic>\n",
            ParseOptions::default(),
        )
        .unwrap();
        let topic = doc.children(Document::ROOT)[0];
        assert_eq!(doc.children(topic).len(), 2);
        let body = doc.children(topic)[1];
        let p = doc.children(body)[0];
        // Text inside a text-accepting element is kept as is.
        assert_eq!(doc.text(doc.children(p)[0]), Some(" x "));
    }

    #[test]
    fn test_tokenization_errors_fail_at_end() {
        let err = xdita_to_ast("<topic><title>Hi</title>", ParseOptions::default()).unwrap_err();
        let ParseError::Tokenization(errors) = err else {
            panic!("expected tokenization errors");
        };
        assert!(
            errors
                .iter()
                .any(|e| e.kind == TokenizationErrorKind::Unclosed("topic".to_string()))
        );
    }

    #[test]
    fn test_tokenization_errors_recorded_when_lenient() {
        let parsed = lenient("<topic><title>Hi</title>");
        assert!(matches!(
            parsed.diagnostics.first(),
            Some(Diagnostic::Tokenization(_))
        ));
        let topic = parsed.document.children(Document::ROOT)[0];
        assert_eq!(parsed.document.node_name(topic), "topic");
    }

    #[test]
    fn test_stray_close_reported_once() {
        let parsed = lenient(r#"<topic id="t1"><title>x</i></title></topic>"#);
        assert_eq!(parsed.diagnostics.len(), 1);
        let Diagnostic::Tokenization(error) = &parsed.diagnostics[0] else {
            panic!("expected a tokenization diagnostic");
        };
        assert_eq!(
            error.kind,
            TokenizationErrorKind::UnexpectedClose("i".to_string())
        );

        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        let [title] = doc.children(topic) else {
            panic!("expected a single title");
        };
        assert_eq!(doc.text_content(*title), "x");

        let err = xdita_to_ast(
            r#"<topic id="t1"><title>x</i></title></topic>"#,
            ParseOptions::default(),
        )
        .unwrap_err();
        let ParseError::Tokenization(errors) = err else {
            panic!("expected tokenization errors");
        };
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_mismatched_close_closes_inner_element() {
        let parsed = lenient(r#"<topic id="t1"><title>T</title><body><p><b>x</p></body></topic>"#);
        let kinds: Vec<_> = parsed
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::Tokenization(error) => error.kind.clone(),
                other => panic!("unexpected diagnostic {other}"),
            })
            .collect();
        assert_eq!(kinds, vec![TokenizationErrorKind::Unclosed("b".to_string())]);

        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        let body = doc.children(topic)[1];
        let [p] = doc.children(body) else {
            panic!("expected a single paragraph");
        };
        let [b] = doc.children(*p) else {
            panic!("expected <b> inside <p>");
        };
        assert_eq!(doc.node_name(*b), "b");
        assert_eq!(doc.text_content(*b), "x");
    }

    #[test]
    fn test_non_strict_registry_keeps_unknown() {
        let registry = Arc::new(
            lwdita_ast::catalog::lwdita_registry_builder()
                .strict(false)
                .build()
                .unwrap(),
        );
        let parsed = parse(
            r#"<topic><title/><body><bogus x="1"/></body></topic>"#,
            registry,
            ParseOptions::lenient(),
        )
        .unwrap();
        let doc = &parsed.document;
        let topic = doc.children(Document::ROOT)[0];
        let body = doc.children(topic)[1];
        let bogus = doc.children(body)[0];
        assert_eq!(doc.node(bogus).kind(), &NodeKind::Unknown("bogus".to_string()));
        assert_eq!(doc.prop(bogus, "x"), Some(&serde_json::json!("1")));
    }

    #[test]
    fn test_empty_input() {
        let err = xdita_to_ast("", ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::ContentModel { .. }));
        let parsed = lenient("");
        assert!(parsed.document.children(Document::ROOT).is_empty());
    }
}
