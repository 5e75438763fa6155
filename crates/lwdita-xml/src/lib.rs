//! XDITA text to and from [`lwdita_ast::Document`] trees.
//!
//! # Example
//!
//! ```rust
//! use lwdita_xml::{Indentation, ParseOptions, serialize_to_xdita, xdita_to_ast};
//!
//! let input = r#"<topic id="t1"><title>Hi</title></topic>"#;
//! let doc = xdita_to_ast(input, ParseOptions::default()).unwrap();
//! assert_eq!(serialize_to_xdita(&doc, Indentation::None), input);
//! ```

pub mod builder;
pub mod error;
pub mod serializer;
pub mod sink;
pub mod tokenizer;

pub use builder::{
    ParseOptions, Parsed, TreeBuilder, ast_to_json, parse, xdita_to_ast, xdita_to_json,
};
pub use error::{Diagnostic, ParseError, Position, TokenizationError, TokenizationErrorKind};
pub use serializer::{
    DEFAULT_TAB_SIZE, Indentation, XditaSerializer, serialize_to_writer, serialize_to_xdita,
};
pub use sink::{OutputSink, StringSink, WriterSink};
pub use tokenizer::{OpenTag, XmlEventHandler, tokenize};
