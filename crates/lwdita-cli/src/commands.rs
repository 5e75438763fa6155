//! Command implementations for the lwdita CLI.

use anyhow::{Context, Result};
use lwdita_ast::catalog::lwdita_registry;
use lwdita_xml::{Indentation, ParseOptions, Parsed, parse, serialize_to_xdita};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;

pub fn options(lenient: bool) -> ParseOptions {
    if lenient {
        ParseOptions::lenient()
    } else {
        ParseOptions::strict()
    }
}

/// Value parser for `--indent`.
pub fn parse_indent(value: &str) -> Result<Indentation, String> {
    match value {
        "none" => Ok(Indentation::None),
        "tab" => Ok(Indentation::Tab),
        _ => value
            .parse::<usize>()
            .map(Indentation::spaces)
            .map_err(|_| format!("expected 'none', 'tab' or a number of spaces, got '{value}'")),
    }
}

/// Apply `--indent-string` on top of `--indent`.
pub fn resolve_indentation(indent: Indentation, unit: Option<&str>) -> Indentation {
    match unit {
        None => indent,
        Some(unit) => {
            let size = match indent {
                Indentation::Repeat { size, .. } => Some(size),
                _ => None,
            };
            Indentation::from_unit(unit, size)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn load(path: &Path, options: ParseOptions) -> Result<Parsed> {
    let input = read_input(path)?;
    let parsed = parse(&input, lwdita_registry(), options)
        .with_context(|| format!("{} is not a valid XDITA document", path.display()))?;
    for diagnostic in &parsed.diagnostics {
        eprintln!("{}:{}", path.display(), diagnostic);
    }
    Ok(parsed)
}

/// Parse every input and report problems; returns whether all were clean.
pub fn check(inputs: &[impl AsRef<Path>], options: ParseOptions, attributes: bool) -> Result<bool> {
    let mut clean = true;
    for input in inputs {
        let path = input.as_ref();
        let parsed = match load(path, options) {
            Ok(parsed) => parsed,
            Err(err) => {
                eprintln!("{err:#}");
                clean = false;
                continue;
            }
        };
        if !parsed.is_clean() {
            clean = false;
        }
        if attributes {
            if let Err(err) = parsed.document.validate() {
                eprintln!("{}: {}", path.display(), err);
                clean = false;
            }
        }
        info!(path = %path.display(), nodes = parsed.document.len(), "checked");
    }
    Ok(clean)
}

pub fn format(
    input: &Path,
    options: ParseOptions,
    indentation: Indentation,
    output: Option<&Path>,
) -> Result<()> {
    let parsed = load(input, options)?;
    write_output(output, &serialize_to_xdita(&parsed.document, indentation))
}

pub fn json(input: &Path, options: ParseOptions, pretty: bool, output: Option<&Path>) -> Result<()> {
    let parsed = load(input, options)?;
    let projection = parsed.document.to_json();
    let mut text = if pretty {
        serde_json::to_string_pretty(&projection)?
    } else {
        serde_json::to_string(&projection)?
    };
    text.push('\n');
    write_output(output, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = r#"<topic id="t1"><title>Hi</title></topic>"#;

    #[test]
    fn test_parse_indent() {
        assert_eq!(parse_indent("none"), Ok(Indentation::None));
        assert_eq!(parse_indent("tab"), Ok(Indentation::Tab));
        assert_eq!(parse_indent("2"), Ok(Indentation::spaces(2)));
        assert!(parse_indent("wide").is_err());
    }

    #[test]
    fn test_resolve_indentation() {
        assert_eq!(
            resolve_indentation(Indentation::spaces(2), Some("-")),
            Indentation::Repeat {
                unit: "-".to_string(),
                size: 2
            }
        );
        assert_eq!(
            resolve_indentation(Indentation::None, Some("\t")),
            Indentation::Tab
        );
        assert_eq!(
            resolve_indentation(Indentation::None, Some(" ")),
            Indentation::spaces(4)
        );
        assert_eq!(resolve_indentation(Indentation::Tab, None), Indentation::Tab);
    }

    #[test]
    fn test_check_reports_invalid_documents() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.dita");
        let bad = dir.path().join("bad.dita");
        fs::write(&good, TOPIC).unwrap();
        fs::write(&bad, "<topic><bogus/></topic>").unwrap();

        assert!(check(&[&good], ParseOptions::strict(), true).unwrap());
        assert!(!check(&[&good, &bad], ParseOptions::strict(), false).unwrap());
        assert!(!check(&[&bad], ParseOptions::lenient(), false).unwrap());
    }

    #[test]
    fn test_format_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.dita");
        let output = dir.path().join("out.dita");
        fs::write(&input, TOPIC).unwrap();

        format(&input, ParseOptions::strict(), Indentation::Tab, Some(&output)).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "<topic id=\"t1\">\n\t<title>\n\t\tHi\n\t</title>\n</topic>\n"
        );
    }

    #[test]
    fn test_json_writes_projection() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.dita");
        let output = dir.path().join("out.json");
        fs::write(&input, TOPIC).unwrap();

        json(&input, ParseOptions::strict(), false, Some(&output)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["children"][0]["nodeName"], "topic");
        assert_eq!(value["children"][0]["attributes"]["id"], "t1");
    }
}
