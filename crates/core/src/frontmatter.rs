//! YAML front matter: extraction and conversion to bibliographic nodes.
//!
//! ```text
//! ---
//! title: Rust in Production
//! subtitle: A field report
//! author: [Ada Lovelace, Grace Hopper]
//! date: 2024-03-01
//! venue: RustConf
//! ---
//! ```

use crate::doctree::{Node, NodeKind};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Front matter split off a Markdown document.
#[derive(Debug, Default)]
pub struct FrontMatter {
    /// Bibliographic data; empty without a front matter block.
    pub meta: DocumentMeta,
    /// Byte offset where the Markdown body begins.
    pub body_start: usize,
}

/// Errors emitted while reading front matter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// The opening `---` has no closing fence.
    #[error("front matter opened with '---' is never closed")]
    Unterminated,
    /// YAML failed to parse.
    #[error("front matter is not valid YAML: {0}")]
    Parse(String),
    /// The block is YAML but not a mapping.
    #[error("front matter must be a YAML mapping")]
    InvalidRootType,
}

/// Splits a leading `---` fenced YAML block off `input`.
///
/// Blank lines and a byte order mark may precede the opening fence.
pub fn split_front_matter(input: &str) -> Result<FrontMatter, FrontmatterError> {
    match find_block(input)? {
        Some((block, body_start)) => Ok(FrontMatter {
            meta: parse_block(block)?,
            body_start,
        }),
        None => Ok(FrontMatter::default()),
    }
}

fn find_block(input: &str) -> Result<Option<(&str, usize)>, FrontmatterError> {
    let bom = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };
    let mut lines = input[bom..].split_inclusive('\n').scan(bom, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    });

    let Some((opener_start, opener)) = lines.find(|(_, line)| !line.trim().is_empty()) else {
        return Ok(None);
    };
    if !is_fence(opener) {
        return Ok(None);
    }
    let block_start = opener_start + opener.len();
    for (start, line) in lines {
        if is_fence(line) {
            return Ok(Some((&input[block_start..start], start + line.len())));
        }
    }
    Err(FrontmatterError::Unterminated)
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == "---"
}

fn parse_block(block: &str) -> Result<DocumentMeta, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(DocumentMeta::default());
    }
    let value: Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    match value {
        Value::Null => Ok(DocumentMeta::default()),
        Value::Mapping(map) => Ok(DocumentMeta::from_mapping(&map)),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Bibliographic data read from front matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMeta {
    /// Document title.
    pub title: Option<String>,
    /// Document subtitle.
    pub subtitle: Option<String>,
    /// Authors; an author may span several lines.
    pub authors: Vec<String>,
    /// Date, verbatim.
    pub date: Option<String>,
    /// Remaining scalar fields in source order.
    pub fields: Vec<(String, String)>,
}

impl DocumentMeta {
    /// Reads the recognized keys from a front matter mapping.
    ///
    /// `author` and `authors` accept a string or a list of strings. Other
    /// scalar entries become fields; nested values are ignored with a warning.
    pub fn from_mapping(map: &Mapping) -> Self {
        let mut meta = DocumentMeta::default();
        for (key, value) in map {
            let Some(key) = scalar_text(key) else {
                log::warn!("front matter key {:?} is not a scalar; ignored", key);
                continue;
            };
            match key.to_ascii_lowercase().as_str() {
                "title" => meta.title = scalar_text(value),
                "subtitle" => meta.subtitle = scalar_text(value),
                "date" => meta.date = scalar_text(value),
                "author" | "authors" => match value {
                    Value::Sequence(items) => {
                        meta.authors.extend(items.iter().filter_map(scalar_text))
                    }
                    other => meta.authors.extend(scalar_text(other)),
                },
                _ => match scalar_text(value) {
                    Some(text) => meta.fields.push((key, text)),
                    None => log::warn!("front matter key '{}' is not a scalar; ignored", key),
                },
            }
        }
        meta
    }

    /// True when nothing was recognized.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.authors.is_empty()
            && self.date.is_none()
            && self.fields.is_empty()
    }

    /// Builds the leading document children: title, subtitle and docinfo.
    pub fn to_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        if let Some(title) = &self.title {
            nodes.push(Node::title(title.as_str()));
        }
        if let Some(subtitle) = &self.subtitle {
            nodes.push(Node::with_children(
                NodeKind::Subtitle,
                vec![Node::text(subtitle.as_str())],
            ));
        }

        let mut docinfo = Vec::new();
        for author in &self.authors {
            docinfo.push(Node::with_children(NodeKind::Author, line_nodes(author)));
        }
        if let Some(date) = &self.date {
            docinfo.push(Node::with_children(NodeKind::Date, vec![Node::text(date.as_str())]));
        }
        for (name, value) in &self.fields {
            docinfo.push(Node::with_children(
                NodeKind::Field { name: name.clone() },
                vec![Node::text(value.as_str())],
            ));
        }
        if !docinfo.is_empty() {
            nodes.push(Node::with_children(NodeKind::Docinfo, docinfo));
        }
        nodes
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim_end().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text nodes separated by line breaks, one per line.
fn line_nodes(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            nodes.push(Node::new(NodeKind::LineBreak));
        }
        nodes.push(Node::text(line.trim()));
    }
    nodes
}
