//! Splits Markdown source into plain Markdown chunks and directive blocks.
//!
//! Container directives open with three or more colons and close with a line
//! holding only colons; they nest by depth. Leaf directives use two colons and
//! span one line:
//!
//! ```text
//! :::r2b_simplecolumns[0.8]{.wide}
//! First column
//!
//! Second column
//! :::
//!
//! ::r2b_section[A slide with an explicit title]
//! ```
//!
//! Lines inside fenced code blocks are never treated as directives.

use crate::code_fence::{FenceState, advance_fence_state, is_indented_code};
use std::collections::BTreeMap;

/// Parsed directive opening line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOpening {
    /// Lowercased directive name.
    pub name: String,
    /// Text between `[` and `]`, or the bare words after the name.
    pub argument: Option<String>,
    /// `key=value` attributes.
    pub options: BTreeMap<String, String>,
    /// `.class` attributes.
    pub classes: Vec<String>,
    /// `#id` attribute.
    pub id: Option<String>,
    /// Two-colon single-line form.
    pub leaf: bool,
}

/// A directive block cut out of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveBlock {
    /// The opening line, parsed.
    pub opening: DirectiveOpening,
    /// Absolute line of the opener.
    pub line: usize,
    /// Column of the first colon.
    pub column: usize,
    /// Dedented content lines.
    pub content: Vec<String>,
    /// Absolute line of the first content line.
    pub content_offset: usize,
    /// Opener, content and closer as written.
    pub block_text: String,
    /// False when the source ended before the closing line.
    pub closed: bool,
}

/// One piece of scanned source.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Markdown text handed to markdown-rs as is.
    Markdown {
        /// Joined source lines.
        text: String,
        /// Absolute line of the first line.
        first_line: usize,
    },
    /// A directive block.
    Directive(DirectiveBlock),
}

/// Parses a directive opening line such as `:::r2b_column{width=0.4}`.
///
/// Returns `None` for closers, indented code and anything that is not a
/// directive.
pub fn parse_opening_directive(line: &str) -> Option<DirectiveOpening> {
    if is_indented_code(line) {
        return None;
    }
    let trimmed = line.trim();
    let colons = trimmed.chars().take_while(|c| *c == ':').count();
    if colons < 2 {
        return None;
    }
    let rest = &trimmed[colons..];

    let name_len = rest
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map_or(rest.len(), |(i, _)| i);
    let name = &rest[..name_len];
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut opening = DirectiveOpening {
        name: name.to_ascii_lowercase(),
        leaf: colons == 2,
        ..Default::default()
    };
    let mut rest = &rest[name_len..];

    if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = matching_bracket(after_bracket)?;
        opening.argument = Some(after_bracket[..close].to_string());
        rest = &after_bracket[close + 1..];
    }

    let rest = rest.trim();
    let (bare, attrs) = match rest.find('{') {
        Some(open) if rest.ends_with('}') => (&rest[..open], &rest[open + 1..rest.len() - 1]),
        _ => (rest, ""),
    };
    let bare = bare.trim();
    if !bare.is_empty() {
        if opening.argument.is_some() {
            return None;
        }
        opening.argument = Some(bare.to_string());
    }

    for token in tokenize_attributes(attrs) {
        if let Some(class) = token.strip_prefix('.') {
            opening.classes.push(class.to_string());
        } else if let Some(id) = token.strip_prefix('#') {
            opening.id = Some(id.to_string());
        } else {
            let (key, value) = split_attribute(token);
            opening.options.insert(key.to_ascii_lowercase(), value);
        }
    }
    Some(opening)
}

/// True for a line made only of three or more colons.
pub fn is_directive_closer(line: &str) -> bool {
    if is_indented_code(line) {
        return false;
    }
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == ':')
}

/// Splits `key=value` (value optionally quoted). A bare key gets an empty value.
pub fn split_attribute(token: &str) -> (String, String) {
    match token.split_once('=') {
        Some((key, value)) => (key.trim().to_string(), unquote(value.trim()).to_string()),
        None => (token.trim().to_string(), String::new()),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Splits an attribute list on whitespace, keeping quoted values intact.
pub fn tokenize_attributes(attrs: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, c) in attrs.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => {
                token_start.get_or_insert(i);
                quote = Some(c);
            }
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c.is_whitespace() => {
                if let Some(start) = token_start.take() {
                    tokens.push(&attrs[start..i]);
                }
            }
            _ => {
                token_start.get_or_insert(i);
            }
        }
    }
    if let Some(start) = token_start {
        tokens.push(&attrs[start..]);
    }
    tokens
}

fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Cuts `lines` into Markdown chunks and directive blocks.
///
/// `first_line` is the absolute line number of `lines[0]`.
pub fn scan_blocks(lines: &[String], first_line: usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut pending_start = first_line;
    let mut fence = FenceState::default();
    let mut index = 0;

    while index < lines.len() {
        let line = &lines[index];
        let step = advance_fence_state(line, fence);
        fence = step.next_state;
        let opening = if step.in_code {
            None
        } else {
            parse_opening_directive(line)
        };

        let Some(opening) = opening else {
            if pending.is_empty() {
                pending_start = first_line + index;
            }
            pending.push(line);
            index += 1;
            continue;
        };

        flush_markdown(&mut blocks, &mut pending, pending_start);
        let line_no = first_line + index;
        let column = 1 + (line.len() - line.trim_start().len());

        if opening.leaf {
            blocks.push(Block::Directive(DirectiveBlock {
                opening,
                line: line_no,
                column,
                content: Vec::new(),
                content_offset: line_no + 1,
                block_text: line.trim().to_string(),
                closed: true,
            }));
            index += 1;
            continue;
        }

        let (end, closed) = find_closer(lines, index + 1);
        let block_end = if closed { end + 1 } else { end };
        blocks.push(Block::Directive(DirectiveBlock {
            opening,
            line: line_no,
            column,
            content: dedent(&lines[index + 1..end]),
            content_offset: line_no + 1,
            block_text: lines[index..block_end].join("\n"),
            closed,
        }));
        index = block_end;
    }

    flush_markdown(&mut blocks, &mut pending, pending_start);
    blocks
}

fn flush_markdown(blocks: &mut Vec<Block>, pending: &mut Vec<&str>, first_line: usize) {
    if pending.is_empty() {
        return;
    }
    if pending.iter().any(|line| !line.trim().is_empty()) {
        blocks.push(Block::Markdown {
            text: pending.join("\n"),
            first_line,
        });
    }
    pending.clear();
}

/// Index of the closing line for a container opened just before `start`.
fn find_closer(lines: &[String], start: usize) -> (usize, bool) {
    let mut depth = 1usize;
    let mut fence = FenceState::default();
    for (offset, line) in lines[start..].iter().enumerate() {
        let step = advance_fence_state(line, fence);
        fence = step.next_state;
        if step.in_code {
            continue;
        }
        if is_directive_closer(line) {
            depth -= 1;
            if depth == 0 {
                return (start + offset, true);
            }
        } else if parse_opening_directive(line).is_some_and(|o| !o.leaf) {
            depth += 1;
        }
    }
    (lines.len(), false)
}

/// Removes the indentation shared by all non-blank lines.
fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end().to_string())
        .collect()
}
