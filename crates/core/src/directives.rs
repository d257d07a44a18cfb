//! Layout directives and the registry the front end dispatches through.
//!
//! A directive is a pure constructor: it receives its invocation (arguments,
//! options, content lines) and a [`NestedParser`] for its content, and returns
//! new nodes. Nothing is rewritten in place.
//!
//! ```text
//! :::r2b_columnset{width=1.0}
//! :::r2b_column{width=0.6}
//! Left side
//! :::
//! :::r2b_column
//! Right side
//! :::
//! :::
//! ```

use crate::doctree::{Node, NodeKind, normalize_name};
use crate::error::{DirectiveError, SourceLocation};
use std::collections::BTreeMap;

/// Total width used when a column group does not ask for one.
pub const DEFAULT_COLUMNSET_WIDTH: f64 = 0.90;

/// Tolerance for comparing summed fractional widths.
const WIDTH_EPSILON: f64 = 1e-9;

/// Everything a directive handler gets to see about one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveInvocation {
    /// Registered name the directive was invoked with.
    pub name: String,
    /// Positional arguments.
    pub arguments: Vec<String>,
    /// Raw option values keyed by option name.
    pub options: BTreeMap<String, String>,
    /// Content lines, dedented.
    pub content: Vec<String>,
    /// Absolute line number of the first content line.
    pub content_offset: usize,
    /// Full source text of the directive block.
    pub block_text: String,
    /// Location of the directive opener.
    pub location: SourceLocation,
}

impl DirectiveInvocation {
    /// Creates an invocation with the given content and no arguments.
    pub fn new(name: impl Into<String>, content: &[&str]) -> Self {
        let content: Vec<String> = content.iter().map(|l| (*l).to_string()).collect();
        Self {
            name: name.into(),
            block_text: content.join("\n"),
            content,
            location: SourceLocation::new(1, 1),
            content_offset: 2,
            ..Default::default()
        }
    }

    /// Adds an option (builder style).
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Adds a positional argument (builder style).
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// True when every content line is blank.
    pub fn content_is_empty(&self) -> bool {
        self.content.iter().all(|line| line.trim().is_empty())
    }

    fn assert_has_content(&self) -> Result<(), DirectiveError> {
        if self.content_is_empty() {
            return Err(DirectiveError::MissingContent {
                directive: self.name.clone(),
            });
        }
        Ok(())
    }

    fn check_arguments(&self, min: usize, max: usize) -> Result<(), DirectiveError> {
        let found = self.arguments.len();
        if found < min || found > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{}..={}", min, max)
            };
            return Err(DirectiveError::ArgumentCount {
                directive: self.name.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn check_options(&self, accepted: &[&str]) -> Result<(), DirectiveError> {
        match self.options.keys().find(|k| !accepted.contains(&k.as_str())) {
            Some(unknown) => Err(DirectiveError::UnknownOption {
                directive: self.name.clone(),
                name: unknown.clone(),
            }),
            None => Ok(()),
        }
    }

    fn joined_content(&self) -> String {
        self.content.join("\n")
    }
}

/// The pipeline's ability to parse directive content into nodes.
pub trait NestedParser {
    /// Parses `lines` (starting at absolute line `offset`) into block nodes.
    fn nested_parse(&mut self, lines: &[String], offset: usize) -> Result<Vec<Node>, DirectiveError>;
}

/// Signature shared by all directive handlers.
pub type DirectiveHandler =
    fn(&DirectiveInvocation, &mut dyn NestedParser) -> Result<Vec<Node>, DirectiveError>;

/// Explicit name → handler registry handed to the front end at startup.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    handlers: BTreeMap<String, DirectiveHandler>,
}

impl DirectiveRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the layout directives and the supporting
    /// `container` and `contents` directives.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("r2b_simplecolumns", simple_columns)
            .register("r2b_columnset", column_set)
            .register("r2b_column", column)
            .register("r2b_note", note)
            .register("beamer_section", section)
            .register("r2b_section", section)
            .register("container", container)
            .register("contents", contents);
        registry
    }

    /// Registers (or replaces) a handler.
    pub fn register(&mut self, name: &str, handler: DirectiveHandler) -> &mut Self {
        self.handlers.insert(name.to_ascii_lowercase(), handler);
        self
    }

    /// Looks up a handler by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<DirectiveHandler> {
        self.handlers.get(&name.to_ascii_lowercase()).copied()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Runs the named directive.
    pub fn run(
        &self,
        invocation: &DirectiveInvocation,
        parser: &mut dyn NestedParser,
    ) -> Option<Result<Vec<Node>, DirectiveError>> {
        let handler = self.get(&invocation.name)?;
        log::debug!(
            "running directive '{}' at {}",
            invocation.name,
            invocation.location
        );
        Some(handler(invocation, parser))
    }
}

/// Validates a fractional width in (0.0, 1.0].
pub fn check_width(value: f64) -> Result<f64, DirectiveError> {
    if value.is_nan() || value <= 0.0 || value > 1.0 {
        return Err(DirectiveError::InvalidWidth { value });
    }
    Ok(value)
}

/// Reads the `width` option, falling back to a single positional argument.
fn requested_width(invocation: &DirectiveInvocation) -> Result<Option<f64>, DirectiveError> {
    let raw = invocation
        .options
        .get("width")
        .or_else(|| invocation.arguments.first());
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DirectiveError::InvalidOption {
            name: "width".to_string(),
            value: raw.clone(),
        })?;
    check_width(value).map(Some)
}

/// Wraps each node in its own column, sharing `width` evenly.
pub fn wrap_in_columns(children: Vec<Node>, width: Option<f64>) -> Vec<Node> {
    let width = width.unwrap_or(DEFAULT_COLUMNSET_WIDTH);
    if children.is_empty() {
        return Vec::new();
    }
    let col_width = width / children.len() as f64;
    children
        .into_iter()
        .map(|child| Node::column(Some(col_width), vec![child]))
        .collect()
}

/// Computes the width of every column in a column set.
///
/// Declared widths are kept. Undeclared columns share `width` minus the
/// declared sum. Fails when the declared sum exceeds 1.0 or nothing is left
/// for undeclared columns.
pub fn resolve_column_widths(
    declared: &[Option<f64>],
    width: f64,
) -> Result<Vec<f64>, DirectiveError> {
    let used: f64 = declared.iter().flatten().sum();
    if used > 1.0 + WIDTH_EPSILON {
        return Err(DirectiveError::WidthOverflow { total: used });
    }

    let unsized_count = declared.iter().filter(|w| w.is_none()).count();
    if unsized_count == 0 {
        if used + WIDTH_EPSILON < width {
            log::warn!(
                "column widths add up to {:.2} of the requested {:.2}; the rest stays empty",
                used,
                width
            );
        }
        return Ok(declared.iter().flatten().copied().collect());
    }

    let excess = width - used;
    if excess <= WIDTH_EPSILON {
        return Err(DirectiveError::NoRoomForUnsized { remainder: excess });
    }
    let col_width = excess / unsized_count as f64;
    Ok(declared.iter().map(|w| w.unwrap_or(col_width)).collect())
}

/// `r2b_simplecolumns`: every top-level block of the content becomes a column.
pub fn simple_columns(
    invocation: &DirectiveInvocation,
    parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.assert_has_content()?;
    invocation.check_arguments(0, 1)?;
    invocation.check_options(&["width"])?;
    let width = requested_width(invocation)?.unwrap_or(DEFAULT_COLUMNSET_WIDTH);

    let children = parser.nested_parse(&invocation.content, invocation.content_offset)?;
    if children.is_empty() {
        return Err(DirectiveError::MissingContent {
            directive: invocation.name.clone(),
        });
    }

    let columns = wrap_in_columns(children, Some(width));
    let cset = Node::with_children(NodeKind::ColumnSet, columns)
        .with_rawsource(invocation.joined_content());
    Ok(vec![cset])
}

/// `r2b_columnset`: explicit columns, undeclared widths share what is left.
pub fn column_set(
    invocation: &DirectiveInvocation,
    parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.assert_has_content()?;
    invocation.check_arguments(0, 1)?;
    invocation.check_options(&["width"])?;
    let width = requested_width(invocation)?.unwrap_or(DEFAULT_COLUMNSET_WIDTH);

    let parsed = parser.nested_parse(&invocation.content, invocation.content_offset)?;
    let columns: Vec<Node> = parsed
        .into_iter()
        .map(|child| match child.kind {
            NodeKind::Column { .. } => child,
            _ => Node::column(None, vec![child]),
        })
        .collect();

    let declared: Vec<Option<f64>> = columns.iter().map(Node::column_width).collect();
    let widths = resolve_column_widths(&declared, width)?;
    let columns = columns
        .into_iter()
        .zip(widths)
        .map(|(mut column, resolved)| {
            column.kind = NodeKind::Column {
                width: Some(resolved),
            };
            column
        })
        .collect();

    let cset = Node::with_children(NodeKind::ColumnSet, columns)
        .with_rawsource(invocation.joined_content());
    Ok(vec![cset])
}

/// `r2b_column`: a single column, width left to the enclosing set when absent.
pub fn column(
    invocation: &DirectiveInvocation,
    parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.assert_has_content()?;
    invocation.check_arguments(0, 1)?;
    invocation.check_options(&["width"])?;
    let width = requested_width(invocation)?;

    let children = parser.nested_parse(&invocation.content, invocation.content_offset)?;
    let col = Node::column(width, children).with_rawsource(invocation.joined_content());
    Ok(vec![col])
}

/// `r2b_note`: speaker notes for the current slide.
pub fn note(
    invocation: &DirectiveInvocation,
    parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.assert_has_content()?;
    invocation.check_arguments(0, 0)?;
    invocation.check_options(&[])?;

    let children = parser.nested_parse(&invocation.content, invocation.content_offset)?;
    let note = Node::with_children(NodeKind::BeamerNote, children)
        .with_rawsource(invocation.joined_content());
    Ok(vec![note])
}

/// `r2b_section` / `beamer_section`: a slide break with an explicit title.
pub fn section(
    invocation: &DirectiveInvocation,
    _parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.check_arguments(1, 1)?;
    invocation.check_options(&[])?;
    let title = &invocation.arguments[0];

    let title_node = Node::title(title.as_str());
    let mut node = Node::with_children(NodeKind::BeamerSection, vec![title_node])
        .with_rawsource(invocation.block_text.as_str());
    node.attributes.names.push(normalize_name(title));
    Ok(vec![node])
}

/// `container`: generic block carrying the argument words as classes.
pub fn container(
    invocation: &DirectiveInvocation,
    parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.assert_has_content()?;
    invocation.check_options(&["class"])?;

    let children = parser.nested_parse(&invocation.content, invocation.content_offset)?;
    let mut node = Node::with_children(NodeKind::Container, children)
        .with_rawsource(invocation.joined_content());
    node.attributes.classes = invocation
        .arguments
        .iter()
        .chain(invocation.options.get("class"))
        .flat_map(|words| words.split_whitespace())
        .map(str::to_string)
        .collect();
    Ok(vec![node])
}

/// `contents`: a table-of-contents topic, filled once sections are known.
pub fn contents(
    invocation: &DirectiveInvocation,
    _parser: &mut dyn NestedParser,
) -> Result<Vec<Node>, DirectiveError> {
    invocation.check_arguments(0, 1)?;
    invocation.check_options(&["depth"])?;
    if let Some(depth) = invocation.options.get("depth")
        && depth.trim().parse::<usize>().is_err()
    {
        return Err(DirectiveError::InvalidOption {
            name: "depth".to_string(),
            value: depth.clone(),
        });
    }

    let title = invocation
        .arguments
        .first()
        .cloned()
        .unwrap_or_else(|| "Contents".to_string());
    let mut topic = Node::with_children(NodeKind::Topic, vec![Node::title(title.as_str())])
        .with_class("contents")
        .with_rawsource(invocation.block_text.as_str());
    topic.attributes.names.push(normalize_name(&title));
    if let Some(depth) = invocation.options.get("depth") {
        topic.attributes.classes.push(format!("depth-{}", depth.trim()));
    }
    Ok(vec![topic])
}
