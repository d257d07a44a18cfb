//! Markdown front end: source text to a finished document tree.
//!
//! The pipeline runs in this order:
//! 1. YAML front matter becomes the title, subtitle and docinfo block.
//! 2. The body is cut into Markdown chunks and directive blocks.
//! 3. Chunks go through markdown-rs and are converted to tree nodes;
//!    directives run through the registry with the pipeline as their
//!    [`NestedParser`].
//! 4. Headings are nested into sections, a lone top-level section may become
//!    the document title, and `contents` topics are filled.

use crate::convert::{ConvertContext, Flat, convert_root};
use crate::directives::{DirectiveInvocation, DirectiveRegistry, NestedParser};
use crate::doctree::{Node, NodeKind};
use crate::error::{
    DirectiveError, ParseDiagnostics, ParseWarning, R2bError, RecoverableError, SourceLocation,
};
use crate::frontmatter::split_front_matter;
use crate::scan::{Block, DirectiveBlock, scan_blocks};
use crate::slug::Slugger;
use crate::structure::{build_sections, fill_contents, promote_title};
use markdown::message::{Message, Place};

/// Front end options.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Keep raw HTML (and HTML comments) as nodes.
    pub raw_html: bool,
    /// Promote a lone top-level section to the document title.
    pub doctitle_xform: bool,
}

impl ParseOptions {
    /// Defaults for slide sources.
    pub const fn markdown() -> Self {
        Self {
            gfm: true,
            code_indented: true,
            raw_html: true,
            doctitle_xform: true,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    ///
    /// Front matter is extracted before markdown-rs runs, so the construct
    /// stays off.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            frontmatter: false,
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::markdown()
    }
}

/// A parsed document with the problems found along the way.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The finished tree.
    pub document: Node,
    /// Warnings and recoverable (directive) errors.
    pub diagnostics: ParseDiagnostics,
}

/// Builds document trees from Markdown, dispatching directives through a
/// registry.
pub struct ParserPipeline<'r> {
    registry: &'r DirectiveRegistry,
    options: ParseOptions,
}

impl<'r> ParserPipeline<'r> {
    /// Creates a pipeline over an explicit directive registry.
    pub fn new(registry: &'r DirectiveRegistry, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    /// Options in use.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parses a document.
    pub fn parse(&self, input: &str) -> Result<ParseOutcome, R2bError> {
        self.parse_source(input, None)
    }

    /// Parses a document, naming `source` in diagnostic locations.
    pub fn parse_source(
        &self,
        input: &str,
        source: Option<&str>,
    ) -> Result<ParseOutcome, R2bError> {
        let front = split_front_matter(input)?;
        let meta = front.meta;
        let body = &input[front.body_start..];
        let first_line = 1 + input[..front.body_start].matches('\n').count();
        let lines: Vec<String> = body
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::to_string)
            .collect();

        let mut session = Session {
            registry: self.registry,
            options: self.options,
            source,
            diagnostics: ParseDiagnostics::new(),
        };
        let flats = session.parse_lines(&lines, first_line)?;
        let mut body = build_sections(flats, &mut Slugger::new());

        let mut document = Node::new(NodeKind::Document);
        if meta.title.is_none()
            && self.options.doctitle_xform
            && let Some((title, attributes)) = promote_title(&mut body)
        {
            document.attributes = attributes;
            document.children.push(title);
        }
        document.children.extend(meta.to_nodes());
        document.children.extend(body);
        fill_contents(&mut document);

        log::debug!(
            "parsed {} top-level node(s), {} diagnostic(s)",
            document.children.len(),
            session.diagnostics.count()
        );
        Ok(ParseOutcome {
            document,
            diagnostics: session.diagnostics,
        })
    }
}

/// Per-document parsing state; also the nested parser handed to directives.
struct Session<'a> {
    registry: &'a DirectiveRegistry,
    options: ParseOptions,
    source: Option<&'a str>,
    diagnostics: ParseDiagnostics,
}

impl Session<'_> {
    fn location(&self, line: usize, column: usize) -> SourceLocation {
        match self.source {
            Some(file) => SourceLocation::with_file(file.to_string(), line, column),
            None => SourceLocation::new(line, column),
        }
    }

    fn parse_lines(&mut self, lines: &[String], first_line: usize) -> Result<Vec<Flat>, R2bError> {
        let mut flats = Vec::new();
        for block in scan_blocks(lines, first_line) {
            match block {
                Block::Markdown { text, first_line } => {
                    flats.extend(self.parse_markdown(&text, first_line)?);
                }
                Block::Directive(directive) => {
                    flats.extend(self.run_directive(directive).into_iter().map(Flat::Block));
                }
            }
        }
        Ok(flats)
    }

    fn parse_markdown(&mut self, text: &str, first_line: usize) -> Result<Vec<Flat>, R2bError> {
        let root = markdown::to_mdast(text, &self.options.to_markdown()).map_err(|message| {
            let (line, column) = message_position(&message);
            R2bError::MarkdownAdapter {
                message: message.to_string(),
                location: self.location(first_line + line - 1, column),
            }
        })?;
        let mut ctx = ConvertContext::new(&mut self.diagnostics, first_line, self.source);
        Ok(convert_root(&root, &mut ctx))
    }

    fn run_directive(&mut self, block: DirectiveBlock) -> Vec<Node> {
        let location = self.location(block.line, block.column);
        let name = block.opening.name.clone();
        if !block.closed {
            log::warn!("{}: directive '{}' is never closed", location, name);
            self.diagnostics.add_warning(ParseWarning::UnclosedDirective {
                location: location.clone(),
                name: name.clone(),
            });
        }

        let invocation = DirectiveInvocation {
            name: name.clone(),
            arguments: block.opening.argument.iter().cloned().collect(),
            options: block.opening.options.clone(),
            content: block.content,
            content_offset: block.content_offset,
            block_text: block.block_text,
            location: location.clone(),
        };

        let registry = self.registry;
        match registry.run(&invocation, self) {
            None => {
                self.fail(location, format!("unknown directive type '{}'", name));
                Vec::new()
            }
            Some(Err(err)) => {
                self.fail(location, format!("error in '{}' directive: {}", name, err));
                Vec::new()
            }
            Some(Ok(mut nodes)) => {
                for node in &mut nodes {
                    node.attributes
                        .classes
                        .extend(block.opening.classes.iter().cloned());
                }
                if let (Some(id), Some(first)) = (&block.opening.id, nodes.first_mut()) {
                    first.attributes.ids.push(id.clone());
                }
                nodes
            }
        }
    }

    fn fail(&mut self, location: SourceLocation, message: String) {
        log::warn!("{}: {}", location, message);
        self.diagnostics
            .add_error(RecoverableError::at(message, location));
    }
}

impl NestedParser for Session<'_> {
    fn nested_parse(
        &mut self,
        lines: &[String],
        offset: usize,
    ) -> Result<Vec<Node>, DirectiveError> {
        let flats = self
            .parse_lines(lines, offset)
            .map_err(|err| DirectiveError::Content(err.to_string()))?;
        flats
            .into_iter()
            .map(|flat| match flat {
                Flat::Block(node) => Ok(node),
                Flat::Heading { .. } => Err(DirectiveError::UnexpectedSection),
            })
            .collect()
    }
}

fn message_position(message: &Message) -> (usize, usize) {
    match message.place.as_deref() {
        Some(Place::Point(point)) => (point.line, point.column),
        Some(Place::Position(position)) => (position.start.line, position.start.column),
        None => (1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    fn parse(input: &str) -> ParseOutcome {
        let registry = DirectiveRegistry::with_defaults();
        ParserPipeline::new(&registry, ParseOptions::default())
            .parse(input)
            .expect("parse should succeed")
    }

    fn find<'n>(node: &'n Node, tag: &str) -> Option<&'n Node> {
        if node.tag_name() == tag {
            return Some(node);
        }
        node.children.iter().find_map(|child| find(child, tag))
    }

    fn widths(cset: &Node) -> Vec<f64> {
        cset.children
            .iter()
            .map(|c| c.column_width().unwrap())
            .collect()
    }

    #[test]
    fn front_matter_builds_title_and_docinfo() {
        let outcome = parse("---\ntitle: Talk\nauthor: Ada\ndate: today\n---\n# One\n\ntext\n");
        let doc = &outcome.document;
        let tags: Vec<_> = doc.children.iter().map(Node::tag_name).collect();
        assert_eq!(tags, ["title", "docinfo", "section"]);
        assert_eq!(doc.children[0].astext(), "Talk");
        assert!(!outcome.diagnostics.has_warnings());
    }

    #[test]
    fn lone_section_is_promoted_without_front_matter() {
        let doc = parse("# Talk\n\n## One\n\na\n\n## Two\n\nb\n").document;
        let tags: Vec<_> = doc.children.iter().map(Node::tag_name).collect();
        assert_eq!(tags, ["title", "section", "section"]);
        assert_eq!(doc.attributes.ids, vec!["talk"]);

        let registry = DirectiveRegistry::with_defaults();
        let options = ParseOptions {
            doctitle_xform: false,
            ..ParseOptions::default()
        };
        let doc = ParserPipeline::new(&registry, options)
            .parse("# Talk\n\n## One\n")
            .unwrap()
            .document;
        assert_eq!(doc.children.len(), 1);
        assert!(doc.children[0].has_sub_sections());
    }

    #[test]
    fn simple_columns_directive() {
        let outcome = parse("# Slide\n\n:::r2b_simplecolumns\nFirst\n\nSecond\n\nThird\n:::\n");
        let cset = find(&outcome.document, "columnset").expect("columnset");
        assert_eq!(cset.children.len(), 3);
        for width in widths(cset) {
            assert!((width - 0.30).abs() < 1e-9);
        }
        assert_eq!(cset.children[2].astext(), "Third");
    }

    #[test]
    fn explicit_column_set_with_nested_columns() {
        let input = "# Slide\n\n:::r2b_columnset{width=1.0}\n:::r2b_column{width=0.6}\nLeft\n:::\n:::r2b_column\nRight\n:::\n:::\n";
        let outcome = parse(input);
        assert!(!outcome.diagnostics.has_errors(), "{:?}", outcome.diagnostics);
        let cset = find(&outcome.document, "columnset").expect("columnset");
        let widths = widths(cset);
        assert!((widths[0] - 0.6).abs() < 1e-9);
        assert!((widths[1] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn note_and_section_directives() {
        let input = "---\ntitle: T\n---\n# A\n\ntext\n\n::r2b_section[Extra slide]\n\n:::r2b_note{.aside}\nRemember the demo.\n:::\n";
        let doc = parse(input).document;
        let section = &doc.children[1];
        let tags: Vec<_> = section.children.iter().map(Node::tag_name).collect();
        assert_eq!(tags, ["title", "paragraph", "beamer_section", "beamer_note"]);
        assert_eq!(section.children[2].children[0].astext(), "Extra slide");
        assert_eq!(section.children[3].attributes.classes, vec!["aside"]);
    }

    #[test]
    fn directive_errors_are_located_and_siblings_survive() {
        let input = "# Slide\n\nbefore\n\n:::r2b_simplecolumns{width=1.5}\nx\n:::\n\nafter\n";
        let outcome = parse(input);
        let errors = &outcome.diagnostics.errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, ErrorSeverity::Error);
        assert_eq!(errors[0].location.line, 5);
        assert!(errors[0].message.contains("1.500000"), "{}", errors[0].message);
        assert!(find(&outcome.document, "columnset").is_none());
        assert!(outcome.document.astext().contains("after"));
    }

    #[test]
    fn headings_inside_directives_fail_the_directive() {
        let outcome = parse("# Slide\n\n:::r2b_note\n## Not here\n:::\n");
        assert_eq!(outcome.diagnostics.errors.len(), 1);
        assert!(outcome.diagnostics.errors[0].message.contains("section titles"));
        assert!(find(&outcome.document, "beamer_note").is_none());
    }

    #[test]
    fn unknown_and_unclosed_directives_are_reported() {
        let outcome = parse("# Slide\n\n::bogus[x]\n\n:::r2b_note\nnever closed\n");
        assert_eq!(outcome.diagnostics.errors.len(), 1);
        assert!(outcome.diagnostics.errors[0].message.contains("bogus"));
        assert!(matches!(
            outcome.diagnostics.warnings[0],
            ParseWarning::UnclosedDirective { ref name, .. } if name == "r2b_note"
        ));
        assert!(find(&outcome.document, "beamer_note").is_some());
    }

    #[test]
    fn locations_account_for_front_matter() {
        let registry = DirectiveRegistry::with_defaults();
        let outcome = ParserPipeline::new(&registry, ParseOptions::default())
            .parse_source("---\ntitle: T\n---\n# S\n\n::nope\n", Some("talk.md"))
            .unwrap();
        let location = &outcome.diagnostics.errors[0].location;
        assert_eq!(location.to_string(), "talk.md:6:1");
    }

    #[test]
    fn contents_directive_is_filled() {
        let doc = parse("::contents[Overview]\n\n# A\n\n# B\n").document;
        let topic = find(&doc, "topic").expect("topic");
        assert_eq!(topic.children[0].astext(), "Overview");
        assert_eq!(topic.children[1].children.len(), 2);
    }

    #[test]
    fn container_with_class_reaches_the_tree() {
        let doc = parse("# S\n\n:::container r2b-simplecolumns\nOne\n\nTwo\n:::\n").document;
        let container = find(&doc, "container").expect("container");
        assert!(container.has_class(&["r2b-simplecolumns"]));
        assert_eq!(container.children.len(), 2);
    }
}
