//! Document tree model shared by the front end and the translators.
//!
//! The tree mirrors the docutils node vocabulary closely enough that a tree
//! produced elsewhere can be handed over as JSON, plus three layout
//! extensions (`columnset`, `column`, `beamer_note`) and the synthetic
//! `beamer_section` produced by the section directive.

use serde::{Deserialize, Serialize};

/// Attribute mapping carried by every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Class tags (e.g. `contents`, `r2b-note`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Normalized reference names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// Unique identifiers usable as link targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

/// Tag identity of a node together with its kind-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// The single root of a tree.
    Document,
    /// A section; nesting depth drives frame detection.
    Section,
    /// A synthetic slide with an explicit title.
    BeamerSection,
    /// Title of a document, section or topic.
    Title,
    /// Document subtitle.
    Subtitle,
    /// A paragraph of inline content.
    Paragraph,
    /// Plain text.
    Text {
        /// The text content.
        value: String,
    },
    /// Emphasised inline content.
    Emphasis,
    /// Strong inline content.
    Strong,
    /// Inline literal (code) text.
    Literal,
    /// Preformatted block.
    LiteralBlock {
        /// Language hint, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Unordered list.
    BulletList,
    /// Ordered list.
    EnumeratedList {
        /// First item number when not 1.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<i64>,
    },
    /// A list item.
    ListItem,
    /// Block quotation.
    BlockQuote,
    /// Hyperlink, external (`refuri`) or internal (`refid`).
    Reference {
        /// External target.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refuri: Option<String>,
        /// Internal target id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refid: Option<String>,
    },
    /// An image.
    Image(ImageAttributes),
    /// Generic container, interpreted through its classes.
    Container,
    /// A topic (e.g. a table of contents).
    Topic,
    /// Bibliographic block.
    Docinfo,
    /// Author entry; multi-line text is one author with several lines.
    Author,
    /// Date entry.
    Date,
    /// Generic bibliographic field.
    Field {
        /// Field name.
        name: String,
    },
    /// Horizontal separator.
    Transition,
    /// Hard line break.
    LineBreak,
    /// Raw output for a specific format.
    Raw {
        /// Target format (e.g. `latex`).
        format: String,
    },
    /// Comment, never rendered.
    Comment,
    /// A group of columns shown on one slide.
    #[serde(rename = "columnset")]
    ColumnSet,
    /// A single column.
    Column {
        /// Fraction of the text width, unset until resolved.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },
    /// Speaker notes.
    BeamerNote,
}

/// Image attributes following the docutils `image` directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAttributes {
    /// Image location.
    pub uri: String,
    /// Alternate text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Width as a length or percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Height as a length or percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    /// Scale in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Alignment keyword (`top`, `middle`, `bottom`, `left`, `center`, `right`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

impl NodeKind {
    /// Returns the tag name used in messages and class-free dispatch.
    pub fn tag_name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::BeamerSection => "beamer_section",
            NodeKind::Title => "title",
            NodeKind::Subtitle => "subtitle",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Text { .. } => "#text",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strong => "strong",
            NodeKind::Literal => "literal",
            NodeKind::LiteralBlock { .. } => "literal_block",
            NodeKind::BulletList => "bullet_list",
            NodeKind::EnumeratedList { .. } => "enumerated_list",
            NodeKind::ListItem => "list_item",
            NodeKind::BlockQuote => "block_quote",
            NodeKind::Reference { .. } => "reference",
            NodeKind::Image(_) => "image",
            NodeKind::Container => "container",
            NodeKind::Topic => "topic",
            NodeKind::Docinfo => "docinfo",
            NodeKind::Author => "author",
            NodeKind::Date => "date",
            NodeKind::Field { .. } => "field",
            NodeKind::Transition => "transition",
            NodeKind::LineBreak => "line_break",
            NodeKind::Raw { .. } => "raw",
            NodeKind::Comment => "comment",
            NodeKind::ColumnSet => "columnset",
            NodeKind::Column { .. } => "column",
            NodeKind::BeamerNote => "beamer_note",
        }
    }

    /// True for kinds whose children are inline content.
    pub fn is_text_element(&self) -> bool {
        matches!(
            self,
            NodeKind::Title
                | NodeKind::Subtitle
                | NodeKind::Paragraph
                | NodeKind::Emphasis
                | NodeKind::Strong
                | NodeKind::Literal
                | NodeKind::LiteralBlock { .. }
                | NodeKind::Reference { .. }
                | NodeKind::Author
                | NodeKind::Date
                | NodeKind::Field { .. }
        )
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Tag identity and kind-specific data.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Classes, names and ids.
    #[serde(default)]
    pub attributes: Attributes,
    /// Children in presentation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Source text the node was built from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rawsource: String,
}

impl Node {
    /// Creates a node without children.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: Attributes::default(),
            children: Vec::new(),
            rawsource: String::new(),
        }
    }

    /// Creates a node with the given children.
    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::new(kind)
        }
    }

    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            value: value.into(),
        })
    }

    /// Creates a title node holding a single text child.
    pub fn title(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut title = Self::with_children(NodeKind::Title, vec![Node::text(text.clone())]);
        title.rawsource = text;
        title
    }

    /// Creates a paragraph holding a single text child.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_children(NodeKind::Paragraph, vec![Node::text(text)])
    }

    /// Creates a section with a title and body.
    pub fn section(title: impl Into<String>, body: Vec<Node>) -> Self {
        let title = Node::title(title);
        let name = normalize_name(&title.astext());
        let mut children = Vec::with_capacity(body.len() + 1);
        children.push(title);
        children.extend(body);
        let mut section = Self::with_children(NodeKind::Section, children);
        section.attributes.names.push(name);
        section
    }

    /// Creates a column with an optional width.
    pub fn column(width: Option<f64>, children: Vec<Node>) -> Self {
        Self::with_children(NodeKind::Column { width }, children)
    }

    /// Adds a class tag (builder style).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.attributes.classes.push(class.into());
        self
    }

    /// Sets the raw source text (builder style).
    pub fn with_rawsource(mut self, rawsource: impl Into<String>) -> Self {
        self.rawsource = rawsource.into();
        self
    }

    /// Tag name of this node.
    pub fn tag_name(&self) -> &'static str {
        self.kind.tag_name()
    }

    /// Returns true if any of the given classes is set on this node.
    pub fn has_class(&self, classes: &[&str]) -> bool {
        self.attributes
            .classes
            .iter()
            .any(|c| classes.contains(&c.as_str()))
    }

    /// Returns true if a direct child is a `section`.
    pub fn has_sub_sections(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child.kind, NodeKind::Section))
    }

    /// Declared width for column nodes.
    pub fn column_width(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Column { width } => width,
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn astext(&self) -> String {
        let mut buffer = String::new();
        collect_text(self, &mut buffer);
        buffer
    }
}

fn collect_text(node: &Node, buffer: &mut String) {
    match &node.kind {
        NodeKind::Text { value } => buffer.push_str(value),
        NodeKind::LineBreak => buffer.push('\n'),
        NodeKind::Comment => {}
        _ => {
            for child in &node.children {
                collect_text(child, buffer);
            }
        }
    }
}

/// Normalizes a reference name: lowercase with whitespace runs collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
