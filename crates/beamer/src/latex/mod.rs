//! Base LaTeX translator.
//!
//! [`LatexTranslator`] turns a document tree into a standalone LaTeX
//! document. The Beamer translator wraps it and hands over every node kind it
//! does not treat itself.

mod encode;
mod image;

pub use encode::{encode, encode_literal, encode_url, latex_encoding};
pub use image::{include_graphics, latex_image_length};

use crate::visitor::{Visit, Visitor};
use r2b_core::{Node, NodeKind, Settings, TranslateError};

/// Sectioning commands of a LaTeX document class, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentClass {
    sections: Vec<&'static str>,
}

impl DocumentClass {
    /// Sectioning for `document_class`; book-like classes start at `\chapter`.
    pub fn new(document_class: &str) -> Self {
        let mut sections = vec![
            "section",
            "subsection",
            "subsubsection",
            "paragraph",
            "subparagraph",
        ];
        if matches!(document_class, "book" | "report" | "scrbook" | "scrreprt") {
            sections.insert(0, "chapter");
        }
        Self { sections }
    }

    /// Command for a section at `level` (1 is outermost). Levels past the
    /// deepest command reuse it.
    pub fn section(&self, level: usize) -> &'static str {
        self.sections
            .get(level.saturating_sub(1))
            .or_else(|| self.sections.last())
            .copied()
            .unwrap_or("paragraph")
    }
}

/// Translates a document tree into LaTeX.
///
/// Output accumulates in the public fragment buffers; [`astext`] joins them.
/// The translator borrows its settings and never changes the tree.
///
/// [`astext`]: LatexTranslator::astext
#[derive(Debug)]
pub struct LatexTranslator<'s> {
    settings: &'s Settings,
    /// Document class and package lines.
    pub head_prefix: Vec<String>,
    /// Further preamble lines, after the title block.
    pub head: Vec<String>,
    /// Opening of the document body.
    pub body_prefix: Vec<String>,
    /// Body fragments in output order.
    pub body: Vec<String>,
    /// Closing of the document body.
    pub body_suffix: Vec<String>,
    /// Sectioning commands in use.
    pub d_class: DocumentClass,
    /// Emit `\hypertarget` anchors for section ids.
    pub use_bookmarks: bool,
    /// Closing fragments pushed on enter, popped on exit.
    context: Vec<String>,
    section_level: usize,
    title: String,
    authors: Vec<Vec<String>>,
    date: Option<String>,
    pdfinfo: Vec<String>,
    pdfauthor: Vec<String>,
    docinfo: Option<Vec<String>>,
    topic_classes: Vec<String>,
    literal_block: bool,
    dependencies: Vec<String>,
}

impl<'s> LatexTranslator<'s> {
    /// Creates a translator and its preamble from `settings`.
    pub fn new(settings: &'s Settings) -> Self {
        let documentclass = if settings.documentoptions.is_empty() {
            format!("\\documentclass{{{}}}\n", settings.documentclass)
        } else {
            format!(
                "\\documentclass[{}]{{{}}}\n",
                settings.documentoptions, settings.documentclass
            )
        };
        let mut head_prefix = vec![
            documentclass,
            format!(
                "\\usepackage[{}]{{inputenc}}\n",
                latex_encoding(&settings.output_encoding)
            ),
            "\\usepackage[T1]{fontenc}\n".to_string(),
            "\\usepackage{graphicx}\n".to_string(),
            "\\usepackage{color}\n".to_string(),
            "\\usepackage[DIV12]{typearea}\n".to_string(),
            "\\usepackage{hyperref}\n".to_string(),
        ];
        if !settings.hyperlink_color.is_empty() {
            head_prefix.push(format!(
                "\\hypersetup{{colorlinks=true,linkcolor={c},urlcolor={c}}}\n",
                c = settings.hyperlink_color
            ));
        }

        Self {
            settings,
            head_prefix,
            head: Vec::new(),
            body_prefix: vec!["\\begin{document}\n".to_string()],
            body: Vec::new(),
            body_suffix: vec!["\n\\end{document}\n".to_string()],
            d_class: DocumentClass::new(&settings.documentclass),
            use_bookmarks: true,
            context: Vec::new(),
            section_level: 0,
            title: String::new(),
            authors: Vec::new(),
            date: None,
            pdfinfo: Vec::new(),
            pdfauthor: Vec::new(),
            docinfo: None,
            topic_classes: Vec::new(),
            literal_block: false,
            dependencies: Vec::new(),
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &'s Settings {
        self.settings
    }

    /// Depth of the innermost open section; 0 outside sections.
    pub fn section_level(&self) -> usize {
        self.section_level
    }

    /// True while inside a `contents` topic.
    pub fn in_contents(&self) -> bool {
        self.topic_classes.iter().any(|c| c == "contents")
    }

    /// Encoded document title; empty when the document has none.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Authors recorded so far, one list of encoded lines per author.
    pub fn authors(&self) -> &[Vec<String>] {
        &self.authors
    }

    /// Encoded document date.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Appends a body fragment.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.body.push(fragment.into());
    }

    /// Records a file the output depends on.
    pub fn record_dependency(&mut self, path: &str) {
        if !self.dependencies.iter().any(|d| d == path) {
            self.dependencies.push(path.to_string());
        }
    }

    /// Files the output depends on, in first-use order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// The `\hypersetup` block with the PDF metadata, or an empty string.
    pub fn pdfinfo_block(&self) -> String {
        let mut items = self.pdfinfo.clone();
        if !self.pdfauthor.is_empty() {
            items.push(format!("pdfauthor={{{}}}", self.pdfauthor.join("; ")));
        }
        if items.is_empty() {
            return String::new();
        }
        format!("\\hypersetup{{\n{}\n}}\n", items.join(",\n"))
    }

    /// Joins the fragments around `front_matter` (the title block).
    pub fn assemble(&self, front_matter: &str) -> String {
        let mut out = String::new();
        for part in &self.head_prefix {
            out.push_str(part);
        }
        out.push_str(front_matter);
        for part in &self.head {
            out.push_str(part);
        }
        out.push_str(&self.pdfinfo_block());
        for part in &self.body_prefix {
            out.push_str(part);
        }
        if !self.title.is_empty() {
            out.push_str("\\maketitle\n");
        }
        for part in self.body.iter().chain(&self.body_suffix) {
            out.push_str(part);
        }
        out
    }

    /// The complete LaTeX document.
    pub fn astext(&self) -> String {
        let authors = self
            .authors
            .iter()
            .map(|lines| lines.join("~\\\\\n"))
            .collect::<Vec<_>>()
            .join(" \\and\n");
        let front_matter = format!(
            "\\title{{{}}}\n\\author{{{}}}\n\\date{{{}}}\n",
            self.title,
            authors,
            self.date.as_deref().unwrap_or_default()
        );
        self.assemble(&front_matter)
    }

    fn open(&mut self, fragment: impl Into<String>, closing: impl Into<String>) {
        self.body.push(fragment.into());
        self.context.push(closing.into());
    }

    fn close(&mut self, node: &Node) -> Result<(), TranslateError> {
        let closing = self.context.pop().ok_or_else(|| {
            TranslateError::invariant(format!("unbalanced exit from '{}'", node.tag_name()))
        })?;
        self.body.push(closing);
        Ok(())
    }

    fn enter_title(&mut self, node: &Node, parent: Option<&Node>) -> Visit {
        match parent.map(|p| &p.kind) {
            Some(NodeKind::Document) => {
                self.title = encode(node.astext().trim());
                self.pdfinfo.push(format!("pdftitle={{{}}}", self.title));
                Visit::SkipNode
            }
            Some(NodeKind::Section) => {
                let command = self.d_class.section(self.section_level);
                self.open(format!("\n\n\\{}{{", command), "}\n");
                Visit::Continue
            }
            Some(NodeKind::Topic) => {
                self.open("\\subsubsection*{~\\hfill ", "\\hfill ~}\n");
                Visit::Continue
            }
            _ => {
                self.open("\\textbf{", "}\n\n");
                Visit::Continue
            }
        }
    }

    fn enter_subtitle(&mut self, node: &Node, parent: Option<&Node>) -> Visit {
        if matches!(parent.map(|p| &p.kind), Some(NodeKind::Document)) {
            self.title
                .push_str(&format!("\\\\\n\\large{{{}}}", encode(node.astext().trim())));
            return Visit::SkipNode;
        }
        self.open("\\textit{", "}\n\n");
        Visit::Continue
    }

    fn enter_author(&mut self, node: &Node) -> Visit {
        let lines = text_lines(node);
        self.pdfauthor.push(lines.join(" "));
        if let Some(docinfo) = &mut self.docinfo {
            docinfo.push(format!("\\textbf{{Author}}: & {} \\\\\n", lines.join(", ")));
        }
        self.authors.push(lines);
        Visit::SkipNode
    }

    fn enter_date(&mut self, node: &Node) -> Visit {
        let date = encode(node.astext().trim());
        if let Some(docinfo) = &mut self.docinfo {
            docinfo.push(format!("\\textbf{{Date}}: & {} \\\\\n", date));
        }
        self.date = Some(date);
        Visit::SkipNode
    }

    fn enter_topic(&mut self, node: &Node) -> Visit {
        self.topic_classes = node.attributes.classes.clone();
        if self.in_contents() && self.settings.use_latex_toc {
            self.body.push("\\tableofcontents\n\n".to_string());
            self.topic_classes.clear();
            return Visit::SkipNode;
        }
        Visit::Continue
    }

    fn depart_docinfo(&mut self) {
        let Some(rows) = self.docinfo.take() else {
            return;
        };
        if rows.is_empty() {
            return;
        }
        let mut table = vec!["\\begin{center}\n\\begin{tabular}{ll}\n".to_string()];
        table.extend(rows);
        table.push("\\end{tabular}\n\\end{center}\n\n".to_string());
        self.body.splice(0..0, table);
    }
}

/// Encoded lines of an author entry, split at line breaks.
fn text_lines(node: &Node) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for child in &node.children {
        if matches!(child.kind, NodeKind::LineBreak) {
            lines.push(encode(current.trim()));
            current.clear();
        } else {
            current.push_str(&child.astext());
        }
    }
    lines.push(encode(current.trim()));
    lines.retain(|line| !line.is_empty());
    lines
}

impl Visitor for LatexTranslator<'_> {
    fn enter(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        let visit = match &node.kind {
            NodeKind::Document => Visit::Continue,
            NodeKind::Section => {
                self.section_level += 1;
                if self.use_bookmarks
                    && let Some(id) = node.attributes.ids.first()
                {
                    self.body.push(format!("\\hypertarget{{{}}}{{}}\n", id));
                }
                Visit::Continue
            }
            NodeKind::Title => self.enter_title(node, parent),
            NodeKind::Subtitle => self.enter_subtitle(node, parent),
            NodeKind::Paragraph => {
                if !self.in_contents() {
                    self.body.push("\n".to_string());
                }
                Visit::Continue
            }
            NodeKind::Text { value } => {
                let text = if self.literal_block {
                    encode_literal(value)
                } else {
                    encode(value)
                };
                self.body.push(text);
                Visit::Continue
            }
            NodeKind::Emphasis => {
                self.open("\\emph{", "}");
                Visit::Continue
            }
            NodeKind::Strong => {
                self.open("\\textbf{", "}");
                Visit::Continue
            }
            NodeKind::Literal => {
                self.open("\\texttt{", "}");
                Visit::Continue
            }
            NodeKind::LiteralBlock { .. } => {
                self.body
                    .push("\\begin{quote}{\\ttfamily \\raggedright \\noindent\n".to_string());
                self.literal_block = true;
                Visit::Continue
            }
            NodeKind::BulletList => {
                if self.in_contents() {
                    self.open("\\begin{list}{}{}\n", "\\end{list}\n");
                } else {
                    self.open("\\begin{itemize}\n", "\\end{itemize}\n");
                }
                Visit::Continue
            }
            NodeKind::EnumeratedList { start } => {
                if self.in_contents() {
                    self.open("\\begin{list}{}{}\n", "\\end{list}\n");
                } else {
                    self.open("\\begin{enumerate}\n", "\\end{enumerate}\n");
                    if let Some(start) = start {
                        self.body
                            .push(format!("\\addtocounter{{enumi}}{{{}}}\n", start.saturating_sub(1)));
                    }
                }
                Visit::Continue
            }
            NodeKind::ListItem => {
                self.body.push("\\item ".to_string());
                Visit::Continue
            }
            NodeKind::BlockQuote => {
                self.body.push("\\begin{quote}\n".to_string());
                Visit::Continue
            }
            NodeKind::Reference { refuri, refid } => {
                match (refuri, refid) {
                    (Some(uri), _) => self.open(format!("\\href{{{}}}{{", encode_url(uri)), "}"),
                    (None, Some(id)) => self.open(format!("\\hyperlink{{{}}}{{", id), "}"),
                    (None, None) => self.open("", ""),
                }
                Visit::Continue
            }
            NodeKind::Image(image) => {
                self.record_dependency(&image.uri);
                let inline = parent.is_some_and(|p| p.kind.is_text_element());
                self.body.push(include_graphics(image, inline, None));
                Visit::Continue
            }
            NodeKind::Topic => self.enter_topic(node),
            NodeKind::Docinfo => {
                self.docinfo = Some(Vec::new());
                Visit::Continue
            }
            NodeKind::Author => self.enter_author(node),
            NodeKind::Date => self.enter_date(node),
            NodeKind::Field { name } => {
                if let Some(docinfo) = &mut self.docinfo {
                    docinfo.push(format!(
                        "\\textbf{{{}}}: & {} \\\\\n",
                        encode(name),
                        encode(node.astext().trim())
                    ));
                }
                Visit::SkipNode
            }
            NodeKind::Transition => {
                self.body
                    .push("\n\n\\hspace*{\\fill}\\hrulefill\\hspace*{\\fill}\n\n".to_string());
                Visit::Continue
            }
            NodeKind::LineBreak => {
                self.body.push("\\\\\n".to_string());
                Visit::Continue
            }
            NodeKind::Raw { format } => {
                if format.eq_ignore_ascii_case("latex") {
                    self.body.push(node.astext());
                }
                Visit::SkipNode
            }
            NodeKind::Comment => {
                let text: String = node.children.iter().map(Node::astext).collect();
                self.body
                    .push(format!("% {}\n", text.trim().replace('\n', "\n% ")));
                Visit::SkipNode
            }
            NodeKind::Container
            | NodeKind::BeamerSection
            | NodeKind::ColumnSet
            | NodeKind::Column { .. }
            | NodeKind::BeamerNote => Visit::Continue,
        };
        Ok(visit)
    }

    fn exit(&mut self, node: &Node, _parent: Option<&Node>) -> Result<(), TranslateError> {
        match &node.kind {
            NodeKind::Section => {
                self.section_level = self.section_level.saturating_sub(1);
            }
            NodeKind::Title
            | NodeKind::Subtitle
            | NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Literal
            | NodeKind::BulletList
            | NodeKind::EnumeratedList { .. }
            | NodeKind::Reference { .. } => self.close(node)?,
            NodeKind::Paragraph | NodeKind::ListItem => self.body.push("\n".to_string()),
            NodeKind::LiteralBlock { .. } => {
                self.literal_block = false;
                self.body.push("\n}\\end{quote}\n".to_string());
            }
            NodeKind::BlockQuote => self.body.push("\\end{quote}\n".to_string()),
            NodeKind::Topic => {
                self.topic_classes.clear();
                self.body.push("\n".to_string());
            }
            NodeKind::Docinfo => self.depart_docinfo(),
            NodeKind::Document
            | NodeKind::Text { .. }
            | NodeKind::Image(_)
            | NodeKind::Author
            | NodeKind::Date
            | NodeKind::Field { .. }
            | NodeKind::Transition
            | NodeKind::LineBreak
            | NodeKind::Raw { .. }
            | NodeKind::Comment
            | NodeKind::Container
            | NodeKind::BeamerSection
            | NodeKind::ColumnSet
            | NodeKind::Column { .. }
            | NodeKind::BeamerNote => {}
        }
        Ok(())
    }
}
