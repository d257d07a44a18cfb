//! Beamer translator.
//!
//! Sections become frames, column sets become `columns` environments and
//! notes become `\note` blocks. Everything else goes to the wrapped
//! [`LatexTranslator`].
//!
//! Frame detection happens during the walk: a section with subsections raises
//! the frame level, a section without subsections opens a frame that it owns
//! until it is exited.

use crate::latex::{DocumentClass, LatexTranslator, encode, include_graphics};
use crate::visitor::{Visit, Visitor, child_index, walk};
use r2b_core::{
    DEFAULT_COLUMNSET_WIDTH, DirectiveError, ImageAttributes, Node, NodeKind, Settings,
    TranslateError, check_width, resolve_column_widths, wrap_in_columns,
};

/// Slack allowed when summing fractional widths.
const WIDTH_EPSILON: f64 = 1e-9;

/// Container classes turned into an even column set.
pub const SIMPLECOLUMNS_CLASSES: &[&str] = &["r2b-simplecolumns", "r2b_simplecolumns"];
/// Container classes turned into a speaker note.
pub const NOTE_CLASSES: &[&str] = &["r2b-note", "r2b_note"];

const OVERLAY_SPEC: &str = "[<+-| alert@+>]";
const DEFAULT_IMAGE_HEIGHT: &str = "0.75\\textheight";
const BEGIN_FRAME: &str = "\n\\begin{frame}\n";
const END_FRAME: &str = "\\end{frame}\n";

const LITERAL_ENVIRONMENT: &[&str] = &[
    "\\definecolor{rrblitbackground}{rgb}{0.55, 0.3, 0.1}\n",
    "\\newenvironment{rtbliteral}{\n",
    "\\begin{ttfamily}\n",
    "\\color{rrblitbackground}\n",
    "}{\n",
    "\\end{ttfamily}\n",
    "}\n",
];

/// The frame currently open in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFrame {
    /// Section depth that closes the frame on exit.
    owner: usize,
    /// A `\frametitle` has been written.
    titled: bool,
}

/// Translates a document tree into Beamer-flavoured LaTeX.
#[derive(Debug)]
pub struct BeamerTranslator<'s> {
    base: LatexTranslator<'s>,
    overlay_bullets: bool,
    center_figures: bool,
    in_columnset: bool,
    in_column: bool,
    in_note: bool,
    frame_level: usize,
    frame: Option<OpenFrame>,
    column_widths: Vec<f64>,
}

impl<'s> BeamerTranslator<'s> {
    /// Creates a translator for one conversion.
    pub fn new(settings: &'s Settings) -> Self {
        Self::from_base(LatexTranslator::new(settings))
    }

    /// Wraps an existing base translator and adapts its preamble.
    pub fn from_base(mut base: LatexTranslator<'s>) -> Self {
        let settings = base.settings();

        base.head_prefix.retain(|line| !line.contains("{typearea}"));
        if !base
            .head_prefix
            .iter()
            .any(|line| line.contains("{hyperref}\n"))
        {
            base.head_prefix.push("\\usepackage{hyperref}\n".to_string());
        }
        base.head_prefix
            .extend(LITERAL_ENVIRONMENT.iter().map(|line| line.to_string()));

        if !settings.theme.is_empty() {
            base.head_prefix
                .push(format!("\\usetheme{{{}}}\n", settings.theme));
        }

        let (use_pgfpages, notes_option) = settings.show_notes.beamer_option();
        if use_pgfpages {
            base.head_prefix.push("\\usepackage{pgfpages}\n".to_string());
        }
        base.head_prefix
            .push(format!("\\setbeameroption{{{}}}\n", notes_option));

        // Beamer creates its own bookmarks.
        base.use_bookmarks = false;
        base.d_class = DocumentClass::new("article");

        Self {
            base,
            overlay_bullets: settings.overlay_bullets,
            center_figures: settings.center_figures,
            in_columnset: false,
            in_column: false,
            in_note: false,
            frame_level: 0,
            frame: None,
            column_widths: Vec::new(),
        }
    }

    /// The wrapped base translator.
    pub fn base(&self) -> &LatexTranslator<'s> {
        &self.base
    }

    /// Deepest section level seen that contains further sections.
    pub fn frame_level(&self) -> usize {
        self.frame_level
    }

    /// Files the output depends on.
    pub fn dependencies(&self) -> &[String] {
        self.base.dependencies()
    }

    /// The complete Beamer document.
    pub fn astext(&self) -> String {
        let mut front_matter = format!("\\title{{{}}}\n", self.base.title());
        let authors = self.base.authors();
        if !authors.is_empty() {
            let authors = authors
                .iter()
                .map(|lines| lines.join("~\\\\\n"))
                .collect::<Vec<_>>()
                .join(" \\and\n");
            front_matter.push_str(&format!("\\author{{{}}}\n", authors));
        }
        if let Some(date) = self.base.date().filter(|d| !d.is_empty()) {
            front_matter.push_str(&format!("\\date{{{}}}\n", date));
        }
        self.base.assemble(&front_matter)
    }

    fn open_frame(&mut self, owner: usize) {
        self.base.push(BEGIN_FRAME);
        self.frame = Some(OpenFrame {
            owner,
            titled: false,
        });
        log::debug!("frame opened at section level {}", owner);
    }

    fn close_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.base.push(END_FRAME);
            log::debug!("frame owned by level {} closed", frame.owner);
        }
    }

    fn enter_section(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        self.close_frame();
        let depth = self.base.section_level() + 1;
        if node.has_sub_sections() {
            if depth > self.frame_level {
                self.frame_level = depth;
                log::debug!("frame level raised to {}", depth);
            }
        } else {
            self.open_frame(depth);
        }
        self.base.enter(node, parent)
    }

    fn exit_section(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), TranslateError> {
        self.base.exit(node, parent)?;
        if self
            .frame
            .is_some_and(|frame| frame.owner > self.base.section_level())
        {
            self.close_frame();
        }
        Ok(())
    }

    fn enter_title(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        let text = node.astext();
        if text == "dummy" {
            return Ok(Visit::SkipNode);
        }
        let level = self.base.section_level();
        if matches!(
            parent.map(|p| &p.kind),
            Some(NodeKind::Section | NodeKind::BeamerSection)
        ) && let Some(frame) = &mut self.frame
            && !frame.titled
            && frame.owner == level
        {
            frame.titled = true;
            self.base
                .push(format!("\\frametitle{{{}}}\n\n", encode(&text)));
            return Ok(Visit::SkipNode);
        }
        self.base.enter(node, parent)
    }

    fn enter_list(
        &mut self,
        node: &Node,
        parent: Option<&Node>,
        environment: &str,
        start: Option<i64>,
    ) -> Result<Visit, TranslateError> {
        if self.base.in_contents() {
            if self.base.settings().use_latex_toc {
                return Ok(Visit::SkipNode);
            }
            return self.base.enter(node, parent);
        }
        let mut begin = format!("\\begin{{{}}}", environment);
        if self.overlay_bullets {
            begin.push_str(OVERLAY_SPEC);
        }
        begin.push('\n');
        self.base.push(begin);
        if let Some(start) = start {
            self.base
                .push(format!("\\addtocounter{{enumi}}{{{}}}\n", start.saturating_sub(1)));
        }
        Ok(Visit::Continue)
    }

    fn exit_list(
        &mut self,
        node: &Node,
        parent: Option<&Node>,
        environment: &str,
    ) -> Result<(), TranslateError> {
        if self.base.in_contents() {
            return self.base.exit(node, parent);
        }
        self.base.push(format!("\\end{{{}}}\n", environment));
        Ok(())
    }

    fn enter_image(&mut self, image: &ImageAttributes, parent: Option<&Node>) -> Visit {
        if self.center_figures {
            self.base.push("\\begin{center}\n");
        }
        self.base.record_dependency(&image.uri);
        let inline = parent.is_some_and(|p| p.kind.is_text_element());
        self.base
            .push(include_graphics(image, inline, Some(DEFAULT_IMAGE_HEIGHT)));
        Visit::Continue
    }

    fn enter_columnset(&mut self, node: &Node) -> Result<Visit, TranslateError> {
        if self.in_columnset {
            return Err(TranslateError::invariant(
                "already in column set, which cannot be nested",
            ));
        }
        let declared = node
            .children
            .iter()
            .map(|child| match child.kind {
                NodeKind::Column { width } => Ok(width),
                _ => Err(TranslateError::invariant(format!(
                    "column set may only contain columns, found '{}'",
                    child.tag_name()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        for width in declared.iter().flatten() {
            check_width(*width)?;
        }
        self.column_widths = if declared.iter().any(Option::is_none) {
            resolve_column_widths(&declared, DEFAULT_COLUMNSET_WIDTH)?
        } else {
            let total: f64 = declared.iter().flatten().sum();
            if total > 1.0 + WIDTH_EPSILON {
                return Err(DirectiveError::WidthOverflow { total }.into());
            }
            declared.iter().flatten().copied().collect()
        };

        self.in_columnset = true;
        self.base.push("\\begin{columns}[T]\n");
        Ok(Visit::Continue)
    }

    fn exit_columnset(&mut self) -> Result<(), TranslateError> {
        if !self.in_columnset {
            return Err(TranslateError::invariant("not in column set"));
        }
        self.in_columnset = false;
        self.column_widths.clear();
        self.base.push("\\end{columns}\n");
        Ok(())
    }

    fn enter_column(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        if self.in_column {
            return Err(TranslateError::invariant(
                "already in column, which cannot be nested",
            ));
        }
        let resolved = || {
            if !self.in_columnset {
                return None;
            }
            let index = child_index(node, parent)?;
            self.column_widths.get(index).copied()
        };
        let declared = node.column_width().map(check_width).transpose()?;
        let width = declared.or_else(resolved).ok_or_else(|| {
            TranslateError::invariant("column width is unset and no column set resolves it")
        })?;

        self.in_column = true;
        self.base
            .push(format!("\\column{{{:.2}\\textwidth}}\n", width));
        Ok(Visit::Continue)
    }

    fn enter_note(&mut self) -> Result<Visit, TranslateError> {
        if self.in_note {
            return Err(TranslateError::invariant(
                "already in note, which cannot be nested",
            ));
        }
        self.in_note = true;
        self.base.push("\\note{\n");
        Ok(Visit::Continue)
    }

    fn exit_note(&mut self) {
        self.in_note = false;
        self.base.push("}\n");
    }

    fn enter_container(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        if node.has_class(SIMPLECOLUMNS_CLASSES) {
            let columnset = Node::with_children(
                NodeKind::ColumnSet,
                wrap_in_columns(node.children.clone(), None),
            );
            walk(&columnset, Some(node), self)?;
            return Ok(Visit::SkipNode);
        }
        if node.has_class(NOTE_CLASSES) {
            return self.enter_note();
        }
        self.base.enter(node, parent)
    }
}

impl Visitor for BeamerTranslator<'_> {
    fn enter(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError> {
        match &node.kind {
            NodeKind::Section => self.enter_section(node, parent),
            NodeKind::BeamerSection => {
                self.close_frame();
                let owner = self.base.section_level();
                self.open_frame(owner);
                Ok(Visit::Continue)
            }
            NodeKind::Title => self.enter_title(node, parent),
            NodeKind::BulletList => self.enter_list(node, parent, "itemize", None),
            NodeKind::EnumeratedList { start } => {
                self.enter_list(node, parent, "enumerate", *start)
            }
            NodeKind::Image(image) => Ok(self.enter_image(image, parent)),
            NodeKind::LiteralBlock { .. } => {
                self.base.push("\\setbeamerfont{quote}{parent={}}\n");
                self.base.enter(node, parent)
            }
            NodeKind::ColumnSet => self.enter_columnset(node),
            NodeKind::Column { .. } => self.enter_column(node, parent),
            NodeKind::BeamerNote => self.enter_note(),
            NodeKind::Container => self.enter_container(node, parent),
            NodeKind::Docinfo => Ok(Visit::Continue),
            NodeKind::Document
            | NodeKind::Subtitle
            | NodeKind::Paragraph
            | NodeKind::Text { .. }
            | NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Literal
            | NodeKind::ListItem
            | NodeKind::BlockQuote
            | NodeKind::Reference { .. }
            | NodeKind::Topic
            | NodeKind::Author
            | NodeKind::Date
            | NodeKind::Field { .. }
            | NodeKind::Transition
            | NodeKind::LineBreak
            | NodeKind::Raw { .. }
            | NodeKind::Comment => self.base.enter(node, parent),
        }
    }

    fn exit(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), TranslateError> {
        match &node.kind {
            NodeKind::Document => {
                self.close_frame();
                self.base.exit(node, parent)
            }
            NodeKind::Section => self.exit_section(node, parent),
            NodeKind::BeamerSection | NodeKind::Docinfo => Ok(()),
            NodeKind::BulletList => self.exit_list(node, parent, "itemize"),
            NodeKind::EnumeratedList { .. } => self.exit_list(node, parent, "enumerate"),
            NodeKind::Image(_) => {
                if self.center_figures {
                    self.base.push("\\end{center}\n");
                }
                Ok(())
            }
            NodeKind::LiteralBlock { .. } => {
                self.base.exit(node, parent)?;
                self.base.push("\\setbeamerfont{quote}{parent=quotation}\n");
                Ok(())
            }
            NodeKind::ColumnSet => self.exit_columnset(),
            NodeKind::Column { .. } => {
                self.in_column = false;
                self.base.push("\n");
                Ok(())
            }
            NodeKind::BeamerNote => {
                self.exit_note();
                Ok(())
            }
            NodeKind::Container => {
                if node.has_class(NOTE_CLASSES) {
                    self.exit_note();
                    return Ok(());
                }
                self.base.exit(node, parent)
            }
            NodeKind::Title
            | NodeKind::Subtitle
            | NodeKind::Paragraph
            | NodeKind::Text { .. }
            | NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Literal
            | NodeKind::ListItem
            | NodeKind::BlockQuote
            | NodeKind::Reference { .. }
            | NodeKind::Topic
            | NodeKind::Author
            | NodeKind::Date
            | NodeKind::Field { .. }
            | NodeKind::Transition
            | NodeKind::LineBreak
            | NodeKind::Raw { .. }
            | NodeKind::Comment => self.base.exit(node, parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2b_core::{NotesMode, TranslateError};

    fn doc(children: Vec<Node>) -> Node {
        Node::with_children(NodeKind::Document, children)
    }

    fn translate(document: &Node, settings: &Settings) -> Result<String, TranslateError> {
        let mut translator = BeamerTranslator::new(settings);
        walk(document, None, &mut translator)?;
        Ok(translator.base().body.concat())
    }

    fn body(document: &Node) -> String {
        translate(document, &Settings::default()).unwrap()
    }

    fn plain_settings() -> Settings {
        Settings {
            overlay_bullets: false,
            center_figures: false,
            ..Settings::default()
        }
    }

    fn image(uri: &str) -> Node {
        Node::new(NodeKind::Image(ImageAttributes {
            uri: uri.to_string(),
            ..ImageAttributes::default()
        }))
    }

    #[test]
    fn leaf_section_is_one_titled_frame() {
        let document = doc(vec![Node::section("Slide", vec![Node::paragraph("Hello")])]);
        assert_eq!(
            body(&document),
            "\n\\begin{frame}\n\\frametitle{Slide}\n\n\nHello\n\\end{frame}\n"
        );
    }

    #[test]
    fn subsections_become_frames() {
        let document = doc(vec![Node::section(
            "Top",
            vec![
                Node::section("A", vec![Node::paragraph("a")]),
                Node::section("B", vec![Node::paragraph("b")]),
            ],
        )]);
        let settings = Settings::default();
        let mut translator = BeamerTranslator::new(&settings);
        walk(&document, None, &mut translator).unwrap();
        assert_eq!(translator.frame_level(), 1);
        assert_eq!(
            translator.base().body.concat(),
            "\n\n\\section{Top}\n\
             \n\\begin{frame}\n\\frametitle{A}\n\n\na\n\\end{frame}\n\
             \n\\begin{frame}\n\\frametitle{B}\n\n\nb\n\\end{frame}\n"
        );
    }

    #[test]
    fn frame_level_only_grows() {
        let document = doc(vec![
            Node::section(
                "A",
                vec![Node::section("A1", vec![Node::section("A1a", vec![])])],
            ),
            Node::section("B", vec![Node::section("B1", vec![])]),
        ]);
        let settings = Settings::default();
        let mut translator = BeamerTranslator::new(&settings);
        walk(&document, None, &mut translator).unwrap();
        assert_eq!(translator.frame_level(), 2);
        let out = translator.base().body.concat();
        assert_eq!(out.matches("\\begin{frame}").count(), 2);
        assert_eq!(out.matches("\\end{frame}").count(), 2);
        assert!(out.contains("\\frametitle{A1a}"));
        assert!(out.contains("\\frametitle{B1}"));
        assert!(out.contains("\\subsection{A1}"));
    }

    #[test]
    fn inconsistent_depths_keep_frames_balanced() {
        let document = doc(vec![
            Node::section("Flat", vec![Node::paragraph("x")]),
            Node::section("Deep", vec![Node::section("Inner", vec![])]),
            Node::section("Flat again", vec![]),
        ]);
        let out = body(&document);
        assert_eq!(out.matches("\\begin{frame}").count(), 3);
        assert_eq!(out.matches("\\end{frame}").count(), 3);
        assert!(out.contains("\\frametitle{Flat again}"));
        assert!(out.contains("\\section{Deep}"));
    }

    #[test]
    fn beamer_section_starts_a_new_slide() {
        let document = doc(vec![Node::section(
            "Part",
            vec![
                Node::paragraph("intro"),
                Node::with_children(NodeKind::BeamerSection, vec![Node::title("Extra")]),
                Node::paragraph("more"),
            ],
        )]);
        assert_eq!(
            body(&document),
            "\n\\begin{frame}\n\\frametitle{Part}\n\n\nintro\n\\end{frame}\n\
             \n\\begin{frame}\n\\frametitle{Extra}\n\n\nmore\n\\end{frame}\n"
        );
    }

    #[test]
    fn top_level_beamer_section_is_closed_by_the_document() {
        let document = doc(vec![
            Node::with_children(NodeKind::BeamerSection, vec![Node::title("Alone")]),
            Node::paragraph("text"),
        ]);
        assert_eq!(
            body(&document),
            "\n\\begin{frame}\n\\frametitle{Alone}\n\n\ntext\n\\end{frame}\n"
        );
    }

    #[test]
    fn dummy_titles_are_dropped() {
        let document = doc(vec![Node::section("dummy", vec![Node::paragraph("x")])]);
        assert_eq!(body(&document), "\n\\begin{frame}\n\nx\n\\end{frame}\n");
    }

    #[test]
    fn note_wraps_content_inside_the_frame() {
        let document = doc(vec![Node::section(
            "S",
            vec![Node::with_children(
                NodeKind::BeamerNote,
                vec![Node::paragraph("Remember")],
            )],
        )]);
        assert!(body(&document).contains("\\frametitle{S}\n\n\\note{\n\nRemember\n}\n\\end{frame}\n"));
    }

    #[test]
    fn image_without_size_gets_default_height() {
        let document = doc(vec![image("fig.png")]);
        assert_eq!(
            body(&document),
            "\\begin{center}\n\n\\includegraphics[height=0.75\\textheight]{fig.png}\n\\end{center}\n"
        );
        assert_eq!(
            translate(&document, &plain_settings()).unwrap(),
            "\n\\includegraphics[height=0.75\\textheight]{fig.png}\n"
        );
    }

    #[test]
    fn inline_image_keeps_running_text() {
        let para = Node::with_children(
            NodeKind::Paragraph,
            vec![Node::text("see "), image("icon.png")],
        );
        assert_eq!(
            translate(&doc(vec![para]), &plain_settings()).unwrap(),
            "\nsee \\includegraphics[height=0.75\\textheight]{icon.png}\n"
        );
    }

    #[test]
    fn column_set_resolves_unsized_columns() {
        let columns = Node::with_children(
            NodeKind::ColumnSet,
            vec![
                Node::column(Some(0.6), vec![Node::paragraph("left")]),
                Node::column(None, vec![Node::paragraph("right")]),
            ],
        );
        assert_eq!(
            body(&doc(vec![columns])),
            "\\begin{columns}[T]\n\
             \\column{0.60\\textwidth}\n\nleft\n\n\
             \\column{0.30\\textwidth}\n\nright\n\n\
             \\end{columns}\n"
        );
    }

    #[test]
    fn simplecolumns_container_splits_children() {
        let container = Node::with_children(
            NodeKind::Container,
            vec![
                Node::paragraph("one"),
                Node::paragraph("two"),
                Node::paragraph("three"),
            ],
        )
        .with_class("r2b_simplecolumns");
        let out = body(&doc(vec![container]));
        assert!(out.starts_with("\\begin{columns}[T]\n"));
        assert_eq!(out.matches("\\column{0.30\\textwidth}\n").count(), 3);
        assert!(out.ends_with("three\n\n\\end{columns}\n"));
    }

    #[test]
    fn note_container_becomes_a_note() {
        let container = Node::with_children(NodeKind::Container, vec![Node::paragraph("psst")])
            .with_class("r2b-note");
        assert_eq!(body(&doc(vec![container])), "\\note{\n\npsst\n}\n");

        let plain = Node::with_children(NodeKind::Container, vec![Node::paragraph("x")])
            .with_class("other");
        assert_eq!(body(&doc(vec![plain])), "\nx\n");
    }

    #[test]
    fn nesting_violations_fail() {
        let nested_sets = Node::with_children(
            NodeKind::ColumnSet,
            vec![Node::column(
                Some(0.5),
                vec![Node::with_children(
                    NodeKind::ColumnSet,
                    vec![Node::column(Some(0.5), vec![])],
                )],
            )],
        );
        let nested_columns = Node::column(Some(0.5), vec![Node::column(Some(0.5), vec![])]);
        let nested_notes = Node::with_children(
            NodeKind::BeamerNote,
            vec![Node::with_children(NodeKind::BeamerNote, vec![])],
        );
        let note_in_container = Node::with_children(
            NodeKind::BeamerNote,
            vec![Node::with_children(NodeKind::Container, vec![]).with_class("r2b-note")],
        );

        for (tree, message) in [
            (nested_sets, "already in column set"),
            (nested_columns, "already in column"),
            (nested_notes, "already in note"),
            (note_in_container, "already in note"),
        ] {
            match translate(&doc(vec![tree]), &Settings::default()) {
                Err(TranslateError::InvariantViolation(text)) => {
                    assert!(text.starts_with(message), "{text}")
                }
                other => panic!("expected invariant violation, got {other:?}"),
            }
        }
    }

    #[test]
    fn unresolvable_columns_fail() {
        let loose = Node::column(None, vec![Node::paragraph("x")]);
        assert!(matches!(
            translate(&doc(vec![loose]), &Settings::default()),
            Err(TranslateError::InvariantViolation(_))
        ));

        let stray = Node::with_children(NodeKind::ColumnSet, vec![Node::paragraph("x")]);
        assert!(matches!(
            translate(&doc(vec![stray]), &Settings::default()),
            Err(TranslateError::InvariantViolation(_))
        ));

        let full = Node::with_children(
            NodeKind::ColumnSet,
            vec![Node::column(Some(0.9), vec![]), Node::column(None, vec![])],
        );
        assert!(matches!(
            translate(&doc(vec![full]), &Settings::default()),
            Err(TranslateError::Layout(_))
        ));
    }

    #[test]
    fn declared_widths_are_validated() {
        let set = |widths: &[f64]| {
            Node::with_children(
                NodeKind::ColumnSet,
                widths.iter().map(|w| Node::column(Some(*w), vec![])).collect(),
            )
        };
        for widths in [&[3.5, -1.0][..], &[0.6, 0.6][..], &[0.0][..]] {
            assert!(
                matches!(
                    translate(&doc(vec![set(widths)]), &Settings::default()),
                    Err(TranslateError::Layout(_))
                ),
                "{widths:?}"
            );
        }
        let out = translate(&doc(vec![set(&[0.5, 0.5])]), &Settings::default()).unwrap();
        assert!(out.contains("\\column{0.50\\textwidth}"));
    }

    #[test]
    fn extreme_enumeration_start_does_not_overflow() {
        let item = Node::with_children(NodeKind::ListItem, vec![Node::paragraph("x")]);
        let list = Node::with_children(NodeKind::EnumeratedList { start: Some(i64::MIN) }, vec![item]);
        let out = translate(&doc(vec![list]), &plain_settings()).unwrap();
        assert!(out.contains(&format!("\\addtocounter{{enumi}}{{{}}}\n", i64::MIN)));
    }

    #[test]
    fn overlay_bullets_and_enumeration_start() {
        let item = |text: &str| Node::with_children(NodeKind::ListItem, vec![Node::paragraph(text)]);
        let bullets = Node::with_children(NodeKind::BulletList, vec![item("a")]);
        let numbers = Node::with_children(NodeKind::EnumeratedList { start: Some(4) }, vec![item("d")]);
        let document = doc(vec![bullets, numbers]);

        let out = body(&document);
        assert!(out.contains("\\begin{itemize}[<+-| alert@+>]\n\\item \na\n\n\\end{itemize}\n"));
        assert!(out.contains("\\begin{enumerate}[<+-| alert@+>]\n\\addtocounter{enumi}{3}\n"));
        assert!(out.ends_with("\\end{enumerate}\n"));

        let out = translate(&document, &plain_settings()).unwrap();
        assert!(out.starts_with("\\begin{itemize}\n"));
        assert!(out.contains("\\begin{enumerate}\n"));
    }

    #[test]
    fn contents_lists() {
        let entry = Node::with_children(
            NodeKind::ListItem,
            vec![Node::with_children(
                NodeKind::Paragraph,
                vec![Node::with_children(
                    NodeKind::Reference {
                        refuri: None,
                        refid: Some("intro".into()),
                    },
                    vec![Node::text("Intro")],
                )],
            )],
        );
        let topic = Node::with_children(
            NodeKind::Topic,
            vec![
                Node::title("Contents"),
                Node::with_children(NodeKind::BulletList, vec![entry]),
            ],
        )
        .with_class("contents");
        let document = doc(vec![topic]);

        assert_eq!(body(&document), "\\tableofcontents\n\n");

        let settings = Settings {
            use_latex_toc: false,
            ..Settings::default()
        };
        let out = translate(&document, &settings).unwrap();
        assert!(out.contains("\\begin{list}{}{}\n\\item \\hyperlink{intro}{Intro}\n\n\\end{list}\n"));
        assert!(!out.contains("itemize"));
    }

    #[test]
    fn literal_blocks_reset_the_quote_font() {
        let block = Node::with_children(
            NodeKind::LiteralBlock { language: None },
            vec![Node::text("x = 1")],
        );
        assert_eq!(
            body(&doc(vec![block])),
            "\\setbeamerfont{quote}{parent={}}\n\
             \\begin{quote}{\\ttfamily \\raggedright \\noindent\nx~=~1\n}\\end{quote}\n\
             \\setbeamerfont{quote}{parent=quotation}\n"
        );
    }

    #[test]
    fn docinfo_only_feeds_the_front_matter() {
        let document = doc(vec![
            Node::title("Talk"),
            Node::with_children(
                NodeKind::Docinfo,
                vec![
                    Node::with_children(NodeKind::Author, vec![Node::text("Ann")]),
                    Node::with_children(NodeKind::Author, vec![Node::text("Bob")]),
                    Node::with_children(
                        NodeKind::Field {
                            name: "venue".into(),
                        },
                        vec![Node::text("Hall")],
                    ),
                ],
            ),
            Node::section("S", vec![]),
        ]);
        let settings = Settings::default();
        let mut translator = BeamerTranslator::new(&settings);
        walk(&document, None, &mut translator).unwrap();
        let out = translator.astext();
        assert!(out.contains("\\title{Talk}\n\\author{Ann \\and\nBob}\n\\hypersetup{\n"));
        assert!(!out.contains("\\date{"));
        assert!(!out.contains("Hall"));
        assert!(!out.contains("tabular"));
        assert!(out.contains("pdfauthor={Ann; Bob}"));
    }

    #[test]
    fn preamble_is_adapted_for_beamer() {
        let settings = Settings::default();
        let translator = BeamerTranslator::new(&settings);
        let head = translator.base().head_prefix.concat();
        assert!(head.starts_with("\\documentclass[t]{beamer}\n\\usepackage[latin1]{inputenc}\n"));
        assert!(!head.contains("typearea"));
        assert_eq!(head.matches("{hyperref}").count(), 1);
        assert!(head.contains("\\definecolor{rrblitbackground}{rgb}{0.55, 0.3, 0.1}\n"));
        assert!(head.contains("\\newenvironment{rtbliteral}{\n"));
        assert!(head.ends_with("\\usetheme{Warsaw}\n\\setbeameroption{hide notes}\n"));
        assert!(!head.contains("pgfpages"));
    }

    #[test]
    fn hyperref_is_added_when_missing() {
        let settings = Settings::default();
        let mut base = LatexTranslator::new(&settings);
        base.head_prefix.retain(|line| !line.contains("hyperref"));
        let translator = BeamerTranslator::from_base(base);
        let head = translator.base().head_prefix.concat();
        assert_eq!(head.matches("\\usepackage{hyperref}\n").count(), 1);
    }

    #[test]
    fn notes_modes_select_beamer_options() {
        let cases = [
            (NotesMode::False, false, "hide notes"),
            (NotesMode::Only, true, "show only notes"),
            (NotesMode::True, true, "show notes on second screen=right"),
            (NotesMode::Left, true, "show notes on second screen=left"),
            (NotesMode::Right, true, "show notes on second screen=right"),
            (NotesMode::Top, true, "show notes on second screen=top"),
            (NotesMode::Bottom, true, "show notes on second screen=bottom"),
        ];
        for (mode, pgfpages, option) in cases {
            let settings = Settings {
                show_notes: mode,
                theme: String::new(),
                ..Settings::default()
            };
            let translator = BeamerTranslator::new(&settings);
            let head = translator.base().head_prefix.concat();
            assert_eq!(head.contains("\\usepackage{pgfpages}\n"), pgfpages, "{mode}");
            assert!(
                head.ends_with(&format!("\\setbeameroption{{{}}}\n", option)),
                "{mode}"
            );
            assert!(!head.contains("usetheme"));
        }
    }

    #[test]
    fn astext_orders_the_document() {
        let document = doc(vec![
            Node::title("T"),
            Node::with_children(
                NodeKind::Docinfo,
                vec![Node::with_children(NodeKind::Date, vec![Node::text("today")])],
            ),
            Node::section("S", vec![]),
        ]);
        let settings = Settings::default();
        let mut translator = BeamerTranslator::new(&settings);
        walk(&document, None, &mut translator).unwrap();
        let out = translator.astext();

        let positions: Vec<usize> = [
            "\\documentclass",
            "\\setbeameroption",
            "\\title{T}\n",
            "\\date{today}\n",
            "\\hypersetup{\npdftitle={T}\n}\n",
            "\\begin{document}\n\\maketitle\n",
            "\\frametitle{S}",
            "\\end{document}\n",
        ]
        .iter()
        .map(|needle| out.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
        assert!(!out.contains("\\author{"));
    }
}
