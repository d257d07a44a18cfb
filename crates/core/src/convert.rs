//! Conversion from markdown-rs mdast to the document tree.
//!
//! Headings are not nested here: they come out as [`Flat::Heading`] markers
//! and the section hierarchy is built afterwards from the flat sequence.

use crate::doctree::{ImageAttributes, Node, NodeKind};
use crate::error::{ParseDiagnostics, ParseWarning, SourceLocation};
use crate::scan::{split_attribute, tokenize_attributes};
use markdown::mdast;
use std::collections::HashMap;

/// One top-level item of converted flow content.
#[derive(Debug, Clone, PartialEq)]
pub enum Flat {
    /// A heading, still to be turned into a section.
    Heading {
        /// Heading rank (1 for `#`).
        depth: u8,
        /// Converted inline content.
        children: Vec<Node>,
        /// Absolute source line.
        line: usize,
    },
    /// Any other block.
    Block(Node),
}

/// State shared while converting one Markdown chunk.
pub struct ConvertContext<'a> {
    diagnostics: &'a mut ParseDiagnostics,
    first_line: usize,
    source: Option<&'a str>,
    definitions: HashMap<String, String>,
}

impl<'a> ConvertContext<'a> {
    /// Creates a context for a chunk starting at absolute line `first_line`.
    pub fn new(
        diagnostics: &'a mut ParseDiagnostics,
        first_line: usize,
        source: Option<&'a str>,
    ) -> Self {
        Self {
            diagnostics,
            first_line,
            source,
            definitions: HashMap::new(),
        }
    }

    fn location(&self, node: &mdast::Node) -> SourceLocation {
        let (line, column) = node
            .position()
            .map_or((1, 1), |p| (p.start.line, p.start.column));
        let line = self.first_line + line.saturating_sub(1);
        match self.source {
            Some(file) => SourceLocation::with_file(file.to_string(), line, column),
            None => SourceLocation::new(line, column),
        }
    }

    fn unsupported(&mut self, node: &mdast::Node, kind: &str) {
        let location = self.location(node);
        log::warn!("{}: unsupported markup dropped ({})", location, kind);
        self.diagnostics.add_warning(ParseWarning::UnsupportedMarkup {
            location,
            kind: kind.to_string(),
        });
    }

    fn suspicious(&mut self, node: &mdast::Node, message: impl Into<String>) {
        let location = self.location(node);
        let message = message.into();
        log::warn!("{}: {}", location, message);
        self.diagnostics
            .add_warning(ParseWarning::SuspiciousMarkup { location, message });
    }
}

/// Converts an mdast root into flat top-level items.
pub fn convert_root(root: &mdast::Node, ctx: &mut ConvertContext) -> Vec<Flat> {
    let Some(children) = root.children() else {
        return Vec::new();
    };
    collect_definitions(children, &mut ctx.definitions);

    let mut flats = Vec::new();
    for child in children {
        match child {
            mdast::Node::Heading(heading) => {
                let line = ctx.location(child).line;
                flats.push(Flat::Heading {
                    depth: heading.depth,
                    children: convert_inlines(&heading.children, ctx),
                    line,
                });
            }
            other => flats.extend(convert_block(other, ctx).map(Flat::Block)),
        }
    }
    flats
}

/// Link reference definitions, keyed by normalized identifier.
fn collect_definitions(nodes: &[mdast::Node], definitions: &mut HashMap<String, String>) {
    for node in nodes {
        match node {
            mdast::Node::Definition(def) => {
                definitions
                    .entry(def.identifier.clone())
                    .or_insert_with(|| def.url.clone());
            }
            other => {
                if let Some(children) = other.children() {
                    collect_definitions(children, definitions);
                }
            }
        }
    }
}

fn convert_blocks(nodes: &[mdast::Node], ctx: &mut ConvertContext) -> Vec<Node> {
    nodes
        .iter()
        .filter_map(|node| convert_block(node, ctx))
        .collect()
}

fn convert_block(node: &mdast::Node, ctx: &mut ConvertContext) -> Option<Node> {
    match node {
        mdast::Node::Paragraph(para) => Some(convert_paragraph(para, ctx)),
        mdast::Node::Heading(heading) => {
            ctx.suspicious(node, "heading inside a block is rendered as a paragraph");
            Some(Node::with_children(
                NodeKind::Paragraph,
                convert_inlines(&heading.children, ctx),
            ))
        }
        mdast::Node::Code(code) => Some(convert_code(code)),
        mdast::Node::List(list) => {
            let kind = if list.ordered {
                NodeKind::EnumeratedList {
                    start: list.start.filter(|s| *s != 1).map(i64::from),
                }
            } else {
                NodeKind::BulletList
            };
            let items = list
                .children
                .iter()
                .filter_map(|child| convert_block(child, ctx))
                .collect();
            Some(Node::with_children(kind, items))
        }
        mdast::Node::ListItem(item) => Some(Node::with_children(
            NodeKind::ListItem,
            convert_blocks(&item.children, ctx),
        )),
        mdast::Node::Blockquote(quote) => Some(Node::with_children(
            NodeKind::BlockQuote,
            convert_blocks(&quote.children, ctx),
        )),
        mdast::Node::ThematicBreak(_) => Some(Node::new(NodeKind::Transition)),
        mdast::Node::Html(html) => Some(convert_html(&html.value)),
        mdast::Node::Definition(_) | mdast::Node::Yaml(_) | mdast::Node::Toml(_) => None,
        mdast::Node::Table(_) => {
            ctx.unsupported(node, "table");
            None
        }
        mdast::Node::FootnoteDefinition(_) => {
            ctx.unsupported(node, "footnote definition");
            None
        }
        mdast::Node::Math(_) => {
            ctx.unsupported(node, "math block");
            None
        }
        _ => {
            ctx.unsupported(node, "unexpected block content");
            None
        }
    }
}

fn convert_paragraph(para: &mdast::Paragraph, ctx: &mut ConvertContext) -> Node {
    if let Some(image) = block_image(&para.children, ctx) {
        return image;
    }
    Node::with_children(NodeKind::Paragraph, convert_inlines(&para.children, ctx))
}

/// A paragraph holding only an image, optionally followed by an attribute
/// block such as `{width=50% align=left}`, is a block image.
fn block_image(children: &[mdast::Node], ctx: &mut ConvertContext) -> Option<Node> {
    let (first, rest) = children.split_first()?;
    let mut image = image_attributes(first, ctx)?;
    match rest {
        [] => {}
        [mdast::Node::Text(text)] => {
            let attrs = text.value.trim().strip_prefix('{')?.strip_suffix('}')?;
            for token in tokenize_attributes(attrs) {
                apply_image_option(&mut image, token, &rest[0], ctx);
            }
        }
        _ => return None,
    }
    Some(Node::new(NodeKind::Image(image)))
}

fn image_attributes(node: &mdast::Node, ctx: &ConvertContext) -> Option<ImageAttributes> {
    let (uri, alt) = match node {
        mdast::Node::Image(img) => (img.url.clone(), img.alt.clone()),
        mdast::Node::ImageReference(img) => (
            ctx.definitions.get(&img.identifier)?.clone(),
            img.alt.clone(),
        ),
        _ => return None,
    };
    Some(ImageAttributes {
        uri,
        alt: (!alt.is_empty()).then_some(alt),
        ..Default::default()
    })
}

fn apply_image_option(
    image: &mut ImageAttributes,
    token: &str,
    node: &mdast::Node,
    ctx: &mut ConvertContext,
) {
    let (key, value) = split_attribute(token);
    match key.as_str() {
        "width" => image.width = Some(value),
        "height" => image.height = Some(value),
        "align" => image.align = Some(value.to_ascii_lowercase()),
        "alt" => image.alt = Some(value),
        "scale" => match value.trim_end_matches('%').parse::<f64>() {
            Ok(scale) if scale > 0.0 => image.scale = Some(scale),
            _ => ctx.suspicious(node, format!("invalid image scale '{}' ignored", value)),
        },
        _ => ctx.suspicious(node, format!("unknown image option '{}' ignored", key)),
    }
}

fn convert_code(code: &mdast::Code) -> Node {
    let text = vec![Node::text(code.value.as_str())];
    let format = code
        .lang
        .as_deref()
        .and_then(|lang| lang.strip_prefix("{=")?.strip_suffix('}'));
    match format {
        Some(format) => Node::with_children(
            NodeKind::Raw {
                format: format.to_ascii_lowercase(),
            },
            text,
        ),
        None => Node::with_children(
            NodeKind::LiteralBlock {
                language: code.lang.clone(),
            },
            text,
        ),
    }
}

/// HTML comments become comment nodes; other HTML is kept as raw `html`.
fn convert_html(value: &str) -> Node {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
    {
        return Node::with_children(NodeKind::Comment, vec![Node::text(inner.trim())]);
    }
    Node::with_children(
        NodeKind::Raw {
            format: "html".to_string(),
        },
        vec![Node::text(value)],
    )
}

fn convert_inlines(nodes: &[mdast::Node], ctx: &mut ConvertContext) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        convert_inline(node, ctx, &mut out);
    }
    out
}

fn convert_inline(node: &mdast::Node, ctx: &mut ConvertContext, out: &mut Vec<Node>) {
    match node {
        mdast::Node::Text(text) => out.push(Node::text(text.value.as_str())),
        mdast::Node::Emphasis(em) => out.push(Node::with_children(
            NodeKind::Emphasis,
            convert_inlines(&em.children, ctx),
        )),
        mdast::Node::Strong(strong) => out.push(Node::with_children(
            NodeKind::Strong,
            convert_inlines(&strong.children, ctx),
        )),
        mdast::Node::InlineCode(code) => out.push(Node::with_children(
            NodeKind::Literal,
            vec![Node::text(code.value.as_str())],
        )),
        mdast::Node::Break(_) => out.push(Node::new(NodeKind::LineBreak)),
        mdast::Node::Link(link) => {
            let children = convert_inlines(&link.children, ctx);
            out.push(reference(&link.url, children));
        }
        mdast::Node::LinkReference(link) => {
            let children = convert_inlines(&link.children, ctx);
            match ctx.definitions.get(&link.identifier).cloned() {
                Some(url) => out.push(reference(&url, children)),
                None => {
                    ctx.suspicious(node, format!("undefined link reference '{}'", link.label.as_deref().unwrap_or(&link.identifier)));
                    out.extend(children);
                }
            }
        }
        mdast::Node::Image(_) | mdast::Node::ImageReference(_) => {
            match image_attributes(node, ctx) {
                Some(image) => out.push(Node::new(NodeKind::Image(image))),
                None => ctx.suspicious(node, "undefined image reference"),
            }
        }
        mdast::Node::Html(html) => out.push(convert_html(&html.value)),
        mdast::Node::Delete(del) => {
            ctx.unsupported(node, "strikethrough");
            out.extend(convert_inlines(&del.children, ctx));
        }
        mdast::Node::FootnoteReference(_) => ctx.unsupported(node, "footnote reference"),
        mdast::Node::InlineMath(_) => ctx.unsupported(node, "inline math"),
        _ => ctx.unsupported(node, "unexpected inline content"),
    }
}

/// Fragment links (`#id`) point inside the document.
fn reference(url: &str, children: Vec<Node>) -> Node {
    let kind = match url.strip_prefix('#') {
        Some(id) => NodeKind::Reference {
            refuri: None,
            refid: Some(id.to_string()),
        },
        None => NodeKind::Reference {
            refuri: Some(url.to_string()),
            refid: None,
        },
    };
    Node::with_children(kind, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseOptions;

    fn convert(markdown: &str) -> (Vec<Flat>, ParseDiagnostics) {
        let root = markdown::to_mdast(markdown, &ParseOptions::default().to_markdown()).unwrap();
        let mut diagnostics = ParseDiagnostics::new();
        let flats = convert_root(&root, &mut ConvertContext::new(&mut diagnostics, 1, None));
        (flats, diagnostics)
    }

    fn blocks(markdown: &str) -> Vec<Node> {
        convert(markdown)
            .0
            .into_iter()
            .map(|flat| match flat {
                Flat::Block(node) => node,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn headings_stay_flat() {
        let (flats, _) = convert("# One\n\ntext\n\n## Two");
        assert!(matches!(flats[0], Flat::Heading { depth: 1, line: 1, .. }));
        assert!(matches!(flats[1], Flat::Block(_)));
        assert!(matches!(flats[2], Flat::Heading { depth: 2, line: 5, .. }));
    }

    #[test]
    fn inline_markup() {
        let nodes = blocks("Some *em* and **strong** with `code` and [a link](https://example.com).");
        let para = &nodes[0];
        let tags: Vec<_> = para.children.iter().map(Node::tag_name).collect();
        assert_eq!(
            tags,
            ["#text", "emphasis", "#text", "strong", "#text", "literal", "#text", "reference", "#text"]
        );
        assert_eq!(
            para.children[7].kind,
            NodeKind::Reference {
                refuri: Some("https://example.com".into()),
                refid: None
            }
        );
    }

    #[test]
    fn fragment_links_and_reference_definitions() {
        let nodes = blocks("See [intro](#intro) and [docs][d].\n\n[d]: https://docs.rs");
        let refs: Vec<_> = nodes[0]
            .children
            .iter()
            .filter(|n| n.tag_name() == "reference")
            .map(|n| n.kind.clone())
            .collect();
        assert_eq!(
            refs,
            vec![
                NodeKind::Reference {
                    refuri: None,
                    refid: Some("intro".into())
                },
                NodeKind::Reference {
                    refuri: Some("https://docs.rs".into()),
                    refid: None
                },
            ]
        );
    }

    #[test]
    fn lone_image_is_a_block_image() {
        let nodes = blocks("![Plot](plot.png)\n\n![Wide](wide.pdf){width=50% align=Left scale=80}\n\nInline ![x](x.png) image");
        assert_eq!(
            nodes[0].kind,
            NodeKind::Image(ImageAttributes {
                uri: "plot.png".into(),
                alt: Some("Plot".into()),
                ..Default::default()
            })
        );
        assert_eq!(
            nodes[1].kind,
            NodeKind::Image(ImageAttributes {
                uri: "wide.pdf".into(),
                alt: Some("Wide".into()),
                width: Some("50%".into()),
                align: Some("left".into()),
                scale: Some(80.0),
                ..Default::default()
            })
        );
        assert_eq!(nodes[2].tag_name(), "paragraph");
        assert_eq!(nodes[2].children[1].tag_name(), "image");
    }

    #[test]
    fn lists_and_code() {
        let nodes = blocks("3. three\n4. four\n\n- a\n- b\n\n```rust\nfn main() {}\n```\n\n```{=latex}\n\\vfill\n```");
        assert_eq!(nodes[0].kind, NodeKind::EnumeratedList { start: Some(3) });
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[1].kind, NodeKind::BulletList);
        assert_eq!(nodes[1].children[0].astext(), "a");
        assert_eq!(
            nodes[2].kind,
            NodeKind::LiteralBlock {
                language: Some("rust".into())
            }
        );
        assert_eq!(nodes[2].astext(), "fn main() {}");
        assert_eq!(
            nodes[3].kind,
            NodeKind::Raw {
                format: "latex".into()
            }
        );
        assert_eq!(nodes[3].astext(), "\\vfill");
    }

    #[test]
    fn comments_quotes_and_breaks() {
        let nodes = blocks("<!-- speaker cue -->\n\n> quoted\n\n---\n\nline one  \nline two");
        assert_eq!(nodes[0].tag_name(), "comment");
        assert_eq!(nodes[0].astext(), "");
        assert_eq!(nodes[0].children[0].astext(), "speaker cue");
        assert_eq!(nodes[1].tag_name(), "block_quote");
        assert_eq!(nodes[2].tag_name(), "transition");
        assert_eq!(nodes[3].astext(), "line one\nline two");
    }

    #[test]
    fn unsupported_markup_is_reported() {
        let (flats, diagnostics) = convert("| a | b |\n|---|---|\n| 1 | 2 |\n\nText ~~gone~~ kept");
        assert_eq!(flats.len(), 1);
        let kinds: Vec<_> = diagnostics
            .warnings
            .iter()
            .map(|w| match w {
                ParseWarning::UnsupportedMarkup { kind, .. } => kind.as_str(),
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["table", "strikethrough"]);
        assert_eq!(diagnostics.warnings[0].location().line, 1);
    }
}
