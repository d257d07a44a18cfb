//! Document structure transforms: section nesting, title promotion and
//! table-of-contents generation.

use crate::convert::Flat;
use crate::doctree::{Attributes, Node, NodeKind, normalize_name};
use crate::slug::{Slugger, extract_custom_id};

/// Nests flat headings and blocks into sections.
///
/// A heading closes every open section of the same or a deeper rank. Skipped
/// ranks (`#` followed by `###`) nest one level, as if the gap did not exist.
pub fn build_sections(flats: Vec<Flat>, slugger: &mut Slugger) -> Vec<Node> {
    let mut root = Vec::new();
    let mut stack: Vec<(u8, Node)> = Vec::new();

    for flat in flats {
        match flat {
            Flat::Block(node) => match stack.last_mut() {
                Some((_, section)) => section.children.push(node),
                None => root.push(node),
            },
            Flat::Heading {
                depth,
                children,
                line,
            } => {
                close_sections(&mut stack, &mut root, depth);
                let section = new_section(children, slugger);
                log::debug!(
                    "line {}: section '{}' at rank {}",
                    line,
                    section.attributes.names.first().map_or("", String::as_str),
                    depth
                );
                stack.push((depth, section));
            }
        }
    }
    close_sections(&mut stack, &mut root, 0);
    root
}

fn close_sections(stack: &mut Vec<(u8, Node)>, root: &mut Vec<Node>, depth: u8) {
    while stack.last().is_some_and(|(top, _)| *top >= depth) {
        let Some((_, section)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(section),
            None => root.push(section),
        }
    }
}

fn new_section(mut children: Vec<Node>, slugger: &mut Slugger) -> Node {
    let custom_id = strip_custom_id(&mut children);
    let title = Node::with_children(NodeKind::Title, children);
    let text = title.astext().trim().to_string();
    let id = match custom_id {
        Some(id) => {
            slugger.reserve(&id);
            id
        }
        None => slugger.next_slug(&text),
    };

    let mut section =
        Node::with_children(NodeKind::Section, vec![title.with_rawsource(text.as_str())]);
    section.attributes.names.push(normalize_name(&text));
    section.attributes.ids.push(id);
    section
}

/// Removes a trailing `{#id}` from the deepest last text node.
fn strip_custom_id(children: &mut [Node]) -> Option<String> {
    let last = children.last_mut()?;
    match &mut last.kind {
        NodeKind::Text { value } => {
            let (text, id) = extract_custom_id(value);
            let id = id?.to_string();
            *value = text.to_string();
            Some(id)
        }
        NodeKind::Emphasis | NodeKind::Strong | NodeKind::Reference { .. } => {
            strip_custom_id(&mut last.children)
        }
        _ => None,
    }
}

/// Promotes a lone top-level section to the document title.
///
/// Applies when the section is the last top-level node and only comments
/// come before it. The section's children (minus its title) replace it, and
/// its names and ids move to the returned document attributes.
pub fn promote_title(body: &mut Vec<Node>) -> Option<(Node, Attributes)> {
    let index = body
        .iter()
        .position(|node| !matches!(node.kind, NodeKind::Comment))?;
    if index + 1 != body.len() || !matches!(body[index].kind, NodeKind::Section) {
        return None;
    }

    let mut section = body.pop()?;
    if !matches!(section.children.first().map(|c| &c.kind), Some(NodeKind::Title)) {
        body.push(section);
        return None;
    }
    let title = section.children.remove(0);
    body.append(&mut section.children);
    Some((title, section.attributes))
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq)]
struct TocEntry {
    id: String,
    title: Vec<Node>,
    children: Vec<TocEntry>,
}

fn collect_entries(nodes: &[Node]) -> Vec<TocEntry> {
    nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Section))
        .filter_map(|section| {
            let id = section.attributes.ids.first()?.clone();
            let title = section
                .children
                .first()
                .filter(|c| matches!(c.kind, NodeKind::Title))
                .map(|c| c.children.clone())
                .unwrap_or_default();
            Some(TocEntry {
                id,
                title,
                children: collect_entries(&section.children),
            })
        })
        .collect()
}

/// Fills every `contents` topic with a nested list of links to the sections.
pub fn fill_contents(document: &mut Node) {
    let entries = collect_entries(&document.children);
    fill_topics(&mut document.children, &entries);
}

fn fill_topics(nodes: &mut [Node], entries: &[TocEntry]) {
    for node in nodes {
        if matches!(node.kind, NodeKind::Topic) && node.has_class(&["contents"]) {
            let depth = node
                .attributes
                .classes
                .iter()
                .find_map(|c| c.strip_prefix("depth-")?.parse::<usize>().ok());
            node.children
                .retain(|child| matches!(child.kind, NodeKind::Title));
            if let Some(list) = toc_list(entries, depth) {
                node.children.push(list);
            }
        } else {
            fill_topics(&mut node.children, entries);
        }
    }
}

fn toc_list(entries: &[TocEntry], depth: Option<usize>) -> Option<Node> {
    if entries.is_empty() || depth == Some(0) {
        return None;
    }
    let items = entries
        .iter()
        .map(|entry| {
            let link = Node::with_children(
                NodeKind::Reference {
                    refuri: None,
                    refid: Some(entry.id.clone()),
                },
                entry.title.clone(),
            );
            let mut item = vec![Node::with_children(NodeKind::Paragraph, vec![link])];
            item.extend(toc_list(&entry.children, depth.map(|d| d - 1)));
            Node::with_children(NodeKind::ListItem, item)
        })
        .collect();
    Some(Node::with_children(NodeKind::BulletList, items))
}
