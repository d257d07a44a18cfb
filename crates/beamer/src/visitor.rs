//! Depth-first traversal of document trees.

use r2b_core::{Node, TranslateError};

/// What the walker does after a node has been entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit the children, then exit the node.
    Continue,
    /// Do not visit the children, but still exit the node.
    SkipChildren,
    /// Do not visit the children and do not exit the node.
    SkipNode,
}

/// Enter/exit callbacks for [`walk`].
///
/// `parent` is `None` only for the node the walk started from.
pub trait Visitor {
    /// Called before the children of `node`.
    fn enter(&mut self, node: &Node, parent: Option<&Node>) -> Result<Visit, TranslateError>;

    /// Called after the children of `node`, unless `enter` returned
    /// [`Visit::SkipNode`].
    fn exit(&mut self, node: &Node, parent: Option<&Node>) -> Result<(), TranslateError>;
}

/// Walks `node` and its descendants in document order.
///
/// The first error stops the walk.
pub fn walk<V>(node: &Node, parent: Option<&Node>, visitor: &mut V) -> Result<(), TranslateError>
where
    V: Visitor + ?Sized,
{
    match visitor.enter(node, parent)? {
        Visit::SkipNode => return Ok(()),
        Visit::SkipChildren => {}
        Visit::Continue => {
            for child in &node.children {
                walk(child, Some(node), visitor)?;
            }
        }
    }
    visitor.exit(node, parent)
}

/// Position of `node` among the children of `parent`, by identity.
pub fn child_index(node: &Node, parent: Option<&Node>) -> Option<usize> {
    parent?
        .children
        .iter()
        .position(|child| std::ptr::eq(child, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2b_core::NodeKind;

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        skip: Option<&'static str>,
        skip_children: Option<&'static str>,
    }

    impl Visitor for Trace {
        fn enter(&mut self, node: &Node, _parent: Option<&Node>) -> Result<Visit, TranslateError> {
            self.events.push(format!("+{}", node.tag_name()));
            if Some(node.tag_name()) == self.skip {
                return Ok(Visit::SkipNode);
            }
            if Some(node.tag_name()) == self.skip_children {
                return Ok(Visit::SkipChildren);
            }
            Ok(Visit::Continue)
        }

        fn exit(&mut self, node: &Node, _parent: Option<&Node>) -> Result<(), TranslateError> {
            self.events.push(format!("-{}", node.tag_name()));
            if node.tag_name() == "transition" {
                return Err(TranslateError::invariant("stop"));
            }
            Ok(())
        }
    }

    fn tree() -> Node {
        Node::with_children(
            NodeKind::Document,
            vec![
                Node::section("A", vec![Node::paragraph("x")]),
                Node::new(NodeKind::Comment),
            ],
        )
    }

    #[test]
    fn visits_in_document_order() {
        let mut trace = Trace::default();
        walk(&tree(), None, &mut trace).unwrap();
        assert_eq!(
            trace.events.join(" "),
            "+document +section +title +#text -#text -title +paragraph +#text -#text \
             -paragraph -section +comment -comment -document"
        );
    }

    #[test]
    fn skip_node_suppresses_exit() {
        let mut trace = Trace {
            skip: Some("section"),
            ..Trace::default()
        };
        walk(&tree(), None, &mut trace).unwrap();
        assert_eq!(
            trace.events.join(" "),
            "+document +section +comment -comment -document"
        );
    }

    #[test]
    fn skip_children_still_exits() {
        let mut trace = Trace {
            skip_children: Some("section"),
            ..Trace::default()
        };
        walk(&tree(), None, &mut trace).unwrap();
        assert_eq!(
            trace.events.join(" "),
            "+document +section -section +comment -comment -document"
        );
    }

    #[test]
    fn errors_stop_the_walk() {
        let doc = Node::with_children(
            NodeKind::Document,
            vec![Node::new(NodeKind::Transition), Node::paragraph("never")],
        );
        let mut trace = Trace::default();
        assert!(walk(&doc, None, &mut trace).is_err());
        assert_eq!(trace.events.join(" "), "+document +transition -transition");
    }

    #[test]
    fn child_index_uses_identity() {
        let doc = tree();
        assert_eq!(child_index(&doc.children[1], Some(&doc)), Some(1));
        assert_eq!(child_index(&doc, None), None);
        let copy = doc.children[1].clone();
        assert_eq!(child_index(&copy, Some(&doc)), None);
    }
}
