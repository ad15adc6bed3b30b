//! Builds the two-level comment tree out of the flat rows the store
//! returns. Pure: no store access, no shared state, fresh output on
//! every call.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Anything with an identifier and an optional parent identifier can be
/// organized; review comments and community comments both implement it.
pub trait Threaded {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode<T> {
    pub record: T,
    pub replies: Vec<CommentNode<T>>,
}

impl<T> CommentNode<T> {
    fn leaf(record: T) -> Self {
        CommentNode {
            record,
            replies: Vec::new(),
        }
    }

    /// Nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::count).sum::<usize>()
    }
}

/// Organizes flat comment rows for one review into an ordered
/// two-level tree.
///
/// Both levels preserve input order; the caller's loading query owns
/// any "newest first" presentation. A reply is attached to its parent
/// only when that parent is present in the input *and* is itself a
/// root; everything else surfaces at the top level:
///
/// - a reply whose parent is missing (deleted in a racing request)
///   stays visible rather than being dropped;
/// - a reply whose parent is itself a reply is hoisted, so the output
///   never nests beyond depth two even on malformed input.
///
/// Duplicate identifiers in the input are attached once.
pub fn organize<T: Threaded + Clone>(comments: &[T]) -> Vec<CommentNode<T>> {
    // First occurrence wins, consistent with the attachment pass below.
    let mut by_id: HashMap<&str, &T> = HashMap::with_capacity(comments.len());
    for comment in comments {
        by_id.entry(comment.id()).or_insert(comment);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(comments.len());
    let mut children: HashMap<&str, Vec<&T>> = HashMap::new();
    let mut roots: Vec<&T> = Vec::new();

    for comment in comments {
        if !seen.insert(comment.id()) {
            continue;
        }
        let parent = comment
            .parent_id()
            .filter(|p| *p != comment.id())
            .and_then(|p| by_id.get(p));
        match parent {
            Some(parent) if parent.parent_id().is_none() => {
                children.entry(parent.id()).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| CommentNode {
            replies: children
                .remove(root.id())
                .unwrap_or_default()
                .into_iter()
                .map(|reply| CommentNode::leaf(reply.clone()))
                .collect(),
            record: root.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        parent_id: Option<String>,
    }

    impl Threaded for Row {
        fn id(&self) -> &str {
            &self.id
        }

        fn parent_id(&self) -> Option<&str> {
            self.parent_id.as_deref()
        }
    }

    fn row(id: &str, parent: Option<&str>) -> Row {
        Row {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
        }
    }

    fn total(nodes: &[CommentNode<Row>]) -> usize {
        nodes.iter().map(CommentNode::count).sum()
    }

    fn max_depth(nodes: &[CommentNode<Row>]) -> usize {
        nodes
            .iter()
            .map(|n| 1 + max_depth(&n.replies))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(organize::<Row>(&[]).is_empty());
    }

    #[test]
    fn replies_nest_under_their_roots() {
        let input = vec![row("a", None), row("b", Some("a")), row("c", None)];
        let tree = organize(&input);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].record.id, "a");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].record.id, "b");
        assert_eq!(tree[1].record.id, "c");
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn input_order_is_preserved_at_both_levels() {
        let input = vec![
            row("r1", None),
            row("x", Some("r1")),
            row("r2", None),
            row("y", Some("r1")),
            row("z", Some("r2")),
        ];
        let tree = organize(&input);

        let roots: Vec<&str> = tree.iter().map(|n| n.record.id.as_str()).collect();
        assert_eq!(roots, vec!["r1", "r2"]);
        let replies: Vec<&str> = tree[0].replies.iter().map(|n| n.record.id.as_str()).collect();
        assert_eq!(replies, vec!["x", "y"]);
    }

    #[test]
    fn orphaned_reply_surfaces_at_top_level() {
        let input = vec![row("a", None), row("b", Some("gone"))];
        let tree = organize(&input);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].record.id, "b");
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn reply_to_a_reply_is_hoisted_not_nested() {
        // Malformed rows must never produce a depth-three tree.
        let input = vec![row("a", None), row("b", Some("a")), row("c", Some("b"))];
        let tree = organize(&input);

        assert_eq!(total(&tree), 3);
        assert_eq!(max_depth(&tree), 2);
        assert_eq!(tree[1].record.id, "c");
    }

    #[test]
    fn duplicate_rows_are_attached_once() {
        let input = vec![
            row("a", None),
            row("b", Some("a")),
            row("a", None),
            row("b", Some("a")),
        ];
        let tree = organize(&input);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies.len(), 1);
    }

    #[test]
    fn organize_is_idempotent_on_a_snapshot() {
        let input = vec![
            row("a", None),
            row("b", Some("a")),
            row("c", None),
            row("d", Some("missing")),
        ];
        assert_eq!(organize(&input), organize(&input));
    }

    #[test]
    fn self_referencing_row_falls_back_to_top_level() {
        let input = vec![row("a", Some("a"))];
        let tree = organize(&input);

        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    proptest! {
        /// Every distinct input row appears exactly once in the output
        /// and the tree never exceeds depth two, whatever the parent
        /// pointers look like.
        #[test]
        fn no_row_is_lost_or_duplicated(rows in arbitrary_rows()) {
            let distinct: HashSet<&str> = rows.iter().map(|r| r.id.as_str()).collect();
            let tree = organize(&rows);

            prop_assert_eq!(total(&tree), distinct.len());
            prop_assert!(max_depth(&tree) <= 2);

            let mut seen = HashSet::new();
            fn walk<'a>(nodes: &'a [CommentNode<Row>], seen: &mut HashSet<&'a str>) {
                for node in nodes {
                    seen.insert(node.record.id.as_str());
                    walk(&node.replies, seen);
                }
            }
            walk(&tree, &mut seen);
            prop_assert_eq!(seen, distinct);
        }
    }

    fn arbitrary_rows() -> impl Strategy<Value = Vec<Row>> {
        // Small id space so parent pointers frequently hit real rows,
        // replies, missing ids and the row itself.
        prop::collection::vec((0u8..20, prop::option::of(0u8..25)), 0..40).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(id, parent)| Row {
                    id: format!("c{}", id),
                    parent_id: parent.map(|p| format!("c{}", p)),
                })
                .collect()
        })
    }
}
