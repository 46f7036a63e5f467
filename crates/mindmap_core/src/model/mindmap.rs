//! Mind map document: node arena, id index and document-level passthrough.
//!
//! # Responsibility
//! - Own every topic of one document in an id-keyed arena.
//! - Answer structural lookups and pre-order traversals over ids.
//! - Validate tree invariants on construction and on demand.
//!
//! # Invariants
//! - Exactly one root; every other node has a parent present in the arena.
//! - Parent/child edges agree in both directions and form a tree.
//! - Every node is reachable from the root exactly once.

use crate::model::node::{Node, NodeId};
use crate::model::passthrough::{DocumentPassthrough, Passthrough, Section};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Cross-link between two topics (`relations/relation`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: NodeId,
    pub target: NodeId,
    /// Unmodelled attributes (guid, style) and child content.
    pub passthrough: Passthrough,
}

impl Relation {
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

/// Structural defect found while assembling or validating a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// Two topics share one id.
    DuplicateId(NodeId),
    /// No topic marks itself as root.
    MissingRoot,
    /// More than one topic marks itself as root.
    MultipleRoots { first: NodeId, second: NodeId },
    /// A parent reference does not resolve.
    DanglingParent { node: NodeId, parent: NodeId },
    /// A child reference does not resolve.
    DanglingChild { node: NodeId, child: NodeId },
    /// Parent and child edges disagree.
    InconsistentEdge { parent: NodeId, child: NodeId },
    /// Node cannot be reached from the root (parent chain loops).
    Cycle(NodeId),
    /// Coordinates are infinite or NaN and cannot be written.
    NonFinitePosition(NodeId),
}

impl Display for StructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate topic id `{id}`"),
            Self::MissingRoot => write!(f, "document has no root topic"),
            Self::MultipleRoots { first, second } => write!(
                f,
                "document has more than one root topic: `{first}` and `{second}`"
            ),
            Self::DanglingParent { node, parent } => write!(
                f,
                "topic `{node}` references missing parent `{parent}`"
            ),
            Self::DanglingChild { node, child } => {
                write!(f, "topic `{node}` lists missing child `{child}`")
            }
            Self::InconsistentEdge { parent, child } => write!(
                f,
                "parent/child edge `{parent}` -> `{child}` is not mirrored"
            ),
            Self::Cycle(id) => write!(f, "topic `{id}` is part of a parent cycle"),
            Self::NonFinitePosition(id) => {
                write!(f, "topic `{id}` has a non-finite position")
            }
        }
    }
}

impl Error for StructureError {}

/// One loaded mind map document.
#[derive(Debug, Clone)]
pub struct MindMap {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    relations: Vec<Relation>,
    passthrough: DocumentPassthrough,
    next_id: u64,
}

impl PartialEq for MindMap {
    /// Structural equality; the id allocator cursor is not part of the document.
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.nodes == other.nodes
            && self.relations == other.relations
            && self.passthrough == other.passthrough
    }
}

impl MindMap {
    /// Creates a fresh single-topic document with default SimpleMind framing.
    pub fn new(root_text: impl Into<String>) -> Self {
        let root = Node::new(NodeId::from(0_u64), None, root_text);
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self {
            root: root_id,
            nodes,
            relations: Vec::new(),
            passthrough: DocumentPassthrough::default(),
            next_id: 1,
        }
    }

    /// Assembles a document from topics in source order.
    ///
    /// `children` on the incoming nodes is ignored and rebuilt from
    /// `parent_id`, keeping source order among siblings.
    pub fn from_nodes(
        nodes: Vec<Node>,
        relations: Vec<Relation>,
        passthrough: DocumentPassthrough,
    ) -> Result<Self, StructureError> {
        let mut order = Vec::with_capacity(nodes.len());
        let mut arena: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());
        let mut root: Option<NodeId> = None;

        for mut node in nodes {
            node.children.clear();
            if node.parent_id.is_none() {
                if let Some(first) = &root {
                    return Err(StructureError::MultipleRoots {
                        first: first.clone(),
                        second: node.id,
                    });
                }
                root = Some(node.id.clone());
            }
            if arena.contains_key(&node.id) {
                return Err(StructureError::DuplicateId(node.id));
            }
            order.push(node.id.clone());
            arena.insert(node.id.clone(), node);
        }

        let root = root.ok_or(StructureError::MissingRoot)?;

        for id in &order {
            let Some(parent) = arena.get(id).and_then(|node| node.parent_id.clone()) else {
                continue;
            };
            match arena.get_mut(&parent) {
                Some(parent_node) => parent_node.children.push(id.clone()),
                None => {
                    return Err(StructureError::DanglingParent {
                        node: id.clone(),
                        parent,
                    })
                }
            }
        }

        let next_id = next_numeric_id(arena.keys());
        let map = Self {
            root,
            nodes: arena,
            relations,
            passthrough,
            next_id,
        };
        map.check_invariants()?;
        Ok(map)
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of topics in the document.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Cross-links where `id` is the source or the target.
    pub fn relations_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |relation| relation.touches(id))
    }

    pub fn passthrough(&self) -> &DocumentPassthrough {
        &self.passthrough
    }

    /// Title stored in `meta/title@text`, if any.
    pub fn title(&self) -> Option<&str> {
        self.passthrough
            .section_element("meta")?
            .child_elements()
            .find(|element| element.name == "title")?
            .attribute("text")
    }

    /// Pre-order walk over the whole tree.
    pub fn nodes(&self) -> PreOrder<'_> {
        PreOrder::new(self, &self.root)
    }

    /// Pre-order walk over the subtree rooted at `from`; empty if absent.
    pub fn walk_from<'a>(&'a self, from: &'a NodeId) -> PreOrder<'a> {
        PreOrder::new(self, from)
    }

    /// Ids of `id` and all of its descendants, pre-order.
    pub fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.walk_from(id).map(|(_, node)| node.id.clone()).collect()
    }

    /// Verifies every tree invariant.
    pub fn check_invariants(&self) -> Result<(), StructureError> {
        let root = self.nodes.get(&self.root).ok_or(StructureError::MissingRoot)?;
        if let Some(parent) = &root.parent_id {
            return Err(StructureError::DanglingParent {
                node: root.id.clone(),
                parent: parent.clone(),
            });
        }

        for node in self.nodes.values() {
            if !node.position.is_finite() {
                return Err(StructureError::NonFinitePosition(node.id.clone()));
            }
            if let Some(parent_id) = &node.parent_id {
                let parent = self.nodes.get(parent_id).ok_or_else(|| {
                    StructureError::DanglingParent {
                        node: node.id.clone(),
                        parent: parent_id.clone(),
                    }
                })?;
                let occurrences = parent
                    .children
                    .iter()
                    .filter(|child| *child == &node.id)
                    .count();
                if occurrences != 1 {
                    return Err(StructureError::InconsistentEdge {
                        parent: parent_id.clone(),
                        child: node.id.clone(),
                    });
                }
            } else if node.id != self.root {
                return Err(StructureError::MultipleRoots {
                    first: self.root.clone(),
                    second: node.id.clone(),
                });
            }

            for child_id in &node.children {
                let child = self.nodes.get(child_id).ok_or_else(|| {
                    StructureError::DanglingChild {
                        node: node.id.clone(),
                        child: child_id.clone(),
                    }
                })?;
                if child.parent_id.as_ref() != Some(&node.id) {
                    return Err(StructureError::InconsistentEdge {
                        parent: node.id.clone(),
                        child: child_id.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut stack = vec![&self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(StructureError::Cycle(id.clone()));
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter());
            }
        }
        if seen.len() != self.nodes.len() {
            let mut unreachable = self
                .nodes
                .keys()
                .filter(|id| !seen.contains(id))
                .collect::<Vec<_>>();
            unreachable.sort();
            return Err(StructureError::Cycle(unreachable[0].clone()));
        }

        Ok(())
    }

    pub(crate) fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Hands out the next unused numeric id.
    ///
    /// Once the numeric space above the largest id is used up, ids are
    /// random hex strings checked against the arena.
    pub(crate) fn allocate_id(&mut self) -> NodeId {
        while self.next_id < u64::MAX {
            let candidate = NodeId::from(self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
        loop {
            let candidate = NodeId::from(Uuid::new_v4().simple().to_string());
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Inserts a node already linked into its parent's `children`.
    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub(crate) fn retain_relations(&mut self, keep: impl FnMut(&Relation) -> bool) {
        self.relations.retain(keep);
    }

    /// Whether the passthrough declares a `relations` section.
    pub(crate) fn has_relations_section(&self) -> bool {
        self.passthrough
            .sections
            .iter()
            .any(|section| matches!(section, Section::Relations { .. }))
    }
}

fn next_numeric_id<'a>(ids: impl Iterator<Item = &'a NodeId>) -> u64 {
    ids.filter_map(NodeId::as_number)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Depth-first pre-order iterator yielding `(depth, node)`.
///
/// Depth is relative to the walk origin (origin has depth 0).
pub struct PreOrder<'a> {
    map: &'a MindMap,
    stack: Vec<(usize, &'a NodeId)>,
}

impl<'a> PreOrder<'a> {
    fn new(map: &'a MindMap, from: &'a NodeId) -> Self {
        let stack = if map.contains(from) {
            vec![(0, from)]
        } else {
            Vec::new()
        };
        Self { map, stack }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, id)) = self.stack.pop() {
            if let Some(node) = self.map.nodes.get(id) {
                self.stack
                    .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
                return Some((depth, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>, text: &str) -> Node {
        Node::new(NodeId::from(id), parent.map(NodeId::from), text)
    }

    fn sample() -> MindMap {
        MindMap::from_nodes(
            vec![
                node("0", None, "Project"),
                node("2", Some("0"), "Research"),
                node("1", Some("0"), "Overview"),
                node("3", Some("2"), "Papers"),
            ],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap()
    }

    #[test]
    fn children_follow_source_order() {
        let map = sample();
        let texts = map
            .nodes()
            .map(|(depth, node)| (depth, node.text.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![(0, "Project"), (1, "Research"), (2, "Papers"), (1, "Overview")]
        );
    }

    #[test]
    fn child_listed_before_parent_still_links() {
        let map = MindMap::from_nodes(
            vec![node("5", Some("0"), "Early"), node("0", None, "Root")],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap();
        assert_eq!(map.root().children, vec![NodeId::from("5")]);
    }

    #[test]
    fn rejects_dangling_parent() {
        let err = MindMap::from_nodes(
            vec![node("0", None, "Root"), node("1", Some("9"), "Lost")],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StructureError::DanglingParent {
                node: NodeId::from("1"),
                parent: NodeId::from("9"),
            }
        );
    }

    #[test]
    fn rejects_parent_cycle() {
        let err = MindMap::from_nodes(
            vec![
                node("0", None, "Root"),
                node("1", Some("2"), "A"),
                node("2", Some("1"), "B"),
            ],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap_err();
        assert_eq!(err, StructureError::Cycle(NodeId::from("1")));
    }

    #[test]
    fn rejects_second_root_and_duplicate_ids() {
        let err = MindMap::from_nodes(
            vec![node("0", None, "Root"), node("1", None, "Floating")],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StructureError::MultipleRoots { .. }));

        let err = MindMap::from_nodes(
            vec![node("0", None, "Root"), node("0", Some("0"), "Again")],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap_err();
        assert_eq!(err, StructureError::DuplicateId(NodeId::from("0")));
    }

    #[test]
    fn allocator_skips_taken_ids() {
        let mut map = sample();
        assert_eq!(map.allocate_id(), NodeId::from("4"));
        assert_eq!(map.allocate_id(), NodeId::from("5"));
    }

    #[test]
    fn non_finite_positions_fail_the_invariant_check() {
        let mut map = sample();
        map.get_mut(&NodeId::from("3")).unwrap().position.x = f64::INFINITY;
        assert_eq!(
            map.check_invariants(),
            Err(StructureError::NonFinitePosition(NodeId::from("3")))
        );
    }

    #[test]
    fn allocator_falls_back_to_random_ids_at_the_numeric_ceiling() {
        let mut map = MindMap::from_nodes(
            vec![node("18446744073709551615", None, "Root")],
            Vec::new(),
            DocumentPassthrough::default(),
        )
        .unwrap();

        let first = map.allocate_id();
        let second = map.allocate_id();
        assert_eq!(first.as_number(), None);
        assert_eq!(first.as_str().len(), 32);
        assert_ne!(first, second);
        assert!(!map.contains(&first));
    }

    #[test]
    fn subtree_ids_are_pre_order() {
        let map = sample();
        assert_eq!(
            map.subtree_ids(&NodeId::from("2")),
            vec![NodeId::from("2"), NodeId::from("3")]
        );
        assert!(map.subtree_ids(&NodeId::from("99")).is_empty());
    }
}
