use crate::error::{DeclarationError, Result};
use crate::identifier::{DeclarationKind, Identifier, Segment};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Handle of a node inside a [`DeclarationTree`].
///
/// Nodes are stored in depth-first preorder, so comparing two ids compares
/// their position in source declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The unit node always comes first
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A declaration recognized in one revision of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationNode {
    name: String,
    kind: DeclarationKind,
    start: usize,
    end: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DeclarationNode {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// First byte of the declaration
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last byte of the declaration
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub const fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    #[must_use]
    pub const fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Enclosing declaration; `None` only for the unit
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct members in declaration order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Frozen declaration tree of one file revision.
///
/// The arena owns every node; child lists are the ownership edges and
/// `parent` links are plain indices used only for upward walks. Trees are
/// only ever produced by [`NodeBuilder::freeze`], so every index is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationTree {
    nodes: Vec<DeclarationNode>,
}

impl DeclarationTree {
    #[must_use]
    pub fn root(&self) -> &DeclarationNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &DeclarationNode {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&DeclarationNode> {
        self.nodes.get(id.0)
    }

    /// Number of declarations, the unit included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its unit
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first preorder, i.e. source declaration order
    pub fn preorder(&self) -> impl Iterator<Item = (NodeId, &DeclarationNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// The node itself, then each enclosing declaration up to the unit
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &DeclarationNode)> + '_ {
        std::iter::successors(Some(id), move |&cur| self.nodes[cur.0].parent)
            .map(move |cur| (cur, &self.nodes[cur.0]))
    }

    /// Identifier of `id`, walking parent links (`O(depth)`)
    #[must_use]
    pub fn identifier(&self, id: NodeId) -> Identifier {
        let segments = self
            .ancestors(id)
            .map(|(_, node)| Segment::new(node.kind, node.name.clone()))
            .collect();
        Identifier::from_ancestor_walk(segments)
    }

    /// Identifiers of every declaration in preorder
    pub fn identifiers(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.preorder().map(move |(id, _)| self.identifier(id))
    }

    /// `(kind, name, start, end)` of every node in preorder. Two parses are
    /// structurally identical exactly when their shapes are equal.
    #[must_use]
    pub fn shape(&self) -> Vec<(DeclarationKind, &str, usize, usize)> {
        self.nodes
            .iter()
            .map(|n| (n.kind, n.name.as_str(), n.start, n.end))
            .collect()
    }

    /// Check containment and ordering of every parent/child pair
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.first_violation().is_none()
    }

    /// First node, in preorder, that is empty or whose members are out of
    /// order or escape its span
    fn first_violation(&self) -> Option<&DeclarationNode> {
        self.preorder()
            .find(|&(id, node)| {
                let ordered = node
                    .children
                    .windows(2)
                    .all(|w| self.nodes[w[0].0].start <= self.nodes[w[1].0].start);
                let contained = node.children.iter().all(|&child| {
                    let c = &self.nodes[child.0];
                    c.parent == Some(id) && node.start <= c.start && c.end <= node.end
                });
                let non_empty = id == NodeId::ROOT || node.start < node.end;
                !(ordered && contained && non_empty)
            })
            .map(|(_, node)| node)
    }
}

/// Mutable declaration used while a tree is being assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBuilder {
    pub(crate) name: String,
    pub(crate) kind: DeclarationKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) members: Vec<NodeBuilder>,
}

impl NodeBuilder {
    pub fn new(kind: DeclarationKind, name: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            name: name.into(),
            kind,
            start: span.start,
            end: span.end,
            members: Vec::new(),
        }
    }

    pub fn unit(name: impl Into<String>, span: Range<usize>) -> Self {
        Self::new(DeclarationKind::Unit, name, span)
    }

    pub fn type_decl(name: impl Into<String>, span: Range<usize>) -> Self {
        Self::new(DeclarationKind::Type, name, span)
    }

    pub fn method(name: impl Into<String>, span: Range<usize>) -> Self {
        Self::new(DeclarationKind::Method, name, span)
    }

    /// Builder: append a member
    #[must_use]
    pub fn with_member(mut self, member: NodeBuilder) -> Self {
        self.members.push(member);
        self
    }

    /// Builder: append several members
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = NodeBuilder>) -> Self {
        self.members.extend(members);
        self
    }

    /// Flatten into a read-only arena in preorder, linking parents.
    ///
    /// Fails when a member is empty, escapes its parent's span, or starts
    /// before an earlier sibling.
    pub fn freeze(self) -> Result<DeclarationTree> {
        let tree = self.freeze_unchecked();
        let violation = tree.first_violation().map(|node| {
            format!(
                "`{}` at {}..{} is empty, out of order, or has a member outside its span",
                node.name, node.start, node.end
            )
        });
        match violation {
            None => Ok(tree),
            Some(msg) => Err(DeclarationError::MalformedTree(msg)),
        }
    }

    /// Flatten a builder the parser assembled; its spans nest by construction
    pub(crate) fn freeze_unchecked(self) -> DeclarationTree {
        let mut nodes: Vec<DeclarationNode> = Vec::new();
        let mut stack: Vec<(NodeBuilder, Option<NodeId>)> = vec![(self, None)];

        while let Some((builder, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            let NodeBuilder {
                name,
                kind,
                start,
                end,
                members,
            } = builder;
            nodes.push(DeclarationNode {
                name,
                kind,
                start,
                end,
                parent,
                children: Vec::with_capacity(members.len()),
            });
            stack.extend(members.into_iter().rev().map(|m| (m, Some(id))));
        }

        DeclarationTree { nodes }
    }
}
