use crate::error::MatchError;
use crate::tree::{DeclarationTree, NodeId};

/// Resolves byte positions to their innermost enclosing declaration.
///
/// Queries must arrive in non-decreasing position order; under that
/// contract a whole pass over a file costs `O(nodes + queries)` amortized.
/// The cursor only moves forward through the preorder arena and then
/// climbs parent links while the current node ends before the query.
#[derive(Debug, Clone)]
pub struct PositionMatcher<'t> {
    tree: &'t DeclarationTree,
    /// Innermost declaration found by the last query
    current: NodeId,
    /// First preorder node whose start has not been passed yet
    next: usize,
    last_pos: usize,
}

impl<'t> PositionMatcher<'t> {
    #[must_use]
    pub fn new(tree: &'t DeclarationTree) -> Self {
        Self {
            tree,
            current: NodeId::ROOT,
            next: 1,
            last_pos: 0,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &'t DeclarationTree {
        self.tree
    }

    /// Innermost declaration containing `pos`; the unit when nothing else
    /// does, including positions past the end of the file.
    pub fn find(&mut self, pos: usize) -> Result<NodeId, MatchError> {
        self.check_order(pos)?;
        Ok(self.advance_to(pos))
    }

    /// Innermost declaration containing `from`, followed by every node that
    /// starts inside `(from, to)`, in preorder. `[from, to)` is half-open.
    pub fn find_range(&mut self, from: usize, to: usize) -> Result<Vec<NodeId>, MatchError> {
        if to < from {
            return Err(MatchError::InvalidRange {
                start: from,
                end: to,
            });
        }
        self.check_order(from)?;

        let mut found = vec![self.advance_to(from)];
        while let Some(node) = self.tree.get(NodeId::from_index(self.next)) {
            if node.start() >= to {
                break;
            }
            let id = NodeId::from_index(self.next);
            found.push(id);
            self.current = id;
            self.next += 1;
        }

        // Later queries may not reach back before the last covered byte
        self.last_pos = from.max(to.saturating_sub(1));
        Ok(found)
    }

    fn check_order(&self, pos: usize) -> Result<(), MatchError> {
        if pos < self.last_pos {
            return Err(MatchError::OutOfOrder {
                previous: self.last_pos,
                requested: pos,
            });
        }
        Ok(())
    }

    fn advance_to(&mut self, pos: usize) -> NodeId {
        let mut current = self.current;
        while let Some(node) = self.tree.get(NodeId::from_index(self.next)) {
            if node.start() > pos {
                break;
            }
            current = NodeId::from_index(self.next);
            self.next += 1;
        }

        while pos >= self.tree.node(current).end() {
            match self.tree.node(current).parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        self.current = current;
        self.last_pos = pos;
        current
    }
}
