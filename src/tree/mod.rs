//! The branching log: a persistent n-ary tree of immutable values with a
//! well-defined reduction at every node.
//!
//! Every node's **residue** is the reduction of the values on the path
//! from the root to that node, folded through the tree's reducer (by
//! default the combination algebra, though any reducer works and the log
//! never assumes more than the [`Reducer`] contract). Each line of history
//! is a **branch**: a tip node plus a memoized residue, so extending a tip
//! costs one reduction and querying it costs nothing. Adding under an
//! interior node **forks**: a brand-new branch slot appears and its
//! residue is computed definitionally, by walking the path.
//!
//! The reducer doubles as a validity gate. If it refuses a value, the
//! `add` aborts atomically, with no node appended and no branch touched, so
//! every value in the log is one that actually reduced against the history
//! it extends.
//!
//! The log is strictly single-writer and fully synchronous. Concurrent
//! producers must serialize their calls before they reach it.

mod codec;
mod error;

pub use codec::{CodecError, Entry, Registry};
pub use error::TreeError;

use std::fmt;

use crate::combine::{combine, CombineError};
use crate::value::Value;

/// Stable identifier of a node: its creation-order index, never reused.
///
/// Ids double as external references: they survive serialization and can
/// be handed to [`Tree::add_to`] and the query methods at any time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

impl NodeId {
    /// The underlying index into the node arena.
    pub fn index(self) -> usize {
        self.0
    }

    /// Rebuild an id from its raw index.
    ///
    /// Ids are stable external references, so an index that arrived from
    /// outside the process (a serialized form, a caller's bookkeeping) can
    /// be turned back into an id. An index the tree never issued is
    /// refused by whichever operation receives it.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Folds one value into an accumulated residue.
///
/// Implemented by [`Combine`] (the default) and by any
/// `Fn(&Value, &Value) -> Result<Value, CombineError>` closure, so the log
/// can be exercised with arbitrary reducers. Returning an error rejects
/// the value.
pub trait Reducer {
    /// Produce the new residue, or refuse the value.
    fn reduce(&self, residue: &Value, value: &Value) -> Result<Value, CombineError>;
}

/// The default reducer: the crate's combination algebra.
#[derive(Clone, Copy, Debug, Default)]
pub struct Combine;

impl Reducer for Combine {
    fn reduce(&self, residue: &Value, value: &Value) -> Result<Value, CombineError> {
        combine(residue, value)
    }
}

impl<F> Reducer for F
where
    F: Fn(&Value, &Value) -> Result<Value, CombineError>,
{
    fn reduce(&self, residue: &Value, value: &Value) -> Result<Value, CombineError> {
        self(residue, value)
    }
}

/// One entry in the log.
///
/// Nodes are owned by the tree's arena; `parent` is an index, never a live
/// reference, so the structure serializes without cycles.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    value: Value,
    parent: Option<NodeId>,
}

impl Node {
    /// The node's stable id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The admitted value. Immutable for the life of the tree.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The parent's id; `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// One line of history: a tip node and its memoized residue.
#[derive(Clone, Debug)]
pub struct Branch {
    tip: NodeId,
    residue: Value,
}

impl Branch {
    /// The branch's current frontier node.
    pub fn tip(&self) -> NodeId {
        self.tip
    }

    /// The cached reduction of the root→tip path.
    pub fn residue(&self) -> &Value {
        &self.residue
    }
}

/// A branching, memoized, append-only log of values.
///
/// # Example
///
/// ```rust
/// use accrete::record;
/// use accrete::tree::Tree;
///
/// let mut tree = Tree::new(record! { "count" => 0.0 });
/// let first = tree.add(record! { "count" => 1.0 }).unwrap();
/// tree.add(record! { "count" => 10.0 }).unwrap();
///
/// // Forking from the first node starts an independent line of history.
/// let fork = tree.add_to(record! { "count" => 100.0 }, first).unwrap();
///
/// assert_eq!(tree.residue(tree.branches()[0].tip()).unwrap(), record! { "count" => 11.0 });
/// assert_eq!(tree.residue(fork).unwrap(), record! { "count" => 101.0 });
/// ```
#[derive(Clone)]
pub struct Tree<R: Reducer = Combine> {
    nodes: Vec<Node>,
    branches: Vec<Branch>,
    last: NodeId,
    reducer: R,
}

impl<R: Reducer> std::fmt::Debug for Tree<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes)
            .field("branches", &self.branches)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl Tree<Combine> {
    /// A tree seeded with a root value, reduced by the combination algebra.
    pub fn new(seed: Value) -> Self {
        Self::with_reducer(seed, Combine)
    }
}

impl<R: Reducer> Tree<R> {
    /// A tree seeded with a root value and a caller-supplied reducer.
    pub fn with_reducer(seed: Value, reducer: R) -> Self {
        let root = Node {
            id: NodeId(0),
            value: seed.clone(),
            parent: None,
        };
        Self {
            nodes: vec![root],
            branches: vec![Branch {
                tip: NodeId(0),
                residue: seed,
            }],
            last: NodeId(0),
            reducer,
        }
    }

    /// Add a value under the most recently added node.
    ///
    /// See [`Tree::add_to`] for the full contract.
    pub fn add(&mut self, value: Value) -> Result<NodeId, TreeError> {
        self.add_to(value, self.last)
    }

    /// Add a value under the given parent node.
    ///
    /// The value is frozen on admission: the tree takes ownership and only
    /// ever hands out shared references afterwards, so memoized residues
    /// can never be invalidated by later mutation.
    ///
    /// If the parent is a branch tip this is an extension: the branch's
    /// cached residue folds forward in O(1). Otherwise it is a fork: a new
    /// branch appears and its residue is computed by walking the full
    /// root→parent path.
    ///
    /// # Errors
    ///
    /// If the reducer refuses the value the call fails atomically
    /// (`node_count` and every branch are exactly as they were) with
    /// [`TreeError::Rejected`] carrying the refused value.
    pub fn add_to(&mut self, value: Value, parent: NodeId) -> Result<NodeId, TreeError> {
        if parent.0 >= self.nodes.len() {
            return Err(TreeError::UnknownNode { id: parent.0 });
        }

        let id = NodeId(self.nodes.len());
        match self.branches.iter().position(|b| b.tip == parent) {
            Some(slot) => {
                // Extension: fold the cached residue forward.
                let residue = self
                    .reducer
                    .reduce(&self.branches[slot].residue, &value)
                    .map_err(|source| TreeError::Rejected {
                        value: value.clone(),
                        source,
                    })?;
                self.nodes.push(Node {
                    id,
                    value,
                    parent: Some(parent),
                });
                self.branches[slot] = Branch { tip: id, residue };
            }
            None => {
                // Fork: no cache exists for this lineage yet, so compute
                // the residue definitionally before touching any state.
                let along = self.walk_residue(parent)?;
                let residue =
                    self.reducer
                        .reduce(&along, &value)
                        .map_err(|source| TreeError::Rejected {
                            value: value.clone(),
                            source,
                        })?;
                self.nodes.push(Node {
                    id,
                    value,
                    parent: Some(parent),
                });
                self.branches.push(Branch { tip: id, residue });
            }
        }
        self.last = id;
        Ok(id)
    }

    /// The residue at a node: the reduction of the root→node path.
    ///
    /// O(1) for a branch tip (served from the memo), O(depth) otherwise.
    pub fn residue(&self, node: NodeId) -> Result<Value, TreeError> {
        if node.0 >= self.nodes.len() {
            return Err(TreeError::UnknownNode { id: node.0 });
        }
        if let Some(branch) = self.branches.iter().find(|b| b.tip == node) {
            return Ok(branch.residue.clone());
        }
        self.walk_residue(node)
    }

    /// The ids on the path from the root to `node`, inclusive.
    pub fn node_path(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if node.0 >= self.nodes.len() {
            return Err(TreeError::UnknownNode { id: node.0 });
        }
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// The node behind an id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The value admitted at an id.
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(id.0).map(|n| &n.value)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every branch, in creation order. Branches are never removed.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The tip id of every branch, in branch order.
    pub fn branch_tips(&self) -> Vec<NodeId> {
        self.branches.iter().map(|b| b.tip).collect()
    }

    /// The root's id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The most recently added node's id, the default parent for [`add`].
    ///
    /// [`add`]: Tree::add
    pub fn last(&self) -> NodeId {
        self.last
    }

    /// Reduce the root→node path from the root value. Used when no memo
    /// exists for the lineage.
    fn walk_residue(&self, node: NodeId) -> Result<Value, TreeError> {
        let path = self.node_path(node)?;
        let mut acc = self.nodes[path[0].0].value.clone();
        for id in &path[1..] {
            let value = &self.nodes[id.0].value;
            acc = self
                .reducer
                .reduce(&acc, value)
                .map_err(|source| TreeError::Rejected {
                    value: value.clone(),
                    source,
                })?;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{Handler, Message};
    use crate::record;

    #[test]
    fn new_tree_has_a_single_branch_at_the_root() {
        let tree = Tree::new(record! { "a" => 1.0 });
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.branches().len(), 1);
        assert_eq!(tree.branch_tips(), vec![tree.root()]);
        assert_eq!(tree.residue(tree.root()).unwrap(), record! { "a" => 1.0 });
    }

    #[test]
    fn add_extends_the_most_recent_node() {
        let mut tree = Tree::new(record! { "n" => 0.0 });
        let a = tree.add(record! { "n" => 1.0 }).unwrap();
        let b = tree.add(record! { "n" => 2.0 }).unwrap();

        assert_eq!(tree.node_path(b).unwrap(), vec![tree.root(), a, b]);
        assert_eq!(tree.branches().len(), 1);
        assert_eq!(tree.residue(b).unwrap(), record! { "n" => 3.0 });
    }

    #[test]
    fn add_to_an_interior_node_forks() {
        let mut tree = Tree::new(record! { "n" => 0.0 });
        let a = tree.add(record! { "n" => 1.0 }).unwrap();
        tree.add(record! { "n" => 2.0 }).unwrap();

        let fork = tree.add_to(record! { "n" => 100.0 }, a).unwrap();
        assert_eq!(tree.branches().len(), 2);
        assert_eq!(tree.residue(fork).unwrap(), record! { "n" => 101.0 });
        // The forked-from branch is untouched.
        assert_eq!(
            tree.residue(tree.branches()[0].tip()).unwrap(),
            record! { "n" => 3.0 },
        );
    }

    #[test]
    fn fork_residue_is_independent_of_the_original_branch() {
        let mut tree = Tree::new(record! { "log" => Value::Seq(vec![]) });
        let a = tree.add(record! { "log" => "a" }).unwrap();
        tree.add(record! { "log" => "b" }).unwrap();
        let fork = tree.add_to(record! { "log" => "c" }, a).unwrap();

        assert_eq!(
            tree.residue(fork).unwrap(),
            record! { "log" => Value::Seq(vec![Value::from("a"), Value::from("c")]) },
        );
        assert_eq!(
            tree.residue(tree.branches()[0].tip()).unwrap(),
            record! { "log" => Value::Seq(vec![Value::from("a"), Value::from("b")]) },
        );
    }

    #[test]
    fn cached_and_walked_residues_agree() {
        let mut tree = Tree::new(record! { "n" => 0.0 });
        let mut tip = tree.root();
        for i in 1..=5 {
            tip = tree.add(record! { "n" => f64::from(i) }).unwrap();
        }
        // The tip is served from the memo; an interior node forces a walk.
        assert_eq!(tree.residue(tip).unwrap(), record! { "n" => 15.0 });
        let interior = tree.node_path(tip).unwrap()[3];
        assert_eq!(tree.residue(interior).unwrap(), record! { "n" => 6.0 });
    }

    #[test]
    fn rejected_add_changes_nothing() {
        let mut tree = Tree::new(record! { "n" => 0.0 });
        tree.add(record! { "n" => 1.0 }).unwrap();

        let before_nodes = tree.node_count();
        let before_tips = tree.branch_tips();
        let before_residue = tree.residue(tree.last()).unwrap();

        // A bool into a number has no rule; the reducer throws.
        let err = tree.add(record! { "n" => Value::Bool(true) }).unwrap_err();
        assert!(matches!(err, TreeError::Rejected { .. }));

        assert_eq!(tree.node_count(), before_nodes);
        assert_eq!(tree.branch_tips(), before_tips);
        assert_eq!(tree.residue(tree.last()).unwrap(), before_residue);
    }

    #[test]
    fn rejected_fork_changes_nothing() {
        let mut tree = Tree::new(record! { "n" => 0.0 });
        let a = tree.add(record! { "n" => 1.0 }).unwrap();
        tree.add(record! { "n" => 2.0 }).unwrap();

        let before = (tree.node_count(), tree.branches().len());
        let err = tree
            .add_to(record! { "n" => Value::Bool(true) }, a)
            .unwrap_err();
        assert!(matches!(err, TreeError::Rejected { .. }));
        assert_eq!((tree.node_count(), tree.branches().len()), before);
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut tree = Tree::new(record! {});
        let err = tree.add_to(record! {}, NodeId(99)).unwrap_err();
        assert!(matches!(err, TreeError::UnknownNode { id: 99 }));
        assert!(matches!(
            tree.residue(NodeId(7)),
            Err(TreeError::UnknownNode { id: 7 }),
        ));
    }

    #[test]
    fn custom_reducers_gate_admission() {
        // A reducer that only accepts growing numbers.
        let ascending = |residue: &Value, value: &Value| match (residue, value) {
            (Value::Number(a), Value::Number(b)) if b > a => Ok(Value::Number(*b)),
            _ => Err(CombineError::Rejected {
                reason: "values must ascend".to_string(),
            }),
        };

        let mut tree = Tree::with_reducer(Value::from(0.0), ascending);
        tree.add(Value::from(1.0)).unwrap();
        tree.add(Value::from(5.0)).unwrap();
        assert!(tree.add(Value::from(3.0)).is_err());
        assert_eq!(tree.residue(tree.last()).unwrap(), Value::from(5.0));
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn messages_gate_admission_through_the_cascade() {
        let dec = Handler::new("dec", |core: &Value, msg: &Message| {
            let count = core.get("count").and_then(Value::as_number).unwrap_or(0.0);
            if count <= 0.0 {
                return Err(CombineError::HandlerFailed {
                    name: "dec".to_string(),
                    reason: "count is exhausted".to_string(),
                });
            }
            let amount = msg
                .payload
                .get("amount")
                .and_then(Value::as_number)
                .unwrap_or(1.0);
            Ok(record! { "count" => -amount })
        });

        let mut tree = Tree::new(record! { "count" => 2.0 });
        tree.add(Value::Handler(dec)).unwrap();
        tree.add(Message::new("dec").into()).unwrap();
        tree.add(Message::new("dec").field("amount", 5.0).into()).unwrap();

        let residue = tree.residue(tree.last()).unwrap();
        assert_eq!(residue.get("count"), Some(&Value::from(-4.0)));

        // The exhausted counter now rejects further decrements, and the
        // rejected message never enters the log.
        let before = tree.node_count();
        assert!(tree.add(Message::new("dec").into()).is_err());
        assert_eq!(tree.node_count(), before);
    }
}
