//! In-memory helpers: flat/nested conversions, rendering, integrity
//! validation, and computing interval coordinates from a nested literal.
//!
//! Nothing here touches the database; every function works on rows the
//! caller already loaded.

use std::fmt;

use crate::config::TreeMode;
use crate::traits::NestedSetModel;

/// A node together with its children, produced by [`build_tree`].
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode<M> {
    pub node: M,
    pub children: Vec<TreeNode<M>>,
}

/// Group a flat set of rows into nested [`TreeNode`]s.
///
/// Rows are sorted by `lft`; a node's children are the contiguous run of
/// following rows whose `rgt` stays below its own. In multi-tree mode the
/// input is partitioned by discriminator first, so one call may return
/// several independent roots.
pub fn build_tree<M: NestedSetModel>(nodes: &[M]) -> Vec<TreeNode<M>> {
    let mut out = Vec::new();
    for mut group in scope_groups(nodes) {
        group.sort_by_key(NestedSetModel::lft);
        out.extend(group_nested(&group));
    }
    out
}

fn group_nested<M: NestedSetModel>(nodes: &[M]) -> Vec<TreeNode<M>> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < nodes.len() {
        let rgt = nodes[start].rgt();
        let mut end = start + 1;
        while end < nodes.len() && nodes[end].rgt() < rgt {
            end += 1;
        }
        out.push(TreeNode {
            node: nodes[start].clone(),
            children: group_nested(&nodes[start + 1..end]),
        });
        start = end;
    }
    out
}

fn scope_groups<M: NestedSetModel>(nodes: &[M]) -> Vec<Vec<M>> {
    match M::nested_set_config().tree_mode() {
        TreeMode::Single => vec![nodes.to_vec()],
        TreeMode::Scoped { .. } => {
            let mut groups: Vec<(Option<M::Id>, Vec<M>)> = Vec::new();
            for node in nodes {
                let tree = node.tree_id();
                match groups.iter_mut().find(|(group_tree, _)| *group_tree == tree) {
                    Some((_, group)) => group.push(node.clone()),
                    None => groups.push((tree, vec![node.clone()])),
                }
            }
            groups.into_iter().map(|(_, group)| group).collect()
        }
    }
}

/// Pre-order traversal of nested nodes producing `(node, depth)` pairs,
/// with depth counted from the given roots.
pub fn flatten_tree<M: Clone>(roots: &[TreeNode<M>]) -> Vec<(M, usize)> {
    let mut out = Vec::new();
    flatten_into(roots, 0, &mut out);
    out
}

fn flatten_into<M: Clone>(nodes: &[TreeNode<M>], depth: usize, out: &mut Vec<(M, usize)>) {
    for tree_node in nodes {
        out.push((tree_node.node.clone(), depth));
        flatten_into(&tree_node.children, depth + 1, out);
    }
}

/// Render the path from the outermost ancestor down to `node` using the
/// model's configured name field.
pub fn path_string<M: NestedSetModel>(node: &M, ancestors: &[M], separator: &str) -> String {
    let mut segments: Vec<&str> = ancestors.iter().map(NestedSetModel::name).collect();
    segments.push(node.name());
    segments.join(separator)
}

/// `indent_str` repeated once per level, then `prefix`. Roots render empty.
pub fn indent<M: NestedSetModel>(node: &M, indent_str: &str, prefix: &str) -> String {
    if node.depth() == 0 {
        return String::new();
    }
    let mut out = indent_str.repeat(node.depth() as usize);
    out.push_str(prefix);
    out
}

/// Structural defect reported by [`validate_tree`].
#[derive(Clone, Debug, PartialEq)]
pub enum TreeDefect<M> {
    /// `lft` is not strictly below `rgt`.
    InvalidBounds(M),
    /// The node's interval straddles a preceding interval without being
    /// contained by it.
    Overlap(M),
    /// Stored depth disagrees with the number of open ancestors.
    WrongDepth { node: M, expected: i32 },
}

impl<M: NestedSetModel> fmt::Display for TreeDefect<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeDefect::InvalidBounds(node) => {
                write!(f, "invalid interval: lft {} >= rgt {}", node.lft(), node.rgt())
            }
            TreeDefect::Overlap(node) => write!(
                f,
                "interval [{}, {}] overlaps a preceding interval without containment",
                node.lft(),
                node.rgt()
            ),
            TreeDefect::WrongDepth { node, expected } => write!(
                f,
                "depth {} at interval [{}, {}], expected {}",
                node.depth(),
                node.lft(),
                node.rgt(),
                expected
            ),
        }
    }
}

impl<M: NestedSetModel + fmt::Debug> std::error::Error for TreeDefect<M> {}

/// Check interval and depth integrity of loaded rows.
///
/// Sweeps each tree scope sorted by `lft`, keeping a stack of open
/// intervals: entries are popped once passed, the top must contain the
/// current interval, and the stack size must equal the stored depth. The
/// first defect found is returned.
pub fn validate_tree<M: NestedSetModel>(nodes: &[M]) -> Result<(), TreeDefect<M>> {
    for mut group in scope_groups(nodes) {
        group.sort_by_key(NestedSetModel::lft);
        validate_scope(&group)?;
    }
    Ok(())
}

fn validate_scope<M: NestedSetModel>(nodes: &[M]) -> Result<(), TreeDefect<M>> {
    let mut open: Vec<i32> = Vec::new();
    for node in nodes {
        if node.lft() >= node.rgt() {
            return Err(TreeDefect::InvalidBounds(node.clone()));
        }
        while open.last().is_some_and(|rgt| *rgt < node.lft()) {
            open.pop();
        }
        if let Some(rgt) = open.last() {
            if *rgt < node.rgt() {
                return Err(TreeDefect::Overlap(node.clone()));
            }
        }
        let expected = open.len() as i32;
        if node.depth() != expected {
            return Err(TreeDefect::WrongDepth {
                node: node.clone(),
                expected,
            });
        }
        open.push(node.rgt());
    }
    Ok(())
}

/// Nested literal consumed by [`rebuild_from_hierarchy`].
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy<T> {
    pub value: T,
    pub children: Vec<Hierarchy<T>>,
}

impl<T> Hierarchy<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    pub fn with_children(value: T, children: Vec<Hierarchy<T>>) -> Self {
        Self { value, children }
    }
}

/// Compute `(payload, lft, rgt, depth)` rows from a nested literal.
///
/// A depth-first walk assigns `lft` on the way in and `rgt` on the way out
/// from one increasing counter, so the emitted rows satisfy the interval
/// invariants and can seed a fresh tree. Rows come out in post-order;
/// leaves get `rgt = lft + 1`.
pub fn rebuild_from_hierarchy<T>(root: Hierarchy<T>) -> Vec<(T, i32, i32, i32)> {
    let mut out = Vec::new();
    let mut counter = 1;
    emit_rows(root, &mut counter, 0, &mut out);
    out
}

fn emit_rows<T>(
    node: Hierarchy<T>,
    counter: &mut i32,
    depth: i32,
    out: &mut Vec<(T, i32, i32, i32)>,
) {
    let lft = *counter;
    for child in node.children {
        *counter += 1;
        emit_rows(child, counter, depth + 1, out);
    }
    *counter += 1;
    let rgt = *counter;
    out.push((node.value, lft, rgt, depth));
}
