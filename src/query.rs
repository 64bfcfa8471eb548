//! Composable tree queries.
//!
//! Every function takes an in-progress [`Select`] (start from
//! `M::Entity::find()`) plus a context node, attaches the tree-relationship
//! predicate, and returns the select untouched otherwise. Nothing here
//! executes; callers keep appending filters, orderings, or limits and decide
//! when to run the query.
//!
//! In multi-tree mode each node-contextual function also attaches the
//! `tree = node.tree` predicate; in single-tree mode the whole table is one
//! scope and the predicate is omitted.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};

use crate::config::TreeMode;
use crate::traits::NestedSetModel;

/// Predicate restricting a query to the tree `node` belongs to.
pub(crate) fn scope_condition<M: NestedSetModel>(node: &M) -> Condition {
    match M::nested_set_config().tree_mode() {
        TreeMode::Single => Condition::all(),
        TreeMode::Scoped { .. } => {
            let tree = node
                .tree_id()
                .expect("scoped model without a tree discriminator value");
            Condition::all().add(tree_column::<M>().eq(M::id_to_value(&tree)))
        }
    }
}

pub(crate) fn tree_column<M: NestedSetModel>() -> <M::Entity as EntityTrait>::Column {
    M::tree_column().expect("scoped model without a tree discriminator column")
}

/// Strict ancestors of `node`, outermost first.
pub fn ancestors<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(
            scope_condition(node)
                .add(M::lft_column().lt(node.lft()))
                .add(M::rgt_column().gt(node.rgt())),
        )
        .order_by_asc(M::lft_column())
}

/// Ancestors no more than `levels` above `node`.
pub fn ancestors_within<M: NestedSetModel>(
    query: Select<M::Entity>,
    node: &M,
    levels: i32,
) -> Select<M::Entity> {
    ancestors(query, node).filter(M::depth_column().gte(node.depth() - levels))
}

/// Strict descendants of `node` in tree order.
pub fn descendants<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(
            scope_condition(node)
                .add(M::lft_column().gt(node.lft()))
                .add(M::rgt_column().lt(node.rgt())),
        )
        .order_by_asc(M::lft_column())
}

/// Descendants no more than `levels` below `node`.
pub fn descendants_within<M: NestedSetModel>(
    query: Select<M::Entity>,
    node: &M,
    levels: i32,
) -> Select<M::Entity> {
    descendants(query, node).filter(M::depth_column().lte(node.depth() + levels))
}

/// Direct children of `node` in tree order.
pub fn children<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    descendants_within(query, node, 1)
}

/// Descendants of `node` that have no children themselves.
pub fn leaves<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    descendants(query, node)
        .filter(Expr::col(M::rgt_column()).eq(Expr::col(M::lft_column()).add(1)))
}

/// The sibling immediately to the left of `node`, if any.
pub fn prev_sibling<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(scope_condition(node).add(M::rgt_column().eq(node.lft() - 1)))
        .limit(1)
}

/// The sibling immediately to the right of `node`, if any.
pub fn next_sibling<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(scope_condition(node).add(M::lft_column().eq(node.rgt() + 1)))
        .limit(1)
}

/// Other children of `node`'s parent, in tree order.
///
/// Sibling membership needs the parent interval, which takes a round-trip to
/// resolve; pass the parent fetched beforehand (the repository's `siblings`
/// executor does both steps).
pub fn siblings<M: NestedSetModel>(
    query: Select<M::Entity>,
    node: &M,
    parent: &M,
) -> Select<M::Entity> {
    children(query, parent).filter(M::id_column().ne(M::id_to_value(&node.id())))
}

/// All root nodes. A single row in single-tree mode, one per tree otherwise.
pub fn roots<M: NestedSetModel>(query: Select<M::Entity>) -> Select<M::Entity> {
    query
        .filter(M::lft_column().eq(1))
        .order_by_asc(M::lft_column())
}

/// The root of `node`'s tree.
pub fn root_of<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(scope_condition(node).add(M::lft_column().eq(1)))
        .limit(1)
}

/// `node` together with all of its descendants, in tree order.
pub fn subtree<M: NestedSetModel>(query: Select<M::Entity>, node: &M) -> Select<M::Entity> {
    query
        .filter(
            scope_condition(node)
                .add(M::lft_column().gte(node.lft()))
                .add(M::rgt_column().lte(node.rgt())),
        )
        .order_by_asc(M::lft_column())
}

/// Nodes at the given depth, in tree order. Compose with [`in_tree`] to
/// restrict to one tree.
pub fn at_depth<M: NestedSetModel>(query: Select<M::Entity>, depth: i32) -> Select<M::Entity> {
    query
        .filter(M::depth_column().eq(depth))
        .order_by_asc(M::lft_column())
}

/// Nodes belonging to the tree with the given discriminator value.
///
/// Panics in single-tree mode, where no discriminator column exists.
pub fn in_tree<M: NestedSetModel>(query: Select<M::Entity>, tree: &M::Id) -> Select<M::Entity> {
    query.filter(tree_column::<M>().eq(M::id_to_value(tree)))
}
