use std::marker::PhantomData;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Value,
};

use crate::config::{NestedSetConfig, TreeMode};
use crate::error::NestedSetError;
use crate::lock::TransactionGuard;
use crate::query;
use crate::traits::NestedSetModel;

/// Placement of a node relative to a target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Position {
    /// First child of the target.
    Prepend,
    /// Last child of the target.
    Append,
    /// Left sibling of the target.
    Before,
    /// Right sibling of the target.
    After,
}

impl Position {
    fn is_sibling(self) -> bool {
        matches!(self, Position::Before | Position::After)
    }

    /// Destination `lft` and depth for a node placed at this position
    /// relative to `target`.
    fn destination<M: NestedSetModel>(self, target: &M) -> (i32, i32) {
        match self {
            Position::Prepend => (target.lft() + 1, target.depth() + 1),
            Position::Append => (target.rgt(), target.depth() + 1),
            Position::Before => (target.lft(), target.depth()),
            Position::After => (target.rgt() + 1, target.depth()),
        }
    }
}

/// One nested-set numbering domain: the whole table in single-tree mode,
/// one discriminator value otherwise.
enum Scope<M: NestedSetModel> {
    Whole,
    Tree(M::Id),
}

impl<M: NestedSetModel> Scope<M> {
    fn of(node: &M) -> Result<Self, NestedSetError> {
        match M::nested_set_config().tree_mode() {
            TreeMode::Single => Ok(Scope::Whole),
            TreeMode::Scoped { column } => node.tree_id().map(Scope::Tree).ok_or_else(|| {
                NestedSetError::invariant(format!("node has no value in tree column `{column}`"))
            }),
        }
    }

    fn condition(&self) -> Condition {
        match self {
            Scope::Whole => Condition::all(),
            Scope::Tree(id) => {
                Condition::all().add(query::tree_column::<M>().eq(M::id_to_value(id)))
            }
        }
    }
}

/// Repository exposing the nested-set operations for a given model.
///
/// Every mutation runs inside a single transaction, serialised by the
/// configured advisory lock on PostgreSQL; a failure at any statement rolls
/// the whole change back, so committed state always satisfies the interval
/// invariants.
#[derive(Debug, Default)]
pub struct NestedSetRepository<M>
where
    M: NestedSetModel,
{
    _marker: PhantomData<M>,
}

impl<M> NestedSetRepository<M>
where
    M: NestedSetModel,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn config(&self) -> &'static NestedSetConfig {
        M::nested_set_config()
    }

    /// Create the first root (single-tree mode) or an independent new root
    /// (multi-tree mode).
    ///
    /// The node is inserted with `lft = 1, rgt = 2, depth = 0`; in
    /// multi-tree mode its discriminator is then set to the fresh primary
    /// key in a second statement and the row is re-read.
    pub async fn make_root(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
    ) -> Result<M, NestedSetError> {
        let guard = TransactionGuard::begin(self.config().advisory_lock_strategy(), db).await?;
        let result = self.make_root_on(guard.connection(), node).await;
        finish(guard, result).await
    }

    /// Insert an unpersisted node, or move a persisted one, to become the
    /// first child of `target`.
    pub async fn prepend_to(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
        target: &M,
    ) -> Result<M, NestedSetError> {
        self.place(db, node, target, Position::Prepend).await
    }

    /// Insert an unpersisted node, or move a persisted one, to become the
    /// last child of `target`.
    pub async fn append_to(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
        target: &M,
    ) -> Result<M, NestedSetError> {
        self.place(db, node, target, Position::Append).await
    }

    /// Insert an unpersisted node, or move a persisted one, to become the
    /// left sibling of `target`.
    pub async fn insert_before(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
        target: &M,
    ) -> Result<M, NestedSetError> {
        self.place(db, node, target, Position::Before).await
    }

    /// Insert an unpersisted node, or move a persisted one, to become the
    /// right sibling of `target`.
    pub async fn insert_after(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
        target: &M,
    ) -> Result<M, NestedSetError> {
        self.place(db, node, target, Position::After).await
    }

    /// Place `node` relative to `target`.
    ///
    /// Dispatches on the node's primary key: `NotSet` means a fresh insert,
    /// anything else moves the existing subtree (within or across trees).
    pub async fn place(
        &self,
        db: &DatabaseConnection,
        node: M::ActiveModel,
        target: &M,
        position: Position,
    ) -> Result<M, NestedSetError> {
        let guard = TransactionGuard::begin(self.config().advisory_lock_strategy(), db).await?;
        let result = self.place_on(guard.connection(), node, target, position).await;
        finish(guard, result).await
    }

    /// Delete `node` together with its whole subtree. Returns the number of
    /// rows removed.
    pub async fn delete_with_children(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<u64, NestedSetError> {
        let guard = TransactionGuard::begin(self.config().advisory_lock_strategy(), db).await?;
        let result = self.delete_with_children_on(guard.connection(), node).await;
        finish(guard, result).await
    }

    /// Delete `node` alone, promoting its children one level up into the
    /// vacated position. Returns the deleted row.
    ///
    /// A root that still has children cannot be removed this way; an empty
    /// root can.
    pub async fn delete_node(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<M, NestedSetError> {
        let guard = TransactionGuard::begin(self.config().advisory_lock_strategy(), db).await?;
        let result = self.delete_node_on(guard.connection(), node).await;
        finish(guard, result).await
    }

    /// Detach `node`'s subtree into an independent tree whose discriminator
    /// becomes the node's primary key. Multi-tree mode only.
    pub async fn make_root_from(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<M, NestedSetError> {
        let guard = TransactionGuard::begin(self.config().advisory_lock_strategy(), db).await?;
        let result = self.make_root_from_on(guard.connection(), node).await;
        finish(guard, result).await
    }

    async fn make_root_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        mut node: M::ActiveModel,
    ) -> Result<M, NestedSetError> {
        if !self.config().tree_mode().is_scoped() {
            let existing = M::Entity::find()
                .filter(M::lft_column().eq(1))
                .one(conn)
                .await?;
            if existing.is_some() {
                return Err(NestedSetError::RootAlreadyExists);
            }
        }

        node.set(M::lft_column(), Value::from(1));
        node.set(M::rgt_column(), Value::from(2));
        node.set(M::depth_column(), Value::from(0));
        let inserted = node.insert(conn).await?;

        if self.config().tree_mode().is_scoped() {
            let pk = inserted.id();
            M::Entity::update_many()
                .filter(M::id_column().eq(M::id_to_value(&pk)))
                .col_expr(query::tree_column::<M>(), Expr::value(M::id_to_value(&pk)))
                .exec(conn)
                .await?;
            return self.refreshed(conn, &pk).await;
        }

        Ok(inserted)
    }

    async fn place_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        node: M::ActiveModel,
        target: &M,
        position: Position,
    ) -> Result<M, NestedSetError> {
        let target = M::Entity::find()
            .filter(M::id_column().eq(M::id_to_value(&target.id())))
            .one(conn)
            .await?
            .ok_or(NestedSetError::TargetNotPersisted)?;

        match node.get(M::id_column()) {
            ActiveValue::NotSet => self.insert_at(conn, node, &target, position).await,
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => {
                self.move_to(conn, id, &target, position).await
            }
        }
    }

    async fn insert_at<C: ConnectionTrait>(
        &self,
        conn: &C,
        mut node: M::ActiveModel,
        target: &M,
        position: Position,
    ) -> Result<M, NestedSetError> {
        if position.is_sibling() && target.is_root() {
            return Err(NestedSetError::CannotInsertBeforeRoot);
        }

        let scope = Scope::of(target)?;
        let (dest_lft, depth) = position.destination(target);

        self.shift(conn, &scope, dest_lft, 2).await?;

        node.set(M::lft_column(), Value::from(dest_lft));
        node.set(M::rgt_column(), Value::from(dest_lft + 1));
        node.set(M::depth_column(), Value::from(depth));
        if let Scope::Tree(tree) = &scope {
            node.set(query::tree_column::<M>(), M::id_to_value(tree));
        }

        Ok(node.insert(conn).await?)
    }

    async fn move_to<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Value,
        target: &M,
        position: Position,
    ) -> Result<M, NestedSetError> {
        let node = M::Entity::find()
            .filter(M::id_column().eq(id))
            .one(conn)
            .await?
            .ok_or(NestedSetError::NotFound)?;

        if node.id() == target.id() {
            return Err(NestedSetError::CannotMoveToItself);
        }
        if position.is_sibling() && target.is_root() {
            return Err(NestedSetError::CannotMoveBeforeAfterRoot);
        }
        if target.is_descendant_of(&node) {
            return Err(NestedSetError::CannotMoveToDescendant);
        }

        let source_scope = Scope::of(&node)?;
        let target_scope = Scope::of(target)?;
        let same_scope = match (&source_scope, &target_scope) {
            (Scope::Whole, Scope::Whole) => true,
            (Scope::Tree(source), Scope::Tree(dest)) => source == dest,
            _ => false,
        };

        let width = node.rgt() - node.lft() + 1;
        let (dest_lft, new_depth) = position.destination(target);

        self.shift(conn, &target_scope, dest_lft, width).await?;

        // The opening shift moved the source interval too when it sits at
        // or past the destination in the same scope.
        let (src_lft, src_rgt) = if same_scope && node.lft() >= dest_lft {
            (node.lft() + width, node.rgt() + width)
        } else {
            (node.lft(), node.rgt())
        };

        let distance = dest_lft - src_lft;
        let depth_change = new_depth - node.depth();

        let mut relocate = M::Entity::update_many()
            .filter(
                source_scope
                    .condition()
                    .add(M::lft_column().gte(src_lft))
                    .add(M::rgt_column().lte(src_rgt)),
            )
            .col_expr(M::lft_column(), Expr::col(M::lft_column()).add(distance))
            .col_expr(M::rgt_column(), Expr::col(M::rgt_column()).add(distance))
            .col_expr(
                M::depth_column(),
                Expr::col(M::depth_column()).add(depth_change),
            );
        if !same_scope {
            if let Scope::Tree(tree) = &target_scope {
                relocate =
                    relocate.col_expr(query::tree_column::<M>(), Expr::value(M::id_to_value(tree)));
            }
        }
        relocate.exec(conn).await?;

        self.shift(conn, &source_scope, src_rgt + 1, -width).await?;

        self.refreshed(conn, &node.id()).await
    }

    async fn delete_with_children_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        node: &M,
    ) -> Result<u64, NestedSetError> {
        let node = self.refreshed(conn, &node.id()).await?;
        let scope = Scope::of(&node)?;
        let (lft, rgt) = (node.lft(), node.rgt());

        let deleted = M::Entity::delete_many()
            .filter(
                scope
                    .condition()
                    .add(M::lft_column().gte(lft))
                    .add(M::rgt_column().lte(rgt)),
            )
            .exec(conn)
            .await?;

        self.shift(conn, &scope, rgt + 1, -(rgt - lft + 1)).await?;

        Ok(deleted.rows_affected)
    }

    async fn delete_node_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        node: &M,
    ) -> Result<M, NestedSetError> {
        let node = self.refreshed(conn, &node.id()).await?;
        if node.is_root() && !node.is_leaf() {
            return Err(NestedSetError::CannotDeleteRoot);
        }

        let scope = Scope::of(&node)?;
        let (lft, rgt) = (node.lft(), node.rgt());

        M::Entity::delete_many()
            .filter(M::id_column().eq(M::id_to_value(&node.id())))
            .exec(conn)
            .await?;

        if rgt - lft > 1 {
            // Children move one step left and one level up, covering the
            // removed outer boundary.
            M::Entity::update_many()
                .filter(
                    scope
                        .condition()
                        .add(M::lft_column().gt(lft))
                        .add(M::rgt_column().lt(rgt)),
                )
                .col_expr(M::lft_column(), Expr::col(M::lft_column()).sub(1))
                .col_expr(M::rgt_column(), Expr::col(M::rgt_column()).sub(1))
                .col_expr(M::depth_column(), Expr::col(M::depth_column()).sub(1))
                .exec(conn)
                .await?;
        }

        self.shift(conn, &scope, rgt + 1, -2).await?;

        Ok(node)
    }

    async fn make_root_from_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        node: &M,
    ) -> Result<M, NestedSetError> {
        if !self.config().tree_mode().is_scoped() {
            return Err(NestedSetError::TreeRequired);
        }

        let node = self.refreshed(conn, &node.id()).await?;
        if node.is_root() {
            return Err(NestedSetError::AlreadyRoot);
        }

        let old_scope = Scope::of(&node)?;
        let (lft, rgt, depth) = (node.lft(), node.rgt(), node.depth());
        let width = rgt - lft + 1;
        let pk = node.id();

        M::Entity::update_many()
            .filter(
                old_scope
                    .condition()
                    .add(M::lft_column().gte(lft))
                    .add(M::rgt_column().lte(rgt)),
            )
            .col_expr(M::lft_column(), Expr::col(M::lft_column()).add(1 - lft))
            .col_expr(M::rgt_column(), Expr::col(M::rgt_column()).add(1 - lft))
            .col_expr(M::depth_column(), Expr::col(M::depth_column()).sub(depth))
            .col_expr(query::tree_column::<M>(), Expr::value(M::id_to_value(&pk)))
            .exec(conn)
            .await?;

        // The subtree is already out of the old scope, so closing the gap
        // cannot touch it.
        self.shift(conn, &old_scope, rgt + 1, -width).await?;

        self.refreshed(conn, &pk).await
    }

    /// Open (`delta > 0`) or close (`delta < 0`) a gap: every `lft >= start`
    /// and every `rgt >= start` in the scope moves by `delta`. Two
    /// statements, because the two predicates differ.
    async fn shift<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &Scope<M>,
        start: i32,
        delta: i32,
    ) -> Result<(), NestedSetError> {
        M::Entity::update_many()
            .filter(scope.condition().add(M::lft_column().gte(start)))
            .col_expr(M::lft_column(), Expr::col(M::lft_column()).add(delta))
            .exec(conn)
            .await?;
        M::Entity::update_many()
            .filter(scope.condition().add(M::rgt_column().gte(start)))
            .col_expr(M::rgt_column(), Expr::col(M::rgt_column()).add(delta))
            .exec(conn)
            .await?;
        Ok(())
    }

    async fn refreshed<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &M::Id,
    ) -> Result<M, NestedSetError> {
        M::Entity::find()
            .filter(M::id_column().eq(M::id_to_value(id)))
            .one(conn)
            .await?
            .ok_or(NestedSetError::NotFound)
    }

    /// Direct parent, or `None` for a root.
    pub async fn parent(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Option<M>, NestedSetError> {
        let parent = query::ancestors_within(M::Entity::find(), node, 1)
            .one(db)
            .await?;
        Ok(parent)
    }

    /// Strict ancestors, outermost first.
    pub async fn ancestors(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        let rows = query::ancestors(M::Entity::find(), node).all(db).await?;
        Ok(rows)
    }

    /// Direct children in tree order.
    pub async fn children(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        let rows = query::children(M::Entity::find(), node).all(db).await?;
        Ok(rows)
    }

    /// Strict descendants in tree order.
    pub async fn descendants(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        let rows = query::descendants(M::Entity::find(), node).all(db).await?;
        Ok(rows)
    }

    /// The node and its descendants in tree order.
    pub async fn self_and_descendants(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        let rows = query::subtree(M::Entity::find(), node).all(db).await?;
        Ok(rows)
    }

    /// Descendants that have no children themselves.
    pub async fn leaves(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        let rows = query::leaves(M::Entity::find(), node).all(db).await?;
        Ok(rows)
    }

    /// Other children of the node's parent. Empty for a root.
    pub async fn siblings(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Vec<M>, NestedSetError> {
        match self.parent(db, node).await? {
            Some(parent) => {
                let rows = query::siblings(M::Entity::find(), node, &parent)
                    .all(db)
                    .await?;
                Ok(rows)
            }
            None => Ok(Vec::new()),
        }
    }

    /// The sibling immediately to the left, if any.
    pub async fn prev_sibling(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Option<M>, NestedSetError> {
        let row = query::prev_sibling(M::Entity::find(), node).one(db).await?;
        Ok(row)
    }

    /// The sibling immediately to the right, if any.
    pub async fn next_sibling(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Option<M>, NestedSetError> {
        let row = query::next_sibling(M::Entity::find(), node).one(db).await?;
        Ok(row)
    }

    /// All roots: one row in single-tree mode, one per tree otherwise.
    pub async fn roots(&self, db: &DatabaseConnection) -> Result<Vec<M>, NestedSetError> {
        let rows = query::roots::<M>(M::Entity::find()).all(db).await?;
        Ok(rows)
    }

    /// The root of the node's tree.
    pub async fn root_of(
        &self,
        db: &DatabaseConnection,
        node: &M,
    ) -> Result<Option<M>, NestedSetError> {
        let row = query::root_of(M::Entity::find(), node).one(db).await?;
        Ok(row)
    }
}

async fn finish<T>(
    guard: TransactionGuard,
    result: Result<T, NestedSetError>,
) -> Result<T, NestedSetError> {
    match result {
        Ok(value) => {
            guard.commit().await?;
            Ok(value)
        }
        Err(err) => {
            let _ = guard.rollback().await;
            Err(err)
        }
    }
}
