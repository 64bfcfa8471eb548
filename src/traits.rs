use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel, Value,
};

use crate::config::{NestedSetConfig, TreeMode};

/// Trait implemented by SeaORM `Model` types stored as nested sets.
///
/// Each node owns an integer interval `[lft, rgt]` that contains exactly the
/// intervals of its descendants, plus a `depth` counting its strict
/// ancestors. The interval and depth columns belong to the mutation engine;
/// callers update payload columns only.
///
/// Implementations are normally provided by the `#[derive(NestedSetModel)]`
/// macro.
pub trait NestedSetModel:
    Clone + Send + Sync + 'static + IntoActiveModel<Self::ActiveModel> + FromQueryResult
{
    type Entity: EntityTrait<Model = Self>;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;
    type Id: Clone + PartialEq + Send + Sync + 'static;

    fn nested_set_config() -> &'static NestedSetConfig;

    fn id(&self) -> Self::Id;
    fn id_to_value(id: &Self::Id) -> Value;

    /// Left boundary of the node's interval.
    fn lft(&self) -> i32;
    /// Right boundary of the node's interval.
    fn rgt(&self) -> i32;
    /// Number of strict ancestors.
    fn depth(&self) -> i32;
    /// Tree discriminator value; `None` when the model is in single-tree mode.
    fn tree_id(&self) -> Option<Self::Id>;

    fn name(&self) -> &str;

    fn id_column() -> <Self::Entity as EntityTrait>::Column;
    fn lft_column() -> <Self::Entity as EntityTrait>::Column;
    fn rgt_column() -> <Self::Entity as EntityTrait>::Column;
    fn depth_column() -> <Self::Entity as EntityTrait>::Column;
    fn name_column() -> <Self::Entity as EntityTrait>::Column;
    /// Tree discriminator column; `None` in single-tree mode.
    fn tree_column() -> Option<<Self::Entity as EntityTrait>::Column>;

    /// `true` when this node is the root of its tree.
    fn is_root(&self) -> bool {
        self.lft() == 1
    }

    /// `true` when this node has no children.
    fn is_leaf(&self) -> bool {
        self.rgt() - self.lft() == 1
    }

    /// Number of nodes strictly inside this node's interval.
    fn descendant_count(&self) -> i32 {
        (self.rgt() - self.lft() - 1) / 2
    }

    /// `true` when this node lies strictly inside `other`'s interval.
    ///
    /// In multi-tree mode containment only counts within the same tree.
    fn is_descendant_of(&self, other: &Self) -> bool {
        let contained = self.lft() > other.lft() && self.rgt() < other.rgt();
        match Self::nested_set_config().tree_mode() {
            TreeMode::Single => contained,
            TreeMode::Scoped { .. } => contained && self.tree_id() == other.tree_id(),
        }
    }

    /// `true` when `other` is this node's direct parent.
    fn is_child_of(&self, other: &Self) -> bool {
        self.is_descendant_of(other) && self.depth() == other.depth() + 1
    }
}
