use thiserror::Error;

/// Errors returned by the nested-set APIs.
#[derive(Debug, Error)]
pub enum NestedSetError {
    #[error("a root node already exists")]
    RootAlreadyExists,

    #[error("node is already a root")]
    AlreadyRoot,

    #[error("operation requires a tree discriminator column")]
    TreeRequired,

    #[error("cannot insert a node before or after a root")]
    CannotInsertBeforeRoot,

    #[error("cannot move a node before or after a root")]
    CannotMoveBeforeAfterRoot,

    #[error("cannot move a node relative to itself")]
    CannotMoveToItself,

    #[error("cannot move a node into its own subtree")]
    CannotMoveToDescendant,

    #[error("cannot delete a root that still has children")]
    CannotDeleteRoot,

    #[error("target node has not been persisted")]
    TargetNotPersisted,

    #[error("node does not exist")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("nested-set invariant violation: {0}")]
    Invariant(String),
}

impl NestedSetError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }
}
