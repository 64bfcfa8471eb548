//! SeaORM-centric nested set implementation.
//!
//! Hierarchies are stored in a single relational table by giving every node
//! an integer interval `lft..rgt` that contains exactly the intervals of its
//! descendants, plus a `depth` column. An optional discriminator column
//! partitions one table into many independent trees. Mutations (insert,
//! move, delete, promote) rewrite the interval columns inside one
//! transaction; reads are composable SeaORM selects.
//!
//! The public API is backend agnostic. On PostgreSQL, writers can
//! additionally be serialised per table with advisory locks; other backends
//! run plain transactions.

pub mod config;
pub mod error;
pub mod lock;
pub mod query;
pub mod repository;
pub mod traits;
pub mod tree;

pub mod prelude {
    //! Convenient re-exports for consumers.
    pub use crate::config::{
        AdvisoryLockStrategy, NestedSetConfig, NestedSetOptions, TreeMode,
    };
    pub use crate::repository::{NestedSetRepository, Position};
    pub use crate::traits::NestedSetModel;
}

pub use nested_set_macros::NestedSetModel as NestedSetModelDerive;
#[doc(hidden)]
pub use nested_set_macros::NestedSetModel;

pub use config::{
    AdvisoryLockKey, AdvisoryLockStrategy, NestedSetConfig, NestedSetOptions, TreeMode,
};
pub use error::NestedSetError;
pub use repository::{NestedSetRepository, Position};
pub use traits::NestedSetModel;
pub use tree::{
    build_tree, flatten_tree, indent, path_string, rebuild_from_hierarchy, validate_tree,
    Hierarchy, TreeDefect, TreeNode,
};
