use crc32fast::Hasher;

/// Static configuration describing how a SeaORM model lays out its
/// nested-set columns.
#[derive(Clone, Debug)]
pub struct NestedSetConfig {
    entity_name: String,
    lft_column: String,
    rgt_column: String,
    depth_column: String,
    name_column: String,
    tree_mode: TreeMode,
    advisory_lock_strategy: AdvisoryLockStrategy,
}

impl NestedSetConfig {
    /// Create a new configuration for the given logical entity name.
    pub fn new(entity_name: impl Into<String>) -> Self {
        let entity_name = entity_name.into();

        let default_lock =
            AdvisoryLockStrategy::Namespaced(AdvisoryLockKey::derived_from(&entity_name));

        Self {
            entity_name,
            lft_column: "lft".to_string(),
            rgt_column: "rgt".to_string(),
            depth_column: "depth".to_string(),
            name_column: "name".to_string(),
            tree_mode: TreeMode::Single,
            advisory_lock_strategy: default_lock,
        }
    }

    /// Merge options produced by [`NestedSetOptions`].
    pub(crate) fn apply_options(mut self, options: NestedSetOptions) -> Self {
        if let Some(lft_column) = options.lft_column {
            self.lft_column = lft_column;
        }
        if let Some(rgt_column) = options.rgt_column {
            self.rgt_column = rgt_column;
        }
        if let Some(depth_column) = options.depth_column {
            self.depth_column = depth_column;
        }
        if let Some(name_column) = options.name_column {
            self.name_column = name_column;
        }
        if let Some(tree_mode) = options.tree_mode {
            self.tree_mode = tree_mode;
        }
        if let Some(strategy) = options.advisory_lock_strategy {
            self.advisory_lock_strategy = strategy;
        }
        self
    }

    /// Human-readable Rust struct name for the entity.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Column name storing the left interval boundary.
    pub fn lft_column(&self) -> &str {
        &self.lft_column
    }

    /// Column name storing the right interval boundary.
    pub fn rgt_column(&self) -> &str {
        &self.rgt_column
    }

    /// Column name storing the ancestor count.
    pub fn depth_column(&self) -> &str {
        &self.depth_column
    }

    /// Column name storing the display name.
    pub fn name_column(&self) -> &str {
        &self.name_column
    }

    /// Whether the table holds one tree or many.
    pub fn tree_mode(&self) -> &TreeMode {
        &self.tree_mode
    }

    /// Advisory lock strategy (PostgreSQL only).
    pub fn advisory_lock_strategy(&self) -> &AdvisoryLockStrategy {
        &self.advisory_lock_strategy
    }
}

/// Builder-style options consumed by the derive macro.
#[derive(Clone, Debug, Default)]
pub struct NestedSetOptions {
    lft_column: Option<String>,
    rgt_column: Option<String>,
    depth_column: Option<String>,
    name_column: Option<String>,
    tree_mode: Option<TreeMode>,
    advisory_lock_strategy: Option<AdvisoryLockStrategy>,
}

impl NestedSetOptions {
    pub fn lft_column(mut self, value: impl Into<String>) -> Self {
        self.lft_column = Some(value.into());
        self
    }

    pub fn rgt_column(mut self, value: impl Into<String>) -> Self {
        self.rgt_column = Some(value.into());
        self
    }

    pub fn depth_column(mut self, value: impl Into<String>) -> Self {
        self.depth_column = Some(value.into());
        self
    }

    pub fn name_column(mut self, value: impl Into<String>) -> Self {
        self.name_column = Some(value.into());
        self
    }

    /// Enable multi-tree mode, discriminated by the given column.
    pub fn tree_column(mut self, column: impl Into<String>) -> Self {
        self.tree_mode = Some(TreeMode::scoped(column));
        self
    }

    pub fn advisory_lock_strategy(mut self, strategy: AdvisoryLockStrategy) -> Self {
        self.advisory_lock_strategy = Some(strategy);
        self
    }

    pub fn apply(self, base: NestedSetConfig) -> NestedSetConfig {
        base.apply_options(self)
    }
}

/// Whether the table stores a single tree or many independent trees.
///
/// Under `Scoped`, every node carries a value in the discriminator column
/// and interval containment is meaningful only between nodes with equal
/// discriminator values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TreeMode {
    Single,
    Scoped { column: String },
}

impl TreeMode {
    pub fn scoped(column: impl Into<String>) -> Self {
        Self::Scoped {
            column: column.into(),
        }
    }

    pub fn is_scoped(&self) -> bool {
        matches!(self, Self::Scoped { .. })
    }
}

/// Key used for PostgreSQL advisory locks.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AdvisoryLockKey(String);

impl AdvisoryLockKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn derived_from(entity: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(entity.as_bytes());
        let crc = hasher.finalize();
        Self(format!("nested-set::{entity}::{crc:x}"))
    }
}

/// Configuration describing how writers to one tree table are serialised.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AdvisoryLockStrategy {
    Disabled,
    Namespaced(AdvisoryLockKey),
}

impl AdvisoryLockStrategy {
    pub fn key(&self) -> Option<&AdvisoryLockKey> {
        match self {
            AdvisoryLockStrategy::Disabled => None,
            AdvisoryLockStrategy::Namespaced(key) => Some(key),
        }
    }
}
