#![allow(dead_code)]

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait,
    QueryOrder, Statement,
};

pub mod single {
    pub mod node {
        use nested_set::NestedSetModelDerive as NestedSetModel;
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel, NestedSetModel)]
        #[sea_orm(table_name = "nodes")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub name: String,
            pub lft: i32,
            pub rgt: i32,
            pub depth: i32,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

pub mod scoped {
    pub mod taxon {
        use nested_set::NestedSetModelDerive as NestedSetModel;
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel, NestedSetModel)]
        #[sea_orm(table_name = "taxons")]
        #[nested_set(tree_field = "tree_id")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub name: String,
            pub lft: i32,
            pub rgt: i32,
            pub depth: i32,
            pub tree_id: i32,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

pub async fn setup_database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"
        CREATE TABLE nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            lft INTEGER NOT NULL,
            rgt INTEGER NOT NULL,
            depth INTEGER NOT NULL
        );
        "#,
    ))
    .await
    .expect("create nodes table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"
        CREATE TABLE taxons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            lft INTEGER NOT NULL,
            rgt INTEGER NOT NULL,
            depth INTEGER NOT NULL,
            tree_id INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ))
    .await
    .expect("create taxons table");

    db
}

pub fn node(name: &str) -> single::node::ActiveModel {
    single::node::ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_owned()),
        ..Default::default()
    }
}

pub fn taxon(name: &str) -> scoped::taxon::ActiveModel {
    scoped::taxon::ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_owned()),
        ..Default::default()
    }
}

/// `(name, lft, rgt, depth)` rows of the single-tree table in tree order.
pub async fn snapshot(db: &DatabaseConnection) -> Vec<(String, i32, i32, i32)> {
    single::node::Entity::find()
        .order_by_asc(single::node::Column::Lft)
        .all(db)
        .await
        .expect("load nodes")
        .into_iter()
        .map(|n| (n.name, n.lft, n.rgt, n.depth))
        .collect()
}

pub async fn node_by_name(db: &DatabaseConnection, name: &str) -> single::node::Model {
    use sea_orm::ColumnTrait;
    use sea_orm::QueryFilter;

    single::node::Entity::find()
        .filter(single::node::Column::Name.eq(name))
        .one(db)
        .await
        .expect("load node")
        .unwrap_or_else(|| panic!("no node named {name}"))
}

pub async fn taxon_by_name(db: &DatabaseConnection, name: &str) -> scoped::taxon::Model {
    use sea_orm::ColumnTrait;
    use sea_orm::QueryFilter;

    scoped::taxon::Entity::find()
        .filter(scoped::taxon::Column::Name.eq(name))
        .one(db)
        .await
        .expect("load taxon")
        .unwrap_or_else(|| panic!("no taxon named {name}"))
}

/// `(name, lft, rgt, depth, tree_id)` rows of the multi-tree table, grouped
/// by tree and in tree order within each group.
pub async fn taxon_snapshot(db: &DatabaseConnection) -> Vec<(String, i32, i32, i32, i32)> {
    scoped::taxon::Entity::find()
        .order_by_asc(scoped::taxon::Column::TreeId)
        .order_by_asc(scoped::taxon::Column::Lft)
        .all(db)
        .await
        .expect("load taxons")
        .into_iter()
        .map(|t| (t.name, t.lft, t.rgt, t.depth, t.tree_id))
        .collect()
}

/// Assert that the boundaries of `rows` cover `1..=2N` exactly once each.
pub fn assert_contiguous(bounds: &[(i32, i32)]) {
    let mut seen: Vec<i32> = bounds.iter().flat_map(|(lft, rgt)| [*lft, *rgt]).collect();
    seen.sort_unstable();
    let expected: Vec<i32> = (1..=bounds.len() as i32 * 2).collect();
    assert_eq!(seen, expected, "boundaries are not contiguous");
}
