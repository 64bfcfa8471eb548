mod common;

use common::scoped::taxon;
use common::single::node;
use nested_set::{
    build_tree, flatten_tree, indent, path_string, rebuild_from_hierarchy, validate_tree,
    Hierarchy, NestedSetModel, TreeDefect,
};

fn row(id: i32, name: &str, lft: i32, rgt: i32, depth: i32) -> node::Model {
    node::Model {
        id,
        name: name.to_owned(),
        lft,
        rgt,
        depth,
    }
}

fn taxon_row(id: i32, name: &str, lft: i32, rgt: i32, depth: i32, tree_id: i32) -> taxon::Model {
    taxon::Model {
        id,
        name: name.to_owned(),
        lft,
        rgt,
        depth,
        tree_id,
    }
}

/// `R -> [A -> [A1, A2], B]` as flat rows, deliberately out of order.
fn family() -> Vec<node::Model> {
    vec![
        row(3, "A1", 3, 4, 2),
        row(1, "R", 1, 10, 0),
        row(5, "B", 8, 9, 1),
        row(2, "A", 2, 7, 1),
        row(4, "A2", 5, 6, 2),
    ]
}

#[test]
fn build_tree_groups_descendants_under_their_parents() {
    let roots = build_tree(&family());

    assert_eq!(roots.len(), 1);
    let root = &roots[0];
    assert_eq!(root.node.name, "R");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].node.name, "A");
    assert_eq!(root.children[1].node.name, "B");

    let a_children: Vec<&str> = root.children[0]
        .children
        .iter()
        .map(|c| c.node.name.as_str())
        .collect();
    assert_eq!(a_children, vec!["A1", "A2"]);
}

#[test]
fn flatten_tree_restores_tree_order_and_depths() {
    let flattened = flatten_tree(&build_tree(&family()));

    let pairs: Vec<(&str, usize)> = flattened
        .iter()
        .map(|(n, depth)| (n.name.as_str(), *depth))
        .collect();
    assert_eq!(
        pairs,
        vec![("R", 0), ("A", 1), ("A1", 2), ("A2", 2), ("B", 1)]
    );

    for (node, depth) in &flattened {
        assert_eq!(node.depth as usize, *depth);
    }
}

#[test]
fn build_tree_separates_scopes() {
    let rows = vec![
        taxon_row(1, "Electronics", 1, 4, 0, 1),
        taxon_row(2, "Computers", 2, 3, 1, 1),
        taxon_row(3, "Furniture", 1, 2, 0, 3),
    ];

    let roots = build_tree(&rows);
    let names: Vec<&str> = roots.iter().map(|r| r.node.name.as_str()).collect();
    assert_eq!(names, vec!["Electronics", "Furniture"]);
    assert_eq!(roots[0].children[0].node.name, "Computers");
}

#[test]
fn validate_tree_accepts_a_well_formed_scope() {
    assert!(validate_tree(&family()).is_ok());
}

#[test]
fn validate_tree_reports_straddling_intervals() {
    let rows = vec![row(1, "X", 1, 4, 0), row(2, "Y", 3, 6, 0)];
    match validate_tree(&rows) {
        Err(TreeDefect::Overlap(node)) => assert_eq!((node.lft, node.rgt), (3, 6)),
        other => panic!("expected overlap, got {other:?}"),
    }
}

#[test]
fn validate_tree_reports_wrong_depths() {
    let rows = vec![row(1, "X", 1, 4, 0), row(2, "Y", 2, 3, 2)];
    match validate_tree(&rows) {
        Err(TreeDefect::WrongDepth { node, expected }) => {
            assert_eq!(node.name, "Y");
            assert_eq!(expected, 1);
        }
        other => panic!("expected wrong depth, got {other:?}"),
    }
}

#[test]
fn validate_tree_reports_inverted_bounds() {
    let rows = vec![row(1, "X", 5, 4, 0)];
    match validate_tree(&rows) {
        Err(TreeDefect::InvalidBounds(node)) => assert_eq!((node.lft, node.rgt), (5, 4)),
        other => panic!("expected invalid bounds, got {other:?}"),
    }
}

#[test]
fn rebuild_from_hierarchy_numbers_a_nested_literal() {
    let literal = Hierarchy::with_children(
        "R",
        vec![
            Hierarchy::with_children("A", vec![Hierarchy::new("A1"), Hierarchy::new("A2")]),
            Hierarchy::new("B"),
        ],
    );

    let rows = rebuild_from_hierarchy(literal);
    assert_eq!(
        rows,
        vec![
            ("A1", 3, 4, 2),
            ("A2", 5, 6, 2),
            ("A", 2, 7, 1),
            ("B", 8, 9, 1),
            ("R", 1, 10, 0),
        ]
    );

    // The emitted coordinates must form a valid tree themselves.
    let models: Vec<node::Model> = rows
        .iter()
        .enumerate()
        .map(|(i, (name, lft, rgt, depth))| row(i as i32 + 1, name, *lft, *rgt, *depth))
        .collect();
    assert!(validate_tree(&models).is_ok());
}

#[test]
fn indent_renders_per_depth() {
    assert_eq!(indent(&row(1, "R", 1, 10, 0), "  ", "- "), "");
    assert_eq!(indent(&row(2, "A", 2, 7, 1), "  ", "- "), "  - ");
    assert_eq!(indent(&row(3, "A1", 3, 4, 2), "  ", "- "), "    - ");
}

#[test]
fn path_string_joins_ancestors_and_node() {
    let ancestors = vec![row(1, "R", 1, 10, 0), row(2, "A", 2, 7, 1)];
    let leaf = row(3, "A1", 3, 4, 2);
    assert_eq!(path_string(&leaf, &ancestors, " / "), "R / A / A1");
    assert_eq!(path_string(&ancestors[0], &[], " / "), "R");
}

#[test]
fn interval_predicates() {
    let root = row(1, "R", 1, 10, 0);
    let a = row(2, "A", 2, 7, 1);
    let a1 = row(3, "A1", 3, 4, 2);
    let b = row(5, "B", 8, 9, 1);

    assert!(root.is_root());
    assert!(!a.is_root());
    assert!(a1.is_leaf());
    assert!(!a.is_leaf());

    assert_eq!(root.descendant_count(), 4);
    assert_eq!(a.descendant_count(), 2);
    assert_eq!(a1.descendant_count(), 0);

    assert!(a1.is_descendant_of(&a));
    assert!(a1.is_descendant_of(&root));
    assert!(!b.is_descendant_of(&a));
    assert!(!a.is_descendant_of(&a));

    assert!(a.is_child_of(&root));
    assert!(!a1.is_child_of(&root));
}

#[test]
fn scoped_predicates_require_matching_trees() {
    let electronics = taxon_row(1, "Electronics", 1, 4, 0, 1);
    let computers = taxon_row(2, "Computers", 2, 3, 1, 1);
    let impostor = taxon_row(3, "Impostor", 2, 3, 1, 9);

    assert!(computers.is_descendant_of(&electronics));
    assert!(computers.is_child_of(&electronics));
    assert!(!impostor.is_descendant_of(&electronics));
}
