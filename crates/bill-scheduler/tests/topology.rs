use bill_core::coordinate::Coordinate;
use bill_core::dependency::DeclaredDependency;
use bill_core::subproject::Subproject;
use bill_scheduler::topology::{SubprojectGraph, TopologyError};

fn project(name: &str, path_deps: &[&str]) -> Subproject {
    Subproject::new(name, name).with_dependencies(
        path_deps
            .iter()
            .map(|dep| DeclaredDependency::path_to(Coordinate::new("com.example", *dep)))
            .collect(),
    )
}

#[test]
fn topological_order_puts_dependencies_first() {
    let graph = SubprojectGraph::build(vec![
        project("cli", &["api"]),
        project("api", &["core"]),
        project("core", &[]),
    ])
    .unwrap();

    let order: Vec<&str> = graph
        .topological_order()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(order, vec!["core", "api", "cli"]);
}

#[test]
fn diamond_orders_both_branches_before_the_join() {
    let graph = SubprojectGraph::build(vec![
        project("app", &["left", "right"]),
        project("left", &["core"]),
        project("right", &["core"]),
        project("core", &[]),
    ])
    .unwrap();

    let order: Vec<&str> = graph
        .topological_order()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert_eq!(pos("core"), 0);
    assert!(pos("left") < pos("app"));
    assert!(pos("right") < pos("app"));
}

#[test]
fn path_dependency_cycle_lists_the_full_chain() {
    let err = SubprojectGraph::build(vec![
        project("core", &["cli"]),
        project("api", &["core"]),
        project("cli", &["api"]),
    ])
    .unwrap_err();

    match err {
        TopologyError::ProjectCycle { chain } => {
            assert_eq!(chain, "api -> core -> cli -> api");
        }
        other => panic!("expected ProjectCycle, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = SubprojectGraph::build(vec![project("core", &["core"])]).unwrap_err();
    match err {
        TopologyError::ProjectCycle { chain } => assert_eq!(chain, "core -> core"),
        other => panic!("expected ProjectCycle, got {other:?}"),
    }
}

#[test]
fn unknown_path_dependency_is_rejected() {
    let err = SubprojectGraph::build(vec![project("api", &["kore"])]).unwrap_err();
    match err {
        TopologyError::UnknownPathDependency { subproject, target } => {
            assert_eq!(subproject, "api");
            assert_eq!(target, "kore");
        }
        other => panic!("expected UnknownPathDependency, got {other:?}"),
    }
}

#[test]
fn dependencies_of_returns_direct_path_dependencies() {
    let graph = SubprojectGraph::build(vec![
        project("app", &["left", "right"]),
        project("left", &[]),
        project("right", &[]),
    ])
    .unwrap();

    assert_eq!(graph.dependencies_of("app"), vec!["left", "right"]);
    assert!(graph.dependencies_of("left").is_empty());
    assert!(graph.dependencies_of("missing").is_empty());
}

#[test]
fn lookup_by_name() {
    let graph = SubprojectGraph::build(vec![project("core", &[])]).unwrap();
    assert_eq!(graph.len(), 1);
    assert!(graph.get("core").is_some());
    assert!(graph.get("api").is_none());
}
