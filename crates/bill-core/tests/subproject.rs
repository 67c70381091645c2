use bill_core::coordinate::Coordinate;
use bill_core::dependency::DeclaredDependency;
use bill_core::subproject::Subproject;

fn sample() -> Subproject {
    Subproject::new("api", "api").with_dependencies(vec![
        DeclaredDependency::direct(Coordinate::new("org.slf4j", "slf4j-api"), "2.0.9"),
        DeclaredDependency::direct(Coordinate::new("com.google.guava", "guava"), "[31.0,)"),
        DeclaredDependency::path_to(Coordinate::new("com.example", "core")),
    ])
}

#[test]
fn direct_pins_cover_exact_versions_only() {
    let pins = sample().direct_pins();
    assert_eq!(
        pins.get(&Coordinate::new("org.slf4j", "slf4j-api")),
        Some(&"2.0.9".to_string())
    );
    // A range token pins nothing; it is rejected during traversal instead.
    assert!(!pins.contains_key(&Coordinate::new("com.google.guava", "guava")));
    // Path dependencies are not repository pins.
    assert!(!pins.contains_key(&Coordinate::new("com.example", "core")));
}

#[test]
fn path_dependencies_name_siblings_by_artifact() {
    assert_eq!(sample().path_dependencies(), vec!["core"]);
}

#[test]
fn repository_dependencies_skip_path_declarations() {
    let targets: Vec<String> = sample()
        .repository_dependencies()
        .map(|d| d.target.to_string())
        .collect();
    assert_eq!(targets, vec!["org.slf4j:slf4j-api", "com.google.guava:guava"]);
}
