use bill_core::category::{Category, CategorySet};

#[test]
fn empty_set() {
    let set = CategorySet::EMPTY;
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert!(!set.contains(Category::Compile));
}

#[test]
fn insert_reports_novelty() {
    let mut set = CategorySet::EMPTY;
    assert!(set.insert(Category::Test));
    assert!(!set.insert(Category::Test));
    assert!(set.contains(Category::Test));
    assert_eq!(set.len(), 1);
}

#[test]
fn union_combines_members() {
    let a = CategorySet::of(&[Category::Compile, Category::Runtime]);
    let b = CategorySet::of(&[Category::Runtime, Category::Test]);
    let u = a.union(b);
    assert_eq!(u.len(), 3);
    assert!(u.contains(Category::Compile));
    assert!(u.contains(Category::Runtime));
    assert!(u.contains(Category::Test));
    assert!(!u.contains(Category::Build));
}

#[test]
fn iter_yields_declaration_order() {
    let set = CategorySet::of(&[Category::Test, Category::Compile]);
    let members: Vec<Category> = set.iter().collect();
    assert_eq!(members, vec![Category::Compile, Category::Test]);
}

#[test]
fn display_joins_members() {
    let set = CategorySet::of(&[Category::Compile, Category::Package]);
    assert_eq!(set.to_string(), "compile+package");
    assert_eq!(CategorySet::EMPTY.to_string(), "");
}

#[test]
fn collect_from_iterator() {
    let set: CategorySet = [Category::Build, Category::Build].into_iter().collect();
    assert_eq!(set.len(), 1);
    assert!(set.contains(Category::Build));
}
