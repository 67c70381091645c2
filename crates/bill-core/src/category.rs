use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a resolved dependency is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// On the compilation classpath.
    Compile,
    /// Bundled into the packaged output.
    Package,
    /// On the runtime classpath.
    Runtime,
    /// Visible to test compilation and execution.
    Test,
    /// Visible to build-command execution only.
    Build,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Compile,
        Category::Package,
        Category::Runtime,
        Category::Test,
        Category::Build,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Compile => "compile",
            Category::Package => "package",
            Category::Runtime => "runtime",
            Category::Test => "test",
            Category::Build => "build",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Category::Compile => 1 << 0,
            Category::Package => 1 << 1,
            Category::Runtime => 1 << 2,
            Category::Test => 1 << 3,
            Category::Build => 1 << 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of visibility categories, stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u8);

impl CategorySet {
    pub const EMPTY: CategorySet = CategorySet(0);

    pub fn of(categories: &[Category]) -> Self {
        categories.iter().copied().collect()
    }

    /// Add a category; returns `true` if it was not already present.
    pub fn insert(&mut self, category: Category) -> bool {
        let before = self.0;
        self.0 |= category.bit();
        self.0 != before
    }

    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn union(self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Member categories in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::EMPTY;
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in self.iter() {
            if !first {
                f.write_str("+")?;
            }
            first = false;
            f.write_str(c.name())?;
        }
        Ok(())
    }
}
