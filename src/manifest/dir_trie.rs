use std::collections::HashMap;

/// Prefix tree over `/`-separated components of managed directory paths.
///
/// Lookups walk one node per path component, so `/usr/foo` and
/// `/usr/foobar` can never be confused the way a raw string prefix would.
#[derive(Debug, Clone, Default)]
pub struct DirTrie {
    /// Child nodes keyed by directory name component
    children: HashMap<String, Self>,
}

impl DirTrie {
    /// Create a new empty trie
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a managed directory together with all of its ancestors
    pub fn insert(&mut self, dir: &str) {
        let mut current = self;
        for name in components(dir) {
            current = current.children.entry(name.to_string()).or_default();
        }
    }

    /// True iff some managed directory lives strictly below `dir`
    #[inline]
    #[must_use]
    pub fn has_descendant(&self, dir: &str) -> bool {
        self.find(dir).is_some_and(|node| !node.children.is_empty())
    }

    /// Walk down the trie following the components of `dir`
    fn find(&self, dir: &str) -> Option<&Self> {
        let mut current = self;
        for name in components(dir) {
            current = current.children.get(name)?;
        }
        Some(current)
    }
}

/// Non-empty components of an absolute path
fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}
