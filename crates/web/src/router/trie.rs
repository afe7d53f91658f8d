//! An ordered prefix tree.
//!
//! Every node keeps its children sorted by prefix, so lookups descend with a
//! binary search at each level. A key may end at an inner node; such nodes
//! are marked `ending`.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie<E, P> {
    prefix: Option<E>,
    payload: Option<P>,
    ending: bool,
    children: Vec<Trie<E, P>>,
}

impl<E, P> Default for Trie<E, P> {
    fn default() -> Self {
        Self { prefix: None, payload: None, ending: false, children: Vec::new() }
    }
}

impl<E: Ord, P> Trie<E, P> {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_prefix(prefix: E) -> Self {
        Self { prefix: Some(prefix), ..Self::default() }
    }

    /// The element leading to this node, `None` for the root.
    pub fn prefix(&self) -> Option<&E> {
        self.prefix.as_ref()
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Whether a whole key terminates at this node.
    pub fn is_ending(&self) -> bool {
        self.ending
    }

    pub fn children(&self) -> &[Trie<E, P>] {
        &self.children
    }

    /// Inserts `key`, marking its last node as ending.
    ///
    /// A node that already holds a payload keeps it.
    pub fn insert<I: IntoIterator<Item = E>>(&mut self, key: I, payload: Option<P>) {
        let mut node = self;
        for element in key {
            let index = match node.children.binary_search_by(|child| child.prefix.as_ref().cmp(&Some(&element))) {
                Ok(index) => index,
                Err(index) => {
                    node.children.insert(index, Trie::with_prefix(element));
                    index
                }
            };
            node = &mut node.children[index];
        }

        if node.payload.is_none() {
            node.payload = payload;
        }
        node.ending = true;
    }

    /// Binary searches the children with `f`, which orders a child prefix
    /// against the target.
    pub fn child_by<F>(&self, mut f: F) -> Option<&Trie<E, P>>
    where
        F: FnMut(&E) -> Ordering,
    {
        self.children
            .binary_search_by(|child| child.prefix.as_ref().map_or(Ordering::Less, &mut f))
            .ok()
            .and_then(|index| self.children.get(index))
    }

    /// The node where `key` ends, if `key` was inserted.
    pub fn find_last<'k, I>(&self, key: I) -> Option<&Trie<E, P>>
    where
        I: IntoIterator<Item = &'k E>,
        E: 'k,
    {
        let mut node = self;
        for element in key {
            node = node.child_by(|prefix| prefix.cmp(element))?;
        }
        node.ending.then_some(node)
    }

    pub fn find_payload<'k, I>(&self, key: I) -> Option<&P>
    where
        I: IntoIterator<Item = &'k E>,
        E: 'k,
    {
        self.find_last(key)?.payload.as_ref()
    }

    pub fn contains<'k, I>(&self, key: I) -> bool
    where
        I: IntoIterator<Item = &'k E>,
        E: 'k,
    {
        self.find_last(key).is_some()
    }

    /// Reorders every level with `compare`.
    ///
    /// Lookups assume prefix order, so a trie sorted any other way is only
    /// good for traversal until the next [`sort`](Self::sort).
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&Trie<E, P>, &Trie<E, P>) -> Ordering,
    {
        self.sort_recursive(&mut compare);
    }

    /// Restores prefix order on every level.
    pub fn sort(&mut self) {
        self.sort_by(|a, b| a.prefix.cmp(&b.prefix));
    }

    fn sort_recursive<F>(&mut self, compare: &mut F)
    where
        F: FnMut(&Trie<E, P>, &Trie<E, P>) -> Ordering,
    {
        for child in &mut self.children {
            child.sort_recursive(compare);
        }
        self.children.sort_by(|a, b| compare(a, b));
    }
}

impl<E: Ord, P: PartialEq> Trie<E, P> {
    /// The key leading to the first node, in depth-first order, holding `payload`.
    pub fn find_by_payload(&self, payload: &P) -> Option<Vec<&E>> {
        if self.payload.as_ref() == Some(payload) {
            return Some(self.prefix.iter().collect());
        }

        self.children.iter().find_map(|child| child.find_by_payload(payload)).map(|mut key| {
            if let Some(prefix) = &self.prefix {
                key.insert(0, prefix);
            }
            key
        })
    }
}

impl<E: fmt::Display, P: fmt::Display> Trie<E, P> {
    fn pretty(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:width$}- ", "", width = depth * 2)?;
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}")?,
            None => f.write_str("head")?,
        }
        if let Some(payload) = &self.payload {
            write!(f, ":{payload}")?;
        }
        f.write_str("\n")?;

        for child in &self.children {
            child.pretty(f, depth + 1)?;
        }
        Ok(())
    }
}

/// One line per node, `- prefix:payload`, indented two spaces per level.
impl<E: fmt::Display, P: fmt::Display> fmt::Display for Trie<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pretty(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn chars(key: &str) -> Vec<char> {
        key.chars().collect()
    }

    fn digits() -> Trie<char, u32> {
        let mut trie = Trie::new();
        trie.insert(chars("12345"), Some(10101));
        trie.insert(chars("12456"), None);
        trie.insert(chars("12346"), None);
        trie.insert(chars("12344"), None);
        trie.insert(chars("92344"), None);
        trie
    }

    fn assert_sorted<E: Ord + fmt::Debug, P>(trie: &Trie<E, P>) {
        let prefixes: Vec<_> = trie.children().iter().map(Trie::prefix).collect();
        assert!(prefixes.is_sorted(), "unsorted children {prefixes:?}");
        trie.children().iter().for_each(assert_sorted);
    }

    #[test]
    fn lookups() {
        let trie = digits();

        assert!(trie.contains(&chars("12345")));
        assert!(trie.contains(&chars("92344")));
        assert!(!trie.contains(&chars("12")));
        assert!(!trie.contains(&chars("12444")));
        assert_eq!(trie.find_payload(&chars("12345")), Some(&10101));
        assert_eq!(trie.find_payload(&chars("12346")), None);
    }

    #[test]
    fn first_payload_wins() {
        let mut trie = Trie::new();
        trie.insert(chars("ab"), Some(1));
        trie.insert(chars("ab"), Some(2));
        trie.insert(chars("a"), None);
        trie.insert(chars("a"), Some(3));

        assert_eq!(trie.find_payload(&chars("ab")), Some(&1));
        assert_eq!(trie.find_payload(&chars("a")), Some(&3));
    }

    #[test]
    fn empty_key_ends_at_root() {
        let mut trie: Trie<char, u8> = Trie::new();
        assert!(!trie.contains(&[]));

        trie.insert([], Some(7));
        assert!(trie.contains(&[]));
        assert_eq!(trie.find_payload(&[]), Some(&7));
    }

    #[test]
    fn children_stay_sorted() {
        let words = ["zebra", "apple", "mango", "app", "banana", "zed", "cherry", "apricot", "berry", "a"];
        let mut trie = Trie::new();
        for (index, word) in words.iter().enumerate() {
            trie.insert(chars(word), Some(index));
            assert_sorted(&trie);
        }

        for (index, word) in words.iter().enumerate() {
            let key = chars(word);
            let linear = key.iter().try_fold(&trie, |node, c| node.children().iter().find(|child| child.prefix() == Some(c)));
            assert_eq!(trie.find_last(&key).map(Trie::payload), linear.map(Trie::payload));
            assert_eq!(trie.find_payload(&key), Some(&index));
        }
    }

    #[test]
    fn find_by_payload() {
        let trie = digits();
        assert_eq!(trie.find_by_payload(&10101), Some(vec![&'1', &'2', &'3', &'4', &'5']));
        assert_eq!(trie.find_by_payload(&7), None);
    }

    #[test]
    fn sort_by_reorders_every_level() {
        let mut trie = digits();
        trie.sort_by(|a, b| b.prefix().cmp(&a.prefix()));

        let first: Vec<_> = trie.children().iter().filter_map(Trie::prefix).collect();
        assert_eq!(first, vec![&'9', &'1']);

        trie.sort();
        assert_sorted(&trie);
        assert!(trie.contains(&chars("12456")));
    }

    #[test]
    fn pretty_print() {
        let mut trie = Trie::new();
        trie.insert(chars("ab"), Some(1));
        trie.insert(chars("ac"), Some(2));

        assert_eq!(
            trie.to_string(),
            indoc! {"
                - head
                  - a
                    - b:1
                    - c:2
            "}
        );
    }
}
