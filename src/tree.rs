// src/tree.rs
//
// Turns a flat key listing into a nested, directory-like tree.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::constants::KEY_SEPARATOR;

/// One level of the path tree.
///
/// Children are keyed by their *cumulative* path (`a/`, `a/b/`, `a/b/c.csv`),
/// never by the bare segment name, and keep first-seen order. A file leaf is a
/// node without children, exactly like an empty directory marker; the two are
/// told apart by the trailing `/` of the key.
///
/// Equality compares structure only, not sibling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    children: IndexMap<String, TreeNode>,
}

impl TreeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child stored under `path`.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        self.children.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Direct children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Direct child keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Follow `path` from this node, one cumulative key per level.
    ///
    /// `node.descend(&["a/", "a/b/"])` is `node.get("a/")?.get("a/b/")`.
    pub fn descend(&self, path: &[&str]) -> Option<&TreeNode> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Every file leaf below this node, depth-first in insertion order.
    pub fn files(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
        for (key, node) in &self.children {
            if !key.ends_with(KEY_SEPARATOR) {
                out.push(key);
            }
            node.collect_files(out);
        }
    }

    /// Child under `key`, inserted empty when missing. Never replaces an
    /// existing node.
    fn entry(&mut self, key: &str) -> &mut TreeNode {
        let idx = match self.children.get_index_of(key) {
            Some(idx) => idx,
            None => self.children.insert_full(key.to_string(), TreeNode::new()).0,
        };
        &mut self.children[idx]
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len()))?;
        for (key, node) in &self.children {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

/// Build the directory tree for `keys`.
///
/// Each key is walked segment by segment from the root, so ancestors are
/// created on demand whatever the input order. With `include_file_leaves`
/// false, file keys only contribute their parent directories.
///
/// ```
/// use s3namic::tree::build_tree;
///
/// let tree = build_tree(["a/b/c.csv", "x/y/"], true);
/// assert!(tree.descend(&["a/", "a/b/", "a/b/c.csv"]).unwrap().is_empty());
/// assert!(tree.descend(&["x/", "x/y/"]).unwrap().is_empty());
/// ```
pub fn build_tree<I, S>(keys: I, include_file_leaves: bool) -> TreeNode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = TreeNode::new();
    for key in keys {
        insert_key(&mut root, key.as_ref(), include_file_leaves);
    }
    root
}

fn insert_key(root: &mut TreeNode, key: &str, include_file_leaves: bool) {
    if key.is_empty() {
        return;
    }
    let is_dir = key.ends_with(KEY_SEPARATOR);
    let mut segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if is_dir {
        segments.pop();
    }
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut prefix = String::with_capacity(key.len());
    let mut cursor = root;
    for segment in parents {
        prefix.push_str(segment);
        prefix.push(KEY_SEPARATOR);
        cursor = cursor.entry(&prefix);
    }

    if is_dir {
        prefix.push_str(last);
        prefix.push(KEY_SEPARATOR);
        cursor.entry(&prefix);
    } else if include_file_leaves {
        cursor.entry(key);
    }
}
