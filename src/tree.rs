use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::client::PortalClient;
use crate::error::StatError;
use crate::label::normalize;
use crate::listing::{DatasetDescriptor, DatasetLister};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Category(CategoryNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn as_category(&self) -> Option<&CategoryNode> {
        match self {
            Node::Category(category) => Some(category),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_category_mut(&mut self) -> Option<&mut CategoryNode> {
        match self {
            Node::Category(category) => Some(category),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Category(_) => None,
            Node::Leaf(leaf) => Some(leaf),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    children: BTreeMap<String, Node>,
}

impl CategoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children in label order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children
            .iter()
            .map(|(label, node)| (label.as_str(), node))
    }

    pub fn get(&self, label: &str) -> Option<&Node> {
        self.children.get(label)
    }

    pub fn insert(&mut self, label: impl Into<String>, node: Node) -> Option<Node> {
        self.children.insert(label.into(), node)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    // A category always takes the place of a leaf with the same label, so the
    // final shape does not depend on path order.
    fn category_mut(&mut self, label: String) -> Option<&mut CategoryNode> {
        let node = self
            .children
            .entry(label)
            .or_insert_with(|| Node::Category(CategoryNode::default()));
        if let Node::Leaf(leaf) = node {
            tracing::warn!(locator = %leaf.locator, "leaf shadowed by a category, dropping it");
            *node = Node::Category(CategoryNode::default());
        }
        node.as_category_mut()
    }

    fn attach_leaf(&mut self, label: String, leaf: LeafNode) {
        if let Some(Node::Category(_)) = self.children.get(&label) {
            tracing::warn!(locator = %leaf.locator, "leaf shadowed by a category, dropping it");
            return;
        }
        self.children.insert(label, Node::Leaf(leaf));
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a LeafNode)>) {
        for (label, node) in &self.children {
            let path = if prefix.is_empty() {
                label.clone()
            } else {
                format!("{prefix}/{label}")
            };
            match node {
                Node::Category(category) => category.collect_leaves(&path, out),
                Node::Leaf(leaf) => out.push((path, leaf)),
            }
        }
    }
}

/// A dataset group. Its listing page is fetched on first use and kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafNode {
    locator: String,
    #[serde(skip)]
    datasets: OnceLock<Vec<DatasetDescriptor>>,
}

impl LeafNode {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            datasets: OnceLock::new(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn cached(&self) -> Option<&[DatasetDescriptor]> {
        self.datasets.get().map(Vec::as_slice)
    }

    /// Fetches the listing at most once. If two callers race, the first
    /// stored list wins and is returned to both.
    pub fn ensure_loaded<C: PortalClient>(
        &self,
        lister: &DatasetLister<'_, C>,
    ) -> Result<&[DatasetDescriptor], StatError> {
        if let Some(datasets) = self.datasets.get() {
            return Ok(datasets);
        }
        let fetched = lister.list(&self.locator)?;
        Ok(self.datasets.get_or_init(|| fetched))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTree {
    root: CategoryNode,
}

impl CategoryTree {
    pub fn build<P, S>(paths: &[P]) -> Result<Self, StatError>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut root = CategoryNode::default();

        for path in paths {
            let segments: &[S] = path.as_ref();
            let locator = segments
                .iter()
                .map(|segment| segment.as_ref())
                .collect::<Vec<&str>>()
                .join("/");
            if segments.len() < 2 {
                return Err(StatError::MalformedPath(format!(
                    "`{locator}` needs a category and a page segment"
                )));
            }

            let leaf_index = segments.len() - 2;
            let mut cursor = &mut root;
            for segment in &segments[..leaf_index] {
                cursor = cursor
                    .category_mut(normalize(segment.as_ref()))
                    .ok_or_else(|| {
                        StatError::MalformedPath(format!(
                            "`{locator}` passes through a dataset page"
                        ))
                    })?;
            }
            cursor.attach_leaf(
                normalize(segments[leaf_index].as_ref()),
                LeafNode::new(locator),
            );
        }

        let tree = Self { root };
        tracing::info!(
            paths = paths.len(),
            leaves = tree.leaves().len(),
            "built category tree"
        );
        Ok(tree)
    }

    pub fn root(&self) -> &CategoryNode {
        &self.root
    }

    /// Follows normalized labels from the root.
    pub fn lookup<S: AsRef<str>>(&self, labels: &[S]) -> Option<&Node> {
        let (last, parents) = labels.split_last()?;
        let mut cursor = &self.root;
        for label in parents {
            cursor = cursor.get(label.as_ref())?.as_category()?;
        }
        cursor.get(last.as_ref())
    }

    /// Resolves a `/`-separated label path such as `Majandus/Ehitus`.
    pub fn find_leaf(&self, label_path: &str) -> Result<&LeafNode, StatError> {
        let labels = label_path
            .split('/')
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>();
        self.lookup(labels.as_slice())
            .and_then(Node::as_leaf)
            .ok_or_else(|| StatError::CategoryNotFound(label_path.to_string()))
    }

    /// All leaves depth first, each with its label path.
    pub fn leaves(&self) -> Vec<(String, &LeafNode)> {
        let mut out = Vec::new();
        self.root.collect_leaves("", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(path: &str) -> Vec<&str> {
        path.split('/').collect()
    }

    #[test]
    fn leaf_sits_at_second_to_last_segment() {
        let tree = CategoryTree::build(&[split("Majandus/10Ehitus/file.asp")]).unwrap();
        let leaf = tree.find_leaf("Majandus/Ehitus").unwrap();
        assert_eq!(leaf.locator(), "Majandus/10Ehitus/file.asp");
        assert!(tree.lookup(&["Majandus", "Ehitus", "file.asp"]).is_none());
    }

    #[test]
    fn duplicate_leaf_last_write_wins() {
        let tree = CategoryTree::build(&[
            split("Majandus/10Ehitus/a.asp"),
            split("Majandus/10-Ehitus/b.asp"),
        ])
        .unwrap();
        let leaf = tree.find_leaf("Majandus/Ehitus").unwrap();
        assert_eq!(leaf.locator(), "Majandus/10-Ehitus/b.asp");
    }

    #[test]
    fn category_wins_over_leaf_in_any_order() {
        let a = split("Majandus/10Ehitus/a.asp");
        let b = split("Majandus/10Ehitus/01Hinnad/b.asp");
        let forward = CategoryTree::build(&[a.clone(), b.clone()]).unwrap();
        let backward = CategoryTree::build(&[b, a]).unwrap();
        assert_eq!(forward, backward);
        assert!(matches!(
            forward.lookup(&["Majandus", "Ehitus"]),
            Some(Node::Category(_))
        ));
    }

    #[test]
    fn shadowed_leaf_becomes_category_for_later_paths() {
        let tree = CategoryTree::build(&[
            split("Majandus/10Ehitus/a.asp"),
            split("Majandus/10Ehitus/01Hinnad/b.asp"),
            split("Majandus/10Ehitus/02Kulud/c.asp"),
        ])
        .unwrap();
        let category = tree
            .lookup(&["Majandus", "Ehitus"])
            .and_then(Node::as_category)
            .unwrap();
        assert_eq!(category.len(), 2);
        assert_eq!(
            tree.find_leaf("Majandus/Ehitus/Kulud").unwrap().locator(),
            "Majandus/10Ehitus/02Kulud/c.asp"
        );
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn find_leaf_rejects_category() {
        let tree = CategoryTree::build(&[split("Majandus/10Ehitus/a.asp")]).unwrap();
        assert!(tree.find_leaf("Majandus").is_err());
        assert!(tree.find_leaf("").is_err());
    }
}
