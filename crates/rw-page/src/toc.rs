//! Static table of contents entries.

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (2-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Table of contents entry with nested sub-entries.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocNode {
    /// The entry itself.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub entry: TocEntry,
    /// Entries of deeper level that follow it.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<TocNode>,
}

/// Nest a flat entry list by heading level.
///
/// Every entry becomes a child of the closest preceding entry with a lower
/// level. Entries without such a predecessor are roots, so a list that starts
/// at a deep level still keeps all its entries.
#[must_use]
pub fn build_toc_tree(entries: &[TocEntry]) -> Vec<TocNode> {
    let mut iter = entries.iter().peekable();
    let mut roots = Vec::new();
    while let Some(entry) = iter.next() {
        roots.push(build_node(entry, &mut iter));
    }
    roots
}

fn build_node<'a, I>(entry: &TocEntry, iter: &mut std::iter::Peekable<I>) -> TocNode
where
    I: Iterator<Item = &'a TocEntry>,
{
    let mut children = Vec::new();
    while let Some(next) = iter.next_if(|next| next.level > entry.level) {
        children.push(build_node(next, iter));
    }
    TocNode {
        entry: entry.clone(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(level: u8, id: &str) -> TocEntry {
        TocEntry {
            level,
            title: id.to_uppercase(),
            id: id.to_owned(),
        }
    }

    fn ids(nodes: &[TocNode]) -> Vec<(String, Vec<String>)> {
        nodes
            .iter()
            .map(|node| {
                (
                    node.entry.id.clone(),
                    node.children.iter().map(|c| c.entry.id.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_tree_nests_deeper_levels() {
        let entries = vec![
            entry(2, "intro"),
            entry(3, "setup"),
            entry(3, "config"),
            entry(2, "usage"),
        ];
        let tree = build_toc_tree(&entries);

        assert_eq!(
            ids(&tree),
            vec![
                (
                    "intro".to_owned(),
                    vec!["setup".to_owned(), "config".to_owned()]
                ),
                ("usage".to_owned(), vec![]),
            ]
        );
    }

    #[test]
    fn test_tree_skipped_level() {
        let entries = vec![entry(2, "intro"), entry(4, "deep"), entry(3, "mid")];
        let tree = build_toc_tree(&entries);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].entry.id, "deep");
        assert_eq!(tree[0].children[1].entry.id, "mid");
    }

    #[test]
    fn test_tree_starting_deep() {
        let entries = vec![entry(3, "early"), entry(2, "intro")];
        let tree = build_toc_tree(&entries);

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|node| node.children.is_empty()));
    }

    #[test]
    fn test_tree_empty() {
        assert!(build_toc_tree(&[]).is_empty());
    }
}
