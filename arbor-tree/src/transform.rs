use crate::TreeNode;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Names beginning with this prefix are pipeline-internal inner-node labels,
/// not sample accessions.
const INTERNAL_NODE_PREFIX: &str = "NODE_";

// ----------------------------------------------------------------------------
// Rename

/// Renames the nodes of a tree in place, substituting names via `name_map`.
///
/// Traversal is pre-order over an explicit work stack, so deep trees cannot
/// overflow the call stack. When a node's `name` has a mapping, the original
/// name is first saved into the node's open attribute bag under `save_key`
/// (when one is supplied), then `name` is overwritten. Nodes without a
/// mapping are left byte-for-byte untouched.
///
/// ## Examples
///
/// ```rust
/// use arbor_tree::{rename_nodes, TreeNode};
/// use std::collections::BTreeMap;
///
/// let mut root = TreeNode::new("pub123");
/// let name_map = BTreeMap::from([("pub123".to_string(), "priv-A".to_string())]);
/// rename_nodes(&mut root, &name_map, Some("GISAID_ID"));
///
/// assert_eq!(root.name, "priv-A");
/// assert_eq!(root.other["GISAID_ID"], "pub123");
/// ```
pub fn rename_nodes(root: &mut TreeNode, name_map: &BTreeMap<String, String>, save_key: Option<&str>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(renamed) = name_map.get(&node.name) {
            if let Some(key) = save_key {
                node.other.insert(key.to_string(), Value::String(node.name.clone()));
            }
            node.name = renamed.clone();
        }
        if let Some(children) = node.children.as_mut() {
            stack.extend(children.iter_mut());
        }
    }
}

// ----------------------------------------------------------------------------
// Collect Countries

/// Returns every distinct non-empty `node_attrs.country.value` found in the
/// tree rooted at `root`, in sorted order.
///
/// ## Examples
///
/// ```rust
/// use arbor_tree::{collect_countries, TreeNode};
/// use serde_json::json;
///
/// let mut root = TreeNode::new("root");
/// root.node_attrs.insert("country".to_string(), json!({"value": "USA"}));
/// let countries = collect_countries(&root);
///
/// assert!(countries.contains("USA"));
/// ```
pub fn collect_countries(root: &TreeNode) -> BTreeSet<String> {
    let mut countries = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(country) = node.country() {
            countries.insert(country.to_string());
        }
        if let Some(children) = node.children.as_ref() {
            stack.extend(children.iter());
        }
    }
    countries
}

// ----------------------------------------------------------------------------
// Extract Accessions

/// Returns the sample accessions of the tree rooted at `root`, in pre-order.
///
/// For each node, any `node_attrs.external_accession.value` is taken first,
/// then the node's own name unless it carries the internal `NODE_` prefix.
pub fn extract_accessions(root: &TreeNode) -> Vec<String> {
    let mut accessions = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let external = node
            .node_attrs
            .get("external_accession")
            .and_then(|accession| accession.get("value"))
            .and_then(Value::as_str);
        if let Some(accession) = external {
            accessions.push(accession.to_string());
        }
        if !node.name.is_empty() && !node.name.starts_with(INTERNAL_NODE_PREFIX) {
            accessions.push(node.name.clone());
        }
        if let Some(children) = node.children.as_ref() {
            // reversed so children pop left-to-right
            stack.extend(children.iter().rev());
        }
    }
    accessions
}

// ----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeDocument;
    use color_eyre::eyre::{Report, Result};
    use serde_json::json;

    fn fixture() -> Result<TreeDocument, Report> {
        let input = json!({
            "meta": {"colorings": []},
            "tree": {
                "name": "NODE_0000001",
                "children": [
                    {"name": "pub123", "node_attrs": {"country": {"value": "USA"}}},
                    {
                        "name": "NODE_0000002",
                        "node_attrs": {"country": {"value": "USA"}},
                        "children": [
                            {"name": "pub456", "node_attrs": {"country": {"value": "France"}}},
                            {"name": "pub789", "node_attrs": {"country": {"value": "Mexico"}}},
                        ],
                    },
                ],
            },
        });
        Ok(TreeDocument::from_slice(input.to_string().as_bytes())?)
    }

    #[test]
    fn rename_with_save_key() -> Result<(), Report> {
        let mut doc = fixture()?;
        let name_map = BTreeMap::from([
            ("pub123".to_string(), "priv-A".to_string()),
            ("pub456".to_string(), "priv-B".to_string()),
        ]);
        rename_nodes(&mut doc.tree, &name_map, Some("GISAID_ID"));

        let children = doc.tree.children.as_ref().unwrap();
        assert_eq!(children[0].name, "priv-A");
        assert_eq!(children[0].other["GISAID_ID"], "pub123");

        let grandchildren = children[1].children.as_ref().unwrap();
        assert_eq!(grandchildren[0].name, "priv-B");
        assert_eq!(grandchildren[0].other["GISAID_ID"], "pub456");

        // unmapped nodes are untouched
        assert_eq!(grandchildren[1].name, "pub789");
        assert!(grandchildren[1].other.get("GISAID_ID").is_none());
        Ok(())
    }

    #[test]
    fn rename_without_save_key_drops_originals() -> Result<(), Report> {
        let mut doc = fixture()?;
        let name_map = BTreeMap::from([("pub123".to_string(), "priv-A".to_string())]);
        rename_nodes(&mut doc.tree, &name_map, None);

        let children = doc.tree.children.as_ref().unwrap();
        assert_eq!(children[0].name, "priv-A");
        assert!(children[0].other.get("GISAID_ID").is_none());
        Ok(())
    }

    #[test]
    fn rename_empty_map_is_a_no_op() -> Result<(), Report> {
        let mut doc = fixture()?;
        let expected = doc.clone();
        rename_nodes(&mut doc.tree, &BTreeMap::new(), Some("GISAID_ID"));
        assert_eq!(doc, expected);
        Ok(())
    }

    #[test]
    fn rename_is_stack_safe_on_deep_trees() {
        // a 50k-deep path would overflow a naive recursive walk
        let mut root = TreeNode::new("n49999");
        for depth in (0..49_999).rev() {
            let mut parent = TreeNode::new(format!("n{depth}"));
            parent.children = Some(vec![root]);
            root = parent;
        }
        let name_map = BTreeMap::from([("n49999".to_string(), "renamed".to_string())]);
        rename_nodes(&mut root, &name_map, Some("GISAID_ID"));
        let observed = extract_accessions(&root);
        assert_eq!(observed.last().map(String::as_str), Some("renamed"));

        // drop glue recurses, so dismantle the chain iteratively
        let mut stack = vec![root];
        while let Some(mut node) = stack.pop() {
            if let Some(children) = node.children.take() {
                stack.extend(children);
            }
        }
    }

    #[test]
    fn collect_countries_deduplicates() -> Result<(), Report> {
        let doc = fixture()?;
        let observed = collect_countries(&doc.tree);
        let expected =
            BTreeSet::from(["France".to_string(), "Mexico".to_string(), "USA".to_string()]);
        assert_eq!(observed, expected);
        Ok(())
    }

    #[test]
    fn extract_accessions_skips_internal_nodes() -> Result<(), Report> {
        let mut doc = fixture()?;
        let grandchildren = doc.tree.children.as_mut().unwrap()[1].children.as_mut().unwrap();
        grandchildren[0]
            .node_attrs
            .insert("external_accession".to_string(), json!({"value": "EPI_ISL_1234"}));

        let observed = extract_accessions(&doc.tree);
        let expected = vec!["pub123", "EPI_ISL_1234", "pub456", "pub789"];
        assert_eq!(observed, expected);
        Ok(())
    }
}
