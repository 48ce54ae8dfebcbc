use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

// ----------------------------------------------------------------------------
// Tree Document

/// A phylogenetic tree document, as produced by an external analysis pipeline
/// and consumed by a visualization client.
///
/// Only the fields this library transforms are typed; everything else is
/// carried through untouched in open attribute bags, so a document
/// round-trips without losing keys this library has never heard of.
///
/// ## Examples
///
/// ```rust
/// use arbor_tree::TreeDocument;
///
/// let doc = TreeDocument::from_slice(br#"{"meta": {"colorings": []}, "tree": {"name": "root"}}"#)?;
/// assert_eq!(doc.tree.name, "root");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TreeDocument {
    /// Visualization metadata, including the categorical colorings.
    #[serde(default)]
    pub meta: Meta,
    /// Root node of the tree.
    pub tree: TreeNode,
    /// Top-level keys this library does not interpret (`version`, etc.).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TreeDocument {
    /// Returns a [`TreeDocument`] parsed from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the document serialized back into a JSON [`Value`].
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// ----------------------------------------------------------------------------
// Meta

/// Top-level `meta` block of a [`TreeDocument`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Meta {
    /// Ordered categorical coloring definitions.
    #[serde(default)]
    pub colorings: Vec<Coloring>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// ----------------------------------------------------------------------------
// Coloring

/// One entry of `meta.colorings`: a categorical coloring keyed by the node
/// attribute it colors, with an ordered `(value, color)` scale.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Coloring {
    /// Node attribute this coloring applies to (ex. `country`).
    pub key: String,
    /// Human-readable title shown by the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Coloring type (ex. `categorical`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scale_type: Option<String>,
    /// Ordered `(value, color)` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<(String, String)>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Display for Coloring {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "key: {}", self.key)
    }
}

// ----------------------------------------------------------------------------
// Tree Node

/// A single node of the tree: a `name`, optional ordered `children`, and open
/// attribute bags for `node_attrs` and any other keys.
///
/// A node without `children` is a leaf. Absent `children` and an explicit
/// empty list are distinct and both round-trip.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TreeNode {
    /// Node name: a sample identifier for tips, a pipeline-internal label for
    /// inner nodes.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    /// Per-node attributes (`country`, `external_accession`, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub node_attrs: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TreeNode {
    /// Returns a new leaf [`TreeNode`] with the given name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        TreeNode { name: name.into(), ..Default::default() }
    }

    /// Returns the node's non-empty `node_attrs.country.value`, if any.
    pub fn country(&self) -> Option<&str> {
        self.node_attrs
            .get("country")?
            .get("value")?
            .as_str()
            .filter(|country| !country.is_empty())
    }
}

impl Display for TreeNode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "name: {}", self.name)
    }
}

// ----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{Report, Result};
    use serde_json::json;

    #[test]
    fn round_trip_unknown_keys() -> Result<(), Report> {
        let input = json!({
            "version": "v2",
            "meta": {
                "colorings": [{"key": "lineage", "type": "categorical"}],
                "panels": ["tree"],
            },
            "tree": {
                "name": "root",
                "branch_attrs": {"mutations": {}},
                "children": [
                    {"name": "tip", "node_attrs": {"country": {"value": "USA"}}},
                ],
            },
        });

        let doc = TreeDocument::from_slice(input.to_string().as_bytes())?;
        let observed = doc.to_value()?;

        assert_eq!(observed["version"], json!("v2"));
        assert_eq!(observed["meta"]["panels"], json!(["tree"]));
        assert_eq!(observed["tree"]["branch_attrs"], json!({"mutations": {}}));
        assert_eq!(observed["tree"]["children"][0]["name"], json!("tip"));
        Ok(())
    }

    #[test]
    fn leaf_children_stay_absent() -> Result<(), Report> {
        let doc = TreeDocument::from_slice(br#"{"tree": {"name": "tip"}}"#)?;
        let observed = doc.to_value()?;
        assert!(observed["tree"].get("children").is_none());
        Ok(())
    }

    #[test]
    fn country_accessor() {
        let mut node = TreeNode::new("tip");
        assert_eq!(node.country(), None);

        node.node_attrs.insert("country".to_string(), json!({"value": "France"}));
        assert_eq!(node.country(), Some("France"));

        node.node_attrs.insert("country".to_string(), json!({"value": ""}));
        assert_eq!(node.country(), None);
    }

    #[test]
    fn parse_failure_is_an_error() {
        assert!(TreeDocument::from_slice(b"not json").is_err());
        assert!(TreeDocument::from_slice(b"{\"meta\": {}}").is_err());
    }
}
