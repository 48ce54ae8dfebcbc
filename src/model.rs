//! Entities of the surveillance data model, as loaded through the
//! [`Database`](crate::store::Database) seam.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Prefix carried by public identifiers sourced from the external sequence
/// repository. Stripped before identifier-map lookups.
pub const PUBLIC_ID_PREFIX: &str = "hCoV-19/";

/// Node attribute key under which a renamed node keeps its original public
/// identifier.
pub const GISAID_ID_KEY: &str = "GISAID_ID";

// ----------------------------------------------------------------------------
// User

/// A registered user, member of exactly one [`Group`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub group_id: i64,
    /// System admins bypass all row-level visibility rules.
    pub system_admin: bool,
}

// ----------------------------------------------------------------------------
// Group

/// A submitting organization. Owns samples and phylo runs.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    /// Country-level location used as the coloring origin for this group's
    /// trees.
    pub default_tree_location: Location,
}

// ----------------------------------------------------------------------------
// CanSee

/// Kinds of data a [`CanSee`] grant can expose.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataType {
    /// Visibility into another group's private sample identifiers.
    PrivateIdentifiers,
    /// Visibility into another group's phylo trees.
    Trees,
}

/// A visibility grant: `viewer_group_id` may see `owner_group_id`'s data of
/// the given [`DataType`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CanSee {
    pub viewer_group_id: i64,
    pub owner_group_id: i64,
    pub data_type: DataType,
}

// ----------------------------------------------------------------------------
// Sample

/// A genomic sample with a shareable public identifier and a
/// access-restricted private identifier.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Sample {
    pub id: i64,
    pub submitting_group_id: i64,
    pub public_identifier: String,
    pub private_identifier: String,
}

// ----------------------------------------------------------------------------
// Location

/// A geographic location. Country-level rows leave `division` and `location`
/// unset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Location {
    pub country: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Whether this row describes a whole country rather than a division or
    /// sub-location.
    pub fn is_country_level(&self) -> bool {
        self.division.is_none() && self.location.is_none()
    }
}

// ----------------------------------------------------------------------------
// Phylo Run / Tree

/// One execution of the external phylogenetic analysis pipeline, owned by a
/// [`Group`] (eager-loaded).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PhyloRun {
    pub id: i64,
    pub group: Group,
}

/// A stored phylogenetic tree: a pointer into object storage, belonging to
/// exactly one [`PhyloRun`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PhyloTree {
    pub id: i64,
    pub run_id: i64,
    pub s3_bucket: String,
    pub s3_key: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ----------------------------------------------------------------------------
// Id Style

/// Output mode for a processed tree.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IdStyle {
    /// De-anonymize what the viewer is entitled to and recolor.
    #[default]
    Private,
    /// Externally shareable: no de-anonymization, no recoloring.
    Public,
}

// ----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{Report, Result};
    use std::str::FromStr;

    #[test]
    fn id_style_from_str() -> Result<(), Report> {
        assert_eq!(<IdStyle as FromStr>::from_str("public")?, IdStyle::Public);
        assert_eq!(<IdStyle as FromStr>::from_str("private")?, IdStyle::Private);
        assert_eq!(IdStyle::default(), IdStyle::Private);
        Ok(())
    }

    #[test]
    fn country_level_locations() {
        let mut location = Location {
            country: "USA".to_string(),
            division: None,
            location: None,
            latitude: 37.0,
            longitude: -95.0,
        };
        assert!(location.is_country_level());

        location.division = Some("California".to_string());
        assert!(!location.is_country_level());
    }
}
