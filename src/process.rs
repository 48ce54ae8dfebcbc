//! The tree-processing pipeline: verify access, fetch, de-anonymize, color.

use crate::auth::{can_see_pi_group_ids, verify_and_access_phylo_tree, AuthorizationPolicy};
use crate::error::ProcessError;
use crate::model::{IdStyle, User, GISAID_ID_KEY, PUBLIC_ID_PREFIX};
use crate::store::{Database, ObjectStore};
use arbor_tree::{
    apply_country_scale, collect_countries, extract_accessions, rename_nodes, TreeDocument,
    COUNTRY_COLOR_SCALE,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Palette length bounds the country scale.
const MAX_SCALE_COUNTRIES: usize = COUNTRY_COLOR_SCALE.len();

// ----------------------------------------------------------------------------
// Tree Service

/// Request-scoped orchestrator over the storage and authorization seams.
///
/// Every operation works on a freshly fetched, request-local copy of the
/// stored document; nothing is ever written back.
#[derive(Debug)]
pub struct TreeService<D, S, P> {
    db: Arc<D>,
    store: S,
    policy: P,
}

impl<D, S, P> TreeService<D, S, P>
where
    D: Database,
    S: ObjectStore,
    P: AuthorizationPolicy,
{
    pub fn new(db: Arc<D>, store: S, policy: P) -> Self {
        TreeService { db, store, policy }
    }

    /// Returns the processed tree document for `user`.
    ///
    /// 1. Verify access; load the tree and its run.
    /// 2. Fetch and parse the stored document.
    /// 3. [`IdStyle::Public`]: return the document as parsed, with no
    ///    de-anonymization and no recoloring.
    /// 4. Otherwise rename nodes through the viewer's identifier map (saving
    ///    originals under `GISAID_ID`) and write the country color scale.
    ///
    /// Failures short-circuit; a partially transformed document is never
    /// returned.
    pub async fn process_phylo_tree(
        &self,
        user: &User,
        tree_id: i64,
        id_style: IdStyle,
    ) -> Result<TreeDocument, ProcessError> {
        let (tree, run) =
            verify_and_access_phylo_tree(self.db.as_ref(), &self.policy, user, tree_id).await?;

        info!("Fetching phylo tree {tree_id}: s3://{}/{}", tree.s3_bucket, tree.s3_key);
        let bytes = self.store.get(&tree.s3_bucket, &tree.s3_key).await?;
        let mut doc = TreeDocument::from_slice(&bytes)?;

        if id_style == IdStyle::Public {
            debug!("Returning phylo tree {tree_id} with public identifiers.");
            return Ok(doc);
        }

        let can_see_pi = can_see_pi_group_ids(self.db.as_ref(), user).await?;
        let owner_group = &run.group;
        let identifier_map = if user.system_admin || can_see_pi.contains(&owner_group.id) {
            build_identifier_map(self.db.as_ref(), owner_group.id).await?
        } else {
            debug!(
                "User {} has no private-identifier grant from group {}, tree stays anonymized.",
                user.id, owner_group.id
            );
            BTreeMap::new()
        };

        rename_nodes(&mut doc.tree, &identifier_map, Some(GISAID_ID_KEY));
        set_country_colorings(self.db.as_ref(), &mut doc, &owner_group.default_tree_location.country)
            .await?;
        Ok(doc)
    }

    /// Returns the sample accessions of a tree, for the tree download path.
    pub async fn extract_tree_accessions(
        &self,
        user: &User,
        tree_id: i64,
    ) -> Result<Vec<String>, ProcessError> {
        let (tree, _run) =
            verify_and_access_phylo_tree(self.db.as_ref(), &self.policy, user, tree_id).await?;
        let bytes = self.store.get(&tree.s3_bucket, &tree.s3_key).await?;
        let doc = TreeDocument::from_slice(&bytes)?;
        Ok(extract_accessions(&doc.tree))
    }
}

// ----------------------------------------------------------------------------
// Identifier Map

/// Builds the public-to-private identifier map over every sample submitted
/// by the tree-owning group. The repository prefix is stripped from public
/// identifiers before they become keys.
///
/// Two samples stripping to the same public identifier is a data-integrity
/// anomaly: the collision is logged and the later sample wins.
pub async fn build_identifier_map<D: Database>(
    db: &D,
    owner_group_id: i64,
) -> Result<BTreeMap<String, String>, ProcessError> {
    let samples = db.samples_for_group(owner_group_id).await?;

    let mut identifier_map = BTreeMap::new();
    for sample in samples {
        let public_id = sample.public_identifier.replace(PUBLIC_ID_PREFIX, "");
        if let Some(replaced) = identifier_map.insert(public_id.clone(), sample.private_identifier)
        {
            warn!(
                "Samples of group {owner_group_id} collide on public identifier \
                 {public_id:?} (dropping private identifier {replaced:?})."
            );
        }
    }
    debug!("Identifier map for group {owner_group_id}: {} entries.", identifier_map.len());
    Ok(identifier_map)
}

// ----------------------------------------------------------------------------
// Country Colorings

/// Writes the country color scale into the document.
///
/// The scale starts with the home country, continues with up to 15 tree
/// countries ranked by distance from home, and tops up from any collected
/// countries the geo ranking did not know, capped at the palette length.
pub async fn set_country_colorings<D: Database>(
    db: &D,
    doc: &mut TreeDocument,
    home_country: &str,
) -> Result<(), ProcessError> {
    let mut found = collect_countries(&doc.tree);
    found.remove(home_country);

    let mut countries = vec![home_country.to_string()];
    let ranked = db.nearest_countries(home_country, &found, MAX_SCALE_COUNTRIES - 1).await?;
    countries.extend(ranked.iter().cloned());

    if countries.len() < MAX_SCALE_COUNTRIES {
        for country in &ranked {
            found.remove(country);
        }
        let open_slots = MAX_SCALE_COUNTRIES - countries.len();
        countries.extend(found.into_iter().take(open_slots));
    }

    apply_country_scale(doc, &countries);
    Ok(())
}
