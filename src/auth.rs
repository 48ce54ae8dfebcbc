//! Row-level authorization for phylo trees.

use crate::error::ProcessError;
use crate::model::{DataType, PhyloRun, PhyloTree, User};
use crate::store::Database;
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

// ----------------------------------------------------------------------------
// Authorization Policy

/// Row-level visibility policy over phylo trees.
///
/// Swappable so deployments can plug in their own filter; the orchestrator
/// only ever asks "which of these candidate trees may this user view".
#[async_trait]
pub trait AuthorizationPolicy: Send + Sync {
    /// Returns the subset of `candidates` the user may view.
    async fn visible_trees(
        &self,
        user: &User,
        candidates: &BTreeSet<i64>,
    ) -> Result<BTreeSet<i64>, ProcessError>;
}

// ----------------------------------------------------------------------------
// Group Visibility Policy

/// Default policy: system admins see every candidate; other users see trees
/// whose owning group is their own group or a group that granted theirs a
/// [`DataType::Trees`] visibility grant.
#[derive(Debug)]
pub struct GroupVisibilityPolicy<D> {
    db: Arc<D>,
}

impl<D: Database> GroupVisibilityPolicy<D> {
    pub fn new(db: Arc<D>) -> Self {
        GroupVisibilityPolicy { db }
    }
}

#[async_trait]
impl<D: Database> AuthorizationPolicy for GroupVisibilityPolicy<D> {
    async fn visible_trees(
        &self,
        user: &User,
        candidates: &BTreeSet<i64>,
    ) -> Result<BTreeSet<i64>, ProcessError> {
        if user.system_admin {
            return Ok(candidates.clone());
        }

        let mut visible_group_ids =
            self.db.can_see_group_ids(user.group_id, DataType::Trees).await?;
        visible_group_ids.insert(user.group_id);

        let mut visible = BTreeSet::new();
        for &tree_id in candidates {
            if let Some(run) = self.db.run_for_tree(tree_id).await? {
                if visible_group_ids.contains(&run.group.id) {
                    visible.insert(tree_id);
                }
            }
        }
        Ok(visible)
    }
}

// ----------------------------------------------------------------------------
// Access Verification

/// Authorizes `user` against a tree and loads it together with its run
/// (owning group and default location eager-loaded).
///
/// An invisible or nonexistent tree fails with the uniform
/// [`ProcessError::NotViewable`]; a visible tree with no run fails with
/// [`ProcessError::MissingRun`].
pub async fn verify_and_access_phylo_tree<D, P>(
    db: &D,
    policy: &P,
    user: &User,
    tree_id: i64,
) -> Result<(PhyloTree, PhyloRun), ProcessError>
where
    D: Database,
    P: AuthorizationPolicy,
{
    let candidates = BTreeSet::from([tree_id]);
    let visible = policy.visible_trees(user, &candidates).await?;
    let not_viewable = ProcessError::NotViewable { tree_id, user_id: user.id };

    if !visible.contains(&tree_id) {
        warn!("User {} denied access to phylo tree {tree_id}.", user.id);
        return Err(not_viewable);
    }
    let Some(tree) = db.phylo_tree(tree_id).await? else {
        return Err(not_viewable);
    };
    let Some(run) = db.run_for_tree(tree_id).await? else {
        return Err(ProcessError::MissingRun(tree_id));
    };

    debug!("User {} granted access to phylo tree {tree_id}.", user.id);
    Ok((tree, run))
}

/// Returns the ids of groups whose private identifiers `user` may see: the
/// user's own group always, plus every explicit
/// [`DataType::PrivateIdentifiers`] grant for non-admins.
///
/// Admins carry no grant list; their unrestricted visibility is decided at
/// the call sites that consult this set.
pub async fn can_see_pi_group_ids<D: Database>(
    db: &D,
    user: &User,
) -> Result<BTreeSet<i64>, ProcessError> {
    let mut group_ids = BTreeSet::from([user.group_id]);
    if !user.system_admin {
        group_ids
            .extend(db.can_see_group_ids(user.group_id, DataType::PrivateIdentifiers).await?);
    }
    Ok(group_ids)
}
