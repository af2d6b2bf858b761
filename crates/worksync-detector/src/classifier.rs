use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use worksync_core::{
    ProjectId, Result, WorkSyncError, WorkspaceChangeEvent, WorkspaceChangeKind, WorkspaceSnapshot,
};

use crate::graph::transitive_dependents;
use crate::relevance::is_relevant_document;

/// The projects a classified event requires recomputing, in order and without
/// duplicates. `state_clear` means every previously tracked project must be
/// treated as removed before the fresh targets are enqueued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSet {
    pub state_clear: bool,
    targets: Vec<ProjectId>,
}

impl ImpactSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(targets: Vec<ProjectId>) -> Self {
        Self {
            state_clear: false,
            targets: dedup_in_order(targets),
        }
    }

    pub fn state_clearing(targets: Vec<ProjectId>) -> Self {
        Self {
            state_clear: true,
            targets: dedup_in_order(targets),
        }
    }

    pub fn targets(&self) -> &[ProjectId] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        !self.state_clear && self.targets.is_empty()
    }
}

fn dedup_in_order(targets: Vec<ProjectId>) -> Vec<ProjectId> {
    let mut seen = HashSet::with_capacity(targets.len());
    targets.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Maps a workspace mutation to the set of projects that must be recomputed.
///
/// Solution-scoped kinds clear tracked state and target every project in the
/// new snapshot. Project-scoped kinds target the project plus its transitive
/// dependents; a removal resolves dependents against the pre-removal graph.
/// Document-scoped kinds go through the relevance filter first and then fan
/// out from the owning project. A scoped event missing its identifier is a
/// collaborator contract violation and fails fast.
pub fn classify(event: &WorkspaceChangeEvent) -> Result<ImpactSet> {
    let kind = event.kind;

    if kind.is_solution_scoped() {
        let targets = event.new_snapshot.project_ids().collect();
        return Ok(ImpactSet::state_clearing(targets));
    }

    if kind.is_project_scoped() {
        let project_id = require_project_id(event)?;
        let graph_snapshot = if kind == WorkspaceChangeKind::ProjectRemoved {
            &event.old_snapshot
        } else {
            &event.new_snapshot
        };
        return Ok(ImpactSet::of(fan_out(project_id, graph_snapshot)));
    }

    let project_id = require_project_id(event)?;
    let document_id = event.document_id.ok_or_else(|| {
        WorkSyncError::MalformedEvent(format!("{kind:?} event is missing its document id"))
    })?;

    // A removed document only exists in the old snapshot.
    let document = event
        .new_snapshot
        .document(document_id)
        .or_else(|| event.old_snapshot.document(document_id));
    let Some(document) = document else {
        debug!(%document_id, "document event for a document in neither snapshot; ignoring");
        return Ok(ImpactSet::none());
    };

    if !is_relevant_document(document) {
        return Ok(ImpactSet::none());
    }

    Ok(ImpactSet::of(fan_out(project_id, &event.new_snapshot)))
}

fn require_project_id(event: &WorkspaceChangeEvent) -> Result<ProjectId> {
    event.project_id.ok_or_else(|| {
        WorkSyncError::MalformedEvent(format!(
            "{:?} event is missing its project id",
            event.kind
        ))
    })
}

fn fan_out(project_id: ProjectId, snapshot: &WorkspaceSnapshot) -> Vec<ProjectId> {
    let mut targets = vec![project_id];
    targets.extend(transitive_dependents(project_id, snapshot));
    targets
}
