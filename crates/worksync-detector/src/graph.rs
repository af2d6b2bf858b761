use std::collections::{HashMap, HashSet, VecDeque};

use worksync_core::{ProjectId, WorkspaceSnapshot};

/// Returns the projects that transitively depend on `project_id` within the
/// given snapshot, by reversing the project reference edges and walking the
/// closure breadth-first. The start project itself is not included. Tracks
/// visited projects, so cyclic reference graphs terminate.
pub fn transitive_dependents(
    project_id: ProjectId,
    snapshot: &WorkspaceSnapshot,
) -> Vec<ProjectId> {
    // referenced project -> projects referencing it, in snapshot order
    let mut reverse: HashMap<ProjectId, Vec<ProjectId>> = HashMap::new();
    for project in snapshot.projects() {
        for &referenced in &project.references {
            reverse.entry(referenced).or_default().push(project.id);
        }
    }

    let mut visited: HashSet<ProjectId> = HashSet::from([project_id]);
    let mut queue: VecDeque<ProjectId> = VecDeque::from([project_id]);
    let mut dependents = Vec::new();

    while let Some(current) = queue.pop_front() {
        if let Some(direct) = reverse.get(&current) {
            for &dependent in direct {
                if visited.insert(dependent) {
                    dependents.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }
    }

    dependents
}
