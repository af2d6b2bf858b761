use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::syntax::{SemanticModel, SyntaxTree};

pub type ProjectId = Uuid;
pub type DocumentId = Uuid;

/// A project as it exists inside a workspace snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: ProjectId,
    pub name: String,
    pub file_path: String,
    /// Projects this project references (outgoing edges).
    pub references: Vec<ProjectId>,
    pub documents: Vec<DocumentId>,
}

impl ProjectState {
    pub fn new(id: ProjectId, name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            file_path: file_path.into(),
            references: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<ProjectId>) -> Self {
        self.references = references;
        self
    }
}

/// A document as it exists inside a workspace snapshot. Syntax and semantics
/// are optional: a document that has not been analyzed yet simply has neither.
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub id: DocumentId,
    pub project_id: ProjectId,
    pub file_path: String,
    pub text: String,
    syntax: Option<Arc<SyntaxTree>>,
    semantics: Option<Arc<SemanticModel>>,
}

impl DocumentState {
    pub fn new(
        id: DocumentId,
        project_id: ProjectId,
        file_path: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            file_path: file_path.into(),
            text: text.into(),
            syntax: None,
            semantics: None,
        }
    }

    pub fn with_syntax(mut self, syntax: SyntaxTree) -> Self {
        self.syntax = Some(Arc::new(syntax));
        self
    }

    pub fn with_semantics(mut self, semantics: SemanticModel) -> Self {
        self.semantics = Some(Arc::new(semantics));
        self
    }

    pub fn syntax(&self) -> Option<&SyntaxTree> {
        self.syntax.as_deref()
    }

    pub fn semantics(&self) -> Option<&SemanticModel> {
        self.semantics.as_deref()
    }
}

/// Immutable view of the workspace at a point in time. Snapshots are built
/// once, shared behind `Arc`, and compared against each other; they are never
/// mutated in place. Project iteration order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    projects: Vec<ProjectState>,
    project_index: HashMap<ProjectId, usize>,
    documents: HashMap<DocumentId, DocumentState>,
}

impl WorkspaceSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a project, replacing any existing project with the same id
    /// without disturbing its position.
    pub fn with_project(mut self, project: ProjectState) -> Self {
        match self.project_index.get(&project.id) {
            Some(&slot) => self.projects[slot] = project,
            None => {
                self.project_index.insert(project.id, self.projects.len());
                self.projects.push(project);
            }
        }
        self
    }

    /// Adds a document and records it on its owning project, if present.
    pub fn with_document(mut self, document: DocumentState) -> Self {
        if let Some(&slot) = self.project_index.get(&document.project_id) {
            let owner = &mut self.projects[slot];
            if !owner.documents.contains(&document.id) {
                owner.documents.push(document.id);
            }
        }
        self.documents.insert(document.id, document);
        self
    }

    pub fn project(&self, id: ProjectId) -> Option<&ProjectState> {
        self.project_index.get(&id).map(|&slot| &self.projects[slot])
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectState> {
        self.projects.iter()
    }

    pub fn project_ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.iter().map(|p| p.id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&DocumentState> {
        self.documents.get(&id)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

/// The twelve workspace mutation kinds, grouped by scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkspaceChangeKind {
    SolutionAdded,
    SolutionChanged,
    SolutionCleared,
    SolutionReloaded,
    SolutionRemoved,
    ProjectAdded,
    ProjectChanged,
    ProjectRemoved,
    ProjectReloaded,
    DocumentAdded,
    DocumentChanged,
    DocumentRemoved,
}

impl WorkspaceChangeKind {
    pub fn is_solution_scoped(self) -> bool {
        matches!(
            self,
            Self::SolutionAdded
                | Self::SolutionChanged
                | Self::SolutionCleared
                | Self::SolutionReloaded
                | Self::SolutionRemoved
        )
    }

    pub fn is_project_scoped(self) -> bool {
        matches!(
            self,
            Self::ProjectAdded | Self::ProjectChanged | Self::ProjectRemoved | Self::ProjectReloaded
        )
    }

    pub fn is_document_scoped(self) -> bool {
        matches!(
            self,
            Self::DocumentAdded | Self::DocumentChanged | Self::DocumentRemoved
        )
    }
}

/// One workspace mutation. Project and document ids are present only for the
/// kinds scoped to them; the snapshot pair is discarded once classified.
#[derive(Debug, Clone)]
pub struct WorkspaceChangeEvent {
    pub kind: WorkspaceChangeKind,
    pub old_snapshot: Arc<WorkspaceSnapshot>,
    pub new_snapshot: Arc<WorkspaceSnapshot>,
    pub project_id: Option<ProjectId>,
    pub document_id: Option<DocumentId>,
}

impl WorkspaceChangeEvent {
    pub fn solution(
        kind: WorkspaceChangeKind,
        old_snapshot: Arc<WorkspaceSnapshot>,
        new_snapshot: Arc<WorkspaceSnapshot>,
    ) -> Self {
        debug_assert!(kind.is_solution_scoped());
        Self {
            kind,
            old_snapshot,
            new_snapshot,
            project_id: None,
            document_id: None,
        }
    }

    pub fn project(
        kind: WorkspaceChangeKind,
        old_snapshot: Arc<WorkspaceSnapshot>,
        new_snapshot: Arc<WorkspaceSnapshot>,
        project_id: ProjectId,
    ) -> Self {
        debug_assert!(kind.is_project_scoped());
        Self {
            kind,
            old_snapshot,
            new_snapshot,
            project_id: Some(project_id),
            document_id: None,
        }
    }

    pub fn document(
        kind: WorkspaceChangeKind,
        old_snapshot: Arc<WorkspaceSnapshot>,
        new_snapshot: Arc<WorkspaceSnapshot>,
        project_id: ProjectId,
        document_id: DocumentId,
    ) -> Self {
        debug_assert!(kind.is_document_scoped());
        Self {
            kind,
            old_snapshot,
            new_snapshot,
            project_id: Some(project_id),
            document_id: Some(document_id),
        }
    }
}

/// A settled recomputation request handed to the downstream processor.
/// `workspace_project == None` means the project no longer exists in the
/// workspace and previously published state for it must be torn down.
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub project_id: ProjectId,
    pub workspace_project: Option<ProjectState>,
    /// The snapshot attached to the event that last touched this target.
    pub snapshot: Arc<WorkspaceSnapshot>,
}

impl ProjectUpdate {
    pub fn is_removal(&self) -> bool {
        self.workspace_project.is_none()
    }
}

/// Detector configuration. The debounce delay is the single tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub debounce_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { debounce_ms: 200 }
    }
}

impl DetectorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
