pub mod feature;
pub mod task;
pub mod violation;

pub use feature::{
    CoherenceSummary, CurrentTask, CursorStatus, DocumentRef, FeatureInfo, FeatureState,
    StateFileInfo, TasksDocument, TicketRef, WorkflowDocuments, WorkflowPhase, STATE_VERSION,
};
pub use task::{Task, TaskStatus, TddPhase, FOUNDATION_STORY};
pub use violation::{CoherenceReport, Severity, Violation, ViolationType};
