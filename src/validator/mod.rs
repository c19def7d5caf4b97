pub mod coherence;
pub mod schema;

pub use coherence::{
    check_counts, check_cursor, check_documents, check_link_integrity, check_task_reference,
    full_check,
};
pub use schema::{StateValidator, ValidationReport};
