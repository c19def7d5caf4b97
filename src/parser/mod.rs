pub mod tasks;

pub use tasks::{parse_task_lines, parse_tasks_file, RawTask};
