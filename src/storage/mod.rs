pub mod progress;
pub mod export;

pub use progress::{load_dataset, write_json_atomic, ProgressStore};
pub use export::{export_comments_csv, export_details_csv, write_dataset};
