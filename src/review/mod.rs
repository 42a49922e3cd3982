pub mod filter;

pub use filter::{CommentFilter, DatasetStats, ReviewComment};
