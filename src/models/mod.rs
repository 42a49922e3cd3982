pub mod comment;
pub mod collection;

pub use comment::*;
pub use collection::*;
