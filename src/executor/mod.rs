mod context;
mod pipeline;

pub use context::QueryContext;
pub use pipeline::{OpenStream, QueryExecutor};
