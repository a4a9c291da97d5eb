//! Text ingestion boundary: where documents come from before the writer sees them.

pub mod source;
