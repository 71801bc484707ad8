//! # Export Module
//!
//! Modulo che separa le responsabilità dell'export in sottomoduli:
//! - `pipeline`: Worker per singoli asset
//! - `result`: Esiti tipizzati per-asset

pub mod pipeline;
pub mod result;

pub use pipeline::ExportPipeline;
pub use result::{ExportOutcome, ExportResult, Payload};
