//! `kbart-recon`: identifier normalization and holdings/purchase reconciliation.
//!
//! Pure engine crate: receives pre-loaded tables, returns the filtered
//! holdings and the missing identifiers. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;

pub use config::{AbsentPolicy, ReconConfig};
pub use engine::run;
pub use error::ReconError;
pub use model::{
    ColumnSelector, MissingReport, NormalizedId, RawValue, ReconMeta, ReconResult, ReconSummary,
    Table,
};
pub use normalize::Normalizer;
