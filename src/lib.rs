//! varita: preparación de datasets de gestos a partir de grabaciones de acelerómetro.
//!
//! Flujo: grabaciones CSV -> filtrado IIR -> segmentación por disparo ->
//! balanceo de clases -> partición estratificada -> tensores y artefactos.

pub mod artifacts;
pub mod balancer;
pub mod config;
pub mod csv_loader;
pub mod dataset;
pub mod error;
pub mod filter_design;
pub mod gesture_segmenter;
pub mod labels;
pub mod recording_source;
pub mod signal_conditioner;
pub mod splitter;
pub mod types;

pub use error::{PipelineError, Result};
