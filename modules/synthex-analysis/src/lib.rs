//! Turns a raw profile snapshot into the report the `analyze_profile` tool
//! returns: normalize, rank, enrich, summarize.

pub mod analyzer;
pub mod enrichment;
pub mod error;
pub mod normalize;
pub mod ranking;

pub use analyzer::ProfileAnalyzer;
pub use enrichment::{Enrichment, EnrichmentCoordinator};
pub use error::{AnalysisError, EnrichmentError, SchemaRecognitionError};
pub use normalize::normalize;
pub use ranking::{enrichment_candidates, is_video_url, rank, summarize};
