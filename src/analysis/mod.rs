pub mod analyzer;
pub mod indicators;
pub mod pipeline;

pub use analyzer::{Action, AnalysisFailure, AnalysisResult, SymbolAnalyzer};
pub use indicators::{IndicatorEngine, IndicatorSet};
pub use pipeline::AnalysisPipeline;
