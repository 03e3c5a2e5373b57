pub mod analyzer;
pub mod suggestion;

pub use analyzer::{riskiest, riskiest_index, stable_dedup, AnalysisResult, CommandAnalyzer, NO_CONCERNS};
pub use suggestion::AlternativeGenerator;
