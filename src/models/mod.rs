pub mod judgment;
pub mod prediction;

pub use judgment::{JudgmentLabel, JudgmentMode};
pub use prediction::{Candidate, PredictionResult, AOI_OVERRIDE_CATEGORY};
