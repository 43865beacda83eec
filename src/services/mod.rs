pub mod ground_truth;
pub mod log_writer;
pub mod preprocess;
pub mod score_engine;
pub mod statistics;

pub use ground_truth::{comparison_text, extract_ground_truth, format_judgement_log};
pub use log_writer::LogWriter;
pub use preprocess::{prepare_for_upload, MAX_IMAGE_SIZE};
pub use score_engine::{judge, JudgeFn};
pub use statistics::{format_accuracy, BatchStatistics};
