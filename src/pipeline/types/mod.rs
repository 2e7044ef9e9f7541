mod card_report;
mod condition;
mod embedding;
mod raw_image;
mod recognition;
mod tensor;

pub use card_report::CardReport;
pub use condition::{ConditionAnalysis, ConditionGrade, DefectAxis, DefectScores};
pub use embedding::{EMBEDDING_DIM, Embedding};
pub(crate) use embedding::dot;
pub use raw_image::{ChannelLayout, ColorSpace, RawImage};
pub use recognition::{Candidate, RecognitionResult, similarity_to_confidence};
pub(crate) use recognition::clamp_unit;
pub use tensor::{INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, PreprocessedTensor};
