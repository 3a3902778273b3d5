mod engine;
mod knowledge;
mod types;

pub use engine::{CertaintySets, InferenceEngine};
pub use knowledge::KnowledgeBase;
pub use types::{Dimensions, Sentence};
