pub mod analysis;
pub mod chat;
pub mod session;

pub use analysis::{AnalysisResult, Improvement, ImprovementKind, JobRecommendation, PersonalInfo};
pub use chat::{ChatLog, ChatMessage, Role};
pub use session::{Session, UserProfile};
