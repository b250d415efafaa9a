mod groq;

pub use groq::{AnalysisResult, GroqClient, FALLBACK_USER_RESPONSE};
