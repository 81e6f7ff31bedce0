//! market-pulse - simulated market data and sentiment pipeline
//!
//! Each run ingests one price tick per tracked symbol and one headline,
//! labels the newest headline with a sentiment, and sweeps rows past the
//! retention age. Everything is persisted through a relational [`store`].

pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod retention;
pub mod sentiment;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, PipelineReport, Step, StepOutcome};
pub use store::Store;
pub use types::{Headline, PriceSample, SentimentKind, SentimentLabel};
