//! Simulated market data ingestion.
//!
//! Two generators feed the store on every run: one price tick per
//! allow-listed symbol, and one headline drawn from a fixed pool.

pub mod headlines;
pub mod ticks;

pub use headlines::{ingest_headline, pick_headline, write_headline, HEADLINE_POOL, HEADLINE_URL};
pub use ticks::{ingest_ticks, simulate_ticks, write_ticks, TickSummary};
