//! Headline generator.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, instrument};

use crate::store::Store;
use crate::types::{Headline, NewHeadline};

/// (headline, source) pairs drawn from on every run.
pub const HEADLINE_POOL: [(&str, &str); 5] = [
    ("Fed suggests interest rate pause", "Wall Street Journal"),
    ("Tech giants face new antitrust probe", "CNBC"),
    ("AI chips demand hitting record highs", "Reuters"),
    ("Consumer spending shows unexpected resilience", "Bloomberg"),
    ("Global supply chain disruptions easing", "Financial Times"),
];

/// Placeholder link stored on every generated headline.
pub const HEADLINE_URL: &str = "https://finance.yahoo.com";

/// Pick one headline uniformly at random from the pool.
pub fn pick_headline<R: Rng + ?Sized>(rng: &mut R, at: DateTime<Utc>) -> NewHeadline {
    let (headline, source) = HEADLINE_POOL[rng.gen_range(0..HEADLINE_POOL.len())];
    NewHeadline {
        headline: headline.to_string(),
        url: HEADLINE_URL.to_string(),
        source: source.to_string(),
        summary: None,
        published_at: at,
    }
}

/// Insert exactly one freshly picked headline. Repeats of earlier headlines are expected.
#[instrument(skip(store))]
pub async fn ingest_headline(store: &Store) -> Result<Headline> {
    let new = pick_headline(&mut rand::thread_rng(), Utc::now());
    let id = write_headline(store, &new).await?;

    info!("News ingested: {} ({})", new.headline, new.source);
    Ok(Headline {
        id,
        headline: new.headline,
        url: new.url,
        source: new.source,
        summary: new.summary,
        published_at: new.published_at,
    })
}

pub async fn write_headline(store: &Store, headline: &NewHeadline) -> Result<i64> {
    let mut session = store.begin().await?;
    let id = session.insert_headline(headline).await?;
    session.commit().await?;
    Ok(id)
}
