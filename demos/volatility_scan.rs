//! Volatility scan over a generated batch.
//!
//! Uses a wide daily FX swing so that authorizations and later captures
//! regularly drift past the 5% threshold, then lists every flagged pair.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use settlement_engine::prelude::*;
use settlement_engine::simulation::generator::{generate_batch_with_rng, GeneratorConfig};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let config = GeneratorConfig {
        supplier_count: 12,
        transaction_count: 360,
        authorization_share: 0.3,
        ..Default::default()
    };
    let batch = generate_batch_with_rng(&config, Utc::now(), &mut StdRng::seed_from_u64(2024));

    let provider = SimulatedRateProvider::new(RateTable::default()).with_amplitude(0.15);
    let engine = SettlementEngine::new(provider);
    let run = engine.calculate(batch.transactions())?;

    println!("Scanned {} transactions for {} suppliers\n", batch.len(), run.settlements().len());

    let mut flagged = 0;
    for s in run.settlements() {
        if let Some(found) = s.volatility_match() {
            flagged += 1;
            println!(
                "  {:<8} {} -> {}  variance {:.2}%",
                s.supplier_id().as_str(),
                found.intent_id,
                found.capture_id,
                found.variance_pct
            );
        }
    }

    if flagged == 0 {
        println!("No volatility warnings.");
    } else {
        println!("\n{} of {} suppliers flagged", flagged, run.settlements().len());
    }
    Ok(())
}
