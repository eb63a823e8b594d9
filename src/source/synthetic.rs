//! Synthetic market data for demo mode and tests

use super::{
    DataOrigin, InstrumentMeta, Market, Quote, QuoteBatch, QuoteSource, SourceError, Universe,
    UniverseSource,
};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Instruments generated per market
const ROSTER_SIZE: usize = 40;
/// Per-step noise amplitude in percent
const NOISE_PCT: f64 = 0.05;
/// Chance per step that a quiet instrument starts a momentum burst
const BURST_PROBABILITY: f64 = 0.015;

struct SimInstrument {
    name: String,
    price: f64,
    prev_close: f64,
    /// Remaining steps of the current burst
    burst_steps: u32,
    /// Drift per step in percent while bursting
    burst_drift: f64,
}

struct SimState {
    rng: StdRng,
    instruments: BTreeMap<String, SimInstrument>,
}

/// Random-walk universe and quote generator
///
/// Each fetch advances every requested instrument by one step. Quiet
/// instruments wander around their previous close; occasionally one starts a
/// burst of directional drift, which is what the radar is looking for.
pub struct SyntheticSource {
    state: Mutex<SimState>,
}

impl SyntheticSource {
    /// Create a generator; a seed makes the sequence reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut instruments = BTreeMap::new();
        for market in [Market::Kospi, Market::Kosdaq] {
            for i in 0..ROSTER_SIZE {
                let code = Self::roster_code(market, i);
                let instrument = Self::spawn(&mut rng, format!("{} SIM {:02}", market, i + 1));
                instruments.insert(code, instrument);
            }
        }

        Self {
            state: Mutex::new(SimState { rng, instruments }),
        }
    }

    fn roster_code(market: Market, index: usize) -> String {
        let base = match market {
            Market::Kospi => 900_000,
            Market::Kosdaq => 950_000,
        };
        format!("{:06}", base + index)
    }

    fn spawn(rng: &mut StdRng, name: String) -> SimInstrument {
        let prev_close = (rng.gen_range(2_000.0..80_000.0_f64) / 10.0).round() * 10.0;
        let price = prev_close * (1.0 + rng.gen_range(-3.0..3.0) / 100.0);
        SimInstrument {
            name,
            price: price.round(),
            prev_close,
            burst_steps: 0,
            burst_drift: 0.0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn step(rng: &mut StdRng, instrument: &mut SimInstrument) {
        if instrument.burst_steps == 0 && rng.gen_bool(BURST_PROBABILITY) {
            instrument.burst_steps = rng.gen_range(20..60);
            instrument.burst_drift = rng.gen_range(0.03..0.12);
        }

        let mut change_pct = rng.gen_range(-NOISE_PCT..NOISE_PCT);
        if instrument.burst_steps > 0 {
            instrument.burst_steps -= 1;
            change_pct += instrument.burst_drift;
        } else {
            // Mean reversion towards the previous close
            let gap = (instrument.price / instrument.prev_close - 1.0) * 100.0;
            change_pct -= gap * 0.002;
        }

        let next = instrument.price * (1.0 + change_pct / 100.0);
        instrument.price = next.round().max(1.0);
    }

    fn quote(code: &str, instrument: &SimInstrument) -> Quote {
        Quote {
            code: code.to_string(),
            price: instrument.price,
            daily_change_pct: (instrument.price / instrument.prev_close - 1.0) * 100.0,
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl UniverseSource for SyntheticSource {
    async fn rank_candidates(
        &self,
        market: Market,
        top_n: usize,
        watch_count: usize,
    ) -> Result<Universe, SourceError> {
        let mut guard = self.lock();
        let SimState { rng, instruments } = &mut *guard;

        let mut ranked: Vec<(String, f64)> = (0..ROSTER_SIZE)
            .map(|i| Self::roster_code(market, i))
            .filter_map(|code| {
                let instrument = instruments.get_mut(&code)?;
                Self::step(rng, instrument);
                let activity = (instrument.price / instrument.prev_close - 1.0).abs();
                Some((code, activity))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_n);

        let candidate_codes: Vec<String> = ranked
            .iter()
            .take(watch_count)
            .map(|(code, _)| code.clone())
            .collect();

        let mut metadata = Vec::with_capacity(ranked.len());
        for (code, _) in &ranked {
            if let Some(instrument) = instruments.get(code) {
                metadata.push(InstrumentMeta {
                    code: code.clone(),
                    name: instrument.name.clone(),
                });
            }
        }

        let initial_quotes = candidate_codes
            .iter()
            .filter_map(|code| instruments.get(code).map(|i| Self::quote(code, i)))
            .collect();

        Ok(Universe {
            candidate_codes,
            metadata,
            initial_quotes,
            origin: DataOrigin::Primary,
        })
    }
}

#[async_trait]
impl QuoteSource for SyntheticSource {
    async fn fetch_quotes(&self, _market: Market, codes: &[String]) -> Result<QuoteBatch, SourceError> {
        let mut guard = self.lock();
        let SimState { rng, instruments } = &mut *guard;

        let mut quotes = Vec::with_capacity(codes.len());
        for code in codes {
            let instrument = instruments
                .entry(code.clone())
                .or_insert_with(|| Self::spawn(rng, code.clone()));
            Self::step(rng, instrument);
            quotes.push(Self::quote(code, instrument));
        }

        Ok(QuoteBatch {
            quotes,
            origin: DataOrigin::Primary,
        })
    }
}
