//! Synthetic price feed.
//!
//! Owns the live price map the engine queries by symbol, and (optionally) a
//! background task that random-walks the seeded symbols and broadcasts each
//! tick. The engine only ever reads; nothing in the order path mutates
//! prices.

use crate::types::PriceTick;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// Live price map plus tick broadcast.
pub struct PriceFeed {
    prices: DashMap<String, f64>,
    tx: broadcast::Sender<PriceTick>,
}

impl PriceFeed {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(1024);
        Arc::new(Self {
            prices: DashMap::new(),
            tx,
        })
    }

    /// Set the current price for a symbol.
    pub fn seed(&self, symbol: &str, price: f64) {
        self.prices.insert(symbol.to_uppercase(), price);
    }

    /// Current price for a symbol, if known.
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(&symbol.to_uppercase()).map(|p| *p)
    }

    /// All current prices.
    pub fn all_prices(&self) -> Vec<PriceTick> {
        let mut ticks: Vec<PriceTick> = self
            .prices
            .iter()
            .map(|entry| PriceTick {
                symbol: entry.key().clone(),
                price: *entry.value(),
            })
            .collect();
        ticks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        ticks
    }

    /// Subscribe to price ticks.
    pub fn subscribe(&self) -> broadcast::Receiver<PriceTick> {
        self.tx.subscribe()
    }

    /// Apply one random-walk step (±3%) to a random seeded symbol and
    /// broadcast the tick.
    pub fn step(&self) -> Option<PriceTick> {
        let symbols: Vec<String> = self.prices.iter().map(|e| e.key().clone()).collect();
        if symbols.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        let symbol = &symbols[rng.gen_range(0..symbols.len())];
        let change_pct = rng.gen_range(-0.03..=0.03);

        let mut entry = self.prices.get_mut(symbol)?;
        let price = (*entry * (1.0 + change_pct) * 100.0).round() / 100.0;
        *entry = price;
        drop(entry);

        let tick = PriceTick {
            symbol: symbol.clone(),
            price,
        };
        debug!("Price update: {} - ${}", tick.symbol, tick.price);
        let _ = self.tx.send(tick.clone());
        Some(tick)
    }

    /// Start the background simulator task.
    pub fn start_simulator(self: &Arc<Self>, interval: Duration) {
        let feed = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                feed.step();
            }
        });
    }
}
