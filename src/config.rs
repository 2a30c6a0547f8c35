use std::env;

/// Application configuration.
///
/// Everything is environment-driven; `.env` is loaded by the binary before
/// `from_env` runs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite database path. `None` keeps the store in memory.
    pub database_path: Option<String>,
    /// Delay before a pending order is settled, in milliseconds.
    pub settlement_delay_ms: u64,
    /// Probability that settlement completes an order, in [0, 1].
    pub settlement_success_rate: f64,
    /// Interval between synthetic price ticks, in milliseconds.
    pub price_interval_ms: u64,
    /// Seed prices for the synthetic feed.
    pub seed_prices: Vec<(String, f64)>,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let database_path = match env::var("DATABASE_PATH") {
            Ok(p) if p == ":memory:" => None,
            Ok(p) => Some(p),
            Err(_) => Some("paperdesk.db".to_string()),
        };

        let settlement_delay_ms = env::var("SETTLEMENT_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7_000);

        let settlement_success_rate = env::var("SETTLEMENT_SUCCESS_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|r| r.clamp(0.0, 1.0))
            .unwrap_or(0.8);

        let price_interval_ms = env::var("PRICE_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5_000);

        // Format: "AAPL:150,MSFT:300"
        let seed_prices = env::var("SEED_PRICES")
            .ok()
            .map(|s| parse_seed_prices(&s))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_seed_prices);

        Self {
            host,
            port,
            database_path,
            settlement_delay_ms,
            settlement_success_rate,
            price_interval_ms,
            seed_prices,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_seed_prices(raw: &str) -> Vec<(String, f64)> {
    raw.split(',')
        .filter_map(|pair| {
            let (symbol, price) = pair.split_once(':')?;
            let symbol = symbol.trim().to_uppercase();
            let price: f64 = price.trim().parse().ok()?;
            if symbol.is_empty() || price <= 0.0 {
                return None;
            }
            Some((symbol, price))
        })
        .collect()
}

fn default_seed_prices() -> Vec<(String, f64)> {
    vec![
        ("AAPL".to_string(), 150.0),
        ("MSFT".to_string(), 300.0),
        ("GOOGL".to_string(), 2800.0),
        ("TSLA".to_string(), 700.0),
    ]
}
