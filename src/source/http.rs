//! HTTP client for a KIS-style quote proxy
//!
//! Two actions are used on the proxy's single endpoint:
//! - `rank_price`: ranked universe plus initial quotes
//! - `price`: quotes for a comma-separated list of codes
//!
//! Field names differ between upstream payload versions, so price, change,
//! code and name are each read from the first alias that is present.

use super::{
    DataOrigin, InstrumentMeta, Market, Quote, QuoteBatch, QuoteSource, SourceError, Universe,
    UniverseSource,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;

/// Proxy endpoint path
pub const KIS_ENDPOINT: &str = "/.netlify/functions/kis";

const PRICE_FIELDS: [&str; 4] = ["stck_prpr", "last", "prpr", "price"];
const CHANGE_FIELDS: [&str; 3] = ["prdy_ctrt", "change_rate", "rate"];
const CODE_FIELDS: [&str; 4] = ["stck_shrn_iscd", "iscd", "code", "ticker"];
const NAME_FIELDS: [&str; 4] = ["hts_kor_isnm", "kor_isnm", "name", "stck_issu_abbrv_name"];

/// Configuration for the HTTP source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Origin hosting the proxy
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

/// Universe and quote source backed by the proxy
pub struct HttpSource {
    config: HttpSourceConfig,
    client: Client,
}

impl HttpSource {
    /// Create a client with the given configuration
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), KIS_ENDPOINT)
    }

    async fn call(&self, query: &[(&str, String)]) -> Result<KisResponse, SourceError> {
        let url = self.endpoint();
        tracing::debug!(url = %url, action = ?query.first().map(|(_, v)| v), "Calling quote proxy");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        let payload: KisResponse = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) if status.is_success() => return Err(SourceError::Decode(e.to_string())),
            Err(_) => {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        };

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: payload.error.unwrap_or(body),
            });
        }
        if !payload.ok {
            return Err(SourceError::Api(
                payload.error.unwrap_or_else(|| "request failed".to_string()),
            ));
        }

        Ok(payload)
    }

    fn classify(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout(self.config.timeout)
        } else {
            SourceError::Http(error)
        }
    }
}

#[async_trait]
impl UniverseSource for HttpSource {
    async fn rank_candidates(
        &self,
        market: Market,
        top_n: usize,
        watch_count: usize,
    ) -> Result<Universe, SourceError> {
        let payload = self
            .call(&[
                ("action", "rank_price".to_string()),
                ("market", market.as_str().to_string()),
                ("topN", top_n.to_string()),
                ("watchN", watch_count.to_string()),
            ])
            .await?;

        let universe = parse_universe(payload, watch_count);
        tracing::info!(
            market = %market,
            candidates = universe.candidate_codes.len(),
            "Universe ranked"
        );
        Ok(universe)
    }
}

#[async_trait]
impl QuoteSource for HttpSource {
    async fn fetch_quotes(&self, market: Market, codes: &[String]) -> Result<QuoteBatch, SourceError> {
        if codes.is_empty() {
            return Ok(QuoteBatch::default());
        }

        let payload = self
            .call(&[
                ("action", "price".to_string()),
                ("market", market.as_str().to_string()),
                ("codes", codes.join(",")),
            ])
            .await?;

        Ok(QuoteBatch {
            quotes: parse_quotes(&payload.prices),
            origin: DataOrigin::Primary,
        })
    }
}

/// Raw proxy payload
#[derive(Debug, Deserialize)]
struct KisResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "pickCodes")]
    pick_codes: Vec<Value>,
    #[serde(default)]
    rank: Vec<Map<String, Value>>,
    #[serde(default)]
    prices: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    raw: Map<String, Value>,
}

/// Left-pad a numeric instrument code to six digits
///
/// Returns `None` for empty or all-zero codes.
pub fn pad_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let code = format!("{:0>6}", trimmed);
    if code.chars().all(|c| c == '0') {
        return None;
    }
    Some(code)
}

fn value_as_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn first_str(map: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| map.get(*f).and_then(value_as_str))
}

fn first_f64(map: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .find_map(|f| map.get(*f).and_then(value_as_f64))
        .filter(|v| v.is_finite())
}

fn parse_quotes(entries: &[PriceEntry]) -> Vec<Quote> {
    entries
        .iter()
        .filter_map(|entry| {
            let code = value_as_str(&entry.code).and_then(|c| pad_code(&c))?;
            let price = first_f64(&entry.raw, &PRICE_FIELDS)?;
            let daily_change_pct = first_f64(&entry.raw, &CHANGE_FIELDS).unwrap_or(0.0);
            Some(Quote {
                code,
                price,
                daily_change_pct,
            })
        })
        .collect()
}

fn parse_universe(payload: KisResponse, watch_count: usize) -> Universe {
    let mut seen = HashSet::new();
    let candidate_codes: Vec<String> = payload
        .pick_codes
        .iter()
        .filter_map(value_as_str)
        .filter_map(|c| pad_code(&c))
        .filter(|c| seen.insert(c.clone()))
        .take(watch_count)
        .collect();

    let metadata = payload
        .rank
        .iter()
        .filter_map(|row| {
            let code = first_str(row, &CODE_FIELDS).and_then(|c| pad_code(&c))?;
            let name = first_str(row, &NAME_FIELDS).unwrap_or_default();
            Some(InstrumentMeta { code, name })
        })
        .collect();

    Universe {
        candidate_codes,
        metadata,
        initial_quotes: parse_quotes(&payload.prices),
        origin: DataOrigin::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> KisResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_pad_code() {
        assert_eq!(pad_code("5930"), Some("005930".to_string()));
        assert_eq!(pad_code("035720"), Some("035720".to_string()));
        assert_eq!(pad_code(""), None);
        assert_eq!(pad_code("0"), None);
    }

    #[test]
    fn test_parse_universe_aliases() {
        let resp = payload(
            r#"{
                "ok": true,
                "pickCodes": ["035720", 5930, "035720", "000000"],
                "rank": [
                    {"stck_shrn_iscd": "035720", "hts_kor_isnm": "Kakao"},
                    {"code": 5930, "name": "Samsung"},
                    {"ticker": "", "name": "Nobody"}
                ],
                "prices": [
                    {"code": "035720", "raw": {"stck_prpr": "51,200", "prdy_ctrt": "2.35"}},
                    {"code": "005930", "raw": {"last": 70100, "rate": -0.5}},
                    {"code": "000660", "raw": {"prdy_ctrt": "1.0"}}
                ]
            }"#,
        );

        let universe = parse_universe(resp, 15);
        assert_eq!(universe.candidate_codes, vec!["035720", "005930"]);
        assert_eq!(
            universe.metadata,
            vec![
                InstrumentMeta {
                    code: "035720".to_string(),
                    name: "Kakao".to_string()
                },
                InstrumentMeta {
                    code: "005930".to_string(),
                    name: "Samsung".to_string()
                },
            ]
        );
        assert_eq!(universe.initial_quotes.len(), 2);
        assert_eq!(universe.initial_quotes[0].price, 51_200.0);
        assert_eq!(universe.initial_quotes[0].daily_change_pct, 2.35);
        assert_eq!(universe.initial_quotes[1].price, 70_100.0);
        assert_eq!(universe.initial_quotes[1].daily_change_pct, -0.5);
    }

    #[test]
    fn test_parse_universe_respects_watch_count() {
        let resp = payload(r#"{"ok": true, "pickCodes": ["1", "2", "3", "4"]}"#);
        let universe = parse_universe(resp, 2);
        assert_eq!(universe.candidate_codes, vec!["000001", "000002"]);
    }

    #[test]
    fn test_parse_quotes_missing_change_defaults_to_zero() {
        let resp = payload(r#"{"ok": true, "prices": [{"code": "A1", "raw": {"price": 100.5}}]}"#);
        let quotes = parse_quotes(&resp.prices);
        assert_eq!(quotes[0].code, "0000A1");
        assert_eq!(quotes[0].daily_change_pct, 0.0);
    }

    #[test]
    fn test_parse_quotes_skips_unparseable_price() {
        let resp = payload(r#"{"ok": true, "prices": [{"code": "1", "raw": {"stck_prpr": "n/a"}}]}"#);
        assert!(parse_quotes(&resp.prices).is_empty());
    }

    #[test]
    fn test_missing_ok_is_failure() {
        let resp = payload(r#"{"error": "rate limited"}"#);
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let source = HttpSource::new(HttpSourceConfig {
            base_url: "https://radar.example/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(source.endpoint(), "https://radar.example/.netlify/functions/kis");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let source = HttpSource::new(HttpSourceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let result = source
            .fetch_quotes(Market::Kosdaq, &["035720".to_string()])
            .await;
        assert!(result.is_err());
    }
}
