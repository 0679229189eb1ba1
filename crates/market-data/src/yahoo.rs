use analysis_core::{
    AnalysisError, Fundamentals, HistoricalSeries, HistoryPeriod, MarketDataGateway, PricePoint,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::rate_limit::RateLimiter;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile,defaultKeyStatistics";
const MAX_ATTEMPTS: u32 = 3;

/// Yahoo Finance adapter over the chart (v8) and quoteSummary (v10) endpoints.
#[derive(Clone)]
pub struct YahooFinanceClient {
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooFinanceClient {
    pub fn new(base_url: Option<String>, requests_per_minute: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
            rate_limiter: RateLimiter::per_minute(requests_per_minute),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<Value, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            let status = response.status();
            if status.as_u16() == 429 {
                let wait_secs = 5u64 * u64::from(attempt + 1);
                tracing::warn!(
                    "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                    wait_secs,
                    attempt + 1,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !status.is_success() {
                return Err(AnalysisError::ApiError(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                )));
            }

            return response
                .json::<Value>()
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()));
        }

        Err(AnalysisError::ApiError(format!(
            "Rate limited by Yahoo Finance after {} retries",
            MAX_ATTEMPTS
        )))
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<Value, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        self.send_request(self.client.get(&url).query(query)).await
    }

    async fn quote_summary(&self, symbol: &str) -> Result<Value, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        self.send_request(self.client.get(&url).query(&[("modules", SUMMARY_MODULES)]))
            .await
    }
}

#[async_trait]
impl MarketDataGateway for YahooFinanceClient {
    async fn lookup_price(&self, ticker: &str) -> Result<f64, AnalysisError> {
        let json = self
            .chart(ticker, &[("range", "5d".to_string()), ("interval", "1d".to_string())])
            .await?;
        parse_price(ticker, &json)
    }

    async fn lookup_history(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalSeries, AnalysisError> {
        let now = Utc::now();
        let mut query = vec![("interval", "1d".to_string())];
        match period.start_date(now.date_naive()) {
            Some(start) => {
                let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
                query.push(("period1", period1.to_string()));
                query.push(("period2", now.timestamp().to_string()));
            }
            None => query.push(("range", "max".to_string())),
        }

        let json = self.chart(ticker, &query).await?;
        let series = parse_chart(ticker, &json)?;
        tracing::debug!("Fetched {} closes for {} ({})", series.len(), ticker, period);
        Ok(series)
    }

    async fn lookup_fundamentals(&self, ticker: &str) -> Result<Fundamentals, AnalysisError> {
        let json = self.quote_summary(ticker).await?;
        parse_quote_summary(ticker, &json)
    }

    async fn lookup_fx_rate(&self, currency: &str) -> Result<f64, AnalysisError> {
        let (code, divisor) = fx_pair(currency);
        if code == "USD" {
            return Ok(1.0 / divisor);
        }
        let pair = format!("{}USD=X", code);
        let price = self.lookup_price(&pair).await?;
        Ok(price / divisor)
    }
}

/// Yahoo reports some listings in minor units ("GBp", "ZAc", "ILA").
fn fx_pair(currency: &str) -> (String, f64) {
    match currency.trim() {
        "GBp" | "GBX" => ("GBP".to_string(), 100.0),
        "ZAc" => ("ZAR".to_string(), 100.0),
        "ILA" => ("ILS".to_string(), 100.0),
        other => (other.to_ascii_uppercase(), 1.0),
    }
}

fn chart_result<'a>(ticker: &str, json: &'a Value) -> Result<&'a Value, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::fetch(ticker, "missing chart payload"))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown chart error");
        return Err(AnalysisError::fetch(ticker, description));
    }

    chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::fetch(ticker, "no chart data found"))
}

/// Daily closes from a chart response. Null closes (halts, holidays) are skipped and
/// timestamps are shifted by the exchange offset before taking the calendar date.
pub fn parse_chart(ticker: &str, json: &Value) -> Result<HistoricalSeries, AnalysisError> {
    let result = chart_result(ticker, json)?;

    let offset = result
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        None => return Ok(HistoricalSeries::empty(ticker)),
    };

    let closes = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|q| q.get("close"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::fetch(ticker, "no close prices in chart"))?;

    let points = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let close = close.as_f64()?;
            let date = DateTime::from_timestamp(ts.as_i64()? + offset, 0)?.date_naive();
            Some(PricePoint::new(date, close))
        })
        .collect();

    Ok(HistoricalSeries::from_unsorted(ticker, points))
}

/// Latest market price from a chart response: `meta.regularMarketPrice`, falling back
/// to the last non-null close.
pub fn parse_price(ticker: &str, json: &Value) -> Result<f64, AnalysisError> {
    let result = chart_result(ticker, json)?;

    let meta_price = result
        .get("meta")
        .and_then(|m| m.get("regularMarketPrice"))
        .and_then(|v| v.as_f64());

    let price = meta_price.or_else(|| {
        result
            .get("indicators")
            .and_then(|v| v.get("quote"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|q| q.get("close"))
            .and_then(|v| v.as_array())
            .and_then(|closes| closes.iter().rev().find_map(|c| c.as_f64()))
    });

    match price {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(AnalysisError::fetch(ticker, "no market price available")),
    }
}

/// Numeric field that may be either a plain number or a `{"raw": .., "fmt": ..}` object.
fn number(module: Option<&Value>, key: &str) -> Option<f64> {
    let value = module?.get(key)?;
    value
        .get("raw")
        .and_then(|v| v.as_f64())
        .or_else(|| value.as_f64())
        .filter(|v| v.is_finite())
}

fn text(module: Option<&Value>, key: &str) -> Option<String> {
    module?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Fundamentals from a quoteSummary response
pub fn parse_quote_summary(ticker: &str, json: &Value) -> Result<Fundamentals, AnalysisError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| AnalysisError::fetch(ticker, "missing quoteSummary payload"))?;

    if let Some(err) = summary.get("error").filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown quoteSummary error");
        return Err(AnalysisError::fetch(ticker, description));
    }

    let result = summary
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::fetch(ticker, "no fundamental data found"))?;

    let price = result.get("price");
    let detail = result.get("summaryDetail");
    let profile = result.get("assetProfile");
    let stats = result.get("defaultKeyStatistics");

    Ok(Fundamentals {
        sector: text(profile, "sector"),
        industry: text(profile, "industry"),
        exchange: text(price, "exchange"),
        currency: text(price, "currency").or_else(|| text(detail, "currency")),
        beta: number(detail, "beta").or_else(|| number(stats, "beta")),
        pe_ratio: number(detail, "trailingPE"),
        forward_eps: number(stats, "forwardEps"),
        price_to_book: number(stats, "priceToBook"),
        dividend_yield: number(detail, "dividendYield"),
        market_cap: number(price, "marketCap").or_else(|| number(detail, "marketCap")),
        fifty_two_week_high: number(detail, "fiftyTwoWeekHigh"),
        fifty_two_week_low: number(detail, "fiftyTwoWeekLow"),
        previous_close: number(detail, "previousClose")
            .or_else(|| number(price, "regularMarketPreviousClose")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use serde_json::json;

    fn chart_fixture() -> Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 190.5, "gmtoffset": -14400 },
                    "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                    "indicators": { "quote": [{ "close": [185.64, null, 181.91, 181.18] }] }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_parse_chart_skips_null_closes() {
        let series = parse_chart("AAPL", &chart_fixture()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.ticker(), "AAPL");
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series.last().unwrap().close, 181.18);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let json = json!({
            "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" } }
        });
        let err = parse_chart("ZZZZ", &json).unwrap_err();
        assert!(matches!(err, AnalysisError::FetchFailed { ref ticker, .. } if ticker == "ZZZZ"));
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let json = json!({ "chart": { "result": [{ "meta": {}, "indicators": { "quote": [{}] } }], "error": null } });
        assert!(parse_chart("NEW", &json).unwrap().is_empty());
    }

    #[test]
    fn test_parse_price_prefers_meta() {
        assert_eq!(parse_price("AAPL", &chart_fixture()).unwrap(), 190.5);

        let mut fallback = chart_fixture();
        fallback["chart"]["result"][0]["meta"] = json!({});
        assert_eq!(parse_price("AAPL", &fallback).unwrap(), 181.18);
    }

    #[test]
    fn test_parse_price_rejects_zero() {
        let json = json!({ "chart": { "result": [{ "meta": { "regularMarketPrice": 0.0 } }], "error": null } });
        assert!(parse_price("AAA", &json).is_err());
    }

    #[test]
    fn test_parse_quote_summary() {
        let json = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "exchange": "NMS",
                        "currency": "USD",
                        "marketCap": { "raw": 2.9e12, "fmt": "2.9T" }
                    },
                    "summaryDetail": {
                        "beta": { "raw": 1.29 },
                        "trailingPE": { "raw": 31.2 },
                        "dividendYield": { "raw": 0.0051 },
                        "fiftyTwoWeekHigh": { "raw": 199.62 },
                        "fiftyTwoWeekLow": { "raw": 164.08 },
                        "previousClose": 189.98
                    },
                    "assetProfile": { "sector": "Technology", "industry": "Consumer Electronics" },
                    "defaultKeyStatistics": { "forwardEps": { "raw": 7.1 }, "priceToBook": {} }
                }],
                "error": null
            }
        });

        let f = parse_quote_summary("AAPL", &json).unwrap();
        assert_eq!(f.sector.as_deref(), Some("Technology"));
        assert_eq!(f.exchange.as_deref(), Some("NMS"));
        assert_eq!(f.beta, Some(1.29));
        assert_eq!(f.pe_ratio, Some(31.2));
        assert_eq!(f.dividend_yield, Some(0.0051));
        assert_eq!(f.market_cap, Some(2.9e12));
        assert_eq!(f.previous_close, Some(189.98));
        assert_eq!(f.forward_eps, Some(7.1));
        // Empty {} objects are missing values
        assert_eq!(f.price_to_book, None);
    }

    #[test]
    fn test_parse_quote_summary_missing_result() {
        let json = json!({ "quoteSummary": { "result": [], "error": null } });
        assert!(parse_quote_summary("AAA", &json).is_err());
    }

    #[test]
    fn test_fx_pair_minor_units() {
        assert_eq!(fx_pair("GBp"), ("GBP".to_string(), 100.0));
        assert_eq!(fx_pair("eur"), ("EUR".to_string(), 1.0));
        assert_eq!(fx_pair("USD"), ("USD".to_string(), 1.0));

        // A GBPUSD quote of 1.27 prices one penny at 0.0127 USD
        let (_, divisor) = fx_pair("GBp");
        assert_relative_eq!(1.27 / divisor, 0.0127, epsilon = 1e-15);
        let (_, divisor) = fx_pair("ZAc");
        assert_relative_eq!(0.055 / divisor, 0.00055, epsilon = 1e-15);
    }
}
