//! Client for the Lido rewards API, which lists the stETH rebase rewards a wallet received.

use std::time::Duration;

use mockall::automock;
use reqwest::{blocking::Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::tax_year::BlockTime;

pub const LIDO_REWARDS_API: &str = "https://stake.lido.fi/api/rewards";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A single reward event. Only `block_time` and `rewards` feed the report, the rest is kept so a
/// debug dump of an event looks like what the API sent.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardEvent {
    pub apr: Option<String>,
    pub block: Option<String>,
    pub block_time: Option<BlockTime>,
    pub id: Option<String>,
    pub log_index: Option<String>,
    pub total_pooled_ether_after: Option<String>,
    pub total_pooled_ether_before: Option<String>,
    #[serde(alias = "totalSharesafter")]
    pub total_shares_after: Option<String>,
    pub total_shares_before: Option<String>,
    pub epoch_days: Option<String>,
    pub epoch_full_days: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub report_shares: Option<String>,
    pub balance: Option<String>,
    /// Reward in wei, as a decimal string.
    pub rewards: Option<String>,
    pub change: Option<String>,
    pub currency_change: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub eth_rewards: Option<String>,
    pub currency_rewards: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StEthCurrencyPrice {
    pub eth: Option<f64>,
    pub usd: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardsResponse {
    #[serde(default)]
    pub totals: Totals,
    pub average_apr: Option<String>,
    /// Oldest first, as returned by the API.
    #[serde(default)]
    pub events: Vec<RewardEvent>,
    pub st_eth_currency_price: Option<StEthCurrencyPrice>,
    pub eth_to_st_eth_ratio: Option<f64>,
    pub total_items: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardsQuery {
    pub address: String,
    pub currency: String,
    /// Forwarded verbatim, the API expects `"true"` or `"false"`.
    pub archive_rate: String,
    pub only_rewards: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("wallet address is required")]
    MissingAddress,
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("rewards API at {url} responded with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("failed to read rewards API response body")]
    Body(#[source] reqwest::Error),
    #[error("failed to decode rewards API response")]
    Decode(#[source] serde_json::Error),
}

#[automock]
pub trait RewardsSource {
    fn fetch_rewards(&self, query: &RewardsQuery) -> Result<RewardsResponse, FetchError>;
}

pub struct LidoApiHttp {
    server_url: String,
    client: Client,
}

impl LidoApiHttp {
    pub fn new_with_url(server_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            server_url: server_url.into(),
            client,
        })
    }
}

impl RewardsSource for LidoApiHttp {
    fn fetch_rewards(&self, query: &RewardsQuery) -> Result<RewardsResponse, FetchError> {
        if query.address.trim().is_empty() {
            return Err(FetchError::MissingAddress);
        }

        debug!(url = %self.server_url, address = %query.address, "requesting reward events");

        let response = self
            .client
            .get(&self.server_url)
            .query(&[
                ("address", query.address.as_str()),
                ("currency", query.currency.as_str()),
                ("archiveRate", query.archive_rate.as_str()),
                ("onlyRewards", query.only_rewards.as_str()),
            ])
            .send()
            .map_err(|source| FetchError::Request {
                url: self.server_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.server_url.clone(),
                status,
            });
        }

        let body = response.bytes().map_err(FetchError::Body)?;
        let rewards =
            serde_json::from_slice::<RewardsResponse>(&body).map_err(FetchError::Decode)?;

        debug!(
            events = rewards.events.len(),
            total_items = ?rewards.total_items,
            eth_rewards = ?rewards.totals.eth_rewards,
            average_apr = ?rewards.average_apr,
            "received reward events"
        );

        Ok(rewards)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn query() -> RewardsQuery {
        RewardsQuery {
            address: "0xabc".to_string(),
            currency: "USD".to_string(),
            archive_rate: "false".to_string(),
            only_rewards: "true".to_string(),
        }
    }

    #[test]
    fn deserializes_rewards_response_test() {
        let json = r#"{
            "totals": { "ethRewards": "1234", "currencyRewards": "2.5" },
            "averageApr": "3.9",
            "events": [{
                "apr": "3.8",
                "block": "18576000",
                "blockTime": "1700000000",
                "id": "0x1",
                "logIndex": "12",
                "totalSharesafter": "10",
                "type": "reward",
                "rewards": "1234567890123456789"
            }],
            "stEthCurrencyPrice": { "eth": 1.0, "usd": 2034.5 },
            "ethToStEthRatio": 1.0001,
            "totalItems": 1
        }"#;

        let response = serde_json::from_str::<RewardsResponse>(json).unwrap();
        assert_eq!(response.total_items, Some(1));
        assert_eq!(response.totals.eth_rewards.as_deref(), Some("1234"));

        let event = &response.events[0];
        assert_eq!(
            event.block_time,
            Some(BlockTime::Text("1700000000".to_string()))
        );
        assert_eq!(event.rewards.as_deref(), Some("1234567890123456789"));
        assert_eq!(event.event_type.as_deref(), Some("reward"));
        assert_eq!(event.total_shares_after.as_deref(), Some("10"));
    }

    #[test]
    fn deserializes_missing_events_as_empty_test() {
        let response = serde_json::from_str::<RewardsResponse>("{}").unwrap();
        assert!(response.events.is_empty());
    }

    #[test]
    fn fetch_rewards_test() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/rewards")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("address".into(), "0xabc".into()),
                Matcher::UrlEncoded("currency".into(), "USD".into()),
                Matcher::UrlEncoded("archiveRate".into(), "false".into()),
                Matcher::UrlEncoded("onlyRewards".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "events": [
                        { "blockTime": "1700000000", "rewards": "1" },
                        { "blockTime": 1700086400, "rewards": "2" }
                    ]
                })
                .to_string(),
            )
            .create();

        let api = LidoApiHttp::new_with_url(&format!("{}/api/rewards", server.url())).unwrap();
        let response = api.fetch_rewards(&query()).unwrap();

        mock.assert();
        assert_eq!(response.events.len(), 2);
        assert_eq!(
            response.events[1].block_time,
            Some(BlockTime::Seconds(1700086400))
        );
    }

    #[test]
    fn fetch_rewards_error_status_test() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Any)
            .with_status(502)
            .create();

        let api = LidoApiHttp::new_with_url(&server.url()).unwrap();
        let err = api.fetch_rewards(&query()).unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn fetch_rewards_bad_json_test() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let api = LidoApiHttp::new_with_url(&server.url()).unwrap();
        let err = api.fetch_rewards(&query()).unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn fetch_rewards_requires_address_test() {
        let api = LidoApiHttp::new_with_url("http://127.0.0.1:1").unwrap();
        let query = RewardsQuery {
            address: " ".to_string(),
            ..query()
        };

        assert!(matches!(
            api.fetch_rewards(&query),
            Err(FetchError::MissingAddress)
        ));
    }

    #[test]
    fn fetch_rewards_unreachable_test() {
        let api = LidoApiHttp::new_with_url("http://127.0.0.1:1").unwrap();
        let err = api.fetch_rewards(&query()).unwrap_err();

        assert!(matches!(err, FetchError::Request { .. }));
    }
}
