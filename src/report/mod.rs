//! Turns reward events into rows of a Blockpit style tax report.

mod csv_sink;

pub use csv_sink::{default_report_path, write_csv, write_report_file, SinkError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    lido_api::RewardEvent,
    tax_year::{self, BlockTimeError, TaxYear},
    units::{TokenAmount, WeiNewtype, TOKEN_DECIMALS},
};

pub const DEFAULT_INTEGRATION_NAME: &str = "Lido stETH";
pub const DEFAULT_LABEL: &str = "Staking";
pub const DEFAULT_ASSET: &str = "stETH";
pub const DEFAULT_COMMENT: &str = "Lido stETH staking reward";

/// Parameters that are the same for every row of a report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    pub year: TaxYear,
    pub integration_name: String,
    pub label: String,
    pub asset: String,
    pub comment: String,
    pub decimals: u32,
}

impl ReportConfig {
    pub fn new(year: TaxYear) -> Self {
        Self {
            year,
            integration_name: DEFAULT_INTEGRATION_NAME.to_string(),
            label: DEFAULT_LABEL.to_string(),
            asset: DEFAULT_ASSET.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
            decimals: TOKEN_DECIMALS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub integration_name: String,
    pub label: String,
    pub incoming_asset: String,
    pub incoming_amount: String,
    pub comment: String,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 11] = [
        "Date (UTC)",
        "Integration Name",
        "Label",
        "Outgoing Asset",
        "Outgoing Amount",
        "Incoming Asset",
        "Incoming Amount",
        "Fee Asset (optional)",
        "Fee Amount (optional)",
        "Comment (optional)",
        "Trx. ID (optional)",
    ];

    /// Outgoing, fee and transaction columns don't apply to rewards but are always present.
    pub fn to_record(&self) -> [&str; 11] {
        [
            self.date.as_str(),
            self.integration_name.as_str(),
            self.label.as_str(),
            "",
            "",
            self.incoming_asset.as_str(),
            self.incoming_amount.as_str(),
            "",
            "",
            self.comment.as_str(),
            "",
        ]
    }
}

/// An event left out of the report because its amount couldn't be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEvent {
    pub index: usize,
    pub id: Option<String>,
    pub raw_rewards: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<SkippedEvent>,
    pub negative_amounts: usize,
    pub total_incoming: TokenAmount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("event {index} (id {id}) has an unusable timestamp")]
    BlockTime {
        index: usize,
        id: String,
        #[source]
        source: BlockTimeError,
    },
}

fn event_id(event: &RewardEvent) -> String {
    event.id.clone().unwrap_or_else(|| "unknown".to_string())
}

/// Builds the report rows for `config.year`, keeping the order of `events`.
///
/// A timestamp that can't be read fails the whole report, it means the payload is not what we
/// think it is. An amount that can't be read only drops that event, with a warning.
pub fn generate(events: &[RewardEvent], config: &ReportConfig) -> Result<Report, ReportError> {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut negative_amounts = 0;
    let mut total_incoming = TokenAmount::zero(config.decimals);

    for (index, event) in events.iter().enumerate() {
        let date = tax_year::event_date(event.block_time.as_ref(), config.year).map_err(
            |source| ReportError::BlockTime {
                index,
                id: event_id(event),
                source,
            },
        )?;

        let Some(date) = date else {
            continue;
        };

        let raw_rewards = event.rewards.as_deref().unwrap_or_default();
        let wei = match raw_rewards.parse::<WeiNewtype>() {
            Ok(wei) => wei,
            Err(error) => {
                warn!(
                    index,
                    id = %event_id(event),
                    raw_rewards,
                    %error,
                    "skipping event with unreadable reward amount"
                );
                skipped.push(SkippedEvent {
                    index,
                    id: event.id.clone(),
                    raw_rewards: event.rewards.clone(),
                });
                continue;
            }
        };

        if wei.is_negative() {
            warn!(
                index,
                id = %event_id(event),
                %wei,
                "negative reward amount, rewards should never be negative"
            );
            negative_amounts += 1;
        }

        let amount = TokenAmount::from_wei(&wei, config.decimals);
        let incoming_amount = amount.to_fixed_string();
        total_incoming = total_incoming + amount;

        debug!(index, %date, %incoming_amount, "adding reward row");

        rows.push(ReportRow {
            date,
            integration_name: config.integration_name.clone(),
            label: config.label.clone(),
            incoming_asset: config.asset.clone(),
            incoming_amount,
            comment: config.comment.clone(),
        });
    }

    Ok(Report {
        rows,
        skipped,
        negative_amounts,
        total_incoming,
    })
}
