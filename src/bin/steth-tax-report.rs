use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{builder::NonEmptyStringValueParser, Parser};
use tracing::{error, info};

use steth_tax_report::{
    env::ENV_CONFIG,
    export_rewards_report,
    lido_api::{LidoApiHttp, RewardsQuery, LIDO_REWARDS_API},
    log,
    report::{
        ReportConfig, DEFAULT_ASSET, DEFAULT_COMMENT, DEFAULT_INTEGRATION_NAME, DEFAULT_LABEL,
    },
    tax_year::TaxYear,
    units::TOKEN_DECIMALS,
    ExportParams,
};

/// Writes a Blockpit compatible CSV of the stETH staking rewards a wallet received in a tax year.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Address of the wallet to generate the report for.
    #[clap(long, value_parser = NonEmptyStringValueParser::new())]
    address: String,
    /// Currency the API prices rewards in.
    #[clap(long, default_value = "USD")]
    currency: String,
    #[clap(long, default_value = "false", value_parser = ["true", "false"])]
    archive_rate: String,
    #[clap(long, default_value = "true", value_parser = ["true", "false"])]
    only_rewards: String,
    /// Rewards API endpoint, falls back to LIDO_API_URL, then the public Lido API.
    #[clap(long)]
    lido_api_url: Option<String>,
    /// Four digit tax year, defaults to last year.
    #[clap(long)]
    year: Option<TaxYear>,
    /// Output file path, defaults to <year>-report.csv.
    #[clap(long)]
    out: Option<PathBuf>,
    #[clap(long, default_value = DEFAULT_INTEGRATION_NAME)]
    integration: String,
    #[clap(long, default_value = DEFAULT_LABEL)]
    label: String,
    #[clap(long, default_value = DEFAULT_ASSET)]
    asset: String,
    #[clap(long, default_value = DEFAULT_COMMENT)]
    comment: String,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let api_url = cli
        .lido_api_url
        .or_else(|| ENV_CONFIG.lido_api_url.clone())
        .unwrap_or_else(|| LIDO_REWARDS_API.to_string());

    let lido_api = LidoApiHttp::new_with_url(&api_url).context("failed to set up rewards API")?;

    let params = ExportParams {
        query: RewardsQuery {
            address: cli.address,
            currency: cli.currency,
            archive_rate: cli.archive_rate,
            only_rewards: cli.only_rewards,
        },
        report: ReportConfig {
            year: cli.year.unwrap_or_else(|| TaxYear::previous(Utc::now())),
            integration_name: cli.integration,
            label: cli.label,
            asset: cli.asset,
            comment: cli.comment,
            decimals: TOKEN_DECIMALS,
        },
        output: cli.out,
    };

    let summary = export_rewards_report(&lido_api, &params)?;
    info!(path = %summary.path.display(), "wrote report");

    Ok(())
}

fn main() {
    log::init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
