use anyhow::{Context, bail};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use solidi_client::solidi_api::BestVolumePriceQuery;
use solidi_client::{ClientConfig, Method, Side, SigningScheme, SolidiClient};

const USAGE: &str = "\
usage: solidi-probe [--config <path>] <command> [args]

commands:
  currency | market | ticker
  best-volume-price <base> <quote> <buy|sell> <amount>
  balance | fee
  get <route> | post <route> [json-params]

Without --config (or SOLIDI_CONFIG) the signing scheme is read from SOLIDI_SCHEME (A, B or C).
Credentials come from the config file or SOLIDI_API_KEY / SOLIDI_API_SECRET.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("--config needs a path\n\n{USAGE}");
            }
            let path = args.remove(i + 1);
            args.remove(i);
            Some(PathBuf::from(path))
        }
        None => std::env::var("SOLIDI_CONFIG").ok().map(PathBuf::from),
    };

    let config = match config_path {
        Some(path) => ClientConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            dotenv::dotenv().ok();
            let scheme: SigningScheme = std::env::var("SOLIDI_SCHEME")
                .context("no config file given and SOLIDI_SCHEME is not set")?
                .parse()?;
            ClientConfig::new(scheme)
        }
    };

    // 1. Logging: RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,solidi_client={}", config.log_level)));
    fmt().with_env_filter(filter).with_target(true).init();

    let Some(command) = args.first().cloned() else {
        bail!("{USAGE}");
    };

    // 2. Client
    let client = SolidiClient::from_config(config)?;
    tracing::info!(
        authenticated = client.credentials().is_some(),
        base_url = %client.config().base_url(),
        "probe starting"
    );

    // 3. One call, raw result
    let response = match command.as_str() {
        "currency" => client.currency().await?,
        "market" => client.market().await?,
        "ticker" => client.ticker().await?,
        "balance" => client.balance().await?,
        "fee" => client.fee().await?,
        "best-volume-price" => {
            let [base, quote, side, amount] = match &args[1..] {
                [b, q, s, a] => [b, q, s, a],
                _ => bail!("best-volume-price <base> <quote> <buy|sell> <amount>"),
            };
            let side: Side = side.parse()?;
            let query =
                BestVolumePriceQuery::new(base.as_str(), quote.as_str(), side, amount.as_str());
            client.best_volume_price(&query).await?
        }
        "get" => {
            let route = args.get(1).context("get <route>")?;
            client.call(Method::Get, route, &serde_json::json!({})).await?
        }
        "post" => {
            let route = args.get(1).context("post <route> [json-params]")?;
            let params: serde_json::Value = match args.get(2) {
                Some(raw) => serde_json::from_str(raw).context("params must be a JSON object")?,
                None => serde_json::json!({}),
            };
            client.call(Method::Post, route, &params).await?
        }
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    };

    println!("status: {}", response.status);
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
