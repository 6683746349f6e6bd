use anyhow::{anyhow, Result};
use clap::Parser;

use crate::theme::Theme;

/// Alchemy network slugs supported by the explorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    EthMainnet,
    EthSepolia,
    EthHolesky,
    ArbMainnet,
    OptMainnet,
    BaseMainnet,
    PolygonMainnet,
}

impl Network {
    pub const ALL: [Network; 7] = [
        Network::EthMainnet,
        Network::EthSepolia,
        Network::EthHolesky,
        Network::ArbMainnet,
        Network::OptMainnet,
        Network::BaseMainnet,
        Network::PolygonMainnet,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Network::EthMainnet => "eth-mainnet",
            Network::EthSepolia => "eth-sepolia",
            Network::EthHolesky => "eth-holesky",
            Network::ArbMainnet => "arb-mainnet",
            Network::OptMainnet => "opt-mainnet",
            Network::BaseMainnet => "base-mainnet",
            Network::PolygonMainnet => "polygon-mainnet",
        }
    }

    /// Symbol of the native currency (18 decimals on every supported chain).
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::PolygonMainnet => "POL",
            _ => "ETH",
        }
    }

    pub fn alchemy_url(&self, api_key: &str) -> String {
        format!("https://{}.g.alchemy.com/v2/{api_key}", self.slug())
    }
}

impl std::str::FromStr for Network {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let s = match s.as_str() {
            "mainnet" | "eth" | "ethereum" => "eth-mainnet",
            "sepolia" => "eth-sepolia",
            "holesky" => "eth-holesky",
            other => other,
        };
        Network::ALL
            .into_iter()
            .find(|n| n.slug() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Network::ALL.iter().map(|n| n.slug()).collect();
                anyhow!("Invalid network '{s}'. Valid options: {}", valid.join(", "))
            })
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// ethx - Ethereum terminal block explorer
///
/// Browse the latest block's transactions, inspect receipts and look up
/// wallet balances through an Alchemy endpoint.
/// Configuration priority: CLI args > Environment variables (.env) > Defaults
#[derive(Parser, Debug, Default)]
#[command(name = "ethx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ethereum terminal block explorer", long_about = None)]
pub struct CliArgs {
    /// Alchemy API key (required unless --rpc-url is given)
    #[arg(long, env = "ALCHEMY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Network slug, e.g. eth-mainnet, eth-sepolia, base-mainnet
    #[arg(short, long, env = "ETH_NETWORK")]
    pub network: Option<String>,

    /// Full JSON-RPC endpoint URL, overrides the Alchemy URL
    #[arg(long, env = "RPC_URL", hide_env_values = true)]
    pub rpc_url: Option<String>,

    /// RPC request timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Retries on rate limits and gateway errors (0-10)
    #[arg(long, env = "RPC_RETRIES")]
    pub rpc_retries: Option<u8>,

    /// Transactions per page (1-100)
    #[arg(long, env = "ITEMS_PER_PAGE")]
    pub items_per_page: Option<usize>,

    /// Concurrent token metadata lookups (1-16)
    #[arg(long, env = "TOKEN_CONCURRENCY")]
    pub token_concurrency: Option<usize>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,

    /// Color theme: default, amber, mono
    #[arg(long, env = "THEME")]
    pub theme: Option<String>,

    /// Log file (the terminal is in raw mode while running)
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    pub rpc_timeout_ms: u64,
    pub rpc_retries: u8,
    pub items_per_page: usize,
    pub token_concurrency: usize,
    pub render_fps: u32,
    pub theme: Theme,
    pub log_file: String,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    from_args(CliArgs::parse())
}

/// Build a validated config from already-parsed arguments.
pub fn from_args(args: CliArgs) -> Result<Config> {
    let network = match args.network.as_deref() {
        Some(s) => s.parse()?,
        None => Network::EthMainnet,
    };

    let api_key = args
        .api_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let rpc_url = match (args.rpc_url.filter(|u| !u.is_empty()), api_key) {
        (Some(url), _) => {
            validate_url(&url, "RPC_URL")?;
            url
        }
        (None, Some(key)) => network.alchemy_url(&key),
        (None, None) => {
            return Err(anyhow!(
                "ALCHEMY_API_KEY is not set. Export it, add it to .env, or pass --api-key (or point --rpc-url at another endpoint)"
            ))
        }
    };

    let rpc_timeout_ms =
        validate_in_range(args.rpc_timeout_ms.unwrap_or(8000), 1000, 60000, "RPC_TIMEOUT_MS")?;
    let rpc_retries = validate_in_range(args.rpc_retries.unwrap_or(0), 0, 10, "RPC_RETRIES")?;
    let items_per_page = validate_in_range(
        args.items_per_page
            .unwrap_or(crate::pagination::DEFAULT_ITEMS_PER_PAGE),
        1,
        100,
        "ITEMS_PER_PAGE",
    )?;
    let token_concurrency = validate_in_range(
        args.token_concurrency
            .unwrap_or(crate::fetch::DEFAULT_TOKEN_CONCURRENCY),
        1,
        16,
        "TOKEN_CONCURRENCY",
    )?;
    let render_fps = validate_in_range(args.render_fps.unwrap_or(30), 1, 120, "RENDER_FPS")?;

    let theme = match args.theme.as_deref() {
        Some(s) => s.parse()?,
        None => Theme::default(),
    };

    Ok(Config {
        network,
        rpc_url,
        rpc_timeout_ms,
        rpc_retries,
        items_per_page,
        token_concurrency,
        render_fps,
        theme,
        log_file: args.log_file.unwrap_or_else(|| "ethx.log".to_string()),
    })
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

impl Config {
    /// Endpoint for logs: scheme, host and port only. Providers put keys in
    /// the path (`/v2/<key>`, `/v3/<key>`) or the query, so both are masked.
    pub fn redacted_url(&self) -> String {
        let Ok(url) = reqwest::Url::parse(&self.rpc_url) else {
            return "<unparseable url>".to_string();
        };
        let mut out = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            out.push_str(&format!(":{port}"));
        }
        let has_path = !matches!(url.path(), "" | "/");
        if has_path || url.query().is_some() || url.fragment().is_some() {
            out.push_str("/***");
        }
        out
    }

    pub fn log_summary(&self) {
        log::info!("ethx configuration:");
        log::info!("  Network: {}", self.network);
        log::info!("  RPC URL: {}", self.redacted_url());
        log::info!("  RPC Timeout: {}ms", self.rpc_timeout_ms);
        log::info!("  RPC Retries: {}", self.rpc_retries);
        log::info!("  Items per page: {}", self.items_per_page);
        log::info!("  Token concurrency: {}", self.token_concurrency);
        log::info!("  Render FPS: {}", self.render_fps);
        log::info!("  Theme: {}", self.theme);
    }
}
