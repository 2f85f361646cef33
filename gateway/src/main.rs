use anyhow::{Context, Result};
use clap::Parser;
use commonware_codec::DecodeExt;
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use commonware_math::algebra::Random;
use commonware_utils::from_hex_formatted;
use nullspace_client::Client;
use nullspace_gateway::{
    handlers::{HandleResult, HandlerError},
    Gateway, GatewayConfig, ValidatedConfig,
};
use rand::rngs::OsRng;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn, Level};

/// Runs one player session over stdio: newline-delimited JSON commands in, one JSON result per
/// command out.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ledger base URL (overrides the configuration file)
    #[arg(long)]
    ledger_url: Option<String>,

    /// Deadline for each ledger confirmation, in milliseconds
    #[arg(long)]
    event_timeout_ms: Option<u64>,

    #[arg(long)]
    log_level: Option<String>,

    /// Hex-encoded ed25519 private key of the player account
    #[arg(long, conflicts_with = "account_seed")]
    private_key: Option<String>,

    /// Deterministic account key seed (development only)
    #[arg(long)]
    account_seed: Option<u64>,
}

impl Args {
    fn load_config(&self) -> Result<ValidatedConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read config file {}", path.display()))?;
                serde_yaml::from_str::<GatewayConfig>(&contents)
                    .context("Could not parse config file")?
            }
            None => GatewayConfig::new(
                self.ledger_url
                    .clone()
                    .context("--ledger-url is required without --config")?,
            ),
        };
        if let Some(ledger_url) = &self.ledger_url {
            config.ledger_url = ledger_url.clone();
        }
        if let Some(event_timeout_ms) = self.event_timeout_ms {
            config.event_timeout_ms = event_timeout_ms;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        config.validate().context("Invalid configuration")
    }

    fn signer(&self) -> Result<PrivateKey> {
        if let Some(key) = &self.private_key {
            let bytes = from_hex_formatted(key).context("Private key must be hex")?;
            return PrivateKey::decode(bytes.as_ref()).context("Private key is invalid");
        }
        Ok(match self.account_seed {
            Some(seed) => PrivateKey::from_seed(seed),
            None => PrivateKey::random(&mut OsRng),
        })
    }
}

fn init_tracing(level: Level) {
    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses one input line. Parser detail is logged, never returned to the client.
fn parse_line(line: &str) -> Result<Value, HandlerError> {
    serde_json::from_str(line).map_err(|err| {
        debug!(error = %err, "rejecting malformed command");
        HandlerError::invalid_message("invalid JSON")
    })
}

/// Parses and handles one input line.
async fn process_line(
    gateway: &Gateway<Client>,
    session: &mut nullspace_gateway::Session,
    line: &str,
) -> HandleResult {
    match parse_line(line) {
        Ok(msg) => gateway.handle(session, &msg).await,
        Err(err) => HandleResult::err(err),
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.load_config()?;
    init_tracing(config.log_level);

    let client = Client::new(config.ledger_url.as_str())
        .context("Failed to create ledger client")?
        .with_retry_policy(config.retry_policy.clone())
        .with_event_capacity(config.event_channel_capacity);
    let gateway = Gateway::new(client, &config);
    let mut session = gateway.open_session(args.signer()?);
    info!(
        ledger = %config.ledger_url,
        player = ?session.public_key(),
        event_timeout_ms = config.event_timeout.as_millis() as u64,
        "gateway ready"
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = process_line(&gateway, &mut session, line).await;
        if let Some(error) = &result.error {
            warn!(code = %error.code, message = %error.message, "command failed");
        }
        let mut out = serde_json::to_vec(&result).context("Failed to encode result")?;
        out.push(b'\n');
        stdout.write_all(&out).await.context("Failed to write stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }

    gateway.close_session(session);
    info!("session closed");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_utils::hex;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "nullspace-gateway",
            "--ledger-url",
            "http://127.0.0.1:9000",
            "--event-timeout-ms",
            "500",
            "--log-level",
            "debug",
            "--account-seed",
            "7",
        ]);
        let config = args.load_config().unwrap();
        assert_eq!(config.ledger_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.event_timeout, Duration::from_millis(500));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            args.signer().unwrap().public_key(),
            PrivateKey::from_seed(7).public_key()
        );
    }

    #[test]
    fn test_missing_ledger_url() {
        let args = Args::parse_from(["nullspace-gateway"]);
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = Args::parse_from([
            "nullspace-gateway",
            "--ledger-url",
            "ws://127.0.0.1:9000",
        ]);
        assert!(args.load_config().is_err());

        let args = Args::parse_from([
            "nullspace-gateway",
            "--ledger-url",
            "http://127.0.0.1:9000",
            "--event-timeout-ms",
            "0",
        ]);
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_private_key_argument() {
        let key = PrivateKey::from_seed(11);
        let encoded = hex(commonware_codec::Encode::encode(&key).as_ref());
        let args = Args::parse_from(["nullspace-gateway", "--private-key", &encoded]);
        assert_eq!(args.signer().unwrap().public_key(), key.public_key());

        let args = Args::parse_from(["nullspace-gateway", "--private-key", "zz"]);
        assert!(args.signer().is_err());
    }

    #[test]
    fn test_malformed_line_hides_parser_detail() {
        let err = parse_line("{\"type\": \"hilo_deal\",").unwrap_err();
        assert_eq!(err.code, nullspace_gateway::ErrorCode::InvalidMessage);
        assert_eq!(err.message, "invalid JSON");
        assert!(!err.retryable);

        let msg = parse_line("{\"type\": \"hilo_deal\", \"amount\": 10}").unwrap();
        assert_eq!(msg["amount"], 10);
    }

    #[test]
    fn test_key_sources_conflict() {
        let parsed = Args::try_parse_from([
            "nullspace-gateway",
            "--private-key",
            "00",
            "--account-seed",
            "1",
        ]);
        assert!(parsed.is_err());
    }
}
