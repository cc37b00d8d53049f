//! zine: open passphrase + TOTP protected zines from a content-addressed gateway
//!
//! Commands:
//!   open <CID>     - fetch the record, pass the gate, write {CID}.zip
//!   inspect <CID>  - fetch and validate a record without decrypting it
//!   health [CID]   - check that the gateway answers
//!   config show    - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use zine_core::config::{ConfigSource, ZineConfig};
use zine_core::{ContentId, GateError};
use zine_crypto::{SealedZine, SuiteCache};
use zine_gate::{open_zine, Credentials, GateOptions, OpenRequest};
use zine_storage::ContentStore;

/// Empty UnixFS directory; every IPFS gateway can serve it.
const DEFAULT_PROBE_CID: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zine",
    version,
    about = "Open encrypted zines",
    long_about = "zine: fetch an encrypted zine by content id and unlock it with a passphrase and a one-time code"
)]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "ZINE_CONFIG", default_value = "/etc/zine/config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides log.level
    #[arg(long, env = "ZINE_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides log.format
    #[arg(long, env = "ZINE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt a zine and save it as {CID}.zip
    ///
    /// The passphrase is read from ZINE_PASSPHRASE or prompted for without echo.
    Open {
        /// Content id of the metadata record
        cid: String,
        /// Output directory (overrides output.dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// One-time code from the authenticator app
        #[arg(long, env = "ZINE_TOTP_CODE", hide_env_values = true)]
        code: Option<String>,
        /// Replace an existing {CID}.zip
        #[arg(long)]
        overwrite: bool,
    },

    /// Fetch a metadata record and validate its fields without decrypting
    Inspect {
        cid: String,
    },

    /// Check that the gateway is reachable
    Health {
        /// Content id to probe (default: the empty directory)
        cid: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = ZineConfig::load_with_source(&cli.config)?;

    let level = cli.log.as_deref().unwrap_or(config.log.level.as_str());
    let format = cli.log_format.clone().unwrap_or_else(|| {
        if config.log.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    });
    init_logging(level, &format);
    source.log();

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "zine starting"
    );

    let outcome = match cli.command {
        Commands::Open { cid, out, code, overwrite } => {
            cmd_open(&config, &cid, out.as_deref(), code, overwrite).await
        }
        Commands::Inspect { cid } => cmd_inspect(&config, &cid).await,
        Commands::Health { cid } => cmd_health(&config, cid.as_deref()).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &source),
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<GateError>() {
            Some(gate) => {
                debug!(error = %gate, "attempt failed");
                eprintln!("zine: {}", gate.user_message());
                std::process::exit(exit_code(gate));
            }
            None => Err(e),
        },
    }
}

/// 2 when a fresh attempt may succeed, 1 for a final rejection.
fn exit_code(err: &GateError) -> i32 {
    if err.is_retryable() {
        2
    } else {
        1
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries command output.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── `zine open` ───────────────────────────────────────────────────────────────

async fn cmd_open(
    config: &ZineConfig,
    cid: &str,
    out: Option<&Path>,
    code: Option<String>,
    overwrite: bool,
) -> Result<()> {
    let cid = ContentId::parse(cid)?;
    let store = ContentStore::from_config(&config.gateway)?;

    let passphrase = read_passphrase()?;
    let code = match code {
        Some(code) => code,
        None => prompt_line("One-time code: ")?,
    };

    let output_dir = out.unwrap_or(config.output.dir.as_path());
    let request = OpenRequest {
        cid: &cid,
        credentials: Credentials {
            passphrase,
            one_time_code: SecretString::from(code),
        },
        output_dir,
        overwrite: overwrite || config.output.overwrite,
    };

    let options = GateOptions::from_config(&config.crypto);
    let opened = open_zine(SuiteCache::global(), &store, request, &options).await?;

    println!("Decrypted {} ({} bytes)", cid, opened.bytes);
    for entry in &opened.summary.entries {
        println!("  {:>10}  {}", entry.size, entry.name);
    }
    println!("Saved to {}", opened.path.display());
    Ok(())
}

fn read_passphrase() -> Result<SecretString> {
    if let Ok(value) = std::env::var("ZINE_PASSPHRASE") {
        info!("passphrase taken from ZINE_PASSPHRASE");
        return Ok(SecretString::from(value));
    }
    let value = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    Ok(SecretString::from(value))
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading one-time code")?;
    Ok(line.trim().to_string())
}

// ── `zine inspect` ────────────────────────────────────────────────────────────

async fn cmd_inspect(config: &ZineConfig, cid: &str) -> Result<()> {
    let cid = ContentId::parse(cid)?;
    let store = ContentStore::from_config(&config.gateway)?;

    let record = store.fetch_metadata(&cid).await?;
    let sealed = SealedZine::from_record(&record)?;

    println!("{cid}");
    println!("  ciphertext:    {} bytes", sealed.ciphertext.len());
    println!("  nonce:         {} bytes", sealed.nonce.len());
    println!("  totp secret:   {} bytes", sealed.totp_secret.len());
    println!(
        "  salt:          {}",
        if sealed.salt.is_some() { "stored" } else { "missing" }
    );
    println!(
        "  kdf:           v{} (scrypt log_n={} r={} p={})",
        sealed.kdf_version, sealed.kdf.log_n, sealed.kdf.r, sealed.kdf.p
    );
    Ok(())
}

// ── `zine health` ─────────────────────────────────────────────────────────────

async fn cmd_health(config: &ZineConfig, cid: Option<&str>) -> Result<()> {
    let probe = ContentId::parse(cid.unwrap_or(DEFAULT_PROBE_CID))?;
    let store = ContentStore::from_config(&config.gateway)?;

    zine_storage::check_health(store.operator(), probe.as_str())
        .await
        .map_err(|e| GateError::Retrieval(format!("{e:#}")))?;

    println!(
        "gateway:  {}{}  [ok]",
        config.gateway.endpoint, config.gateway.path_prefix
    );
    Ok(())
}

// ── `zine config show` ────────────────────────────────────────────────────────

fn cmd_config_show(config: &ZineConfig, source: &ConfigSource) -> Result<()> {
    match source {
        ConfigSource::File(path) => println!("# Configuration from: {}", path.display()),
        ConfigSource::Defaults(path) => {
            println!("# Configuration: defaults (no file at {})", path.display())
        }
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
