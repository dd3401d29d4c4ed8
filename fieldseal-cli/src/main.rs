//! Fieldseal CLI for secret management and envelope inspection.
//!
//! Secrets are read from the environment (see `fieldseal-keyenv`); the
//! `seal`/`open` commands exist for operators debugging stored data, not
//! as an application surface.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fieldseal::envelope::Envelope;
use fieldseal::field::{FieldEncryptor, SealedField};
use fieldseal::value::{Value, ValueKind};

#[derive(Parser)]
#[command(name = "fieldseal")]
#[command(about = "Fieldseal secret management and envelope inspection", long_about = None)]
struct Cli {
    /// Environment variable holding the ordered secret list
    #[arg(long, global = true, default_value = fieldseal_keyenv::DEFAULT_KEYS_VAR)]
    keys_var: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh high-entropy secret entry for the key list
    GenSecret,
    /// Show the header fields of a stored envelope without decrypting it
    Inspect {
        /// Base64-encoded envelope bytes
        envelope: String,
    },
    /// Seal a value and print the envelope (and token, if searchable)
    Seal {
        /// Value kind
        #[arg(long, value_enum)]
        kind: KindArg,
        /// The plaintext value (base64 for the bytes kind, RFC 3339 for datetime)
        value: String,
        /// Also emit a blind index token
        #[arg(long)]
        searchable: bool,
    },
    /// Open a sealed envelope and print the plaintext value
    Open {
        /// Value kind
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Base64-encoded envelope bytes
        envelope: String,
    },
    /// Print the equality-lookup tokens for a value, one per key version
    Tokens {
        /// Value kind
        #[arg(long, value_enum)]
        kind: KindArg,
        /// The plaintext value
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Text,
    Integer,
    Float,
    Boolean,
    Datetime,
    Bytes,
}

impl From<KindArg> for ValueKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => Self::Text,
            KindArg::Integer => Self::Integer,
            KindArg::Float => Self::Float,
            KindArg::Boolean => Self::Boolean,
            KindArg::Datetime => Self::DateTime,
            KindArg::Bytes => Self::Bytes,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenSecret => {
            println!("{}", fieldseal_keyenv::generate_secret_entry());
        }
        Commands::Inspect { envelope } => {
            let envelope = decode_envelope(&envelope)?;
            println!("format version: {}", envelope.format_version());
            match envelope.key_version() {
                Some(version) => println!("key version:    {version}"),
                None => println!("key version:    (legacy, first configured key)"),
            }
            match envelope.timestamp() {
                Some(ts) => println!("sealed at:      {ts} (unix seconds)"),
                None => println!("sealed at:      (not recorded)"),
            }
            println!("nonce:          {} bytes", envelope.nonce().len());
            println!("ciphertext:     {} bytes", envelope.ciphertext().len());
        }
        Commands::Seal { kind, value, searchable } => {
            let ring = fieldseal_keyenv::ring_from_env(&cli.keys_var)?;
            let mut field = FieldEncryptor::new(kind.into());
            if searchable {
                field = field.searchable();
            }
            let sealed = field.seal(&parse_value(kind.into(), &value)?, &ring)?;
            println!("envelope: {}", STANDARD.encode(sealed.envelope().to_bytes()?));
            if let Some(token) = sealed.token() {
                println!("token:    {token}");
            }
        }
        Commands::Open { kind, envelope } => {
            let ring = fieldseal_keyenv::ring_from_env(&cli.keys_var)?;
            let field = FieldEncryptor::new(kind.into());
            let sealed = SealedField::from_parts(decode_envelope(&envelope)?, None);
            println!("{}", render_value(&field.open(&sealed, &ring)?));
        }
        Commands::Tokens { kind, value } => {
            let ring = fieldseal_keyenv::ring_from_env(&cli.keys_var)?;
            let field = FieldEncryptor::new(kind.into()).searchable();
            for token in field.lookup_tokens(&parse_value(kind.into(), &value)?, &ring)? {
                println!("{token}");
            }
        }
    }

    Ok(())
}

fn decode_envelope(encoded: &str) -> anyhow::Result<Envelope> {
    let bytes = STANDARD
        .decode(encoded)
        .context("envelope must be base64-encoded")?;
    Ok(Envelope::from_bytes(&bytes)?)
}

fn parse_value(kind: ValueKind, raw: &str) -> anyhow::Result<Value> {
    Ok(match kind {
        ValueKind::Text => Value::Text(raw.to_string()),
        ValueKind::Integer => Value::Integer(raw.parse().context("invalid integer")?),
        ValueKind::Float => Value::Float(raw.parse().context("invalid float")?),
        ValueKind::Boolean => match raw {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            other => bail!("invalid boolean: {other} (expected true or false)"),
        },
        ValueKind::DateTime => {
            let parsed = DateTime::parse_from_rfc3339(raw).context("invalid RFC 3339 datetime")?;
            Value::DateTime(parsed.with_timezone(&Utc))
        }
        ValueKind::Bytes => {
            Value::Bytes(STANDARD.decode(raw).context("bytes value must be base64-encoded")?)
        }
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Bytes(b) => STANDARD.encode(b),
    }
}
