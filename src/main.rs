//! vibecheck - CLI entry point.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

use vibecheck::logging::init_logging;
use vibecheck::{BackendSettings, FunctionCall, FunctionSignature, Provider, VibeCheckConfig, VibeClient};

/// Ask a language model to judge statements and simulate functions.
#[derive(Parser, Debug)]
#[command(name = "vibecheck")]
#[command(about = "Ask a language model to judge statements and simulate functions")]
#[command(version)]
struct Cli {
    /// Model provider (gemini or openai)
    #[arg(long, global = true, default_value = "gemini")]
    provider: Provider,

    /// Model name (defaults to the provider's default model)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Total number of attempts
    #[arg(long, global = true)]
    num_tries: Option<u32>,

    /// Retries after the first attempt
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Backoff base delay in seconds
    #[arg(long, global = true)]
    backoff_base: Option<f64>,

    /// Backoff cap in seconds
    #[arg(long, global = true)]
    backoff_max: Option<f64>,

    /// Per request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Override the provider's API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a statement and print true or false
    Eval {
        /// The statement to evaluate
        statement: String,
    },
    /// Simulate a function call and print its return value
    Simulate {
        /// Function signature, e.g. "def add(a: int, b: int) -> int"
        #[arg(long)]
        signature: String,

        /// What the function does
        #[arg(long, default_value = "")]
        doc: String,

        /// Positional argument as JSON (repeatable); non-JSON is taken as a string
        #[arg(long = "arg", value_parser = parse_json_value)]
        args: Vec<Value>,

        /// Keyword argument as key=JSON (repeatable)
        #[arg(long = "kwarg", value_parser = parse_kwarg)]
        kwargs: Vec<(String, Value)>,
    },
}

impl Cli {
    /// Environment configuration with command-line flags applied on top.
    fn config(&self) -> VibeCheckConfig {
        let mut config = VibeCheckConfig::from_env();
        if let Some(num_tries) = self.num_tries {
            config.num_tries = num_tries;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(base) = self.backoff_base {
            config.backoff_base = base;
        }
        if let Some(max) = self.backoff_max {
            config.backoff_max = max;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config
    }
}

fn parse_json_value(raw: &str) -> Result<Value, String> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

fn parse_kwarg(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing keyword name in '{raw}'"));
    }
    Ok((name.to_string(), parse_json_value(value)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = cli.config();
    let policy = config.resolve().context("Invalid configuration")?;

    let Some(api_key) = cli.provider.api_key_from_env() else {
        bail!(
            "No API key for {}. Set {}.",
            cli.provider,
            cli.provider.api_key_env_vars().join(" or ")
        );
    };

    let mut settings = BackendSettings::new(api_key, config.timeout());
    if let Some(url) = &cli.base_url {
        settings = settings.with_base_url(url.clone());
    }

    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| cli.provider.default_model().to_string());
    let client = VibeClient::for_provider(cli.provider, &settings, model, policy)
        .context("Failed to create model backend")?;

    match cli.command {
        Command::Eval { statement } => {
            let verdict = client
                .evaluate_statement(&statement)
                .await
                .context("Failed to evaluate statement")?;
            println!("{verdict}");
        }
        Command::Simulate {
            signature,
            doc,
            args,
            kwargs,
        } => {
            let signature =
                FunctionSignature::parse(&signature).context("Failed to parse --signature")?;
            let mut call = FunctionCall::new(signature).docstring(doc);
            call.args = args;
            call.kwargs = kwargs;

            let value = client
                .simulate_function(&call)
                .await
                .context("Failed to simulate function")?;
            match value {
                Value::String(text) => println!("{text}"),
                other => println!("{other}"),
            }
        }
    }

    Ok(())
}
