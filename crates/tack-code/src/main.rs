//! `tack-code`: inspect and run the built-in agent tools from a shell.
//!
//! # Examples
//!
//! ```sh
//! # Print the tool schemas exported to the model
//! tack-code schema
//!
//! # Run a tool call, asking on the terminal before anything mutates
//! tack-code invoke edit '{"path": "src/main.rs", "old_string": "foo", "new_string": "bar"}'
//!
//! # Approve everything that is not dangerous
//! tack-code invoke shell '{"command": "cargo test"}' --yes
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tack_code::CodeConfig;
use tack_rs::approval::ApprovalPolicy;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect and run the built-in agent tools.
#[derive(Parser, Debug)]
#[command(name = "tack-code", version)]
struct Cli {
    /// Agent configuration file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the exported tool schemas as JSON.
    Schema,
    /// Run one tool call through the pipeline and print the result as JSON.
    Invoke {
        /// Tool name, e.g. `shell`.
        tool: String,
        /// Parameters as a JSON object.
        #[arg(default_value = "{}")]
        params: String,
        /// Working directory for the call.
        #[arg(long, default_value = ".")]
        cwd: PathBuf,
        /// Approve every call that is not dangerous without asking.
        #[arg(long, short = 'y')]
        yes: bool,
        /// When to ask before running a call.
        #[arg(long, value_enum, default_value_t = PolicyArg::OnMutation)]
        policy: PolicyArg,
        /// Print the text the model would see instead of JSON.
        #[arg(long)]
        model_output: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    Auto,
    OnMutation,
    Always,
    ReadOnly,
}

impl From<PolicyArg> for ApprovalPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Auto => ApprovalPolicy::Auto,
            PolicyArg::OnMutation => ApprovalPolicy::OnMutation,
            PolicyArg::Always => ApprovalPolicy::Always,
            PolicyArg::ReadOnly => ApprovalPolicy::ReadOnly,
        }
    }
}

const EXIT_TOOL_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print `value` as pretty JSON on stdout. Returns false if it could not be
/// serialized.
fn print_json(value: &impl Serialize) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match CodeConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match cli.command {
        Command::Schema => {
            if print_json(&config.build_registry().get_schema()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_USAGE)
            }
        }
        Command::Invoke {
            tool,
            params,
            cwd,
            yes,
            policy,
            model_output,
        } => {
            let params: serde_json::Value = match serde_json::from_str(&params) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: parameters are not valid JSON: {e}");
                    return ExitCode::from(EXIT_USAGE);
                }
            };
            if !cwd.is_dir() {
                eprintln!("Error: working directory does not exist: {}", cwd.display());
                return ExitCode::from(EXIT_USAGE);
            }

            let config = config.with_policy(policy.into()).with_workdir(&cwd);
            let registry = config.build_registry();
            let approvals = config.build_approvals(yes);
            info!(
                "[tack-code] {tool} in {} (policy {})",
                config.workdir.display(),
                approvals.policy()
            );

            let result = registry
                .invoke(&tool, params, &config.workdir, Some(&approvals))
                .await;

            let printed = if model_output {
                println!("{}", result.to_model_output());
                true
            } else {
                print_json(&result)
            };
            if !printed {
                ExitCode::from(EXIT_USAGE)
            } else if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_TOOL_FAILED)
            }
        }
    }
}
