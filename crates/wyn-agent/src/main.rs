//! Chats with a Mistral agent from the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use owo_colors::OwoColorize;
use tokio::io::{self, BufReader};
use wyn_agent::Repl;
use wyn_agent::core::AgentBuilder;
use wyn_agent_mistral_model::{MistralConfigBuilder, MistralProvider};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Ok(api_key) = env::var("MISTRAL_API_KEY") else {
        eprintln!("MISTRAL_API_KEY environment variable is not set");
        return ExitCode::FAILURE;
    };
    let Ok(agent_id) = env::var("MISTRAL_AGENT_ID") else {
        eprintln!("MISTRAL_AGENT_ID environment variable is not set");
        return ExitCode::FAILURE;
    };

    let mut config_builder =
        MistralConfigBuilder::with_credentials(api_key, agent_id);
    if let Ok(base_url) = env::var("MISTRAL_BASE_URL") {
        config_builder = config_builder.with_base_url(base_url);
    }
    let config = config_builder.build();
    debug!("using {config:?}");
    let model_provider = MistralProvider::new(config);

    let mut agent_builder = AgentBuilder::with_model_provider(model_provider);
    if let Some(interpreter) = env::var_os("WYN_AGENT_PYTHON") {
        agent_builder = agent_builder.with_interpreter(interpreter);
    }
    let agent = agent_builder.build();

    let script_dir = env::var_os("WYN_AGENT_SCRIPT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let stdin = BufReader::new(io::stdin());
    let mut repl = Repl::new(agent, stdin, std::io::stdout())
        .with_script_dir(script_dir)
        .with_progress(true);

    match repl.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("session aborted: {err:?}");
            eprintln!("{}", format!("Error: {err}").bright_red());
            ExitCode::FAILURE
        }
    }
}
