use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use studygen::api;
use studygen::config::{ProviderArgs, ServeArgs};
use studygen::llm::{self, StructuredGenerator};
use studygen::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(
    name = "studygen",
    version,
    about = "Generate lessons and multiple-choice quizzes with a hosted LLM.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Manage stored provider API keys
    Key {
        #[command(flatten)]
        provider: ProviderArgs,
        /// Store an API key in the local auth file. Prompts when no value is given
        #[arg(
            long,
            value_name = "KEY",
            num_args = 0..=1,
            default_missing_value = "",
            conflicts_with = "clear"
        )]
        set: Option<String>,
        /// Remove the stored API key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured API key against the provider
        #[arg(long)]
        test: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Key {
            provider,
            set,
            clear,
            test,
        } => handle_key_command(&provider, set, clear, test).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.log_json)?;

    let (settings, source) = args.provider.resolve()?;
    info!(
        provider = %settings.kind,
        model = %settings.model,
        api_base = %settings.api_base,
        key_source = source.description(),
        "provider configured"
    );

    let provider = llm::build_provider(&settings)?;
    let generator = Arc::new(StructuredGenerator::new(provider));
    let app = api::router(generator, args.limits());
    api::serve(args.bind, app).await
}

async fn handle_key_command(
    args: &ProviderArgs,
    set: Option<String>,
    clear: bool,
    test: bool,
) -> Result<()> {
    let kind = args.provider;
    let mut action_taken = false;

    if let Some(key) = set {
        let key = if key.trim().is_empty() {
            llm::prompt_for_api_key(kind)?
        } else {
            key
        };
        llm::store_api_key(kind, &key)?;
        println!("Stored {kind} API key in the local auth file.");
        action_taken = true;
    }

    if clear {
        let removed = llm::clear_api_key(kind)?;
        if removed {
            println!("Removed the stored {kind} API key.");
        } else {
            println!("No {kind} API key found in the auth file.");
        }
        action_taken = true;
    }

    if test {
        let source =
            llm::test_configured_api_key(kind, args.model.as_deref(), args.api_base.as_deref())
                .await?;
        println!("{kind} API key from the {} is valid.", source.description());
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use studygen::llm::ProviderKind;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_set_without_value_parses_as_prompt() {
        let cli = Cli::try_parse_from(["studygen", "key", "--provider", "openai", "--set"]).unwrap();
        let Command::Key { provider, set, .. } = cli.command else {
            panic!("expected key command");
        };
        assert_eq!(provider.provider, ProviderKind::Openai);
        assert_eq!(set.as_deref(), Some(""));
    }

    #[test]
    fn key_set_conflicts_with_clear() {
        assert!(Cli::try_parse_from(["studygen", "key", "--set", "k", "--clear"]).is_err());
    }
}
