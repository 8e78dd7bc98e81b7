mod cli;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use botforge::logging::init_logging;
use botforge::Config;

#[derive(Parser)]
#[command(name = "botforge")]
#[command(about = "Scaffold, remove and run chat-bot feature modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a module; nest children with dots (e.g. video.create)
    AddModule {
        /// Dotted module name
        name: String,
    },
    /// Remove a module with its temp and log folders
    RemoveModule {
        /// Dotted module name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List discovered modules and the router tree
    Modules,
    /// Start the bot
    Run,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", cli::format_cli_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Version => {
            println!("botforge {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::AddModule { name } => {
            let config = load_config()?;
            cli::module::cmd_add_module(&config, &name)?;
        }
        Commands::RemoveModule { name, yes } => {
            let config = load_config()?;
            cli::module::cmd_remove_module(&config, &name, yes)?;
        }
        Commands::Modules => {
            let config = load_config()?;
            cli::module::cmd_list_modules(&config)?;
        }
        Commands::Run => {
            let config = load_config()?;
            cli::run::cmd_run(config).await?;
        }
    }

    Ok(())
}

/// Load `.env`, the config file and env overrides, then start logging.
fn load_config() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let config = Config::load()
        .with_context(|| format!("Failed to load config from {}", Config::path().display()))?;
    init_logging(&config.logging);
    Ok(config)
}
