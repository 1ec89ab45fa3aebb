use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use std::path::PathBuf;
use tokio::runtime::Runtime;

mod completer;
mod shell;

use directory_cli::api::ApiClient;
use directory_cli::config::config::API_URL_ENV;
use directory_cli::config::Config;
use directory_cli::data_exporter::export_to_csv;
use directory_cli::services::{
    FilterOptions, LeadFormService, ProfessionalRegistration, QuoteRequest,
};
use directory_cli::table_display::TableRenderer;
use directory_cli::utils::logging::{init_tracing, log_file_path};
use directory_cli::{FetchOutcome, SearchController, SearchQuery};
use shell::Shell;

#[derive(Parser)]
#[command(name = "directory-cli", version, about = "Search the local business directory")]
struct Cli {
    /// Backend URL (overrides DIRECTORY_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Config file helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that talk to the backend
#[derive(Subcommand)]
enum ClientCommand {
    /// Interactive search shell (default)
    Shell,
    /// List service categories
    Categories,
    /// List locations
    Locations,
    /// Search for businesses and page through the results
    Search(SearchArgs),
    /// Request a quote for a service
    Quote(QuoteArgs),
    /// Register as a professional
    Register(RegisterArgs),
}

#[derive(Args)]
struct SearchArgs {
    #[arg(short, long)]
    category: String,
    #[arg(short, long)]
    location: String,
    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: usize,
    /// Keep fetching until the backend has no more pages
    #[arg(long, conflicts_with = "pages")]
    all: bool,
    /// Write the fetched results to a CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args)]
struct QuoteArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    service: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    description: String,
    /// Business the quote is addressed to
    #[arg(long)]
    business: Option<String>,
    /// Preferred date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    company: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// Service offered (repeat for several)
    #[arg(long = "service", required = true)]
    services: Vec<String>,
    /// Location served (repeat for several)
    #[arg(long = "location", required = true)]
    locations: Vec<String>,
    #[arg(long)]
    description: String,
    #[arg(long)]
    license: Option<String>,
    #[arg(long)]
    insurance: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
    /// Write a commented default config file
    Generate {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::get_config_path(),
    }
}

fn run_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = config_path(cli)?;
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Generate { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::create_default_with_comments())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Configuration file created at: {}", path.display());
        }
    }
    Ok(())
}

fn run_search(runtime: &Runtime, client: ApiClient, config: &Config, args: SearchArgs) -> Result<()> {
    let renderer = TableRenderer::new(config.display.use_glyphs, config.display.show_row_numbers);
    let controller = SearchController::new(client, renderer);
    let query = SearchQuery::new(args.category, args.location);

    let max_pages = if args.all { usize::MAX } else { args.pages.max(1) };

    runtime.block_on(async {
        controller.start_search(query).await?;
        let mut pages = 1;
        while pages < max_pages && controller.session().has_more {
            match controller.load_more().await? {
                FetchOutcome::Page(_) => pages += 1,
                FetchOutcome::NothingToLoad | FetchOutcome::Busy => break,
            }
        }
        Ok::<_, directory_cli::SearchError>(())
    })?;

    if let Some(path) = args.export {
        let rows = export_to_csv(&controller.renderer().displayed(), &path)?;
        println!("{}", format!("Exported {} rows to {}", rows, path.display()).green());
    }
    Ok(())
}

fn run_client(cli: &Cli, command: ClientCommand) -> Result<()> {
    let config = Config::load_from(&config_path(cli)?)?;
    init_tracing(&config.logging);

    let api_url = config.resolve_api_url(cli.api_url.as_deref(), std::env::var(API_URL_ENV).ok());
    let client = ApiClient::with_timeout(&api_url, config.api.timeout())?;
    let runtime = Runtime::new().context("starting async runtime")?;

    match command {
        ClientCommand::Shell => {
            if let Some(path) = log_file_path() {
                eprintln!("Debug logs will be written to:");
                eprintln!("   {}", path.display());
                eprintln!();
            }
            Shell::new(client, config).run(&runtime)?;
        }
        ClientCommand::Categories => {
            let categories = runtime.block_on(client.categories())?;
            let options = FilterOptions::new(categories, Vec::new());
            options.categories.iter().for_each(|c| println!("{}", c));
        }
        ClientCommand::Locations => {
            let locations = runtime.block_on(client.locations())?;
            let options = FilterOptions::new(Vec::new(), locations);
            options.locations.iter().for_each(|l| println!("{}", l));
        }
        ClientCommand::Search(args) => run_search(&runtime, client, &config, args)?,
        ClientCommand::Quote(args) => {
            let request = QuoteRequest {
                name: args.name,
                email: args.email,
                phone: args.phone,
                service: args.service,
                location: args.location,
                description: args.description,
                business: args.business,
                preferred_date: args.date,
            };
            let message = runtime.block_on(LeadFormService::new(client).submit_quote(&request))?;
            println!("{}", message.green());
        }
        ClientCommand::Register(args) => {
            let registration = ProfessionalRegistration {
                name: args.name,
                company: args.company,
                email: args.email,
                phone: args.phone,
                services: args.services,
                locations: args.locations,
                description: args.description,
                license: args.license,
                insurance: args.insurance,
            };
            let message = runtime
                .block_on(LeadFormService::new(client).register_professional(&registration))?;
            println!("{}", message.green());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        Some(Command::Config { action }) => run_config(&cli, &action),
        Some(Command::Client(command)) => run_client(&cli, command),
        None => run_client(&cli, ClientCommand::Shell),
    }
}
