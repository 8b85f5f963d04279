use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use reedline::ExternalPrinter;
use serde_json::Value;
use std::io::{stdin, IsTerminal};
use swipestyle_cli::api::{ApiClient, Backend};
use swipestyle_cli::input_handler::InputHandler;
use swipestyle_cli::protocol::ShoppingRequest;
use swipestyle_cli::suggest::{merge_remote, MAX_SUGGESTIONS};
use swipestyle_cli::{
    logger, resolve_link, App, Config, Locale, OutputHandler, RecommendationItem,
    ResolvedRecommendation, SuggestionIndex,
};

#[derive(Parser)]
#[command(name = "swipestyle")]
#[command(about = "SwipeStyle - conversational product recommendations in the terminal", long_about = None)]
struct Cli {
    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Backend endpoint to connect to (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Interface language: tr or en
    #[arg(long)]
    lang: Option<Locale>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show autocomplete suggestions for a prefix
    Suggest {
        query: String,

        /// Also ask the backend autocomplete endpoint
        #[arg(long)]
        remote: bool,
    },
    /// Repair a product link the same way recommendations are repaired
    Link {
        url: String,

        #[arg(long, default_value = "")]
        title: String,

        /// Retailer the product was found on, e.g. www.hepsiburada.com
        #[arg(long)]
        source: Option<String>,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        price: Option<String>,
    },
    /// Look up products through the shopping endpoint
    Shop {
        query: String,

        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default()?;
    if let Some(endpoint) = cli.endpoint {
        config.api.base_url = endpoint;
    }
    if let Some(lang) = cli.lang {
        config.ui.language = lang;
    }

    let log_path = match logger::init_global_logger(cli.debug) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("⚠️  Logging disabled: {}", e);
            None
        }
    };

    if cli.verbose {
        println!("🚀 Starting SwipeStyle with endpoint: {}", config.api.base_url);
        if let Some(path) = &log_path {
            println!("📝 Logging to {}", path.display());
        }
    }

    let output = OutputHandler::new().with_debug(cli.debug);

    match cli.command {
        Some(Commands::Suggest { query, remote }) => run_suggest(&config, &output, &query, remote).await,
        Some(Commands::Link {
            url,
            title,
            source,
            category,
            price,
        }) => {
            let item = RecommendationItem {
                title: Some(title),
                source_site: source,
                price: price.map(Value::String),
                ..RecommendationItem::default()
            };
            output.print_link(&resolve_link(&url, &item, &category));
            Ok(())
        }
        Some(Commands::Shop { query, country }) => run_shop(&config, &output, query, country).await,
        None => run_interactive(config, output).await,
    }
}

async fn run_suggest(config: &Config, output: &OutputHandler, query: &str, remote: bool) -> Result<()> {
    let locale = config.ui.language;
    let mut results = SuggestionIndex::builtin(locale).suggest(query);
    if remote && !query.trim().is_empty() {
        let client = ApiClient::new(&config.api)?;
        let remote_results = client.autocomplete(query.trim(), locale, MAX_SUGGESTIONS).await?;
        results = merge_remote(results, remote_results);
    }
    output.print_suggestions(&results, locale);
    Ok(())
}

async fn run_shop(
    config: &Config,
    output: &OutputHandler,
    query: String,
    country: Option<String>,
) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let request = ShoppingRequest {
        query,
        country: country.unwrap_or_else(|| config.ui.country.clone()),
        language: config.ui.language,
    };
    let products = client.shopping(&request).await?;
    let resolved: Vec<ResolvedRecommendation> = products
        .into_iter()
        .map(|product| ResolvedRecommendation::resolve(product.into(), ""))
        .collect();
    output.print_recommendations(&resolved, config.ui.language);
    Ok(())
}

async fn run_interactive(config: Config, output: OutputHandler) -> Result<()> {
    if !stdin().is_terminal() {
        bail!("SwipeStyle chat needs an interactive terminal; use a subcommand (see --help) when piping");
    }

    let printer = ExternalPrinter::new(1024);
    let output = output.with_printer(printer.clone());
    let input = InputHandler::new("swipestyle", printer)
        .with_history(Config::data_dir().join("history.txt"))
        .spawn();

    let (mut app, events) = App::new(config, output)?;
    app.run(events, input).await
}
