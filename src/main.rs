use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use media_explorer::api::ApiClient;
use media_explorer::config::{find_config_file, load_config, user_config_path, Config};
use media_explorer::image::{ImageLoader, ImageSlots};
use media_explorer::models::{FilterField, MediaItem, SearchFilters};
use media_explorer::session::{ControllerError, FetchKind, FetchOutcome, SearchSession};
use media_explorer::ui::{self, DetailOverlay, Spinner, Status};
use media_explorer::utils::HttpClient;
use media_explorer::validate::validate_filters;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Media Explorer - Search a media archive by keyword, photographer and date
#[derive(Parser, Debug)]
#[command(name = "media-explorer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search a media archive by keyword, photographer and date range", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Show all environment variables
    #[arg(long)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self, is_tty: bool) -> Self {
        match self {
            OutputFormat::Auto if is_tty => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a search and print the results
    #[command(alias = "s")]
    Search {
        /// Keyword query (matches everything when omitted)
        query: Option<String>,

        /// Photographer name (at least 2 characters)
        #[arg(long, short)]
        photographer: Option<String>,

        /// Earliest date, e.g. 2021-03-07
        #[arg(long)]
        from: Option<String>,

        /// Latest date, e.g. 2021-12-31
        #[arg(long)]
        to: Option<String>,

        /// Results per page (defaults to the configured page size)
        #[arg(long)]
        size: Option<u32>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Interactive search with load more and a detail view
    #[command(alias = "b")]
    Browse,

    /// Download an image, substituting the placeholder if it cannot be loaded
    Image {
        /// Image URL
        url: String,

        /// File to write the image bytes to
        #[arg(long, short = 'O')]
        out: PathBuf,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file location
    Path,
}

fn print_env_vars() {
    println!("Media Explorer Environment Variables");
    println!("====================================");
    println!();
    println!("API:");
    println!("  NEXT_PUBLIC_API_URL                   Base URL of the search API (default: http://localhost:8000)");
    println!("  MEDIA_EXPLORER_API_URL                Same as NEXT_PUBLIC_API_URL, takes precedence");
    println!("  MEDIA_EXPLORER_API__BASE_URL          Base URL via the layered configuration");
    println!("  MEDIA_EXPLORER_API__TIMEOUT_SECONDS   Request timeout in seconds (default: 30)");
    println!("  MEDIA_EXPLORER_API__PAGE_SIZE         Results per page (default: 12)");
    println!();
    println!("Images:");
    println!("  MEDIA_EXPLORER_IMAGES__PLACEHOLDER_PATH  Fallback image (default: public/placeholder-image.jpg)");
    println!();
    println!("Logging:");
    println!("  MEDIA_EXPLORER_LOGGING__LEVEL         Log level when no -v flag is given (default: info)");
    println!("  MEDIA_EXPLORER_LOGGING__FORMAT        Set to \"json\" for JSON logs");
    println!("  RUST_LOG                              Overrides all other log settings");
    println!();
    println!("Example:");
    println!("  export NEXT_PUBLIC_API_URL=\"https://archive.example.com\"");
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };
    let json = cli.log_json || config.logging.is_json();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("media_explorer={}", level)),
        ))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    let is_tty = ui::is_terminal();
    let format = cli.output.resolve(is_tty);
    let show_progress = is_tty && !cli.quiet;

    match cli.command {
        Some(Commands::Search {
            query,
            photographer,
            from,
            to,
            size,
            pages,
        }) => {
            let filters = SearchFilters {
                query: query.unwrap_or_else(|| "*".to_string()),
                photographer,
                from_date: from,
                to_date: to,
            };
            run_search(&config, filters, size, pages, format, show_progress).await
        }
        Some(Commands::Browse) | None => run_browse(&config, show_progress).await,
        Some(Commands::Image { url, out }) => {
            run_image(&config, &url, &out, cli.quiet, show_progress).await
        }
        Some(Commands::Config { action }) => {
            run_config(action, &config, cli.config.as_deref(), config_path.as_deref())
        }
    }
}

async fn run_search(
    config: &Config,
    filters: SearchFilters,
    size: Option<u32>,
    pages: u32,
    format: OutputFormat,
    show_progress: bool,
) -> Result<()> {
    let errors = validate_filters(&filters);
    if !errors.is_empty() {
        ui::print_field_errors(&errors);
        bail!("Invalid search filters");
    }

    let client = ApiClient::from_config(&config.api)?;
    let mut session = SearchSession::new(size.unwrap_or(config.api.page_size));

    let spinner = progress_spinner(
        show_progress && format == OutputFormat::Table,
        "Searching archive...",
    );

    let result = fetch_pages(&mut session, &client, filters, pages).await;
    match result {
        Ok(()) => spinner.clear(),
        Err(e) => {
            spinner.finish_with_error("Search failed");
            if session.results().is_empty() {
                return Err(e.into());
            }
            // keep what was loaded before the failure
            ui::print_status(Status::Warning, &format!("{}; showing results loaded so far", e));
        }
    }

    let mut images = ImageSlots::new(config.images.placeholder_path.clone());
    images.sync(session.results());
    output_results(&session, &images, format)
}

/// A spinner when progress is shown, otherwise one that draws nothing
fn progress_spinner(show: bool, msg: &str) -> Spinner {
    if show {
        Spinner::new(msg)
    } else {
        Spinner::hidden()
    }
}

/// Run the first page and up to `pages - 1` load-more steps
async fn fetch_pages(
    session: &mut SearchSession,
    client: &ApiClient,
    filters: SearchFilters,
    pages: u32,
) -> Result<(), ControllerError> {
    session.submit(client, filters).await?;
    for _ in 1..pages {
        if !session.can_load_more() {
            break;
        }
        session.load_more(client).await?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    count: usize,
    page: u32,
    has_more: bool,
    results: &'a [MediaItem],
}

fn output_results(
    session: &SearchSession,
    images: &ImageSlots,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = SearchOutput {
                count: session.total_count(),
                page: session.current_page(),
                has_more: session.has_more(),
                results: session.results(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            print!("{}", ui::render_plain(session.results(), images.as_slice()));
        }
        OutputFormat::Table | OutputFormat::Auto => print_grid(session, images),
    }
    Ok(())
}

fn print_grid(session: &SearchSession, images: &ImageSlots) {
    if !session.results().is_empty() {
        println!(
            "{}",
            ui::results_table(
                session.results(),
                images.as_slice(),
                0,
                ui::terminal_width()
            )
        );
    }
    println!(
        "{}",
        ui::results_summary(session.results().len(), session.total_count()).dimmed()
    );
}

/// One line of input in the interactive browser
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Set(FilterField, String),
    Clear(FilterField),
    Search,
    More,
    Open(usize),
    Close,
    Show,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "" => Ok(BrowseCommand::Empty),
        "search" | "go" => Ok(BrowseCommand::Search),
        "more" | "m" | "next" => Ok(BrowseCommand::More),
        "close" | "c" => Ok(BrowseCommand::Close),
        "show" | "status" => Ok(BrowseCommand::Show),
        "help" | "h" | "?" => Ok(BrowseCommand::Help),
        "quit" | "exit" => Ok(BrowseCommand::Quit),
        "open" | "o" => rest
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(BrowseCommand::Open)
            .ok_or_else(|| "usage: open <number>".to_string()),
        "clear" => rest.parse::<FilterField>().map(BrowseCommand::Clear),
        other => other
            .parse::<FilterField>()
            .map(|field| BrowseCommand::Set(field, rest.to_string()))
            .map_err(|_| format!("unknown command: {} (type `help`)", other)),
    }
}

fn print_browse_help() {
    ui::print_section("Commands");
    println!("  query <text>         Set the keyword query");
    println!("  photographer <name>  Filter by photographer");
    println!("  from <date>          Earliest date (YYYY-MM-DD)");
    println!("  to <date>            Latest date (YYYY-MM-DD)");
    println!("  clear <field>        Reset a field");
    println!("  search               Run the search");
    println!("  more                 Load the next page");
    println!("  open <n>             Show result n in detail");
    println!("  close                Close the detail view");
    println!("  show                 Show filters and progress");
    println!("  quit                 Exit");
}

fn print_filters(label: &str, filters: &SearchFilters) {
    println!("{}", label.bold());
    for field in FilterField::ALL {
        println!(
            "  {:<13} {}",
            field.name(),
            filters.get(field).unwrap_or("-")
        );
    }
}

fn print_outcome(session: &SearchSession, images: &ImageSlots, outcome: FetchOutcome) {
    match outcome.kind {
        FetchKind::FirstPage => print_grid(session, images),
        FetchKind::NextPage(page) => {
            let start = outcome.loaded - outcome.received;
            ui::print_status(
                Status::Success,
                &format!("Loaded page {} ({} new)", page, outcome.received),
            );
            if outcome.received > 0 {
                println!(
                    "{}",
                    ui::results_table(
                        &session.results()[start..],
                        images.as_slice().get(start..).unwrap_or_default(),
                        start,
                        ui::terminal_width()
                    )
                );
            }
            println!(
                "{}",
                ui::results_summary(session.results().len(), session.total_count()).dimmed()
            );
        }
    }
    if session.can_load_more() {
        println!("{}", "Type `more` to load more results".dimmed());
    }
}

fn report_controller_error(err: &ControllerError) {
    match err {
        ControllerError::Invalid(errors) => ui::print_field_errors(errors),
        ControllerError::NothingMore(_) => ui::print_status(Status::Info, &err.to_string()),
        ControllerError::Api(e) => ui::print_status(
            Status::Error,
            &format!("Search failed: {}. Loaded results were kept.", e),
        ),
        _ => ui::print_status(Status::Warning, &err.to_string()),
    }
}

async fn run_browse(config: &Config, show_progress: bool) -> Result<()> {
    let http = HttpClient::from_config(&config.api)?;
    let client = ApiClient::new(&config.api.base_url, http.clone())?;
    let loader = ImageLoader::new(http, config.images.placeholder_path.clone());

    let mut session = SearchSession::new(config.api.page_size);
    let mut overlay = DetailOverlay::new(config.images.placeholder_path.clone());
    let mut images = ImageSlots::new(config.images.placeholder_path.clone());

    ui::print_status(
        Status::Search,
        &format!("Media Explorer v{} ({})", media_explorer::VERSION, client.endpoint()),
    );
    println!("{}", "Type `help` for commands.".dimmed());

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                ui::print_status(Status::Warning, &msg);
                continue;
            }
        };

        match command {
            BrowseCommand::Empty => {}
            BrowseCommand::Quit => break,
            BrowseCommand::Help => print_browse_help(),
            BrowseCommand::Set(field, value) => {
                session.draft_mut().set(field, value);
                ui::print_field_errors(&validate_filters(session.draft()));
            }
            BrowseCommand::Clear(field) => {
                session.draft_mut().clear(field);
                ui::print_field_errors(&validate_filters(session.draft()));
            }
            BrowseCommand::Show => {
                print_filters("Draft", session.draft());
                print_filters("Active", session.active_filters());
                println!(
                    "{}",
                    ui::results_summary(session.results().len(), session.total_count())
                );
            }
            BrowseCommand::Search => {
                overlay.close();
                let spinner = progress_spinner(show_progress, "Searching archive...");
                let result = session.submit_draft(&client).await;
                spinner.clear();
                images.sync(session.results());
                match result {
                    Ok(outcome) => print_outcome(&session, &images, outcome),
                    Err(e) => report_controller_error(&e),
                }
            }
            BrowseCommand::More => {
                let spinner = progress_spinner(show_progress, "Loading more...");
                let result = session.load_more(&client).await;
                spinner.clear();
                images.sync(session.results());
                match result {
                    Ok(outcome) => print_outcome(&session, &images, outcome),
                    Err(e) => report_controller_error(&e),
                }
            }
            BrowseCommand::Open(n) => {
                let Some(item) = session.results().get(n - 1).cloned() else {
                    ui::print_status(
                        Status::Warning,
                        &format!("No result {} ({} loaded)", n, session.results().len()),
                    );
                    continue;
                };
                let url = item.image.clone();
                overlay.open(item);

                let spinner = progress_spinner(show_progress, "Loading image...");
                let loaded = loader.load(&url).await;
                spinner.clear();
                match loaded {
                    Ok(image) if image.is_placeholder() => {
                        overlay.report_image_error();
                        images.report_error(n - 1);
                    }
                    Ok(_) => {}
                    Err(e) => ui::print_status(Status::Warning, &e.to_string()),
                }

                if let Some(rendered) = overlay.render(ui::terminal_width()) {
                    print!("{}", rendered);
                }
            }
            BrowseCommand::Close => overlay.close(),
        }
    }

    Ok(())
}

async fn run_image(
    config: &Config,
    url: &str,
    out: &Path,
    quiet: bool,
    show_progress: bool,
) -> Result<()> {
    let loader = ImageLoader::new(
        HttpClient::from_config(&config.api)?,
        config.images.placeholder_path.clone(),
    );

    let spinner = progress_spinner(show_progress, "Downloading image...");
    let image = match loader.load(url).await {
        Ok(image) => image,
        Err(e) => {
            spinner.finish_with_error("Image download failed");
            return Err(e.into());
        }
    };
    if let Err(e) = tokio::fs::write(out, &image.bytes).await {
        spinner.finish_with_error("Image download failed");
        return Err(e).with_context(|| format!("Failed to write {}", out.display()));
    }

    match &image.fallback_reason {
        Some(reason) => {
            spinner.clear();
            if !quiet {
                ui::print_status(
                    Status::Warning,
                    &format!(
                        "{} ({}); wrote placeholder to {}",
                        url,
                        reason,
                        out.display()
                    ),
                );
            }
        }
        None => {
            let msg = format!("Saved {} bytes to {}", image.bytes.len(), out.display());
            if show_progress {
                spinner.finish_with_success(&msg);
            } else if !quiet {
                ui::print_status(Status::Success, &msg);
            }
        }
    }
    Ok(())
}

fn run_config(
    action: ConfigAction,
    config: &Config,
    explicit: Option<&Path>,
    loaded_from: Option<&Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => match loaded_from {
            Some(path) => println!("{}", path.display()),
            None => match user_config_path() {
                Some(path) => println!("{} (not created)", path.display()),
                None => bail!("No configuration directory available"),
            },
        },
        ConfigAction::Init { force } => {
            let Some(path) = explicit.map(PathBuf::from).or_else(user_config_path) else {
                bail!("No configuration directory available; pass --config <FILE>");
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            ui::print_status(
                Status::Success,
                &format!("Wrote default configuration to {}", path.display()),
            );
        }
    }
    Ok(())
}
