//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::form_urlencoded;

use sitekit_core::{
    FeedBlock, FeedFilter, ListBlock, LoadScope, Location, SearchBlock, SiteContext,
    career_carousel,
};
use sitekit_index::PlaceholderSource;
use sitekit_nav::{MenuController, MenuEvent, MenuLabels, Viewport, fetch_nav_tree};
use sitekit_shared::{
    AppConfig, CarouselOptions, Locale, init_config, load_config, load_config_from, validate,
};
use sitekit_tabs::{Carousel, CarouselBlock, CarouselEvent, TabEvent, TabsBlock};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sitekit: decorate content-site blocks from the site index.
#[derive(Parser)]
#[command(
    name = "sitekit",
    version,
    about = "Render search, listing, feed and navigation blocks from a content site's index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Site origin, overriding `site.base_url` from the config file.
    #[arg(long, env = "SITEKIT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Config file to read instead of `~/.sitekit/sitekit.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Authored block kinds that `decorate` understands.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum BlockKind {
    Tabs,
    Carousel,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render the search results block for a term.
    Search {
        /// Term to search for.
        term: String,

        /// Zero-based result page.
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,

        /// Read every page of the sheet instead of the first.
        #[arg(long)]
        all: bool,
    },

    /// Render the news listing.
    List {
        /// Zero-based result page.
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,

        /// Read every page of the sheet instead of the first.
        #[arg(long)]
        all: bool,
    },

    /// Render the newsroom feed.
    Feed {
        /// Column to order on, descending.
        #[arg(long)]
        sort: Option<String>,

        /// Card fields (comma-separated).
        #[arg(long)]
        fields: Option<String>,

        /// Page types to leave out (comma-separated).
        #[arg(long)]
        omit: Option<String>,

        /// Only show results from this year.
        #[arg(long)]
        year: Option<i32>,

        /// Only show results in this category.
        #[arg(long)]
        category: Option<String>,

        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Render the site navigation.
    Nav {
        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,

        /// Viewport width the menu is rendered for.
        #[arg(long, default_value = "1440")]
        width: f64,

        /// Open the top-level item with this label, as a tap would.
        #[arg(long)]
        open: Option<String>,
    },

    /// Render the career testimonial carousel.
    Career {
        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Decorate an authored tabs or carousel block read from a file.
    Decorate {
        /// Block kind.
        kind: BlockKind,

        /// HTML file holding the authored block.
        file: PathBuf,

        /// Panel or slide to activate.
        #[arg(long)]
        select: Option<usize>,

        /// Key presses to apply after selection (e.g. ArrowRight).
        #[arg(long)]
        key: Vec<String>,
    },

    /// Load a whole index sheet and report its size.
    Index {
        /// Sheet name (defaults to the locale's search sheet).
        #[arg(short, long)]
        sheet: Option<String>,

        /// Language code (defaults to `site.default_locale`).
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitekit=info",
        1 => "sitekit=debug",
        _ => "sitekit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Block markup goes to stdout; keep logs off it.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&cli).await,
        };
    }

    let config = resolve_config(&cli)?;
    match cli.command {
        Command::Search {
            term,
            page,
            locale,
            all,
        } => cmd_search(config, &term, page, locale.as_deref(), all).await,
        Command::List { page, locale, all } => {
            cmd_list(config, page, locale.as_deref(), all).await
        }
        Command::Feed {
            sort,
            fields,
            omit,
            year,
            category,
            locale,
        } => {
            let filter = FeedFilter { year, category };
            cmd_feed(
                config,
                sort.as_deref(),
                fields.as_deref(),
                omit.as_deref(),
                &filter,
                locale.as_deref(),
            )
            .await
        }
        Command::Nav {
            locale,
            width,
            open,
        } => cmd_nav(config, locale.as_deref(), width, open.as_deref()).await,
        Command::Career { locale } => cmd_career(config, locale.as_deref()).await,
        Command::Decorate {
            kind,
            file,
            select,
            key,
        } => cmd_decorate(&config, kind, &file, select, &key),
        Command::Index { sheet, locale } => {
            cmd_index(config, sheet.as_deref(), locale.as_deref()).await
        }
        Command::Config { .. } => Ok(()),
    }
}

/// Config file (or defaults) with CLI overrides applied.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    validate(&config)?;
    Ok(config)
}

fn locale_or_default(config: &AppConfig, locale: Option<&str>) -> Locale {
    Locale::new(locale.unwrap_or(&config.site.default_locale))
}

/// `s` and `pg` query parameters as the blocks read them.
fn page_query(term: Option<&str>, page: usize) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(term) = term {
        query.append_pair("s", term);
    }
    if page > 0 {
        query.append_pair("pg", &page.to_string());
    }
    query.finish()
}

fn scope(all: bool) -> LoadScope {
    if all { LoadScope::All } else { LoadScope::FirstPage }
}

// ---------------------------------------------------------------------------
// Block commands
// ---------------------------------------------------------------------------

async fn cmd_search(
    config: AppConfig,
    term: &str,
    page: usize,
    locale: Option<&str>,
    all: bool,
) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let location = Location::new(locale.localized_path("/search"), page_query(Some(term), page));
    info!(term, page, %locale, "searching");

    let block = SearchBlock::from(&config.search).with_scope(scope(all));
    let ctx = SiteContext::from_config(config)?;
    let element = block.decorate(&ctx, &location).await?;
    println!("{element}");
    Ok(())
}

async fn cmd_list(config: AppConfig, page: usize, locale: Option<&str>, all: bool) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let location = Location::new(locale.localized_path("/news"), page_query(None, page));

    let block = ListBlock::from(&config.list).with_scope(scope(all));
    let ctx = SiteContext::from_config(config)?;
    let element = block.decorate(&ctx, &location).await?;
    println!("{element}");
    Ok(())
}

async fn cmd_feed(
    config: AppConfig,
    sort: Option<&str>,
    fields: Option<&str>,
    omit: Option<&str>,
    filter: &FeedFilter,
    locale: Option<&str>,
) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let location = Location::new(locale.localized_path("/newsroom"), "");

    let mut block = FeedBlock::from(&config.feed);
    if let Some(sort) = sort {
        block = block.with_sort(sort);
    }
    if let Some(fields) = fields {
        block = block.with_fields(fields);
    }
    if let Some(omit) = omit {
        block = block.with_omitted_page_types(omit);
    }

    let ctx = SiteContext::from_config(config)?;
    let element = block.decorate(&ctx, &location, filter).await?;
    println!("{element}");
    Ok(())
}

async fn cmd_nav(
    config: AppConfig,
    locale: Option<&str>,
    width: f64,
    open: Option<&str>,
) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let viewport = Viewport::from(&config.viewport);
    let ctx = SiteContext::from_config(config)?;

    let tree = fetch_nav_tree(ctx.cache.source(), &locale).await?;
    let placeholders = ctx.placeholders.placeholders(&locale).await?;

    let mut menu = MenuController::new(&tree, viewport, width);
    if let Some(label) = open {
        let item = tree
            .items
            .iter()
            .position(|item| item.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| eyre!("no top-level menu item labelled '{label}'"))?;
        let handled = menu.handle(MenuEvent::ItemClick { item, width });
        info!(label, ?handled, device = ?menu.device(), "menu item clicked");
    }

    println!("{}", menu.render(&tree, MenuLabels::from_placeholders(&placeholders)));
    Ok(())
}

async fn cmd_career(config: AppConfig, locale: Option<&str>) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let location = Location::new(locale.localized_path("/careers"), "");
    let ctx = SiteContext::from_config(config)?;

    let element = career_carousel(&ctx, &location, &mut rand::thread_rng()).await?;
    println!("{element}");
    Ok(())
}

fn cmd_decorate(
    config: &AppConfig,
    kind: BlockKind,
    file: &Path,
    select: Option<usize>,
    keys: &[String],
) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let events = select
        .map(TabEvent::Select)
        .into_iter()
        .chain(keys.iter().filter_map(|k| TabEvent::from_key(k)))
        .collect::<Vec<_>>();

    let element = match kind {
        BlockKind::Tabs => {
            let block = TabsBlock::from_html(&html)?;
            let mut state = block.controller();
            for event in events {
                state.transition(event);
            }
            block.render(&state)
        }
        BlockKind::Carousel => {
            let block = CarouselBlock::from_html(&html)?;
            let now = Instant::now();
            let mut carousel = Carousel::new(block.len(), &CarouselOptions::from(config), now);
            for event in events {
                let event = match event {
                    TabEvent::Select(i) => CarouselEvent::Select(i),
                    TabEvent::Next => CarouselEvent::Next,
                    TabEvent::Prev => CarouselEvent::Prev,
                };
                carousel.handle(event, now);
            }
            block.render(&carousel)
        }
    };
    println!("{element}");
    Ok(())
}

async fn cmd_index(config: AppConfig, sheet: Option<&str>, locale: Option<&str>) -> Result<()> {
    let locale = locale_or_default(&config, locale);
    let sheet = sheet.map_or_else(|| locale.search_sheet(), str::to_string);
    let ctx = SiteContext::from_config(config)?;

    let spinner = spinner();
    spinner.set_message(format!("Loading {} [{sheet}]", ctx.cache.index_name()));
    let started = Instant::now();
    let result = ctx.cache.query_index(&sheet).await;
    spinner.finish_and_clear();
    let rows = result?;

    println!();
    println!("  Index:  {}", ctx.cache.index_name());
    println!("  Sheet:  {sheet}");
    println!("  Rows:   {}", rows.len());
    println!("  Time:   {:.1}s", started.elapsed().as_secs_f64());
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
