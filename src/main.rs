// src/main.rs

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    ups_calc::main();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    use chrono::NaiveDate;

    use ups_calc::api::Bid;
    use ups_calc::app::ApplicationCore;
    use ups_calc::config::{AppConfig, ConfigManager};
    use ups_calc::error::{Error, Result};
    use ups_calc::logging::LoggingManager;
    use ups_calc::manager::Manager;
    use ups_calc::store::BidQuery;
    use ups_calc::utils::Time;

    #[derive(Parser)]
    #[command(
        name = "ups_calc",
        version = ups_calc::VERSION,
        about = "Size UPS power for a set of components",
        long_about = None
    )]
    struct Cli {
        #[arg(short, long, value_name = "FILE", global = true)]
        config: Option<PathBuf>,

        #[arg(short, long, global = true)]
        verbose: bool,

        #[arg(short, long, global = true)]
        debug: bool,

        #[command(subcommand)]
        command: Option<Commands>,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Open the desktop window
        Run,
        /// Check the configuration and exit
        ValidateConfig,
        /// Print catalog components whose title contains QUERY
        Catalog {
            #[arg(default_value = "")]
            query: String,
        },
        /// List the bids visible to the stored session
        Bids {
            #[arg(long)]
            creator: Option<String>,
            #[arg(long)]
            status: Option<String>,
            /// First day, YYYY-MM-DD
            #[arg(long)]
            from: Option<NaiveDate>,
            /// Last day, YYYY-MM-DD
            #[arg(long)]
            to: Option<NaiveDate>,
            /// Keep refreshing until Ctrl-C
            #[arg(short, long)]
            watch: bool,
        },
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let (config, logging) = runtime.block_on(prepare(&cli))?;

        let outcome = match cli.command.unwrap_or(Commands::Run) {
            Commands::Run => {
                drop(runtime);
                launch(config)
            }
            Commands::ValidateConfig => {
                println!("configuration is valid (api: {})", config.api.base_url);
                Ok(())
            }
            Commands::Catalog { query } => runtime.block_on(print_catalog(config, &query)),
            Commands::Bids {
                creator,
                status,
                from,
                to,
                watch,
            } => {
                let query = BidQuery {
                    creator,
                    status,
                    start_date: from,
                    end_date: to,
                };
                runtime.block_on(print_bids(config, query, watch))
            }
        };

        drop(logging);
        outcome
    }

    async fn load_config(cli: &Cli) -> Result<AppConfig> {
        let mut manager = match &cli.config {
            Some(path) => ConfigManager::with_config_file(path)?,
            None => ConfigManager::new(),
        };
        manager.initialize().await?;

        let problems = manager.validate().await?;
        if !problems.is_empty() {
            let listed = problems
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::config(format!("invalid configuration: {}", listed)));
        }

        manager.get_config().await
    }

    async fn prepare(cli: &Cli) -> Result<(AppConfig, LoggingManager)> {
        let mut config = load_config(cli).await?;

        if cli.debug {
            config.logging.level = "debug".to_string();
        } else if cli.verbose {
            config.logging.level = "info".to_string();
        }

        let mut logging = LoggingManager::new(config.logging.clone());
        logging.initialize().await?;

        tracing::info!(
            version = ups_calc::VERSION,
            api = %config.api.base_url,
            "configuration loaded"
        );
        Ok((config, logging))
    }

    async fn print_catalog(config: AppConfig, query: &str) -> Result<()> {
        let core = ApplicationCore::new(config)?;
        let components = core.stores().catalog.fetch_components(query).await?;

        if components.is_empty() {
            println!("no components match '{}'", query);
            return Ok(());
        }

        for component in components {
            println!(
                "{:>5}  {:<40} {:>8.2} kW  x{:.2}",
                component.id, component.title, component.power, component.coeff
            );
        }
        Ok(())
    }

    fn print_bid_table(bids: &[Bid]) {
        if bids.is_empty() {
            println!("no bids");
            return;
        }
        for bid in bids {
            let updated = bid
                .updated_at()
                .map(|d| Time::format_date(&d))
                .unwrap_or_else(|| "-".to_string());
            let power = bid
                .calculated_power_count
                .map(|p| format!("{:.2} kW", p))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:>5}  {:<14} {:<20} {:>10}  {}",
                bid.id,
                bid.status.as_str(),
                bid.creator_login,
                updated,
                power
            );
        }
    }

    /// Prints the listing once, or keeps the background poller running and
    /// reprints on every interval with `watch`.
    async fn print_bids(config: AppConfig, query: BidQuery, watch: bool) -> Result<()> {
        let mut core = ApplicationCore::new(config)?;
        core.initialize().await?;

        if !core.stores().session.is_authenticated().await {
            core.shutdown().await?;
            return Err(Error::not_authenticated());
        }

        if !watch {
            let bids = core.stores().bids.fetch_bids(&query).await;
            core.shutdown().await?;
            print_bid_table(&bids?);
            return Ok(());
        }

        let stores = core.stores();
        core.start_bid_polling(query);
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = tokio::time::sleep(stores.poll_interval()) => {
                    let state = stores.bids.snapshot().await;
                    println!("--- {}", Time::now().format("%H:%M:%S"));
                    match state.error {
                        Some(error) => eprintln!("{}", error),
                        None => print_bid_table(&state.items),
                    }
                }
            }
        }

        core.shutdown().await
    }

    #[cfg(feature = "desktop")]
    fn launch(config: AppConfig) -> Result<()> {
        use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

        let title = config.app.name.clone();
        let core = ApplicationCore::new(config)?;

        let window = Config::new().with_window(
            WindowBuilder::new()
                .with_title(title)
                .with_resizable(true)
                .with_inner_size(LogicalSize::new(1200.0, 800.0)),
        );

        dioxus::LaunchBuilder::desktop()
            .with_cfg(window)
            .with_context(core.stores())
            .launch(ups_calc::ui::App);
        Ok(())
    }

    #[cfg(not(feature = "desktop"))]
    fn launch(_config: AppConfig) -> Result<()> {
        Err(Error::platform(
            "native",
            "ui",
            "built without the `desktop` feature; rebuild with --features desktop",
        ))
    }
}
