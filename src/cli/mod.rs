use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{DayReport, RewardsService};
use crate::config::Config;
use crate::domain::{Catalog, DaySummary, format_cents};
use crate::io::{Exporter, ImportResult, Importer, read_catalog_csv};

/// Fidelis - store rewards ledger
#[derive(Parser)]
#[command(name = "fidelis")]
#[command(about = "Tally daily item sales and customer loyalty points from store purchase logs")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./fidelis.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file path (overrides the config file)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    Balances,
    Items,
    Errors,
    Full,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Replay a business day's purchase log into the ledger
    Process {
        /// Log file ("-" for stdin)
        log: String,

        /// Business date of the log (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Log format (defaults to the file extension, json otherwise)
        #[arg(short, long, value_enum)]
        format: Option<LogFormat>,

        /// Catalog CSV (id,price) used to price items given by id
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Process the date even if it was already processed
        #[arg(long)]
        force: bool,

        /// Show the outcome without saving anything
        #[arg(long)]
        dry_run: bool,

        /// Refuse to process the day if any record cannot be read
        #[arg(long)]
        strict: bool,
    },

    /// Show point balance for a customer or all customers
    Balance {
        /// Customer ID (omit for all customers)
        customer: Option<String>,
    },

    /// Show units sold for an item or all items
    Items {
        /// Item ID (omit for all items)
        item: Option<String>,
    },

    /// List log entries that were rejected for missing purchased items
    Errors,

    /// List processed business days
    Days,

    /// Show what happened on a processed business day
    #[command(name = "show-day")]
    ShowDay {
        /// Business date (YYYY-MM-DD)
        date: String,
    },

    /// Export ledger data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::resolve(self.config.as_deref())?;
        let database = self.database.clone().unwrap_or(config.database.clone());

        match self.command {
            Commands::Init => {
                RewardsService::init(&database).await?;
                println!("Database initialized: {}", database);
            }
            command => {
                let service = RewardsService::connect(&database)
                    .await?
                    .with_policy(config.rewards)?;
                run_command(&service, command).await?;
            }
        }

        Ok(())
    }
}

async fn run_command(service: &RewardsService, command: Commands) -> Result<()> {
    match command {
        Commands::Init => bail!("init creates the database; it cannot run against an open one"),

        Commands::Process {
            log,
            date,
            format,
            catalog,
            force,
            dry_run,
            strict,
        } => {
            let business_date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Local::now().date_naive(),
            };
            let catalog = match catalog {
                Some(path) => load_catalog(&path)?,
                None => Catalog::new(),
            };
            let format = format.unwrap_or_else(|| detect_format(&log));

            let imported = import_log(&log, format, &catalog)?;
            report_import_errors(&imported);
            if strict && !imported.errors.is_empty() {
                bail!(
                    "{} unreadable record(s) in {}; nothing was processed",
                    imported.errors.len(),
                    log
                );
            }

            if dry_run {
                let summary = service.preview_day(&imported.entries).await?;
                println!("Dry run for {} (nothing saved)", business_date);
                if service.is_day_processed(business_date).await? {
                    println!(
                        "Note: {} was already processed; totals below include it twice{}",
                        business_date,
                        if force { "" } else { " and a real run needs --force" }
                    );
                }
                print_summary(&summary);
            } else {
                let report = service
                    .process_day(business_date, &imported.entries, force)
                    .await?;
                print_day_report(service, &report).await?;
            }
        }

        Commands::Balance { customer } => run_balance_command(service, customer).await?,

        Commands::Items { item } => run_items_command(service, item).await?,

        Commands::Errors => {
            let error_log = service.error_log().await?;
            if error_log.is_empty() {
                println!("Error log is empty.");
            } else {
                println!("{:<5} {:<20} {:>8}", "#", "CUSTOMER", "POINTS");
                println!("{}", "-".repeat(35));
                for (index, entry) in error_log.iter().enumerate() {
                    println!(
                        "{:<5} {:<20} {:>8}",
                        index + 1,
                        entry.customer_id.as_deref().unwrap_or("-"),
                        entry
                            .points_redeemed
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Days => {
            let days = service.list_days().await?;
            if days.is_empty() {
                println!("No days processed yet.");
            } else {
                println!(
                    "{:<12} {:>8} {:>9} {:>9} {:>8}  {}",
                    "DATE", "ENTRIES", "REJECTED", "REDEEMED", "AWARDED", "PROCESSED AT"
                );
                println!("{}", "-".repeat(80));
                for day in days {
                    println!(
                        "{:<12} {:>8} {:>9} {:>9} {:>8}  {}",
                        day.business_date.to_string(),
                        day.entries_processed,
                        day.entries_rejected,
                        day.total_redeemed,
                        day.total_awarded,
                        day.processed_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }

        Commands::ShowDay { date } => {
            let report = service.get_day(parse_date(&date)?).await?;
            print_day_report(service, &report).await?;
        }

        Commands::Export {
            export_type,
            output,
        } => run_export_command(service, export_type, output.as_deref()).await?,
    }

    Ok(())
}

async fn run_balance_command(service: &RewardsService, customer: Option<String>) -> Result<()> {
    match customer {
        Some(customer_id) => {
            let balance = service.point_balance(&customer_id).await?;
            println!("{}: {} points", customer_id, balance);
        }
        None => {
            let balances = service.all_point_balances().await?;
            if balances.is_empty() {
                println!("No customers yet.");
                return Ok(());
            }
            println!("{:<20} {:>10}", "CUSTOMER", "POINTS");
            println!("{}", "-".repeat(31));
            for entry in balances {
                println!("{:<20} {:>10}", truncate(&entry.customer_id, 20), entry.balance);
            }
        }
    }
    Ok(())
}

async fn run_items_command(service: &RewardsService, item: Option<String>) -> Result<()> {
    match item {
        Some(item_id) => {
            let units = service.item_sale_count(&item_id).await?;
            println!("{}: {} sold", item_id, units);
        }
        None => {
            let items = service.all_item_sale_counts().await?;
            if items.is_empty() {
                println!("No items sold yet.");
                return Ok(());
            }
            println!("{:<20} {:>10}", "ITEM", "SOLD");
            println!("{}", "-".repeat(31));
            for entry in items {
                println!("{:<20} {:>10}", truncate(&entry.item_id, 20), entry.units_sold);
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &RewardsService,
    export_type: ExportType,
    output: Option<&str>,
) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        ),
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match export_type {
        ExportType::Balances => exporter.export_balances_csv(writer).await?,
        ExportType::Items => exporter.export_items_csv(writer).await?,
        ExportType::Errors => exporter.export_errors_json(writer).await?,
        ExportType::Full => {
            let snapshot = exporter.export_full_json(writer).await?;
            snapshot.point_balances.len() + snapshot.item_sales.len() + snapshot.days.len()
        }
    };

    if let Some(path) = output {
        println!("Exported {} record(s) to {}", count, path);
    }
    Ok(())
}

fn import_log(log: &str, format: LogFormat, catalog: &Catalog) -> Result<ImportResult> {
    let reader: Box<dyn Read> = if log == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(log).with_context(|| format!("Failed to open log {}", log))?)
    };

    let importer = Importer::new(catalog);
    match format {
        LogFormat::Json => importer.import_log_json(reader),
        LogFormat::Csv => importer.import_log_csv(reader),
    }
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog {}", path.display()))?;
    read_catalog_csv(file)
}

fn detect_format(log: &str) -> LogFormat {
    match Path::new(log).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => LogFormat::Csv,
        _ => LogFormat::Json,
    }
}

fn report_import_errors(result: &ImportResult) {
    if result.errors.is_empty() {
        return;
    }
    eprintln!("Skipped {} unreadable record(s):", result.errors.len());
    for error in &result.errors {
        eprintln!("  {}", error);
    }
}

async fn print_day_report(service: &RewardsService, report: &DayReport) -> Result<()> {
    let run = &report.run;
    println!(
        "Business day {}: {} entries, {} sent to error log",
        run.business_date, run.entries_processed, run.entries_rejected
    );
    println!(
        "  Net spend: {}  Redeemed: {} pts  Awarded: {} pts",
        format_cents(report.total_net_spend()),
        run.total_redeemed,
        run.total_awarded
    );

    if report.customers.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "{:<20} {:>12} {:>9} {:>8} {:>9}",
        "CUSTOMER", "NET SPEND", "REDEEMED", "AWARDED", "BALANCE"
    );
    println!("{}", "-".repeat(62));
    for customer in &report.customers {
        let balance = service.point_balance(&customer.customer_id).await?;
        println!(
            "{:<20} {:>12} {:>9} {:>8} {:>9}",
            truncate(&customer.customer_id, 20),
            format_cents(customer.net_spend),
            customer.points_redeemed,
            customer.points_awarded,
            balance
        );
    }
    Ok(())
}

fn print_summary(summary: &DaySummary) {
    println!(
        "  {} entries, {} would go to the error log",
        summary.entries_processed, summary.entries_rejected
    );

    if !summary.customer_spend.is_empty() {
        println!();
        println!(
            "{:<20} {:>12} {:>9} {:>8}",
            "CUSTOMER", "NET SPEND", "REDEEMED", "AWARDED"
        );
        println!("{}", "-".repeat(52));
        for (customer_id, spend) in &summary.customer_spend {
            println!(
                "{:<20} {:>12} {:>9} {:>8}",
                truncate(customer_id, 20),
                format_cents(*spend),
                summary.points_redeemed.get(customer_id).copied().unwrap_or(0),
                summary.points_awarded.get(customer_id).copied().unwrap_or(0)
            );
        }
    }

    println!();
    println!("{:<20} {:>10}", "ITEM", "SOLD (TOTAL)");
    println!("{}", "-".repeat(33));
    for (item_id, units) in &summary.item_sale_counts {
        println!("{:<20} {:>10}", truncate(item_id, 20), units);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}
