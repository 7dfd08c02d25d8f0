//! Querygate CLI
//!
//! Developer tooling around contract definition files:
//! - Checking a definition (`check`)
//! - Normalizing a query string against it (`normalize`)
//! - Listing the toggle links of a filter (`links`)

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use querygate_core::{
    filter_links, normalize, page_link, sort_link, ContractDefinition, FilterValue, InputContract,
    NormalizedQuery, RawInput,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "querygate")]
#[command(author, version, about = "Querygate: typed query input for listing pages")]
struct Cli {
    /// Log contract and normalization decisions to stderr (`RUST_LOG` wins when set).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a contract definition file (JSON).
    Check {
        /// Contract definition
        contract: PathBuf,
    },

    /// Normalize a query string against a contract.
    Normalize {
        /// Contract definition
        contract: PathBuf,
        /// Query string, with or without the leading `?`
        #[arg(short, long, default_value = "")]
        query: String,
        /// Route name recorded on the query
        #[arg(short, long, default_value = "listing")]
        route: String,
        /// Print the normalized query as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print toggle links for one filter, plus sort and paging links.
    Links {
        /// Contract definition
        contract: PathBuf,
        /// Filter to list values for
        #[arg(short, long)]
        filter: String,
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value = "listing")]
        route: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { contract } => cmd_check(&contract),
        Commands::Normalize {
            contract,
            query,
            route,
            json,
        } => cmd_normalize(&contract, &query, &route, json),
        Commands::Links {
            contract,
            filter,
            query,
            route,
        } => cmd_links(&contract, &filter, &query, &route),
    }
}

fn load_contract(path: &Path) -> Result<InputContract> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read contract `{}`", path.display()))?;
    let definition: ContractDefinition = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse contract `{}`", path.display()))?;
    let contract = InputContract::from_definition(definition)
        .with_context(|| format!("invalid contract `{}`", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded contract definition");
    Ok(contract)
}

fn cmd_check(path: &Path) -> Result<()> {
    println!("{} {}", "Checking".green().bold(), path.display());
    let contract = load_contract(path)?;

    println!("  Filters: {}", contract.filters().len());
    for filter in contract.filters() {
        let values = filter
            .allowed_values()
            .map(|values| values.join(", "))
            .unwrap_or_else(|| "any".to_string());
        println!(
            "    {} ({}){}: {}",
            filter.name.yellow(),
            filter.title(),
            if filter.multiple { " [multiple]" } else { "" },
            values
        );
    }

    println!("  Sorts: {}", contract.sorts().len());
    for sort in contract.sorts() {
        println!("    {}", sort.name.yellow());
    }
    if let Some(field) = contract.default_sort_field() {
        println!(
            "  Default sort: {} {}",
            field.cyan(),
            contract.default_sort_order()
        );
    }

    for (field, values) in contract.base_query().iter() {
        println!("  Base query: {} = {}", field.cyan(), values.join("|"));
    }
    if contract.is_search_enabled() {
        println!(
            "  Search: `{}` ({}) -> {}",
            contract.search_param().cyan(),
            if contract.is_search_parsed() { "parsed" } else { "fulltext" },
            contract.search_target()
        );
    }

    println!("{}", "Valid.".green());
    Ok(())
}

fn cmd_normalize(path: &Path, query_string: &str, route: &str, json: bool) -> Result<()> {
    let contract = load_contract(path)?;
    let query = normalize(&contract, &RawInput::from_query_string(query_string), route);

    if json {
        println!("{}", serde_json::to_string_pretty(&query)?);
        return Ok(());
    }
    print_query(&query);
    Ok(())
}

fn print_query(query: &NormalizedQuery) {
    println!("{} {}", "Route".green().bold(), query.route_name());
    println!(
        "  Sort: {} {}",
        query.sort_field().unwrap_or("-").cyan(),
        query.sort_order()
    );
    println!(
        "  Page: {} (limit {}, offset {})",
        query.page(),
        query.limit(),
        query.offset()
    );
    if !query.raw_search_string().is_empty() {
        println!("  Search: {:?} -> {:?}", query.raw_search_string(), query.search_string());
    }
    if !query.current_display().is_empty() {
        println!("  Display: {}", query.current_display());
    }

    println!("  Filters:");
    for (field, value) in query.all() {
        let rendered = match value {
            FilterValue::Single(value) => format!("{value:?}"),
            FilterValue::Multiple(values) => format!("{values:?}"),
        };
        println!("    {} = {}", field.yellow(), rendered);
    }

    let shareable = querygate_core::encode_query_string(query.shareable_parameters());
    println!("  Link: ?{}", shareable.cyan());
}

fn cmd_links(path: &Path, filter: &str, query_string: &str, route: &str) -> Result<()> {
    let contract = load_contract(path)?;
    let descriptor = contract
        .filter(filter)
        .ok_or_else(|| anyhow!("unknown filter `{filter}`"))?;
    if !descriptor.is_choice_restricted() {
        return Err(anyhow!("filter `{filter}` accepts arbitrary values; no links to list"));
    }

    let query = normalize(&contract, &RawInput::from_query_string(query_string), route);

    println!("{} {}", "Filter".green().bold(), descriptor.title());
    for link in filter_links(&contract, &query, filter) {
        let marker = if link.active { "[x]" } else { "[ ]" };
        println!(
            "  {} {} ?{}",
            marker,
            link.label.yellow(),
            link.link.query_string()
        );
    }

    println!("{}", "Sort".green().bold());
    for sort in contract.sorts() {
        if let Some(link) = sort_link(&contract, &query, &sort.name) {
            println!("  {} ?{}", sort.name.yellow(), link.query_string());
        }
    }

    if let Some(next) = page_link(&contract, &query, query.page() + 1) {
        println!("{} ?{}", "Next page".green().bold(), next.query_string());
    }
    Ok(())
}
