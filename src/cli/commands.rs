//! Command implementations for the hearth CLI.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::cli::args::{Command, FilterArgs, HearthArgs, SearchArgs};
use crate::cli::output::Printer;
use crate::config::HearthConfig;
use crate::document::load_records;
use crate::error::{HearthError, Result};
use crate::gateway::{AutocompleteRequest, FilterQuery, SearchGateway, SearchRequest, SpellcheckRequest};
use crate::indexer::{InMemorySource, ReindexReport};
use crate::query::FilterRequest;

/// Execute a CLI command, writing results to stdout.
pub fn execute_command(args: &HearthArgs) -> Result<()> {
    let gateway = open_gateway(args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&gateway, args, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Build a gateway from `--config` and index the `--data` file, if given.
pub fn open_gateway(args: &HearthArgs) -> Result<SearchGateway> {
    let config = match &args.config {
        Some(path) => HearthConfig::from_json_file(path)?,
        None => HearthConfig::default(),
    };
    let gateway = SearchGateway::new(config)?;
    if let Some(path) = &args.data {
        load_data(&gateway, path)?;
    }
    Ok(gateway)
}

/// Index every record of a JSONL file. Records that are not published and
/// active are skipped.
pub fn load_data(gateway: &SearchGateway, path: &Path) -> Result<ReindexReport> {
    let records = load_records(path)?;
    let total = records.len();
    let source = InMemorySource::from_records(records);
    let report = gateway
        .indexer()
        .reindex_all(&source, &AtomicBool::new(false))?;
    info!(
        path = %path.display(),
        records = total,
        indexed = report.indexed,
        "loaded apartment records"
    );
    Ok(report)
}

/// Run the command against `gateway`.
pub fn run<W: Write>(gateway: &SearchGateway, args: &HearthArgs, out: &mut W) -> Result<()> {
    let printer = Printer::from_args(args);
    match &args.command {
        Command::Search(search) => {
            let page = gateway.search(&search_request(search)?)?;
            printer.page(out, &page)
        }
        Command::Filter(filter) => {
            let page = gateway.filter(&filter_query(filter)?)?;
            printer.page(out, &page)
        }
        Command::Autocomplete(autocomplete) => {
            let request = AutocompleteRequest::new(&autocomplete.prefix)
                .with_field(autocomplete.field)
                .with_limit(autocomplete.limit);
            if autocomplete.grouped {
                printer.grouped(out, &gateway.autocomplete_grouped(&request)?)
            } else {
                printer.suggestions(out, &gateway.autocomplete(&request)?)
            }
        }
        Command::Spellcheck(spellcheck) => {
            let suggestions = gateway.spellcheck(&SpellcheckRequest::new(&spellcheck.query))?;
            printer.suggestions(out, &suggestions)
        }
        Command::Stats => printer.stats(out, &gateway.stats()?),
    }
}

fn search_request(args: &SearchArgs) -> Result<SearchRequest> {
    let mut request = SearchRequest::browse()
        .with_page(args.page.skip, args.page.limit)
        .with_sort(args.sort_by)
        .with_fuzziness(args.fuzziness)
        .with_featured_first(!args.page.no_featured_first);
    request.query = args.query.clone();
    if let Some(filter) = &args.filter {
        request = request.with_filters(read_filter(filter)?);
    }
    Ok(request)
}

fn filter_query(args: &FilterArgs) -> Result<FilterQuery> {
    Ok(FilterQuery::new(read_filter(&args.filter)?)
        .with_page(args.page.skip, args.page.limit)
        .with_sort(args.sort_by)
        .with_featured_first(!args.page.no_featured_first))
}

/// Parse a filter given inline or as `@path`.
pub fn read_filter(arg: &str) -> Result<FilterRequest> {
    let json = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| HearthError::invalid_input(format!("filter is not valid JSON: {e}")))?;
    FilterRequest::from_json(&value)
}
