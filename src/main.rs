//! occupancy-report CLI.
//!
//! Usage:
//!   occupancy-report summary [filters]
//!   occupancy-report report [filters] [--export-dir <dir>]
//!   occupancy-report export [filters] [--dir <dir>]
//!   occupancy-report interactive [filters]
//!
//! Examples:
//!   occupancy-report summary --hotel "City Hotel" --year 2017 --agg median
//!   occupancy-report report --from 2016-12-01 --to 2016-12-31 --export-dir out
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use occupancy_report::aggregate::AggFunc;
use occupancy_report::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use occupancy_report::error::ReportError;
use occupancy_report::filter::{DateRange, FilterSpec, FilteredView, HotelSelection};
use occupancy_report::insight::Insights;
use occupancy_report::loader::{Dataset, DatasetCache};
use occupancy_report::metrics::{OccupancyMetrics, ViewInfo};
use occupancy_report::output;
use occupancy_report::pipeline::{self, QueryConfig, QueryOutcome, Report};
use occupancy_report::types::BookingRecord;
use occupancy_report::util::{format_int, format_number};

#[derive(Parser)]
#[command(name = "occupancy-report")]
#[command(about = "Holiday and event occupancy reports for a hotel booking dataset")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline metrics and insights
    Summary {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print every aggregation and drill-down table
    Report {
        #[command(flatten)]
        query: QueryArgs,

        /// Also write CSV/JSON artefacts into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Rows shown per preview table
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Write the filtered bookings and the event list as CSV
    Export {
        #[command(flatten)]
        query: QueryArgs,

        /// Output directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Menu-driven session that keeps the dataset loaded
    Interactive {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct QueryArgs {
    /// Path to the booking CSV
    #[arg(long)]
    data: Option<PathBuf>,

    /// Hotel to keep. "all" in any case selects every hotel, so a hotel
    /// literally named "All" cannot be picked on its own
    #[arg(long)]
    hotel: Option<String>,

    /// Arrival years to keep (repeatable or comma separated)
    #[arg(long = "year", value_delimiter = ',')]
    years: Vec<i32>,

    /// Months to keep, 1-12
    #[arg(long = "month", value_delimiter = ',', value_parser = clap::value_parser!(u32).range(1..=12))]
    months: Vec<u32>,

    /// Seasons to keep
    #[arg(long = "season", value_delimiter = ',')]
    seasons: Vec<String>,

    /// First arrival date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last arrival date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Only holiday rows
    #[arg(long)]
    holidays_only: bool,

    /// Only event-day rows
    #[arg(long)]
    events_only: bool,

    /// Keep canceled bookings in the display population
    #[arg(long)]
    include_canceled: bool,

    /// Aggregation applied to every grouping
    #[arg(long, value_enum)]
    agg: Option<AggFunc>,

    /// Size of the top holiday/event tables
    #[arg(long)]
    top: Option<usize>,
}

impl QueryArgs {
    fn data_path(&self, config: &Config) -> PathBuf {
        self.data.clone().unwrap_or_else(|| config.data.path.clone())
    }

    /// Omitted multi-selects stay unconstrained. A lone `--from`/`--to` is
    /// completed with the dataset's date bounds.
    fn to_query(&self, config: &Config, dataset: &Dataset) -> QueryConfig {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => dataset.date_bounds().map(|(min, max)| DateRange {
                start: from.unwrap_or(min),
                end: to.unwrap_or(max),
            }),
        };
        let filters = FilterSpec {
            hotel: self
                .hotel
                .as_deref()
                .map(HotelSelection::parse)
                .unwrap_or_default(),
            years: (!self.years.is_empty()).then(|| self.years.iter().copied().collect()),
            date_range,
            months: (!self.months.is_empty()).then(|| self.months.iter().copied().collect()),
            seasons: (!self.seasons.is_empty()).then(|| self.seasons.iter().cloned().collect()),
            holidays_only: self.holidays_only,
            events_only: self.events_only,
            exclude_canceled: config.report.exclude_canceled && !self.include_canceled,
        };
        QueryConfig {
            filters,
            agg: self.agg.unwrap_or(config.report.aggregation),
            top_n: self.top.unwrap_or(config.report.top_n),
        }
    }
}

#[derive(Tabled)]
struct MetricLine {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Note")]
    note: String,
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    aggregation: AggFunc,
    info: &'a ViewInfo,
    metrics: &'a OccupancyMetrics,
    insights: &'a Insights,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<ReportError>() {
        Some(ReportError::SourceNotFound { path }) => {
            eprintln!("Error: source file not found.");
            eprintln!("Expected location: {}", path.display());
        }
        _ => {
            eprintln!("Error: {err:#}");
            eprintln!("Please check the data and the CSV column format.");
        }
    }
}

fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_overview(report: &Report) {
    let m = &report.metrics;
    let info = &report.info;
    println!("Dataset info");
    println!("- Total bookings: {}", format_int(m.total_bookings));
    println!(
        "- Period: {} - {}",
        format_date(info.first_date),
        format_date(info.last_date)
    );
    println!("- Hotels: {}\n", info.hotels);

    println!("Key metrics ({} occupancy)\n", report.agg);
    let lines = vec![
        MetricLine {
            metric: "Total Bookings",
            value: format_int(m.total_bookings),
            note: format!("{:.1}% of total", m.share_of_total),
        },
        MetricLine {
            metric: "Holiday Occupancy",
            value: format!("{}%", format_number(m.occupancy_holiday, 2)),
            note: format!("{:+.1}% vs regular", m.diff_holiday),
        },
        MetricLine {
            metric: "Event Occupancy",
            value: format!("{}%", format_number(m.occupancy_event, 2)),
            note: format!("{:+.1}% vs non-event", m.diff_event),
        },
        MetricLine {
            metric: "Average ADR",
            value: format!("${}", format_number(m.avg_rate, 2)),
            note: format!("Cancel: {:.1}%", m.cancellation_rate),
        },
    ];
    println!("{}\n", Table::new(lines).with(Style::markdown()));

    println!("Insights");
    println!("- Holidays: {}", report.insights.holiday);
    println!("- Events: {}", report.insights.event);
    println!("- Cancellations: {}\n", report.insights.cancellation);
}

fn print_details(view: &FilteredView<'_>, report: &Report, rows: usize) {
    let agg = report.agg;
    let preview: Vec<BookingRecord> = view.records().take(rows).cloned().collect();
    output::preview_table(
        &format!("Preview Data (first {} rows)", preview.len()),
        Some(&format!("{} rows after filtering", format_int(view.len()))),
        &preview,
        rows,
    );
    output::preview_table(
        &format!("Daily Occupancy Trend ({agg})"),
        Some("first rows, ascending by date"),
        &report.daily,
        rows,
    );
    output::preview_table(
        &format!("Monthly Occupancy ({agg})"),
        None,
        &report.monthly,
        usize::MAX,
    );
    output::preview_table(
        &format!("Occupancy per Season ({agg})"),
        None,
        &report.seasonal,
        usize::MAX,
    );
    output::preview_table(
        &format!("Holiday vs Regular Day ({agg})"),
        None,
        &report.holiday_comparison,
        usize::MAX,
    );
    output::preview_table(
        &format!("Event vs Non-Event ({agg})"),
        None,
        &report.event_comparison,
        usize::MAX,
    );
    output::preview_table(
        "Occupancy Distribution",
        None,
        &report.distribution,
        usize::MAX,
    );
    println!("Occupancy Heatmap ({agg}) by Day of Month and Month\n");
    output::preview_heatmap(&report.heatmap);
    output::preview_table(
        &format!("Occupancy per Day of Week ({agg})"),
        None,
        &report.weekday,
        usize::MAX,
    );
    output::preview_table(
        &format!("Top {} Holidays by Occupancy", report.top_holidays.len()),
        None,
        &report.top_holidays,
        usize::MAX,
    );
    output::preview_table(
        &format!("Top {} Event Days by Occupancy", report.top_events.len()),
        None,
        &report.top_events,
        usize::MAX,
    );

    let summary = &report.event_summary;
    if summary.rows.is_empty() {
        println!("No events or holidays in the filtered data.\n");
    } else {
        output::preview_table(
            "Events & Holidays",
            Some("newest first"),
            &summary.rows,
            rows,
        );
        println!(
            "Total entries: {} | Holidays: {} | Special events: {}\n",
            format_int(summary.total),
            format_int(summary.holidays),
            format_int(summary.events)
        );
    }
}

fn export_all(dir: &Path, view: &FilteredView<'_>, report: &Report, full: bool) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let data_file = output::timestamped_path(dir, "hotel_data_filtered", "csv");
    output::export_filtered(&data_file, view)?;
    println!("Filtered bookings exported to {}", data_file.display());

    if !report.event_summary.rows.is_empty() {
        let events_file = output::timestamped_path(dir, "event_list", "csv");
        output::export_event_summary(&events_file, &report.event_summary)?;
        println!("Event list exported to {}", events_file.display());
    }

    if full {
        let heatmap_file = dir.join("heatmap.csv");
        output::write_heatmap_csv(&heatmap_file, &report.heatmap)?;
        output::write_csv(&dir.join("daily.csv"), &report.daily)?;
        output::write_csv(&dir.join("monthly.csv"), &report.monthly)?;
        output::write_csv(&dir.join("weekday.csv"), &report.weekday)?;
        let summary = SummaryFile {
            aggregation: report.agg,
            info: &report.info,
            metrics: &report.metrics,
            insights: &report.insights,
        };
        let summary_file = dir.join("summary.json");
        output::write_json(&summary_file, &summary)?;
        println!("Aggregations and summary saved to {}", dir.display());
    }
    println!();
    Ok(())
}

/// Filter values available in the loaded data.
fn print_dimensions(dataset: &Dataset) {
    let join = |v: Vec<String>| v.join(", ");
    println!("Hotels: {}", join(dataset.hotels()));
    println!(
        "Years: {}",
        join(dataset.years().iter().map(i32::to_string).collect())
    );
    println!(
        "Months: {}",
        join(dataset.months().iter().map(u32::to_string).collect())
    );
    println!("Seasons: {}", join(dataset.seasons()));
    if let Some((min, max)) = dataset.date_bounds() {
        println!("Dates: {} to {}", min, max);
    }
    println!();
}

fn print_no_data() {
    println!("No data matches the selected filters.");
    println!("Adjust the hotel, date or category filters and try again.\n");
}

fn run_query(
    dataset: &Dataset,
    config: &Config,
    query: &QueryArgs,
    rows: usize,
    detailed: bool,
    export_dir: Option<&Path>,
) -> Result<()> {
    let query = query.to_query(config, dataset);
    match pipeline::run(dataset, &query) {
        QueryOutcome::NoData => print_no_data(),
        QueryOutcome::Report { view, report } => {
            print_overview(&report);
            if detailed {
                print_details(&view, &report, rows);
            }
            if let Some(dir) = export_dir {
                export_all(dir, &view, &report, detailed)?;
            }
        }
    }
    Ok(())
}

/// Read a single line of input after printing the common prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

struct Session {
    config: Config,
    query: QueryArgs,
    cache: DatasetCache,
    dataset: Option<Arc<Dataset>>,
}

impl Session {
    /// Option [1]: load the CSV, reusing the cached copy while the file is
    /// unchanged.
    fn handle_load(&mut self) {
        let path = self.query.data_path(&self.config);
        match self.cache.get_or_load(&path) {
            Ok(loaded) if loaded.hit => {
                println!("Dataset unchanged, reusing the loaded data.\n");
                self.dataset = Some(loaded.dataset);
            }
            Ok(loaded) => {
                println!(
                    "Processing dataset... ({} rows loaded)",
                    format_int(loaded.report.total_rows)
                );
                if loaded.report.name_synthesized {
                    println!("Note: no Name column, every row marked as \"No Event\".");
                } else if loaded.report.events_filled > 0 {
                    println!(
                        "Note: {} rows without an event name.",
                        format_int(loaded.report.events_filled)
                    );
                }
                print_dimensions(&loaded.dataset);
                self.dataset = Some(loaded.dataset);
            }
            Err(e) => {
                self.cache.invalidate();
                self.dataset = None;
                report_failure(&e.into());
                println!();
            }
        }
    }

    fn loaded(&self) -> Option<&Dataset> {
        let dataset = self.dataset.as_deref();
        if dataset.is_none() {
            println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        }
        dataset
    }

    /// Option [2]: run the full report on the loaded data.
    fn handle_generate_reports(&self) {
        let Some(dataset) = self.loaded() else {
            return;
        };
        println!("Generating report...\n");
        if let Err(e) = run_query(
            dataset,
            &self.config,
            &self.query,
            self.config.report.preview_rows,
            true,
            None,
        ) {
            report_failure(&e);
        }
    }

    /// Option [3]: write the filtered data, event list and aggregations to
    /// the configured export directory.
    fn handle_export(&self) {
        let Some(dataset) = self.loaded() else {
            return;
        };
        let query = self.query.to_query(&self.config, dataset);
        match pipeline::run(dataset, &query) {
            QueryOutcome::NoData => print_no_data(),
            QueryOutcome::Report { view, report } => {
                if let Err(e) = export_all(&self.config.export.dir, &view, &report, true) {
                    report_failure(&e);
                }
            }
        }
    }

    fn run(mut self) {
        loop {
            println!("Hotel Occupancy Report");
            println!("[1] Load the file");
            println!("[2] Generate Report");
            println!("[3] Export Data\n");
            match read_choice().as_str() {
                "1" => self.handle_load(),
                choice @ ("2" | "3") => {
                    println!();
                    if choice == "2" {
                        self.handle_generate_reports();
                    } else {
                        self.handle_export();
                    }
                    if !prompt_back_to_menu() {
                        println!("Exiting the program.");
                        break;
                    }
                }
                "" => break,
                _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
            }
        }
    }
}

fn load(config: &Config, query: &QueryArgs) -> Result<Dataset> {
    let path = query.data_path(config);
    let (dataset, _) = occupancy_report::loader::load_dataset(&path)?;
    Ok(dataset)
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path)?;

    match cli.command {
        Commands::Summary { query } => {
            let dataset = load(&config, &query)?;
            run_query(&dataset, &config, &query, 0, false, None)
        }
        Commands::Report {
            query,
            export_dir,
            rows,
        } => {
            let dataset = load(&config, &query)?;
            let rows = rows.unwrap_or(config.report.preview_rows);
            run_query(&dataset, &config, &query, rows, true, export_dir.as_deref())
        }
        Commands::Export { query, dir } => {
            let dataset = load(&config, &query)?;
            let dir = dir.unwrap_or_else(|| config.export.dir.clone());
            let spec = query.to_query(&config, &dataset);
            match pipeline::run(&dataset, &spec) {
                QueryOutcome::NoData => print_no_data(),
                QueryOutcome::Report { view, report } => {
                    export_all(&dir, &view, &report, false)?;
                }
            }
            Ok(())
        }
        Commands::Interactive { query } => {
            Session {
                config,
                query,
                cache: DatasetCache::new(),
                dataset: None,
            }
            .run();
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use occupancy_report::types::NO_EVENT;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dataset() -> Dataset {
        let rec = |day: &str| {
            let arrival_date = date(day);
            BookingRecord {
                hotel: "City Hotel".to_string(),
                arrival_date,
                year: chrono::Datelike::year(&arrival_date),
                month: chrono::Datelike::month(&arrival_date),
                season: "Winter".to_string(),
                occupancy_per_hari: 50.0,
                is_holiday: false,
                is_event_day: false,
                is_canceled: false,
                adr: 100.0,
                total_tamu: 2,
                name: NO_EVENT.to_string(),
            }
        };
        Dataset::new(vec![rec("2016-12-20"), rec("2017-01-03"), rec("2016-11-05")])
    }

    fn parse_query(args: &[&str]) -> QueryArgs {
        let argv = ["occupancy-report", "summary"].iter().chain(args).copied();
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Summary { query } => query,
            _ => panic!("expected the summary command"),
        }
    }

    #[test]
    fn lone_from_is_completed_with_last_date() {
        let query = parse_query(&["--from", "2016-12-01"]);
        let spec = query.to_query(&Config::default(), &dataset());
        assert_eq!(
            spec.filters.date_range,
            Some(DateRange {
                start: date("2016-12-01"),
                end: date("2017-01-03"),
            })
        );
    }

    #[test]
    fn lone_to_is_completed_with_first_date() {
        let query = parse_query(&["--to", "2016-12-31"]);
        let spec = query.to_query(&Config::default(), &dataset());
        assert_eq!(
            spec.filters.date_range,
            Some(DateRange {
                start: date("2016-11-05"),
                end: date("2016-12-31"),
            })
        );
    }

    #[test]
    fn omitted_multi_selects_stay_unconstrained() {
        let spec = parse_query(&[]).to_query(&Config::default(), &dataset());
        assert_eq!(spec.filters.years, None);
        assert_eq!(spec.filters.months, None);
        assert_eq!(spec.filters.seasons, None);
        assert_eq!(spec.filters.date_range, None);
        assert_eq!(spec.filters.hotel, HotelSelection::All);
    }

    #[test]
    fn given_multi_selects_become_sets() {
        let query = parse_query(&[
            "--year", "2016,2017", "--month", "12", "--month", "1", "--season", "Winter",
        ]);
        let spec = query.to_query(&Config::default(), &dataset());
        assert_eq!(spec.filters.years, Some(BTreeSet::from([2016, 2017])));
        assert_eq!(spec.filters.months, Some(BTreeSet::from([1, 12])));
        assert_eq!(
            spec.filters.seasons,
            Some(BTreeSet::from(["Winter".to_string()]))
        );
    }

    #[test]
    fn month_outside_calendar_is_rejected() {
        assert!(Cli::try_parse_from(["occupancy-report", "summary", "--month", "13"]).is_err());
    }

    #[test]
    fn include_canceled_overrides_config() {
        let mut config = Config::default();
        assert!(config.report.exclude_canceled);

        let spec = parse_query(&[]).to_query(&config, &dataset());
        assert!(spec.filters.exclude_canceled);

        let spec = parse_query(&["--include-canceled"]).to_query(&config, &dataset());
        assert!(!spec.filters.exclude_canceled);

        config.report.exclude_canceled = false;
        let spec = parse_query(&[]).to_query(&config, &dataset());
        assert!(!spec.filters.exclude_canceled);
    }

    #[test]
    fn hotel_named_all_selects_every_hotel() {
        let config = Config::default();
        let spec = parse_query(&["--hotel", "All"]).to_query(&config, &dataset());
        assert_eq!(spec.filters.hotel, HotelSelection::All);
        let spec = parse_query(&["--hotel", "City Hotel"]).to_query(&config, &dataset());
        assert_eq!(
            spec.filters.hotel,
            HotelSelection::Named("City Hotel".to_string())
        );
    }

    #[test]
    fn export_writes_only_into_requested_dir() {
        let ds = dataset();
        let query = parse_query(&[]).to_query(&Config::default(), &ds);
        let QueryOutcome::Report { view, report } = pipeline::run(&ds, &query) else {
            panic!("expected a report");
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        export_all(&out, &view, &report, true).unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        // No event rows, so no event list.
        assert_eq!(names.len(), 6);
        assert!(names[2].starts_with("hotel_data_filtered_"));
        names.remove(2);
        assert_eq!(
            names,
            ["daily.csv", "heatmap.csv", "monthly.csv", "summary.json", "weekday.csv"]
        );
    }

    #[test]
    fn flags_fall_back_to_config() {
        let mut config = Config::default();
        config.report.aggregation = AggFunc::Median;
        config.report.top_n = 3;

        let spec = parse_query(&[]).to_query(&config, &dataset());
        assert_eq!(spec.agg, AggFunc::Median);
        assert_eq!(spec.top_n, 3);

        let spec = parse_query(&["--agg", "sum", "--top", "7"]).to_query(&config, &dataset());
        assert_eq!(spec.agg, AggFunc::Sum);
        assert_eq!(spec.top_n, 7);
    }
}
