//! `trafficlog` - CLI for recording and browsing traffic count surveys.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use trafficlog::cli::{
    Cli, Command, ConfigCommand, DeleteCommand, ListCommand, OutputFormat, RecordCommand,
    ShowCommand, SubmitCommand,
};
use trafficlog::filter::sort_newest_first;
use trafficlog::{init_logging, storage, Config, Dataset, DatasetPayload, TrafficLevel};
use trafficlog::{Stats, TrafficService};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Record(cmd) => handle_record(&mut open_service(&config)?, &config, &cmd),
        Command::Submit(cmd) => handle_submit(&mut open_service(&config)?, &cmd),
        Command::List(cmd) => handle_list(&open_service(&config)?, &cmd),
        Command::Show(cmd) => handle_show(&open_service(&config)?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut open_service(&config)?, &cmd),
        Command::Stats(cmd) => handle_stats(&open_service(&config)?, cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_service(config: &Config) -> Result<TrafficService> {
    let store = storage::open(config).context("opening dataset store")?;
    Ok(TrafficService::new(store))
}

fn handle_record(service: &mut TrafficService, config: &Config, cmd: &RecordCommand) -> Result<()> {
    let payload = cmd.to_payload(&config.survey, Local::now().date_naive())?;
    create(service, &payload)
}

fn handle_submit(service: &mut TrafficService, cmd: &SubmitCommand) -> Result<()> {
    let input = if cmd.reads_stdin() {
        io::read_to_string(io::stdin()).context("reading payload from stdin")?
    } else {
        fs::read_to_string(&cmd.input).with_context(|| format!("reading {}", cmd.input))?
    };
    let payload = DatasetPayload::from_json(&input)?;
    create(service, &payload)
}

fn create(service: &mut TrafficService, payload: &DatasetPayload) -> Result<()> {
    let created = service.create_dataset(payload)?;
    let dataset = service.get_dataset(&created.id)?;
    println!("Saved {}", created.id);
    println!(
        "  {} on {}: {} vehicles, average {}, peak {} ({})",
        dataset.location,
        dataset.date,
        dataset.total_vehicles,
        dataset.average_vehicles,
        dataset.peak_vehicles,
        dataset.classification
    );
    Ok(())
}

fn handle_list(service: &TrafficService, cmd: &ListCommand) -> Result<()> {
    let filter = cmd.to_filter()?;
    let mut list = service.find_datasets(&filter)?;
    sort_newest_first(&mut list.datasets);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
        OutputFormat::Table => print_table(&list.datasets),
        OutputFormat::Plain => {
            for d in &list.datasets {
                println!(
                    "{}  {}  {}  avg {}  {}",
                    d.id, d.date, d.location, d.average_vehicles, d.classification
                );
            }
        }
    }
    Ok(())
}

fn print_table(datasets: &[Dataset]) {
    if datasets.is_empty() {
        println!("No datasets found.");
        return;
    }

    let location_width = datasets
        .iter()
        .map(|d| d.location.chars().count())
        .max()
        .unwrap_or(0)
        .max("LOCATION".len());

    println!(
        "{:<18} {:<10} {:<location_width$} {:>6} {:>7} {:>6}  CONDITION",
        "ID", "DATE", "LOCATION", "SLOTS", "TOTAL", "AVG"
    );
    for d in datasets {
        println!(
            "{:<18} {:<10} {:<location_width$} {:>6} {:>7} {:>6}  {}",
            d.id,
            d.date.to_string(),
            d.location,
            d.interval_count,
            d.total_vehicles,
            d.average_vehicles,
            d.classification
        );
    }
    println!();
    println!("{} dataset(s)", datasets.len());
}

fn handle_show(service: &TrafficService, cmd: &ShowCommand) -> Result<()> {
    let dataset = service.get_dataset(&cmd.id)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&dataset)?);
        return Ok(());
    }

    println!("{}", dataset.location);
    println!("{}", "=".repeat(dataset.location.chars().count().max(1)));
    println!("Id:             {}", dataset.id);
    println!("Date:           {}", dataset.date);
    println!(
        "Grid:           {} x {} min from {}",
        dataset.interval_count,
        dataset.interval_minutes,
        dataset.start_time.format("%H:%M")
    );
    println!("Total vehicles: {}", dataset.total_vehicles);
    println!("Average:        {}", dataset.average_vehicles);
    println!("Peak:           {}", dataset.peak_vehicles);
    println!(
        "Condition:      {} ({})",
        dataset.classification,
        dataset.classification.color()
    );
    println!(
        "Saved:          {}",
        dataset.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!();

    println!("{:<13} {:>8}  {:<18} NOTE", "SLOT", "VEHICLES", "LEVEL");
    for ((slot, sample), level) in dataset
        .time_slots
        .iter()
        .zip(&dataset.samples)
        .zip(dataset.slot_levels())
    {
        println!(
            "{:<13} {:>8}  {:<18} {}",
            slot,
            sample.vehicle_count,
            level.to_string(),
            sample.note
        );
    }

    if let Some(peak) = dataset.peak() {
        println!();
        println!(
            "Busiest interval: {} with {} vehicles",
            peak.time_slot, peak.vehicle_count
        );
    }

    print_recommendation(dataset.classification);
    Ok(())
}

fn print_recommendation(level: TrafficLevel) {
    let rec = level.recommendation();
    println!();
    println!("Recommendation: {}", rec.headline);
    if let Some((low, high)) = rec.extra_minutes {
        println!("  Expect {low}-{high} extra minutes of travel time");
    }
    for line in rec.advice {
        println!("  - {line}");
    }
}

fn handle_delete(service: &mut TrafficService, cmd: &DeleteCommand) -> Result<()> {
    if !cmd.yes {
        let dataset = service.get_dataset(&cmd.id)?;
        println!(
            "This will delete {} ({} on {}).",
            dataset.id, dataset.location, dataset.date
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    service.delete_dataset(&cmd.id)?;
    println!("Deleted {}", cmd.id);
    Ok(())
}

fn handle_stats(service: &TrafficService, json: bool) -> Result<()> {
    let stats = service.get_stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &Stats) {
    println!("Traffic survey statistics");
    println!("-------------------------");
    println!("Datasets:       {}", stats.total_datasets);
    println!("Locations:      {}", stats.total_locations);
    println!("Total vehicles: {}", stats.total_vehicles);
    println!();
    println!("By condition:");
    for level in TrafficLevel::ALL {
        println!("  {:<18} {}", level.to_string(), stats.count_for(level));
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Path:               {}", config.storage_path().display());
                println!();
                println!("[Survey]");
                println!("  Start time:         {}", config.survey.start_time);
                println!("  Interval (minutes): {}", config.survey.interval_minutes);
                println!("  Interval count:     {}", config.survey.interval_count);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
