mod freetime;
mod location;

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use studyspot_core::engine::{open_or_empty, RoomHit, SearchEngine, SearchFilters};
use studyspot_core::error::Error;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "studyspot")]
#[command(about = "Interactive study-room search", long_about = None)]
struct Args {
    /// Index directory produced by studyspot-indexer
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Maximum index partitions kept in memory
    #[arg(long, default_value_t = 3)]
    cache_capacity: usize,
    /// Results per query
    #[arg(long, default_value_t = 5)]
    k: usize,
    /// User latitude, for closest-library query boosting
    #[arg(long, requires = "lon")]
    lat: Option<f64>,
    /// User longitude, for closest-library query boosting
    #[arg(long, requires = "lat")]
    lon: Option<f64>,
    /// Space files to rank by distance from the user
    #[arg(long = "library")]
    libraries: Vec<PathBuf>,
    /// Free/busy calendar export to summarize before searching
    #[arg(long)]
    freebusy: Option<PathBuf>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let engine = open_or_empty(&args.index, args.cache_capacity)?;
    println!("Study Spot Search ({} rooms indexed)", engine.num_docs());

    if let Some(path) = &args.freebusy {
        print_free_time(path)?;
    }

    let boost = closest_library_boost(&args)?;
    if let Some(name) = &boost {
        println!("Closest library: {name} (queries are boosted with it)");
    }

    println!("Type a query. Commands:");
    println!("    :cap N     minimum room capacity");
    println!("    :dur MIN   study duration in minutes");
    println!("    :clear     reset filters");
    println!("    quit/exit");

    run_loop(&engine, args.k, boost.as_deref())
}

fn run_loop(engine: &SearchEngine, k: usize, boost: Option<&str>) -> Result<()> {
    let stdin = io::stdin();
    let mut filters = SearchFilters::default();

    loop {
        print!("\nSearch for: ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            return Ok(());
        };
        let query = line?.trim().to_string();
        if query.is_empty() {
            continue;
        }
        match query.to_lowercase().as_str() {
            "quit" | "exit" => return Ok(()),
            _ => {}
        }

        if let Some(rest) = query.strip_prefix(":cap") {
            match rest.trim().parse::<u32>() {
                Ok(cap) => {
                    filters.min_capacity = Some(cap);
                    println!("Min capacity set to {cap}");
                }
                Err(_) => println!("Usage: :cap N"),
            }
            continue;
        }
        if let Some(rest) = query.strip_prefix(":dur") {
            match rest.trim().parse::<i32>() {
                Ok(dur) => {
                    filters.duration_minutes = dur;
                    println!("Duration set to {dur} minutes");
                }
                Err(_) => println!("Usage: :dur MIN"),
            }
            continue;
        }
        if query == ":clear" {
            filters = SearchFilters::default();
            println!("Filters cleared");
            continue;
        }

        let full_query = match boost {
            Some(name) => format!("{name} {query}"),
            None => query,
        };
        match engine.search(&full_query, filters, k) {
            Ok(hits) => print_hits(&hits),
            Err(Error::Query(msg)) => println!("Rejected query: {msg}"),
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_hits(hits: &[RoomHit]) {
    if hits.is_empty() {
        println!("No rooms matched.");
        return;
    }
    for (rank, hit) in hits.iter().enumerate() {
        let capacity = hit
            .capacity
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{}. {} / {} (capacity {capacity}, free from {})",
            rank + 1,
            hit.space_name,
            hit.room_name,
            hit.earliest_start,
        );
        println!("   matched: {}", hit.matched_terms.join(", "));
    }
}

/// Rank the given libraries by distance from the user; the closest name is
/// prepended to every query.
fn closest_library_boost(args: &Args) -> Result<Option<String>> {
    let (Some(lat), Some(lon)) = (args.lat, args.lon) else {
        return Ok(None);
    };
    if args.libraries.is_empty() {
        return Ok(None);
    }
    let mut libraries = Vec::new();
    for path in &args.libraries {
        match location::load_library(path) {
            Ok(lib) => libraries.push(lib),
            Err(e) => tracing::warn!(path = %path.display(), %e, "skipping library file"),
        }
    }
    let ranked = location::closest_libraries((lat, lon), &libraries);
    for (name, miles) in &ranked {
        println!("{name}: {miles:.2} miles away");
    }
    Ok(ranked.into_iter().next().map(|(name, _)| name))
}

fn print_free_time(path: &PathBuf) -> Result<()> {
    let json = std::fs::read_to_string(path)?;
    let busy = freetime::parse_freebusy(&json)?;
    let Some(first) = busy.first() else {
        println!("Calendar has no busy periods.");
        return Ok(());
    };
    // Window: 08:00-22:00 on the day of the first busy period, in its offset.
    let day = first.start.date();
    let offset = first.start.offset();
    let window_start = day.with_hms(8, 0, 0)?.assume_offset(offset);
    let window_end = day.with_hms(22, 0, 0)?.assume_offset(offset);

    let free = freetime::find_free_time(busy, window_start, window_end, 30);
    println!("Free time blocks for {day}:");
    if free.is_empty() {
        println!("  No free time");
    }
    for iv in free {
        println!(
            "  {} - {}",
            iv.start.format(&Rfc3339)?,
            iv.end.format(&Rfc3339)?
        );
    }
    Ok(())
}
