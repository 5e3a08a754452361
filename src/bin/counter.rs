//! Counter demo: drives a station from the command line and prints every
//! published snapshot.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dripper::{field, Action, Drip, Effect, FieldTable, Station, StationConfig};
use rand::Rng;

/// Count up, count down, or let an effect pick a number.
#[derive(Parser, Debug)]
#[command(name = "dripper-counter", version, about)]
struct Cli {
    /// Number of increase steps to pour.
    #[arg(long, default_value_t = 3)]
    increment: u32,

    /// Number of decrease steps to pour after the increases.
    #[arg(long, default_value_t = 0)]
    decrement: u32,

    /// Finish with a randomizing effect.
    #[arg(long)]
    lucky: bool,

    /// Reset the counter once everything settled.
    #[arg(long)]
    reset: bool,

    /// Name written through the field table.
    #[arg(long)]
    name: Option<String>,

    /// Station settings (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Counter {
    counter: i64,
    text: String,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "Count: {}", self.counter)
        } else {
            write!(f, "Count: {} ({})", self.counter, self.text)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CounterAction {
    Increase,
    Decrease,
    Set(i64),
    Reset,
    Randomize,
}

impl Action for CounterAction {}

const RANDOMIZE_DELAY: Duration = Duration::from_millis(300);

fn counter() -> Drip<Counter, CounterAction> {
    Drip::new(|state: &mut Counter, action: &CounterAction| {
        match action {
            CounterAction::Increase => state.counter += 1,
            CounterAction::Decrease => state.counter -= 1,
            CounterAction::Set(value) => state.counter = *value,
            CounterAction::Reset => state.counter = 0,
            CounterAction::Randomize => {
                return Effect::run(|pour| async move {
                    tokio::time::sleep(RANDOMIZE_DELAY).await;
                    pour.pour(CounterAction::Set(lucky_number()));
                    Ok(())
                });
            }
        }
        Effect::none()
    })
}

fn lucky_number() -> i64 {
    rand::thread_rng().gen_range(1..=100)
}

#[tokio::main]
async fn main() -> Result<()> {
    dripper::logging::init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StationConfig::load_from(path)
            .with_context(|| format!("loading station config from {}", path.display()))?,
        None => StationConfig::named("counter"),
    };
    let fields = FieldTable::new().with(field!(Counter, text))?;
    let station = Station::with_config(Counter::default(), counter(), config)?.with_fields(fields);

    let mut snapshots = station.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(state) = snapshots.next().await {
            println!("{state}");
        }
    });

    for _ in 0..cli.increment {
        station.pour(CounterAction::Increase);
    }
    for _ in 0..cli.decrement {
        station.pour(CounterAction::Decrease);
    }
    if let Some(name) = cli.name {
        station.write_field("text", name)?;
    }
    if cli.lucky {
        station.pour(CounterAction::Randomize);
    }

    station.flush().await;
    while station.in_flight() > 0 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        station.flush().await;
    }

    tracing::info!(counter = station.state().counter, "counter settled");
    if cli.reset {
        station.pour(CounterAction::Reset);
        station.flush().await;
    }

    station.teardown().await;
    printer.await.context("snapshot printer failed")?;
    Ok(())
}
