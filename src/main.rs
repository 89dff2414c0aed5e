use perfrun::config::ExecutionConfig;
use perfrun::util::units::{calculate_throughput, format_duration, format_latency, parse_millis};
use perfrun::{error, FnInvoker, LatencyTracker, PerfRunError, PerfTest, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: perfrun [CONFIG.toml] [--threads N] [--invocations N] \
[--duration D] [--ramp-up D] [--warm-up D] [--spin N]";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{}", error::user_friendly_message(&err));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut overrides: Vec<(String, String)> = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            println!("{}", USAGE);
            return Ok(());
        }
        if let Some(flag) = arg.strip_prefix("--") {
            let value = args
                .next()
                .ok_or_else(|| PerfRunError::ConfigError(format!("missing value for --{}", flag)))?;
            overrides.push((flag.to_string(), value));
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let mut config = match &config_path {
        Some(path) => ExecutionConfig::load_from(path)?,
        None => ExecutionConfig::load()?,
    };
    let mut spin = 10_000u64;
    for (flag, value) in overrides {
        apply_override(&mut config, &mut spin, &flag, &value)?;
    }

    let tracker = Arc::new(LatencyTracker::from_config("spin", &config)?);
    let invoker = FnInvoker::new("spin", move || {
        let mut acc = 0u64;
        for i in 0..spin {
            acc = acc.wrapping_mul(6364136223846793005).wrapping_add(i);
        }
        std::hint::black_box(acc);
        Ok::<(), std::convert::Infallible>(())
    });

    let started = Instant::now();
    PerfTest::new(invoker, config)
        .with_tracker(tracker.clone())
        .evaluate_async()
        .await?;
    let elapsed = started.elapsed();

    match tracker.last_snapshot() {
        Some(snapshot) => {
            println!(
                "Completed {} invocations in {} ({:.0}/s)",
                snapshot.total_invocations,
                format_duration(elapsed),
                calculate_throughput(snapshot.total_invocations, elapsed)
            );
            for clock in &snapshot.clocks {
                println!(
                    "  {:<10} {} samples, mean {}, max {}",
                    clock.clock,
                    clock.samples,
                    format_latency(clock.mean()),
                    format_latency(clock.max)
                );
            }
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("No invocations were tracked"),
    }
    Ok(())
}

fn apply_override(config: &mut ExecutionConfig, spin: &mut u64, flag: &str, value: &str) -> Result<()> {
    let invalid = |e: String| PerfRunError::ConfigError(format!("--{}: {}", flag, e));
    match flag {
        "threads" => config.threads = value.parse().map_err(|_| invalid(format!("not a number: {}", value)))?,
        "invocations" => {
            config.invocations = value.parse().map_err(|_| invalid(format!("not a number: {}", value)))?
        }
        "spin" => *spin = value.parse().map_err(|_| invalid(format!("not a number: {}", value)))?,
        "duration" => config.duration = parse_millis(value).map_err(invalid)?,
        "ramp-up" => config.ramp_up = parse_millis(value).map_err(invalid)?,
        "warm-up" => config.warm_up = parse_millis(value).map_err(invalid)?,
        other => {
            return Err(PerfRunError::ConfigError(format!(
                "unknown option --{}\n{}",
                other, USAGE
            )))
        }
    }
    config.validate()?;
    tracing::debug!(flag, value, "applied override");
    Ok(())
}
