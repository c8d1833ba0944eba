use std::fmt::Write as _;
use std::time::{Duration, Instant};

use clap::Parser;

/// Compare sequential, threaded and blocking-pool runs of a CPU-bound task.
#[derive(Parser)]
#[command(name = "fib-bench")]
struct Args {
    /// Fibonacci index to compute.
    #[arg(long, default_value_t = 35)]
    n: u64,
    /// How many times to compute it.
    #[arg(long, default_value_t = 10)]
    times: usize,
}

fn fibonacci(n: u64) -> u64 {
    if n <= 1 {
        n
    } else {
        fibonacci(n - 1) + fibonacci(n - 2)
    }
}

fn sequential(n: u64, times: usize) -> Duration {
    let started = Instant::now();
    let _results: Vec<u64> = (0..times).map(|_| fibonacci(n)).collect();
    started.elapsed()
}

fn threaded(n: u64, times: usize) -> anyhow::Result<Duration> {
    let started = Instant::now();
    let handles: Vec<_> = (0..times)
        .map(|_| std::thread::spawn(move || fibonacci(n)))
        .collect();
    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("fibonacci worker panicked"))?;
    }
    Ok(started.elapsed())
}

async fn blocking_pool(n: u64, times: usize) -> anyhow::Result<Duration> {
    let started = Instant::now();
    let handles: Vec<_> = (0..times)
        .map(|_| tokio::task::spawn_blocking(move || fibonacci(n)))
        .collect();
    for handle in handles {
        handle.await?;
    }
    Ok(started.elapsed())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut report = String::new();
    writeln!(
        report,
        "computing fibonacci({}) {} times",
        args.n, args.times
    )?;

    let seq = sequential(args.n, args.times);
    writeln!(report, "sequential:    {:.4} s", seq.as_secs_f64())?;

    let threads = threaded(args.n, args.times)?;
    writeln!(report, "threads:       {:.4} s", threads.as_secs_f64())?;

    let pool = blocking_pool(args.n, args.times).await?;
    writeln!(report, "blocking pool: {:.4} s", pool.as_secs_f64())?;

    print!("{}", report);
    tokio::fs::create_dir_all("artifacts").await?;
    tokio::fs::write("artifacts/fibonacci_results.txt", &report).await?;
    Ok(())
}
