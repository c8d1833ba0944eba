use std::fmt::Write as _;
use std::time::Instant;

use clap::Parser;

/// Sweep worker counts comparing threaded and blocking-pool integration of
/// cos over [0, pi/2].
#[derive(Parser)]
#[command(name = "integrate-bench")]
struct Args {
    /// Total number of rectangles.
    #[arg(long, default_value_t = 10_000_000)]
    n_iter: u64,
}

/// Left-rectangle approximation of the integral of `f` over [a, b].
fn integrate(f: fn(f64) -> f64, a: f64, b: f64, n_iter: u64) -> f64 {
    let step = (b - a) / n_iter as f64;
    let mut acc = 0.0;
    for i in 0..n_iter {
        acc += f(a + i as f64 * step) * step;
    }
    acc
}

/// Splits [a, b] into `n_jobs` chunks; the last chunk absorbs the leftover
/// iterations and always ends exactly at `b`.
fn split_jobs(a: f64, b: f64, n_iter: u64, n_jobs: u64) -> Vec<(f64, f64, u64)> {
    let chunk_iters = n_iter / n_jobs;
    let step = (b - a) / n_jobs as f64;
    (0..n_jobs)
        .map(|i| {
            let start = a + i as f64 * step;
            if i == n_jobs - 1 {
                (start, b, n_iter - chunk_iters * (n_jobs - 1))
            } else {
                (start, a + (i + 1) as f64 * step, chunk_iters)
            }
        })
        .collect()
}

fn threaded(f: fn(f64) -> f64, a: f64, b: f64, n_iter: u64, n_jobs: u64) -> anyhow::Result<f64> {
    if n_jobs <= 1 {
        return Ok(integrate(f, a, b, n_iter));
    }
    let mut total = 0.0;
    std::thread::scope(|scope| -> anyhow::Result<()> {
        let handles: Vec<_> = split_jobs(a, b, n_iter, n_jobs)
            .into_iter()
            .map(|(start, end, iters)| scope.spawn(move || integrate(f, start, end, iters)))
            .collect();
        for handle in handles {
            total += handle
                .join()
                .map_err(|_| anyhow::anyhow!("integration worker panicked"))?;
        }
        Ok(())
    })?;
    Ok(total)
}

async fn blocking_pool(
    f: fn(f64) -> f64,
    a: f64,
    b: f64,
    n_iter: u64,
    n_jobs: u64,
) -> anyhow::Result<f64> {
    if n_jobs <= 1 {
        return Ok(integrate(f, a, b, n_iter));
    }
    let handles: Vec<_> = split_jobs(a, b, n_iter, n_jobs)
        .into_iter()
        .map(|(start, end, iters)| tokio::task::spawn_blocking(move || integrate(f, start, end, iters)))
        .collect();
    let mut total = 0.0;
    for handle in handles {
        total += handle.await?;
    }
    Ok(total)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cpus = std::thread::available_parallelism()?.get() as u64;
    let max_jobs = cpus * 2;

    let (a, b) = (0.0, std::f64::consts::FRAC_PI_2);

    let mut report = String::new();
    writeln!(
        report,
        "integrating cos over [0, pi/2]: {} rectangles, {} CPUs",
        args.n_iter, cpus
    )?;
    writeln!(report, "| n_jobs | threads (s) | blocking pool (s) |")?;
    writeln!(report, "|--------|-------------|-------------------|")?;
    print!("{}", report);

    let mut last_thread_result = 0.0;
    let mut last_pool_result = 0.0;
    for n_jobs in 1..=max_jobs {
        let started = Instant::now();
        last_thread_result = threaded(f64::cos, a, b, args.n_iter, n_jobs)?;
        let thread_time = started.elapsed().as_secs_f64();

        let started = Instant::now();
        last_pool_result = blocking_pool(f64::cos, a, b, args.n_iter, n_jobs).await?;
        let pool_time = started.elapsed().as_secs_f64();

        let row = format!("| {:>6} | {:>11.4} | {:>17.4} |", n_jobs, thread_time, pool_time);
        println!("{}", row);
        writeln!(report, "{}", row)?;
    }

    let summary = format!(
        "\nexact value: 1.0\ncomputed (threads): {:.10}\ncomputed (blocking pool): {:.10}\n",
        last_thread_result, last_pool_result
    );
    print!("{}", summary);
    report.push_str(&summary);

    tokio::fs::create_dir_all("artifacts").await?;
    tokio::fs::write("artifacts/integration_benchmark_results.txt", &report).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_cos_quarter_turn() {
        let value = integrate(f64::cos, 0.0, std::f64::consts::FRAC_PI_2, 1_000_000);
        assert!((value - 1.0).abs() < 1e-3, "got {}", value);
    }

    #[test]
    fn test_split_jobs_covers_the_interval() {
        let chunks = split_jobs(0.0, 1.0, 10_000_003, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].0, 0.0);
        assert_eq!(chunks[3].1, 1.0);
        let total: u64 = chunks.iter().map(|c| c.2).sum();
        assert_eq!(total, 10_000_003);
    }

    #[test]
    fn test_threaded_matches_exact_value() {
        let value = threaded(f64::cos, 0.0, std::f64::consts::FRAC_PI_2, 1_000_000, 4).unwrap();
        assert!((value - 1.0).abs() < 1e-3, "got {}", value);
    }
}
