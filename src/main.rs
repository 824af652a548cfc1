use anyhow::Result;
use clap::Parser;
use colored::*;

use demo_miner::cli::{display_banner, Args};
use demo_miner::search::{AttemptResult, SearchEvent, SearchLoop, SearchState};
use demo_miner::stats::{self, MiningStats};
use demo_miner::digest;

use std::io::Write as _;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if args.debug { "debug" } else { "info" })
            }),
        )
        .init();

    display_banner();

    // Validate difficulty
    if args.difficulty > 64 {
        eprintln!(
            "{}",
            "Error: --difficulty above 64 can never match a 64-character digest"
                .red()
                .bold()
        );
        std::process::exit(1);
    }
    if args.difficulty > 8 {
        println!(
            "{}",
            format!(
                "Warning: difficulty {} needs ~{:.2e} attempts on average; expect this to run \
                 until you stop it",
                args.difficulty,
                stats::expected_attempts(args.difficulty)
            )
            .yellow()
        );
    }

    let target = "0".repeat(args.difficulty as usize);

    // Display configuration
    println!("\n{}", "=== Mining Configuration ===".cyan().bold());
    println!("{:<15} {}", "Data:".green(), format!("\"{}\"", args.data).bright_white());
    println!("{:<15} {}", "Difficulty:".green(), args.difficulty.to_string().bright_white());
    println!("{:<15} {}", "Target:".green(), format!("{}...", target).bright_white());
    println!(
        "{:<15} {}",
        "Batch size:".green(),
        stats::format_count(args.batch_size).bright_white()
    );
    println!(
        "{:<15} {}",
        "Expected:".green(),
        format!("~{} attempts", stats::format_count(stats::expected_attempts(args.difficulty) as u64))
            .bright_white()
    );

    // The digest backend must prove itself before a search may start
    if let Err(e) = digest::self_check() {
        eprintln!("\n{}", "Digest backend unavailable!".red().bold());
        eprintln!("{}", format!("   Error: {}", e).red());
        eprintln!("{}", "Cannot start a search without a working SHA-256.".yellow());
        std::process::exit(1);
    }
    tracing::debug!("digest self-check passed");

    println!("\n{}", "=== Mining Status ===".cyan().bold());
    println!(
        "{}",
        format!("Searching for a digest starting with \"{}\" (Ctrl-C to stop)...", target).yellow()
    );

    // Channel for the search task to report progress to the display loop
    let (event_tx, mut event_rx) = mpsc::channel::<SearchEvent>(32);

    let mut search =
        SearchLoop::new(args.data.clone(), args.difficulty, args.batch_size).with_events(event_tx);
    let stop = search.stop_flag();

    // Ctrl+C raises the stop flag; the search observes it at the next
    // batch boundary
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", "Interrupt received, stopping search...".yellow().bold());
                stop_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            Err(err) => {
                eprintln!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    // The sender lives inside the loop, so returning only a state snapshot
    // closes the channel when the task finishes
    let search_task = tokio::spawn(async move {
        let result = search.run().await;
        (result, search.state().clone())
    });

    let mut mining_stats = MiningStats::new();
    let mut current_nonce: u64 = 0;
    let mut last_digest = String::from("...");

    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(SearchEvent::Progress { nonce, total_attempts, last_digest: digest_hex }) => {
                        current_nonce = nonce;
                        last_digest = digest_hex;
                        mining_stats.record_attempts(total_attempts);
                    }
                    Some(SearchEvent::Found { total_attempts, .. }) => {
                        mining_stats.record_attempts(total_attempts);
                        break;
                    }
                    // Channel closed: the search task ended without a match
                    None => break,
                }
            }

            _ = ticker.tick() => {
                mining_stats.sample_hashrate();
                print_status_line(&mining_stats, current_nonce, &last_digest, args.difficulty);
            }
        }
    }

    let (result, final_state) = search_task.await?;
    let elapsed = mining_stats.elapsed();

    match &result {
        Some(attempt) => print_success(attempt, &final_state, elapsed),
        None => {
            println!("\n{}", "Search stopped before a match was found.".yellow());
        }
    }

    // Final statistics
    println!("\n{}", "=== Final Statistics ===".cyan().bold());
    println!(
        "   {} {}",
        "Total Attempts:".green(),
        stats::format_count(final_state.total_attempts)
    );
    println!("   {} {}", "Elapsed:".green(), stats::format_duration(elapsed.as_secs_f64()));
    println!(
        "   {} {} H/s",
        "Average Rate:".green(),
        stats::format_count(mining_stats.overall_rate() as u64)
    );

    if args.json {
        let summary = stats::SearchSummary {
            data: args.data.clone(),
            difficulty: args.difficulty,
            found: result.is_some(),
            nonce: result.as_ref().map(|r| r.nonce),
            digest: result.as_ref().map(|r| r.digest_hex.clone()),
            total_attempts: final_state.total_attempts,
            elapsed_secs: elapsed.as_secs_f64(),
            hash_rate: mining_stats.overall_rate(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Repaint the single status line the way a pool miner repaints its stats
fn print_status_line(mining_stats: &MiningStats, nonce: u64, last_digest: &str, difficulty: u32) {
    let rate = mining_stats.average_rate(10);
    let eta = stats::eta_secs(difficulty, mining_stats.total_attempts, rate);
    let digest_short = last_digest.get(..16).unwrap_or(last_digest);

    print!(
        "\r{} nonce {:>12} | {:>9} H/s | elapsed {:>8} | ETA {:>8} | last {}  ",
        "Searching".cyan(),
        stats::format_count(nonce),
        stats::format_count(rate as u64),
        stats::format_duration(mining_stats.elapsed().as_secs_f64()),
        stats::format_duration(eta),
        digest_short.dimmed(),
    );
    std::io::stdout().flush().ok();
}

fn print_success(attempt: &AttemptResult, state: &SearchState, elapsed: Duration) {
    println!("\n\n{}", "NONCE FOUND!".green().bold());
    println!("   {} {}", "Nonce:".green(), stats::format_count(attempt.nonce));
    println!("   {} {}", "Digest:".green(), attempt.digest_hex);
    println!(
        "   {} {}",
        "Attempts:".green(),
        stats::format_count(state.total_attempts)
    );
    println!("   {} {:.2}s", "Elapsed:".green(), elapsed.as_secs_f64());

    let rate = if elapsed.as_secs_f64() > 0.0 {
        state.total_attempts as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    println!(
        "[{}] found nonce={} after {} attempts ({} H/s)",
        chrono::Local::now().format("%H:%M:%S"),
        attempt.nonce,
        stats::format_count(state.total_attempts),
        stats::format_count(rate as u64),
    );
}
