use demo_miner::stats::{expected_attempts, format_count, format_duration};

fn main() {
    // Expected cost per difficulty level: one match in 16 per added
    // hex-prefix character, so 16^d attempts on average

    println!("Expected attempts and time-to-match per difficulty:\n");

    let rates = [1_000.0, 50_000.0, 1_000_000.0];

    println!(
        "{:>10} {:>20} {:>14} {:>14} {:>14}",
        "difficulty", "expected attempts", "@1k H/s", "@50k H/s", "@1M H/s"
    );

    for difficulty in 0..=8u32 {
        let expected = expected_attempts(difficulty);
        let times: Vec<String> = rates
            .iter()
            .map(|rate| format_duration(expected / rate))
            .collect();

        println!(
            "{:>10} {:>20} {:>14} {:>14} {:>14}",
            difficulty,
            format_count(expected as u64),
            times[0],
            times[1],
            times[2]
        );
    }

    println!("\nDifficulty 8 is the practical ceiling for an interactive demo.");
}
