use demo_miner::digest::attempt_digest;

fn main() {
    // Brute-force the first matching nonce at each difficulty for a
    // sample prefix, showing how fast the search space grows

    let prefix = "demo block";
    println!("First matching nonce per difficulty for prefix {:?}:\n", prefix);

    for difficulty in 0..=3u32 {
        let target = "0".repeat(difficulty as usize);

        let mut nonce = 0u64;
        let digest = loop {
            let digest = attempt_digest(prefix, nonce);
            if digest.starts_with(&target) {
                break digest;
            }
            nonce += 1;
        };

        println!("  difficulty {}: nonce {:>6} -> {}", difficulty, nonce, digest);
    }
}
