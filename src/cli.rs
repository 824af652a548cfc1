use clap::Parser;
use colored::*;

/// demo-miner - Educational proof-of-work mining demo
#[derive(Parser, Debug)]
#[command(name = "demo-miner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Brute-force a nonce until SHA-256(data + nonce) starts with N zeros", long_about = None)]
pub struct Args {
    /// Block data to hash ahead of the nonce (may be empty)
    #[arg(short, long, default_value = "Hello, world!", value_name = "DATA")]
    pub data: String,

    /// Number of leading zero hex characters the digest must have
    #[arg(short = 'D', long, default_value_t = 4, value_name = "N")]
    pub difficulty: u32,

    /// Attempts per batch between yield points
    #[arg(short, long, default_value_t = crate::search::DEFAULT_BATCH_SIZE, value_name = "N")]
    pub batch_size: u64,

    /// Print the final result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

pub fn display_banner() {
    let banner = format!(
        r#"
{}
{}  {}
{}  {}
{}
"#,
        "╔════════════════════════════════════════════════════╗".bright_cyan(),
        "║".bright_cyan(),
        "demo-miner - Proof-of-Work Mining Demo".bright_white().bold(),
        "║".bright_cyan(),
        format!("Version {} | SHA-256 | hex-prefix target", env!("CARGO_PKG_VERSION")).bright_green(),
        "╚════════════════════════════════════════════════════╝".bright_cyan(),
    );

    println!("{}", banner);
}
