//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `studyhub_core` linkage without starting the HTTP server.
//! - Show the local period boundaries the server would use right now.

use chrono::Local;
use studyhub_core::{period_start, Frequency};

fn main() {
    let now = Local::now();
    println!("studyhub_core ping={}", studyhub_core::ping());
    println!("studyhub_core version={}", studyhub_core::core_version());
    println!("now={}", now.to_rfc3339());
    for frequency in [Frequency::Daily, Frequency::Weekly] {
        println!(
            "period_start {frequency}={}",
            period_start(frequency, &now).to_rfc3339()
        );
    }
}
