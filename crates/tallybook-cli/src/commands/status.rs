//! Configuration display command

use anyhow::Result;
use tallybook_core::config::default_config_path;
use tallybook_core::TallyConfig;

pub fn cmd_config(config: &TallyConfig) -> Result<()> {
    println!();
    println!("⚙️  Tally Configuration");
    println!("   ─────────────────────────────────────────────────────────────");

    match &config.source {
        Some(path) => println!("   Source: {}", path.display()),
        None => println!("   Source: built-in defaults"),
    }
    if let Some(path) = default_config_path() {
        let marker = if path.exists() { "" } else { " (not present)" };
        println!("   Override file: {}{}", path.display(), marker);
    }

    println!();
    println!("   Anomalies");
    println!("     Threshold ratio: {}×", config.anomaly.threshold_ratio);
    println!("     Absolute floor:  {:.2}", config.anomaly.absolute_floor);
    println!("     History:         {} days", config.history_days);

    println!();
    println!("   Streaks");
    println!("     Lookback cap:    {} days", config.streak_lookback_cap);

    println!();
    println!("   Advisor");
    println!("     Backend:         {}", config.advisor.backend);
    println!("     Host:            {}", config.advisor.host);
    println!("     Model:           {}", config.advisor.model);
    println!("     Timeout:         {}s", config.advisor.timeout.as_secs());

    Ok(())
}
