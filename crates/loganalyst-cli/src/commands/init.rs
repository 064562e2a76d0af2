//! The `loganalyst init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("loganalyst.toml").exists() {
        println!("loganalyst.toml already exists, skipping.");
    } else {
        std::fs::write("loganalyst.toml", SAMPLE_CONFIG)?;
        println!("Created loganalyst.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point service.base_url at your classification service");
    println!("  2. Run: loganalyst status");
    println!("  3. Run: loganalyst play");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# loganalyst configuration

# Start every session with the built-in logs instead of the service.
offline = false

[service]
base_url = "http://localhost:5000/api"
# Seconds to wait for each request before switching to offline mode.
timeout_secs = 5
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config: loganalyst_providers::AnalystConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.service.timeout_secs, 5);
        assert!(!config.offline);
    }
}
