//! The `loganalyst leaderboard` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use super::{remote_service, ServiceArgs};

pub async fn execute(args: ServiceArgs) -> Result<()> {
    let config = args.resolve()?;
    let service = remote_service(&config)?;
    let entries = service
        .leaderboard()
        .await
        .with_context(|| format!("failed to fetch leaderboard from {}", service.base_url()))?;

    if entries.is_empty() {
        println!("The leaderboard is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Name", "Score", "Accuracy"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(&entry.name),
            Cell::new(entry.score),
            Cell::new(format!("{}%", entry.accuracy)),
        ]);
    }
    println!("{table}");
    Ok(())
}
