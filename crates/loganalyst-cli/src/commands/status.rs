//! The `loganalyst status` command.

use anyhow::{Context, Result};

use super::{remote_service, ServiceArgs};

pub async fn execute(args: ServiceArgs) -> Result<()> {
    let config = args.resolve()?;
    let service = remote_service(&config)?;
    let health = service
        .health()
        .await
        .with_context(|| format!("classification service at {} is unavailable", service.base_url()))?;

    match health.timestamp {
        Some(at) => println!("{}: {} ({at})", service.base_url(), health.status),
        None => println!("{}: {}", service.base_url(), health.status),
    }
    Ok(())
}
