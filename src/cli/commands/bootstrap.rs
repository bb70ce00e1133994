use anyhow::Result;

use crate::cli::CommandContext;

/// Print where the bootstrap came from and which API server it names
pub async fn bootstrap_command(context: &CommandContext) -> Result<()> {
    let bootstrap = context.bootstrap().await?;

    println!("Bootstrap:  {}", bootstrap.path);
    if bootstrap.api_server_url.is_empty() {
        println!("API server: (not set)");
    } else {
        println!("API server: {}", bootstrap.api_server_url);
    }

    let mut keys: Vec<&String> = bootstrap.properties.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {} = {}", key, bootstrap.properties[key]);
    }
    Ok(())
}
