//! Authentication commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use galasactl::auth::Authenticator;
use log::info;

use crate::cli::CommandContext;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Exchange the stored credentials for a bearer token
    Login,
    /// Delete every cached bearer token
    Logout,
    /// Print a usable bearer token
    Token,
    /// Personal access token management
    #[command(subcommand)]
    Tokens(TokensCommands),
}

#[derive(Subcommand)]
pub enum TokensCommands {
    /// Revoke a personal access token
    Delete {
        /// Id of the token to revoke
        #[arg(long)]
        tokenid: String,
    },
}

pub async fn auth_command(args: AuthCommands, context: &CommandContext) -> Result<()> {
    match args.command {
        AuthSubcommands::Login => login(context).await,
        AuthSubcommands::Logout => logout(context).await,
        AuthSubcommands::Token => token(context).await,
        AuthSubcommands::Tokens(TokensCommands::Delete { tokenid }) => {
            delete_token(context, &tokenid).await
        }
    }
}

async fn login(context: &CommandContext) -> Result<()> {
    let authenticator = context.authenticator().await?;
    context
        .retrier()
        .execute(|| authenticator.login())
        .await
        .context("Login failed")?;

    println!("Logged in successfully");
    Ok(())
}

async fn logout(context: &CommandContext) -> Result<()> {
    // Logging out only touches local state, so a bootstrap without a server is fine
    let bootstrap = context.bootstrap().await?;
    let authenticator = context.authenticator_for(&bootstrap.api_server_url);
    authenticator
        .logout_of_everywhere()
        .await
        .context("Logout failed")?;

    println!("Logged out of all Galasa servers");
    Ok(())
}

async fn token(context: &CommandContext) -> Result<()> {
    let authenticator = context.authenticator().await?;
    let token = context
        .retrier()
        .execute(|| authenticator.get_bearer_token())
        .await
        .context("Failed to obtain a bearer token")?;

    println!("{}", token);
    Ok(())
}

async fn delete_token(context: &CommandContext, token_id: &str) -> Result<()> {
    let authenticator = context.authenticator().await?;
    let retrier = context.authenticated_retrier(authenticator);

    retrier
        .execute(|client| async move { client.revoke_token(token_id).await })
        .await
        .with_context(|| format!("Failed to delete token '{}'", token_id))?;

    info!("Token {} revoked", token_id);
    println!("Token '{}' deleted", token_id);
    Ok(())
}
