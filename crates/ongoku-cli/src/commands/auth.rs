//! Login and logout

use anyhow::{Context, Result};
use secrecy::SecretString;

use ongoku::api::ProjectDirectory;
use ongoku::auth::TOKEN_ENV_VAR;
use ongoku::{resolve_token, ApiClient, SyncError};

use super::Session;
use crate::output::Output;
use crate::prompt;

/// Verifies a token against the service, then stores it.
pub async fn login(token: Option<&str>, token_file: Option<&str>, output: &Output) -> Result<()> {
    let session = Session::load()?;

    let token = match (token, token_file) {
        (None, None) => {
            let value = prompt::read_secret("Paste your ongoku token")?;
            resolve_token(Some(&value), None, None)?
        }
        (token, token_file) => resolve_token(token, token_file, None)?,
    };

    let projects = verify(&session.settings.api_url, token.clone()).await?;
    session.store.login(&token)?;

    output.success(&format!(
        "Logged in to {} ({} project(s))",
        session.settings.api_url, projects
    ));
    Ok(())
}

pub fn logout(output: &Output) -> Result<()> {
    let session = Session::load()?;

    if session.store.logout()? {
        output.success("Logged out");
    } else {
        output.message("Not logged in");
    }

    if std::env::var_os(TOKEN_ENV_VAR).is_some() {
        output.warn(&format!(
            "{} is set and will still be used for authentication",
            TOKEN_ENV_VAR
        ));
    }
    Ok(())
}

/// Lists projects with `token`, returning how many the account can see.
async fn verify(api_url: &str, token: SecretString) -> Result<usize> {
    let client = ApiClient::new(api_url, Some(token))?;
    let projects = client
        .list_projects()
        .await
        .map_err(SyncError::from)
        .context("Token verification failed")?;
    Ok(projects.len())
}
