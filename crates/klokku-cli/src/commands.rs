//! Command handlers. Each API command runs inside one client scope: log in,
//! make the call, release the connection.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use klokku_core::{ApiClient, ApiError, Config, Credentials};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{Cli, Command, ConfigAction, ConfigKey};
use crate::output;

pub async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    match &cli.command {
        Command::Config { action } => run_config(action, config, &config_path),
        Command::Users => {
            let users = with_client(&cli, &config, &config_path, |api| {
                Box::pin(async move { Ok::<_, anyhow::Error>(api.get_users().await?) })
            })
            .await?;
            print(&cli, &users, || output::render_users(&users))
        }
        Command::Budgets { active } => {
            let mut budgets = with_client(&cli, &config, &config_path, |api| {
                Box::pin(async move { Ok::<_, anyhow::Error>(api.get_all_budgets().await?) })
            })
            .await?;
            if *active {
                let now = Utc::now();
                budgets.retain(|b| b.is_active_at(now));
            }
            print(&cli, &budgets, || output::render_budgets(&budgets))
        }
        Command::Current => {
            let event = with_client(&cli, &config, &config_path, |api| {
                Box::pin(async move {
                    match api.get_current_event().await {
                        Ok(event) => Ok(Some(event)),
                        Err(ApiError::NotFound(_)) => Ok(None),
                        Err(e) => Err(anyhow::Error::from(e)),
                    }
                })
            })
            .await?;
            match event {
                Some(event) => print(&cli, &event, || {
                    output::render_current_event(&event, Utc::now())
                }),
                None => print(&cli, &Option::<()>::None, || {
                    "No event is currently being tracked.\n".to_string()
                }),
            }
        }
        Command::Switch { budget_id } => {
            let budget_id = *budget_id;
            with_client(&cli, &config, &config_path, move |api| {
                Box::pin(async move {
                    Ok::<_, anyhow::Error>(api.set_current_budget(budget_id).await?)
                })
            })
            .await?;
            print(&cli, &serde_json::json!({ "budgetId": budget_id }), || {
                format!("Switched to budget {}.\n", budget_id)
            })
        }
    }
}

/// Build a client, authenticate, run `f`, and close the client on every path.
async fn with_client<T, F>(cli: &Cli, config: &Config, config_path: &Path, f: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut ApiClient) -> BoxFuture<'a, Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut client_config = config.client_config(cli.url.as_deref())?;
    if let Some(secs) = cli.timeout {
        client_config = client_config.with_timeout(Duration::from_secs(secs));
    }

    let username = cli
        .username
        .clone()
        .or_else(|| config.last_username.clone())
        .context("No username given (use --username or KLOKKU_USERNAME)")?;
    let mut credentials = Credentials::new(username.clone());
    if let Some(ref token) = cli.token {
        credentials = credentials.with_token(token.clone());
    }

    let mut client = ApiClient::new(client_config)?;
    debug!(base_url = client.base_url(), "Connecting");

    let result = client
        .scoped(|api| {
            Box::pin(async move {
                api.authenticate(&credentials)
                    .await
                    .context("Login failed")?;
                f(api).await
            })
        })
        .await?;

    remember_username(config, config_path, &username);
    Ok(result)
}

/// Record the last successful login. Failure to write is not fatal.
fn remember_username(config: &Config, config_path: &Path, username: &str) {
    if config.last_username.as_deref() == Some(username) {
        return;
    }
    let mut updated = config.clone();
    updated.last_username = Some(username.to_string());
    if let Err(e) = updated.save_to(config_path) {
        warn!(error = %e, "Failed to save last username");
    }
}

fn print<T: Serialize>(cli: &Cli, value: &T, render: impl FnOnce() -> String) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render());
    }
    Ok(())
}

fn run_config(action: &ConfigAction, mut config: Config, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", output::render_config(&config, path));
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            apply_config_value(&mut config, *key, Some(value))?;
            config.save_to(path)?;
            println!("Saved {} to {}", key_name(*key), path.display());
            Ok(())
        }
        ConfigAction::Unset { key } => {
            apply_config_value(&mut config, *key, None)?;
            config.save_to(path)?;
            println!("Removed {} from {}", key_name(*key), path.display());
            Ok(())
        }
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Url => "url",
        ConfigKey::Username => "username",
        ConfigKey::Timeout => "timeout",
        ConfigKey::Retries => "retries",
        ConfigKey::SessionTtl => "session-ttl",
    }
}

fn apply_config_value(config: &mut Config, key: ConfigKey, value: Option<&String>) -> Result<()> {
    fn parse<N: std::str::FromStr>(key: ConfigKey, value: Option<&String>) -> Result<Option<N>> {
        match value {
            None => Ok(None),
            Some(v) => match v.trim().parse() {
                Ok(n) => Ok(Some(n)),
                Err(_) => bail!("Invalid value '{}' for {}: expected a number", v, key_name(key)),
            },
        }
    }

    match key {
        ConfigKey::Url => {
            if let Some(url) = value {
                // Reject obviously broken URLs before they are stored
                ApiClient::new(klokku_core::ClientConfig::new(url.clone()))
                    .with_context(|| format!("Invalid url '{}'", url))?;
            }
            config.base_url = value.cloned();
        }
        ConfigKey::Username => config.last_username = value.cloned(),
        ConfigKey::Timeout => config.timeout_secs = parse(key, value)?,
        ConfigKey::Retries => config.max_rate_limit_retries = parse(key, value)?,
        ConfigKey::SessionTtl => {
            let minutes: Option<i64> = parse(key, value)?;
            if let Some(minutes) = minutes {
                klokku_core::config::session_ttl_from_minutes(minutes)?;
            }
            config.session_ttl_minutes = minutes;
        }
    }
    Ok(())
}
