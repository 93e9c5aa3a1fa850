use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. The first caller's timeout and user agent stick
/// for the rest of the process.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build http client")
    })
}
