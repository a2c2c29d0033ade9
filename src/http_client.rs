use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const REQUEST_TIMEOUT_SECS: u64 = 20;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) cbb_scrape/0.1";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}

/// Single GET of a stats page. Non-2xx responses are errors; nothing is retried here.
pub fn fetch_page(url: &str) -> Result<String> {
    let resp = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("request {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("{url} returned {status}"));
    }
    resp.text().with_context(|| format!("read body of {url}"))
}
