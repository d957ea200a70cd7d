use std::env;

use jiff::civil::Date;
use jiff::ToSpan;
use log::{info, warn};
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

use super::scrape;

const BASE_URL: &str = "https://partners.stackcommerce.com";

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("failed to scrape {what} from the {page}")]
    Scrape {
        what: &'static str,
        page: &'static str,
    },
    #[error("fetch attempted before a successful login")]
    NotLoggedIn,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Reported outcome of a login attempt.  A rejected login is not an error:
/// the caller must check it and abort the pipeline instead of fetching.
#[derive(Debug, PartialEq)]
pub enum LoginOutcome {
    Success,
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub email: String,
    pub password: String,
    /// The `cur_partner` slug on the export endpoints, e.g. `vendor-2800`.
    pub vendor: String,
}

impl PortalConfig {
    pub fn from_env() -> Result<PortalConfig, env::VarError> {
        Ok(PortalConfig {
            base_url: env::var("STACK_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string()),
            email: env::var("STACK_EMAIL")?,
            password: env::var("STACK_PASSWORD")?,
            vendor: env::var("STACK_VENDOR")?,
        })
    }
}

/// Tokens scraped from the authenticated landing page.  Sent as headers on
/// every API call; never logged.
struct Credentials {
    delegate_token: String,
    partner: String,
}

/// One authenticated HTTP session against the partner portal.  Holds the
/// cookie jar and the scraped credentials; signs out on drop, best effort.
pub struct PortalSession {
    config: PortalConfig,
    client: Client,
    credentials: Option<Credentials>,
}

impl PortalSession {
    pub fn connect(config: PortalConfig) -> Result<PortalSession, PortalError> {
        info!("Initialize portal session.");
        let client = Client::builder().cookie_store(true).build()?;
        Ok(PortalSession {
            config,
            client,
            credentials: None,
        })
    }

    /// Sign in and scrape the delegate token and partner id.  The portal
    /// reports bad credentials with a banner on the returned form, not with
    /// a status code, so a rejected login comes back as an outcome.
    pub fn login(&mut self) -> Result<LoginOutcome, PortalError> {
        info!("Collect token for login.");
        let resp = self
            .client
            .get(format!("{}/sign_in#/sales", self.config.base_url))
            .send()?;
        let page = resp.text()?;
        let csrf_token = scrape::csrf_token(&page).ok_or(PortalError::Scrape {
            what: "authenticity_token",
            page: "sign-in page",
        })?;
        info!("Token has been collected.");

        let form = [
            ("authenticity_token", csrf_token.as_str()),
            ("commit", "Log In"),
            ("user[email]", self.config.email.as_str()),
            ("user[password]", self.config.password.as_str()),
            ("user[remember_me]", "0"),
        ];
        let resp = self
            .client
            .post(format!("{}/session", self.config.base_url))
            .form(&form)
            .send()?;
        let body = resp.text()?;
        if let Some(message) = scrape::login_failure(&body) {
            warn!("Issue with login: {}", message);
            return Ok(LoginOutcome::Rejected(message));
        }

        let resp = self
            .client
            .get(format!("{}/#/orders", self.config.base_url))
            .send()?;
        let landing = resp.text()?;
        let (delegate_token, partner) =
            scrape::app_credentials(&landing).ok_or(PortalError::Scrape {
                what: "delegate token and partner id",
                page: "landing page",
            })?;
        self.credentials = Some(Credentials {
            delegate_token,
            partner,
        });
        info!("Login successful; delegate token and partner id have been scraped.");
        Ok(LoginOutcome::Success)
    }

    fn credentials(&self) -> Result<&Credentials, PortalError> {
        self.credentials.as_ref().ok_or(PortalError::NotLoggedIn)
    }

    /// Batch ids for the orders placed in `[date_from, date_to]`.  The
    /// server paginates silently past ~30 days, so callers keep the window
    /// within that limit.  A non-2xx status is logged and whatever is
    /// parseable is returned.
    pub fn order_batches(
        &self,
        date_from: Date,
        date_to: Date,
    ) -> Result<Vec<String>, PortalError> {
        let creds = self.credentials()?;
        let url = format!(
            "{}/api/vendor/batches?end_at={}&order_view=1&start_at={}",
            self.config.base_url,
            batch_bound(date_to),
            batch_bound(date_from),
        );
        info!("Request orders batches...");
        let resp = self
            .client
            .get(url)
            .header("X-Current-Partner", &creds.partner)
            .header("X-Stack-Access-Token", &creds.delegate_token)
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            warn!("batches request returned {}: {}", status, body);
        }
        info!(
            "Period {} - {}: batch ids have been collected.",
            batch_bound(date_from),
            batch_bound(date_to)
        );
        Ok(parse_batch_ids(&body))
    }

    /// Raw orders export for the given batch ids.  One repeated
    /// `batch_ids[]` parameter per id, in order.  A non-2xx status is logged
    /// but the body is returned regardless; the loader's CSV parse is the
    /// content check.
    pub fn download_orders(&self, batches: &[String]) -> Result<String, PortalError> {
        let creds = self.credentials()?;
        let url = orders_export_url(&self.config.base_url, &self.config.vendor, batches);
        info!("Request order report from Stack");
        let resp = self
            .client
            .get(url)
            .header("X-Current-Partner", &creds.partner)
            .header("X-Stack-Access-Token", &creds.delegate_token)
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            warn!("Issue with orders request, status {}: {}", status, body);
        }
        info!("Order report received.");
        Ok(body)
    }

    /// Raw earnings CSV for `[date_from, date_to]`.  The end bound extends
    /// one day past `date_to` so the full last day is included; the literal
    /// `-07:00` offset matches what the server expects and is kept as is.
    pub fn download_earnings(
        &self,
        date_from: Date,
        date_to: Date,
    ) -> Result<String, PortalError> {
        let creds = self.credentials()?;
        let start_at = earnings_start(date_from);
        let end_at = earnings_end(date_to);
        let url = format!(
            "{}/earnings.csv?cur_partner={}&start_at={}&end_at={}",
            self.config.base_url, self.config.vendor, start_at, end_at,
        );
        info!("Request earnings report from Stack");
        let resp = self
            .client
            .get(url)
            .header("X-Current-Partner", &creds.partner)
            .header("X-Stack-Access-Token", &creds.delegate_token)
            .send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            warn!("Issue with earnings request, status {}: {}", status, body);
        }
        info!("Period {} - {}: earnings report received.", start_at, end_at);
        Ok(body)
    }
}

impl Drop for PortalSession {
    fn drop(&mut self) {
        info!("Sign out from Stack.");
        let url = format!("{}/sign_out", self.config.base_url);
        if let Err(e) = self.client.get(url).send() {
            warn!("sign out failed: {}", e);
        }
        info!("Close session.");
    }
}

/// Both batch-window bounds use a fixed end-of-day UTC convention.
fn batch_bound(date: Date) -> String {
    date.strftime("%Y-%m-%dT22:00:00.000Z").to_string()
}

fn earnings_start(date: Date) -> String {
    date.strftime("%Y-%m-%dT00:00:00-07:00").to_string()
}

fn earnings_end(date: Date) -> String {
    date.saturating_add(1.day())
        .strftime("%Y-%m-%dT23:59:59-07:00")
        .to_string()
}

fn orders_export_url(base_url: &str, vendor: &str, batches: &[String]) -> String {
    let mut url = format!("{}/vendor/batches?cur_partner={}", base_url, vendor);
    for batch in batches {
        url.push_str("&batch_ids%5B%5D=");
        url.push_str(batch);
    }
    url
}

/// Pull the numeric batch ids out of the batches response, string form.
/// A body that is not the expected JSON yields an empty list (logged), not
/// an error: the endpoint is unreliable about status codes and shapes.
fn parse_batch_ids(body: &str) -> Vec<String> {
    let v: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("batches response is not JSON: {}", e);
            return Vec::new();
        }
    };
    let batches = match &v["batches"] {
        Value::Array(xs) => xs,
        _ => {
            warn!("batches response has no 'batches' array");
            return Vec::new();
        }
    };
    batches
        .iter()
        .filter_map(|b| b["id"].as_i64())
        .map(|id| id.to_string())
        .collect()
}
