use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{error::CmdError, Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;
use webdriver::capabilities::Capabilities;

use crate::automation::{Ack, ActionChannel, DriverError, FocusedInput, Intent, RemotePage};

/// Where and how to open the browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDriverSettings {
    /// WebDriver service endpoint.
    pub url: String,
    pub headless: bool,
    /// Window size in CSS pixels.
    pub window: (u32, u32),
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".to_string(),
            headless: false,
            window: (1440, 900),
        }
    }
}

/// Chrome command-line arguments for the given settings.
pub fn chrome_arguments(settings: &WebDriverSettings) -> Vec<String> {
    let mut args = vec![
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!("--window-size={},{}", settings.window.0, settings.window.1),
    ];
    if settings.headless {
        args.push("--headless".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

const IS_FOCUSED_JS: &str = r#"
    const el = document.querySelector(arguments[0]);
    return el !== null && document.activeElement === el;
"#;
const SELECT_ALL_JS: &str = "document.execCommand('selectAll'); return null;";
const DELETE_JS: &str = "document.execCommand('delete'); return null;";

/// A `fantoccini` WebDriver session acting as both page proxy and action channel.
#[derive(Clone)]
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Connect to a running WebDriver service (Chromedriver by default).
    pub async fn connect(settings: &WebDriverSettings) -> Result<Self> {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": chrome_arguments(settings) }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.url)
            .await
            .with_context(|| format!("failed to open WebDriver session at {}", settings.url))?;

        info!(target: "pilot.browser", endpoint = %settings.url, headless = settings.headless, "session opened");
        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Navigate to `url`.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).with_context(|| format!("invalid target url: {url}"))?;
        self.client.goto(parsed.as_str()).await?;
        info!(target: "pilot.browser", url = %parsed, "navigated");
        Ok(())
    }

    /// Return the current page URL.
    pub async fn current_url(&self) -> Result<Url> {
        self.client.current_url().await.map_err(anyhow::Error::from)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|err| DriverError::Remote(err.to_string()))
    }
}

fn lookup_or_remote(selector: &str, err: CmdError) -> DriverError {
    if err.is_no_such_element() {
        DriverError::lookup(selector)
    } else {
        DriverError::Remote(err.to_string())
    }
}

#[async_trait]
impl RemotePage for WebDriverSession {
    async fn current_value(&self, selector: &str) -> Result<Option<String>, DriverError> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|err| lookup_or_remote(selector, err))?;
        element
            .prop("value")
            .await
            .map_err(|err| lookup_or_remote(selector, err))
    }

    // An element that has not rendered yet reads as unfocused so the focus
    // loop keeps clicking instead of failing.
    async fn is_selected(&self, selector: &str) -> Result<bool, DriverError> {
        let answer = self
            .run_script(IS_FOCUSED_JS, vec![json!(selector)])
            .await?;
        debug!(target: "pilot.browser", %selector, focused = ?answer, "focus poll");
        Ok(answer.as_bool().unwrap_or(false))
    }

    fn focused(&self) -> &dyn FocusedInput {
        self
    }
}

#[async_trait]
impl FocusedInput for WebDriverSession {
    async fn select_all(&self) -> Result<(), DriverError> {
        self.run_script(SELECT_ALL_JS, vec![]).await.map(|_| ())
    }

    async fn delete_selection(&self) -> Result<(), DriverError> {
        self.run_script(DELETE_JS, vec![]).await.map(|_| ())
    }
}

#[async_trait]
impl ActionChannel for WebDriverSession {
    async fn submit(&self, intent: Intent) -> Result<Ack, DriverError> {
        let outcome = match &intent {
            Intent::Click(selector) => match self.client.find(Locator::Css(selector)).await {
                Ok(element) => element.click().await,
                Err(err) => Err(err),
            },
            Intent::Type(text) => match self.client.active_element().await {
                Ok(element) => element.send_keys(text).await,
                Err(err) => Err(err),
            },
        };
        outcome
            .map(|_| Ack)
            .map_err(|err| DriverError::channel(intent, err.to_string()))
    }
}
