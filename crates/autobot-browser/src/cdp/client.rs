//! Browser-level CDP connection.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use super::error::CdpError;
use super::protocol::{BrowserVersion, PageInfo};
use super::session::PageSession;
use super::transport::Transport;

/// Connection to one Chrome instance.
///
/// Owns the browser WebSocket. Page sessions share its [`Transport`] and
/// address their commands by session id.
pub struct CdpClient {
    /// HTTP endpoint for target discovery.
    http_endpoint: String,
    browser_ws_url: String,
    transport: Arc<Transport>,
    reader: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint (e.g. `http://127.0.0.1:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let version = Self::version(&http_endpoint).await?;
        debug!(
            "Found {} (protocol {})",
            version.browser, version.protocol_version
        );

        let browser_ws_url = version.web_socket_debugger_url;
        url::Url::parse(&browser_ws_url)?;

        let (stream, _) = tokio_tungstenite::connect_async(browser_ws_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (transport, source) = Transport::split(stream);
        let transport = Arc::new(transport);
        let reader = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.pump(source).await })
        };

        debug!("Attached to browser socket {}", browser_ws_url);
        Ok(Self {
            http_endpoint,
            browser_ws_url,
            transport,
            reader,
        })
    }

    async fn version(http_endpoint: &str) -> Result<BrowserVersion, CdpError> {
        let unavailable = |e: reqwest::Error| {
            CdpError::ChromeNotAvailable(format!("{}: {}", http_endpoint, e))
        };
        reqwest::get(format!("{}/json/version", http_endpoint))
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.send(method, params, None).await
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Targets reported by the HTTP endpoint.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        Ok(reqwest::get(url).await?.json().await?)
    }

    /// Open a tab (optionally at `url`) and attach to it.
    pub async fn new_page(&self, url: Option<&str>) -> Result<PageSession, CdpError> {
        // /json/new only accepts PUT on current Chrome.
        let create_url = match url {
            Some(u) => format!("{}/json/new?{}", self.http_endpoint, u),
            None => format!("{}/json/new", self.http_endpoint),
        };
        let page: PageInfo = reqwest::Client::new()
            .put(create_url)
            .send()
            .await?
            .json()
            .await?;
        debug!("Opened tab {} at {}", page.id, page.url);

        self.attach_page(&page.id).await
    }

    /// Attach a flattened session to an existing tab.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;
        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("attachToTarget without sessionId".into()))?;

        let session = PageSession::new(
            target_id.to_string(),
            session_id.to_string(),
            self.transport.clone(),
        );
        session.enable_domains().await?;
        Ok(session)
    }

    /// Ask Chrome to exit.
    pub async fn close_browser(&self) -> Result<(), CdpError> {
        self.call("Browser.close", None).await.map(|_| ())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.transport.close();
    }
}
