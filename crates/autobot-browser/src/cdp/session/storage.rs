//! Cookie and local-storage access for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::Cookie;
use crate::storage::{LocalStorageEntry, OriginStorage, StorageState};

use super::core::PageSession;

impl PageSession {
    /// All cookies in the browser context.
    pub async fn get_all_cookies(&self) -> Result<Vec<Cookie>, CdpError> {
        let result = self.call("Network.getAllCookies", None).await?;
        let cookies: Vec<Cookie> = serde_json::from_value(result["cookies"].clone())?;
        Ok(cookies)
    }

    /// Install cookies into the browser context.
    pub async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), CdpError> {
        if cookies.is_empty() {
            return Ok(());
        }
        // An explicit negative expiry makes Chrome drop the cookie on arrival.
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let mut value = serde_json::to_value(cookie)?;
            if cookie.is_session() {
                if let Some(fields) = value.as_object_mut() {
                    fields.remove("expires");
                }
            }
            params.push(value);
        }
        self.call("Network.setCookies", Some(json!({"cookies": params})))
            .await?;
        debug!("Restored {} cookies", cookies.len());
        Ok(())
    }

    /// Local storage of the current document's origin.
    pub async fn local_storage(&self) -> Result<Option<OriginStorage>, CdpError> {
        let value = self
            .evaluate(
                "(() => { try { return { origin: location.origin, entries: Object.entries(localStorage) }; } catch (e) { return null; } })()",
            )
            .await?;

        let origin = match value["origin"].as_str() {
            Some(origin) if origin.starts_with("http") => origin.to_string(),
            _ => return Ok(None),
        };

        let entries = value["entries"]
            .as_array()
            .map(|pairs| {
                pairs
                    .iter()
                    .filter_map(|pair| {
                        Some(LocalStorageEntry {
                            name: pair.get(0)?.as_str()?.to_string(),
                            value: pair.get(1)?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(OriginStorage {
            origin,
            local_storage: entries,
        }))
    }

    /// Snapshot the authentication state of this page's browser context.
    pub async fn export_storage_state(&self) -> Result<StorageState, CdpError> {
        let cookies = self.get_all_cookies().await?;
        let origins = self.local_storage().await?.into_iter().collect();
        Ok(StorageState { cookies, origins })
    }
}
