//! DOM operations for CDP page session.
//!
//! `DOM.getDocument` discards previously issued node ids, so anything that
//! must outlive a later query is addressed by its backend node id instead.

use serde_json::json;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{BoxModel, DomNode};

use super::core::PageSession;

impl PageSession {
    /// Get document root node.
    pub async fn get_document(&self) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;

        let root: DomNode = serde_json::from_value(result["root"].clone())?;
        Ok(root)
    }

    /// Query selector. The node id is valid until the next query.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let doc = self.get_document().await?;

        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({
                    "nodeId": doc.node_id,
                    "selector": selector,
                })),
            )
            .await?;

        let node_id = result["nodeId"].as_i64().unwrap_or(0);
        if node_id == 0 {
            Ok(None)
        } else {
            Ok(Some(node_id))
        }
    }

    /// Query selector all, returning stable backend node ids in document order.
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<i64>, CdpError> {
        let doc = self.get_document().await?;

        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({
                    "nodeId": doc.node_id,
                    "selector": selector,
                })),
            )
            .await?;

        let node_ids: Vec<i64> = result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        let mut backend_ids = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            backend_ids.push(self.backend_node_id(node_id).await?);
        }
        Ok(backend_ids)
    }

    /// Resolve a transient node id to its backend node id.
    pub async fn backend_node_id(&self, node_id: i64) -> Result<i64, CdpError> {
        let result = self
            .call("DOM.describeNode", Some(json!({"nodeId": node_id})))
            .await?;

        result["node"]["backendNodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing backendNodeId".to_string()))
    }

    /// Get box model for a backend node. `None` when the node is not rendered.
    pub async fn get_box_model(&self, backend_node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call(
                "DOM.getBoxModel",
                Some(json!({"backendNodeId": backend_node_id})),
            )
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Scroll a backend node into the viewport if it is not already visible.
    pub async fn scroll_into_view(&self, backend_node_id: i64) -> Result<(), CdpError> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            Some(json!({"backendNodeId": backend_node_id})),
        )
        .await?;
        Ok(())
    }

    /// Click the center of a backend node.
    pub async fn click_node(&self, backend_node_id: i64) -> Result<(), CdpError> {
        let box_model = self.get_box_model(backend_node_id).await?.ok_or_else(|| {
            CdpError::ElementNotFound(format!("node {} (not visible)", backend_node_id))
        })?;

        let (x, y) = Self::quad_center(&box_model.content);
        self.click(x, y).await
    }

    /// Click on element by selector.
    pub async fn click_selector(&self, selector: &str) -> Result<(), CdpError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        let backend_node_id = self.backend_node_id(node_id).await?;
        self.scroll_into_view(backend_node_id).await?;
        self.click_node(backend_node_id).await
    }

    /// Fill an input by selector.
    ///
    /// Goes through the prototype's value setter and dispatches
    /// input/change/blur, which controlled (React) inputs require to pick up
    /// the new value.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<(), CdpError> {
        let expression = format!(
            r#"((selector, value) => {{
                const el = document.querySelector(selector);
                if (!el) return false;
                el.focus();
                const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value').set;
                setter.call(el, value);
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.dispatchEvent(new Event('blur', {{ bubbles: true }}));
                el.blur();
                return true;
            }})({}, {})"#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?
        );

        match self.evaluate(&expression).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(CdpError::ElementNotFound(selector.to_string())),
        }
    }

    /// Visible text of the first element matching `selector`, if any.
    pub async fn text_content(&self, selector: &str) -> Result<Option<String>, CdpError> {
        let expression = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            serde_json::to_string(selector)?
        );
        let value = self.evaluate(&expression).await?;
        Ok(value
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// Calculate center point of a quad.
    pub(super) fn quad_center(quad: &[f64]) -> (f64, f64) {
        if quad.len() >= 8 {
            let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
            let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
            (x, y)
        } else {
            (0.0, 0.0)
        }
    }
}
