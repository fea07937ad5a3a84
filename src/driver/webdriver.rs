//! W3C WebDriver client over blocking HTTP.
//!
//! Talks to a chromedriver-compatible endpoint with plain `ureq` requests —
//! session lifecycle, CSS element lookup, text/attribute reads, and key
//! dispatch to the page body. Only the handful of endpoints the autoplayer
//! needs; this is not a general WebDriver binding.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{DriverError, ElementView, PageDriver};

/// W3C element identifier key in responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const LOCATOR_CSS: &str = "css selector";

/// Build the `POST /session` payload.
///
/// Headless runs use Chrome's new headless mode; visible runs start a normal
/// window so the final board can be inspected.
pub fn new_session_payload(headless: bool) -> Value {
    let mut args = vec!["--disable-gpu".to_string(), "--window-size=900,900".to_string()];
    if headless {
        args.push("--headless=new".to_string());
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

/// Pull a W3C element reference out of a `value` object.
pub fn extract_element_ref(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn transport_err(e: impl std::fmt::Display) -> DriverError {
    DriverError::Transport(e.to_string())
}

/// Pull the protocol error message from an error response body, if any.
fn protocol_message(body: &Value) -> String {
    body.get("value")
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("(no message)")
        .to_string()
}

fn is_no_such_element(body: &Value) -> bool {
    body.get("value")
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        == Some("no such element")
}

/// Blocking WebDriver session against a chromedriver-compatible endpoint.
pub struct WebDriverClient {
    agent: ureq::Agent,
    base: String,
    session_id: String,
}

impl WebDriverClient {
    /// Open a new browser session.
    pub fn connect(endpoint: &str, headless: bool) -> Result<Self, DriverError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        let base = endpoint.trim_end_matches('/').to_string();

        let body = agent
            .post(&format!("{base}/session"))
            .send_json(new_session_payload(headless))
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => {
                    let body: Value = resp.into_json().unwrap_or(Value::Null);
                    DriverError::Protocol {
                        status,
                        message: protocol_message(&body),
                    }
                }
                other => transport_err(other),
            })?
            .into_json::<Value>()
            .map_err(transport_err)?;

        let session_id = body
            .get("value")
            .and_then(|v| v.get("sessionId"))
            .and_then(Value::as_str)
            .ok_or(DriverError::MalformedResponse("value.sessionId"))?
            .to_string();

        info!(endpoint = %base, session = %session_id, headless, "webdriver session created");
        Ok(Self {
            agent,
            base,
            session_id,
        })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.base, self.session_id)
    }

    /// POST a command under the session, treating "no such element" as an
    /// absent result rather than an error.
    fn post(&self, path: &str, payload: Value) -> Result<Option<Value>, DriverError> {
        match self.agent.post(&self.session_url(path)).send_json(payload) {
            Ok(resp) => {
                let body: Value = resp.into_json().map_err(transport_err)?;
                Ok(Some(body))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body: Value = resp.into_json().unwrap_or(Value::Null);
                if is_no_such_element(&body) {
                    return Ok(None);
                }
                Err(DriverError::Protocol {
                    status,
                    message: protocol_message(&body),
                })
            }
            Err(e) => Err(transport_err(e)),
        }
    }

    fn get(&self, path: &str) -> Result<Value, DriverError> {
        match self.agent.get(&self.session_url(path)).call() {
            Ok(resp) => resp.into_json().map_err(transport_err),
            Err(ureq::Error::Status(status, resp)) => {
                let body: Value = resp.into_json().unwrap_or(Value::Null);
                Err(DriverError::Protocol {
                    status,
                    message: protocol_message(&body),
                })
            }
            Err(e) => Err(transport_err(e)),
        }
    }

    /// Navigate the session to `url`.
    pub fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.post("/url", json!({ "url": url }))?
            .ok_or(DriverError::MalformedResponse("navigate response"))?;
        debug!(url, "navigated");
        Ok(())
    }

    /// Tear the browser session down. Safe to call exactly once; the run
    /// calls it unconditionally after the loop ends.
    pub fn close(self) -> Result<(), DriverError> {
        match self.agent.delete(&self.session_url("")).call() {
            Ok(_) => {
                info!(session = %self.session_id, "webdriver session closed");
                Ok(())
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body: Value = resp.into_json().unwrap_or(Value::Null);
                Err(DriverError::Protocol {
                    status,
                    message: protocol_message(&body),
                })
            }
            Err(e) => Err(transport_err(e)),
        }
    }

    /// Find the first element matching a CSS selector.
    fn find_element(&self, selector: &str) -> Result<Option<String>, DriverError> {
        let Some(body) = self.post(
            "/element",
            json!({ "using": LOCATOR_CSS, "value": selector }),
        )?
        else {
            return Ok(None);
        };

        let value = body
            .get("value")
            .ok_or(DriverError::MalformedResponse("value"))?;
        Ok(extract_element_ref(value))
    }

    /// Find every element matching a CSS selector.
    fn find_elements(&self, selector: &str) -> Result<Vec<String>, DriverError> {
        let Some(body) = self.post(
            "/elements",
            json!({ "using": LOCATOR_CSS, "value": selector }),
        )?
        else {
            return Ok(vec![]);
        };

        let refs = body
            .get("value")
            .and_then(Value::as_array)
            .ok_or(DriverError::MalformedResponse("value array"))?;
        Ok(refs.iter().filter_map(extract_element_ref).collect())
    }

    fn element_text(&self, element: &str) -> Result<String, DriverError> {
        let body = self.get(&format!("/element/{element}/text"))?;
        Ok(body
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    fn element_attribute(
        &self,
        element: &str,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let body = self.get(&format!("/element/{element}/attribute/{name}"))?;
        Ok(body
            .get("value")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

impl PageDriver for WebDriverClient {
    fn query_text(&mut self, selector: &str) -> Result<Option<String>, DriverError> {
        match self.find_element(selector)? {
            Some(element) => Ok(Some(self.element_text(&element)?)),
            None => Ok(None),
        }
    }

    fn query_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        match self.find_element(selector)? {
            Some(element) => self.element_attribute(&element, name),
            None => Ok(None),
        }
    }

    fn query_all(
        &mut self,
        selector: &str,
        attrs: &[&str],
    ) -> Result<Vec<ElementView>, DriverError> {
        let elements = self.find_elements(selector)?;
        let mut views = Vec::with_capacity(elements.len());

        for element in elements {
            let text = self.element_text(&element)?;
            let mut attributes = HashMap::new();
            for &name in attrs {
                if let Some(value) = self.element_attribute(&element, name)? {
                    attributes.insert(name.to_string(), value);
                }
            }
            views.push(ElementView { text, attributes });
        }

        Ok(views)
    }

    fn press_key(&mut self, key: char) -> Result<(), DriverError> {
        // Keys go to the page body, matching how the game binds its listener.
        let Some(body_el) = self.find_element("body")? else {
            warn!("page has no body element; key press dropped");
            return Ok(());
        };
        self.post(
            &format!("/element/{body_el}/value"),
            json!({ "text": key.to_string() }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_payload_headless_adds_flag() {
        let payload = new_session_payload(true);
        let args = payload["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn session_payload_visible_omits_flag() {
        let payload = new_session_payload(false);
        let args = payload["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
        assert_eq!(
            payload["capabilities"]["alwaysMatch"]["browserName"],
            "chrome"
        );
    }

    #[test]
    fn element_ref_extraction() {
        let value = json!({ "element-6066-11e4-a52e-4f735466cecf": "abc-123" });
        assert_eq!(extract_element_ref(&value), Some("abc-123".to_string()));

        let empty = json!({});
        assert_eq!(extract_element_ref(&empty), None);
    }

    #[test]
    fn no_such_element_detection() {
        let body = json!({ "value": { "error": "no such element", "message": "..." } });
        assert!(is_no_such_element(&body));

        let other = json!({ "value": { "error": "timeout", "message": "..." } });
        assert!(!is_no_such_element(&other));
        assert!(!is_no_such_element(&Value::Null));
    }

    #[test]
    fn protocol_message_falls_back() {
        let body = json!({ "value": { "message": "session deleted" } });
        assert_eq!(protocol_message(&body), "session deleted");
        assert_eq!(protocol_message(&Value::Null), "(no message)");
    }
}
