//! Page driver layer.
//!
//! The live page is an external collaborator: the loop and policies only
//! need to query element text/attributes and dispatch simulated key
//! presses. That capability set is the [`PageDriver`] trait, with one real
//! implementation ([`webdriver::WebDriverClient`]) speaking the W3C
//! WebDriver protocol. Tests drive the reader and the control loop through
//! hand-rolled fakes instead of a browser.

pub mod webdriver;

use std::collections::HashMap;

use thiserror::Error;

/// Errors from the real page driver. Parse-level problems never surface
/// here — these are transport and protocol faults that end the run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("webdriver request failed: {0}")]
    Transport(String),
    #[error("webdriver protocol error ({status}): {message}")]
    Protocol { status: u16, message: String },
    #[error("webdriver response missing field: {0}")]
    MalformedResponse(&'static str),
}

/// Text plus requested attributes for one matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementView {
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl ElementView {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Capability set the automation needs from a live page.
///
/// Implementations report a missing element as `None` (or an empty list),
/// never as an error — absence is an expected page state. Errors are
/// reserved for the driver itself becoming unusable.
pub trait PageDriver {
    /// Text content of the first element matching `selector`.
    fn query_text(&mut self, selector: &str) -> Result<Option<String>, DriverError>;

    /// Attribute value of the first element matching `selector`.
    fn query_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Text and the named attributes for every element matching `selector`.
    fn query_all(
        &mut self,
        selector: &str,
        attrs: &[&str],
    ) -> Result<Vec<ElementView>, DriverError>;

    /// Dispatch a single key press to the page.
    fn press_key(&mut self, key: char) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify the trait is object-safe (the loop holds a &mut dyn PageDriver).
    #[test]
    fn trait_is_object_safe() {
        struct Null;
        impl PageDriver for Null {
            fn query_text(&mut self, _: &str) -> Result<Option<String>, DriverError> {
                Ok(None)
            }
            fn query_attribute(
                &mut self,
                _: &str,
                _: &str,
            ) -> Result<Option<String>, DriverError> {
                Ok(None)
            }
            fn query_all(
                &mut self,
                _: &str,
                _: &[&str],
            ) -> Result<Vec<ElementView>, DriverError> {
                Ok(vec![])
            }
            fn press_key(&mut self, _: char) -> Result<(), DriverError> {
                Ok(())
            }
        }

        fn _accepts_dyn(_driver: &mut dyn PageDriver) {}
        let mut null = Null;
        _accepts_dyn(&mut null);
    }

    #[test]
    fn element_view_attribute_lookup() {
        let mut view = ElementView::default();
        view.attributes
            .insert("data-row".to_string(), "3".to_string());
        assert_eq!(view.attribute("data-row"), Some("3"));
        assert_eq!(view.attribute("data-col"), None);
    }
}
