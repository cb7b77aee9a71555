#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use poalim_scraper::page::SessionPage;

/// A `SessionPage` with fully scripted behavior: which selectors exist,
/// which URL the page lands on a couple of polls after the submit button
/// is clicked, and what each evaluated script returns (first configured
/// pattern contained in the expression wins). Every call is recorded so
/// tests can assert ordering.
pub struct ScriptedPage {
    state: Mutex<State>,
}

struct State {
    current_url: String,
    selectors: HashSet<String>,
    element_texts: HashMap<String, String>,
    redirect_target: Option<String>,
    redirect_polls_remaining: usize,
    redirect_armed: bool,
    eval_responses: Vec<(String, Value)>,
    cookies: HashMap<String, String>,
    log: Vec<String>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                current_url: "about:blank".to_string(),
                selectors: HashSet::new(),
                element_texts: HashMap::new(),
                redirect_target: None,
                redirect_polls_remaining: 2,
                redirect_armed: false,
                eval_responses: Vec::new(),
                cookies: HashMap::new(),
                log: Vec::new(),
            }),
        }
    }

    /// Selectors that exist in the scripted DOM.
    pub fn with_selectors(self, selectors: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for selector in selectors {
                state.selectors.insert((*selector).to_string());
            }
        }
        self
    }

    /// URL the page reports shortly after the submit button is clicked.
    pub fn with_redirect(self, target: &str) -> Self {
        self.state.lock().unwrap().redirect_target = Some(target.to_string());
        self
    }

    /// Scripted evaluate response for any expression containing `pattern`.
    pub fn with_eval(self, pattern: &str, response: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .eval_responses
            .push((pattern.to_string(), response));
        self
    }

    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_element_text(self, selector: &str, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .element_texts
            .insert(selector.to_string(), text.to_string());
        self
    }

    /// Everything the page was asked to do, in order.
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }
}

impl Default for ScriptedPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionPage for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("goto {url}"));
        state.current_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.redirect_armed {
            if state.redirect_polls_remaining == 0 {
                if let Some(target) = state.redirect_target.clone() {
                    state.current_url = target;
                }
                state.redirect_armed = false;
            } else {
                state.redirect_polls_remaining -= 1;
            }
        }
        Ok(state.current_url.clone())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("wait_for_selector {selector}"));
        if state.selectors.contains(selector) {
            Ok(())
        } else {
            Err(anyhow!("timed out waiting for selector {selector}"))
        }
    }

    async fn type_into(&self, selector: &str, _text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("type {selector}"));
        if state.selectors.contains(selector) {
            Ok(())
        } else {
            Err(anyhow!("element {selector} not found"))
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("click {selector}"));
        if !state.selectors.contains(selector) {
            return Err(anyhow!("element {selector} not found"));
        }
        if selector == ".login-btn" && state.redirect_target.is_some() {
            state.redirect_armed = true;
        }
        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .element_texts
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("element {selector} not found"))
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("evaluate {expression}"));
        for (pattern, response) in &state.eval_responses {
            if expression.contains(pattern.as_str()) {
                return Ok(response.clone());
            }
        }
        Err(anyhow!("no scripted response for expression: {expression}"))
    }

    async fn cookies(&self) -> Result<HashMap<String, String>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().log.push("close".to_string());
        Ok(())
    }
}
