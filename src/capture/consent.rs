//! Cookie/consent banner dismissal.
//!
//! An ordered list of [`DismissRule`]s. Each rule looks for a visible element
//! matching one of its candidates and clicks it; the first successful click
//! ends the pass. A pass where no rule fires is a normal outcome since most
//! pages show no banner at all.

use crate::rendering::{RenderSession, Selector};
use log::{debug, info};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DismissRule {
    pub name: String,
    pub candidates: Vec<Selector>,
}

impl DismissRule {
    pub fn new(name: &str, candidates: Vec<Selector>) -> Self {
        Self {
            name: name.to_string(),
            candidates,
        }
    }

    fn css(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors.iter().map(|s| Selector::css(s)).collect())
    }

    fn texts(name: &str, labels: &[&str]) -> Self {
        Self::new(name, labels.iter().map(|s| Selector::button_text(s)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissOutcome {
    Dismissed { rule: String, selector: Selector },
    NotFound,
}

pub struct ConsentDismisser {
    rules: Vec<DismissRule>,
    probe_timeout: Duration,
    click_timeout: Duration,
}

impl ConsentDismisser {
    pub fn new(rules: Vec<DismissRule>, probe_timeout: Duration, click_timeout: Duration) -> Self {
        Self {
            rules,
            probe_timeout,
            click_timeout,
        }
    }

    /// Default rules followed by one rule holding `extra` CSS selectors, if any.
    pub fn with_defaults(extra: &[String], probe_timeout: Duration, click_timeout: Duration) -> Self {
        let mut rules = default_rules();
        if !extra.is_empty() {
            rules.push(DismissRule::new(
                "configured",
                extra.iter().map(|s| Selector::css(s)).collect(),
            ));
        }
        Self::new(rules, probe_timeout, click_timeout)
    }

    pub fn rules(&self) -> &[DismissRule] {
        &self.rules
    }

    pub async fn dismiss(&self, session: &mut dyn RenderSession) -> DismissOutcome {
        for rule in &self.rules {
            let element = match session
                .find_first_visible(&rule.candidates, self.probe_timeout)
                .await
            {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Consent rule '{}' lookup failed: {}", rule.name, e);
                    continue;
                }
            };

            match session.click(&element, self.click_timeout).await {
                Ok(()) => {
                    info!("Dismissed consent banner via '{}' ({})", rule.name, element.selector);
                    return DismissOutcome::Dismissed {
                        rule: rule.name.clone(),
                        selector: element.selector,
                    };
                }
                Err(e) => debug!("Consent rule '{}' click failed: {}", rule.name, e),
            }
        }
        debug!("No consent banner found");
        DismissOutcome::NotFound
    }
}

/// Common consent-management vendors first, then text-matched buttons, then
/// generic cookie containers.
pub fn default_rules() -> Vec<DismissRule> {
    vec![
        DismissRule::css("onetrust", &["#onetrust-accept-btn-handler"]),
        DismissRule::css(
            "cookiebot",
            &[
                "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
                "#CybotCookiebotDialogBodyButtonAccept",
            ],
        ),
        DismissRule::css("didomi", &["#didomi-notice-agree-button"]),
        DismissRule::css(
            "quantcast",
            &[".qc-cmp2-summary-buttons button[mode='primary']"],
        ),
        DismissRule::css("trustarc", &["#truste-consent-button"]),
        DismissRule::css("usercentrics", &["button[data-testid='uc-accept-all-button']"]),
        DismissRule::texts(
            "accept-en",
            &["Accept all", "Accept all cookies", "Accept cookies", "Accept", "I agree", "Agree", "Allow all", "Got it"],
        ),
        DismissRule::texts(
            "accept-pt",
            &["Aceitar todos", "Aceitar cookies", "Aceitar", "Aceito", "Concordo", "Entendi", "Permitir todos"],
        ),
        DismissRule::texts(
            "accept-es",
            &["Aceptar todo", "Aceptar todas", "Aceptar", "Acepto", "Estoy de acuerdo"],
        ),
        DismissRule::texts("accept-fr", &["Tout accepter", "Accepter", "J'accepte"]),
        DismissRule::texts("accept-de", &["Alle akzeptieren", "Akzeptieren", "Zustimmen"]),
        DismissRule::texts("accept-it", &["Accetta tutto", "Accetta", "Accetto"]),
        DismissRule::css(
            "generic-container",
            &[
                "[id*='cookie'] button",
                "[class*='cookie'] button",
                "[id*='consent'] button",
                "[class*='consent'] button",
            ],
        ),
    ]
}
