//! Marketplace configuration.

use gm_core::models::district::{District, default_districts};

/// Placeholder substituted with the minted vendor code in messages.
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Configuration for the marketplace services.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Upper bound on code generation attempts before giving up
    /// (default: 16). Each attempt is checked against the code index.
    pub max_code_attempts: u32,
    /// Merchant number embedded in the mobile-money USSD string.
    pub ussd_merchant_number: String,
    /// Message stored on direct activation; `{code}` is replaced with
    /// the minted code.
    pub activation_message_template: String,
    /// Delivery fee table.
    pub districts: Vec<District>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: 16,
            ussd_merchant_number: "07659801".into(),
            activation_message_template: "Félicitations ! Vous avez été promu au rang de \
                Vendeur. Votre code d'accès est : {code}. Vous pouvez maintenant accéder \
                à votre Dashboard Vendeur."
                .into(),
            districts: default_districts(),
        }
    }
}

impl MarketConfig {
    /// Overlay values from `GM_*` variables through `lookup`.
    /// Unparseable numbers keep the current value.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(n) = lookup("GM_MAX_CODE_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.max_code_attempts = n;
        }
        if let Some(v) = lookup("GM_USSD_MERCHANT") {
            self.ussd_merchant_number = v;
        }
        if let Some(v) = lookup("GM_ACTIVATION_MESSAGE") {
            self.activation_message_template = v;
        }
        self
    }

    pub fn activation_message(&self, code: &str) -> String {
        fill_code(&self.activation_message_template, code)
    }
}

pub(crate) fn fill_code(template: &str, code: &str) -> String {
    template.replace(CODE_PLACEHOLDER, code)
}
