//! Prompt text for product descriptions.

/// Tone and length constraints sent as the system instruction.
pub const SYSTEM_INSTRUCTION: &str = "You are a digital marketing assistant for a bicycle shop. \
Your task is to write short, vibrant and appealing product descriptions \
(2-3 sentences at most).";

/// Stand-in used when no price was entered.
pub const PRICE_PLACEHOLDER: &str = "not specified";

/// System instruction plus user query for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Prompt asking for a description of one bicycle. Inputs are expected trimmed.
    pub fn describe(model: &str, brand: &str, price: Option<&str>) -> Self {
        let price = price
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(PRICE_PLACEHOLDER);

        Self {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: format!(
                "Please write a description for this bicycle: Model: '{}', Brand: '{}', \
                 Price: R${}. Focus on lifestyle and the main benefits \
                 (e.g. speed, comfort, adventure).",
                model, brand, price
            ),
        }
    }
}
