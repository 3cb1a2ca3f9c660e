use serde::{Deserialize, Serialize};

use crate::error::{WheelError, WheelResult};

/// Display data shown after the wheel lands on an option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmationContent {
    pub title: String,
    pub title_color: String,
    pub subtitle: String,
    pub subtitle_color: String,
    pub description: String,
    pub description_color: String,
    pub button_text: String,
    pub button_text_color: String,
    pub button_background: String,
    pub background_color: String,
    pub background_image: String,
    pub link_to: String,
}

/// One sector of the wheel. Its position in `Promotion::options` is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeOption {
    pub text: String,
    pub weight: f64,
    pub color: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default)]
    pub confirmation: ConfirmationContent,
}

fn default_text_color() -> String {
    "#FFFFFF".to_string()
}

impl PrizeOption {
    pub fn new(text: impl Into<String>, weight: f64, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight,
            color: color.into(),
            text_color: default_text_color(),
            confirmation: ConfirmationContent::default(),
        }
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationContent) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// True once the confirmation screen has been filled in.
    pub fn is_configured(&self) -> bool {
        self.confirmation != ConfirmationContent::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpinButtonStyle {
    pub text: String,
    pub text_color: String,
    pub background: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub background_color: String,
    pub background_image: String,
    pub logo_image: String,
    pub title_color: String,
    pub description_color: String,
    pub spin_button: SpinButtonStyle,
}

/// A named, sluggable prize wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub favicon_url: String,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub options: Vec<PrizeOption>,
}

impl Promotion {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            favicon_url: String::new(),
            branding: Branding::default(),
            options: Vec::new(),
        }
    }

    /// Checks everything a store must enforce before persisting.
    ///
    /// An empty option list passes: wheels are built up incrementally and
    /// only the draw requires at least one option.
    pub fn validate(&self) -> WheelResult<()> {
        validate_slug(&self.slug)?;
        if self.title.trim().is_empty() {
            return Err(WheelError::invalid("title must not be empty"));
        }
        for (i, opt) in self.options.iter().enumerate() {
            if opt.text.trim().is_empty() {
                return Err(WheelError::invalid(format!("option {i} has no text")));
            }
            check_weight(i, opt.weight)?;
        }
        check_total(self.total_weight())
    }

    pub fn total_weight(&self) -> f64 {
        self.options.iter().map(|o| o.weight).sum()
    }

    /// Share of the wheel each option receives, in option order.
    /// All zeros when the total weight is zero.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.total_weight();
        self.options
            .iter()
            .map(|o| if total > 0.0 { o.weight / total } else { 0.0 })
            .collect()
    }

    pub fn prize_list(&self) -> Vec<String> {
        self.options.iter().map(|o| o.text.clone()).collect()
    }

    pub fn configured_flags(&self) -> Vec<bool> {
        self.options.iter().map(PrizeOption::is_configured).collect()
    }
}

pub(crate) fn check_weight(index: usize, weight: f64) -> WheelResult<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(WheelError::invalid(format!(
            "option {index} has weight {weight}; weights must be finite and >= 0"
        )));
    }
    Ok(())
}

pub(crate) fn check_total(total: f64) -> WheelResult<()> {
    if !total.is_finite() {
        return Err(WheelError::invalid("weights add up to more than a wheel can hold"));
    }
    Ok(())
}

/// Slugs end up as a URL path segment, so they are limited to characters
/// that never need percent-encoding: ASCII letters, digits, `-`, `_`, `.`
/// and `~`. The dot segments `.` and `..` are refused.
pub fn validate_slug(slug: &str) -> WheelResult<()> {
    if slug.is_empty() {
        return Err(WheelError::invalid("slug must not be empty"));
    }
    if slug.chars().any(char::is_whitespace) {
        return Err(WheelError::invalid("slug must not contain whitespace"));
    }
    if let Some(c) = slug
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
    {
        return Err(WheelError::invalid(format!("slug must not contain {c:?}")));
    }
    if slug == "." || slug == ".." {
        return Err(WheelError::invalid("slug must not be a dot segment"));
    }
    Ok(())
}
