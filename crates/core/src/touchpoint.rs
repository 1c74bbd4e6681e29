//! Touchpoints: one customer interaction with one platform/campaign at one instant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Advertising platform a touchpoint was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Pinterest,
    Meta,
    Tiktok,
    Google,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Pinterest,
        Platform::Meta,
        Platform::Tiktok,
        Platform::Google,
        Platform::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Pinterest => "pinterest",
            Platform::Meta => "meta",
            Platform::Tiktok => "tiktok",
            Platform::Google => "google",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinterest" => Ok(Platform::Pinterest),
            "meta" | "facebook" | "instagram" => Ok(Platform::Meta),
            "tiktok" => Ok(Platform::Tiktok),
            "google" => Ok(Platform::Google),
            "other" => Ok(Platform::Other),
            _ => Err(ValidationError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Kind of interaction recorded by a touchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Impression,
    Save,
    Closeup,
    Click,
    Conversion,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Impression => "impression",
            InteractionType::Save => "save",
            InteractionType::Closeup => "closeup",
            InteractionType::Click => "click",
            InteractionType::Conversion => "conversion",
        }
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, InteractionType::Conversion)
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "impression" => Ok(InteractionType::Impression),
            "save" => Ok(InteractionType::Save),
            "closeup" => Ok(InteractionType::Closeup),
            "click" => Ok(InteractionType::Click),
            "conversion" | "purchase" => Ok(InteractionType::Conversion),
            _ => Err(ValidationError::UnknownInteractionType(s.to_string())),
        }
    }
}

/// A single, typed customer interaction. `value` is the monetary order
/// value and is only meaningful on conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub platform: Platform,
    pub interaction_type: InteractionType,
    pub campaign_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Touchpoint {
    pub fn new(
        platform: Platform,
        interaction_type: InteractionType,
        campaign_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            platform,
            interaction_type,
            campaign_id: campaign_id.into(),
            ad_id: None,
            pin_id: None,
            timestamp,
            value: None,
        }
    }

    /// A conversion touchpoint carrying the order value.
    pub fn conversion(
        platform: Platform,
        campaign_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self::new(platform, InteractionType::Conversion, campaign_id, timestamp).with_value(value)
    }

    pub fn with_ad_id(mut self, ad_id: impl Into<String>) -> Self {
        self.ad_id = Some(ad_id.into());
        self
    }

    pub fn with_pin_id(mut self, pin_id: impl Into<String>) -> Self {
        self.pin_id = Some(pin_id.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn is_conversion(&self) -> bool {
        self.interaction_type.is_conversion()
    }
}

/// Loosely-typed touchpoint record as delivered by an event source.
/// Unknown fields are rejected at deserialization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTouchpoint {
    pub platform: String,
    pub interaction_type: String,
    pub campaign_id: String,
    #[serde(default)]
    pub ad_id: Option<String>,
    #[serde(default)]
    pub pin_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl TryFrom<RawTouchpoint> for Touchpoint {
    type Error = ValidationError;

    fn try_from(raw: RawTouchpoint) -> Result<Self, Self::Error> {
        Ok(Touchpoint {
            platform: raw.platform.parse()?,
            interaction_type: raw.interaction_type.parse()?,
            campaign_id: raw.campaign_id,
            ad_id: raw.ad_id,
            pin_id: raw.pin_id,
            timestamp: raw.timestamp,
            value: raw.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(platform: &str, interaction: &str) -> RawTouchpoint {
        RawTouchpoint {
            platform: platform.to_string(),
            interaction_type: interaction.to_string(),
            campaign_id: "cmp-1".to_string(),
            ad_id: None,
            pin_id: Some("pin-9".to_string()),
            timestamp: Utc::now(),
            value: None,
        }
    }

    #[test]
    fn test_platform_parsing_is_case_insensitive() {
        assert_eq!("Pinterest".parse::<Platform>().unwrap(), Platform::Pinterest);
        assert_eq!("FACEBOOK".parse::<Platform>().unwrap(), Platform::Meta);
        assert_eq!(" tiktok ".parse::<Platform>().unwrap(), Platform::Tiktok);
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPlatform("myspace".to_string()));
    }

    #[test]
    fn test_raw_touchpoint_conversion() {
        let tp = Touchpoint::try_from(raw("pinterest", "save")).unwrap();
        assert_eq!(tp.platform, Platform::Pinterest);
        assert_eq!(tp.interaction_type, InteractionType::Save);
        assert_eq!(tp.pin_id.as_deref(), Some("pin-9"));
    }

    #[test]
    fn test_raw_touchpoint_unknown_interaction() {
        let err = Touchpoint::try_from(raw("meta", "hover")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownInteractionType(_)));
    }

    #[test]
    fn test_raw_touchpoint_rejects_unknown_fields() {
        let json = r#"{
            "platform": "meta",
            "interaction_type": "click",
            "campaign_id": "c",
            "timestamp": "2024-05-01T10:00:00Z",
            "utm_source": "newsletter"
        }"#;
        assert!(serde_json::from_str::<RawTouchpoint>(json).is_err());
    }

    #[test]
    fn test_platform_serializes_snake_case() {
        let json = serde_json::to_string(&Platform::Tiktok).unwrap();
        assert_eq!(json, "\"tiktok\"");
    }
}
