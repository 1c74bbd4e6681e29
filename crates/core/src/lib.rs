//! Core data model for the cross-platform attribution engine: touchpoints,
//! customer journeys, model identifiers, configuration and errors.

pub mod config;
pub mod error;
pub mod journey;
pub mod metadata;
pub mod model;
pub mod result;
pub mod touchpoint;

pub use config::AppConfig;
pub use error::{EngineError, EngineResult, ValidationError};
pub use journey::{Journey, JourneyBuilder, JourneyRecord};
pub use metadata::{BudgetTier, CampaignMetadata, CampaignMetadataProvider, StaticCampaignMetadata};
pub use model::{AttributionModel, ModelSelection};
pub use result::AttributionResult;
pub use touchpoint::{InteractionType, Platform, RawTouchpoint, Touchpoint};
