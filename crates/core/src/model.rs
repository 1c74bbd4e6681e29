//! Attribution model identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The seven supported rules for distributing conversion credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    FirstClick,
    LastClick,
    Linear,
    TimeDecay,
    PositionBased,
    DataDriven,
    MachineLearning,
}

impl AttributionModel {
    pub const ALL: [AttributionModel; 7] = [
        AttributionModel::FirstClick,
        AttributionModel::LastClick,
        AttributionModel::Linear,
        AttributionModel::TimeDecay,
        AttributionModel::PositionBased,
        AttributionModel::DataDriven,
        AttributionModel::MachineLearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionModel::FirstClick => "first_click",
            AttributionModel::LastClick => "last_click",
            AttributionModel::Linear => "linear",
            AttributionModel::TimeDecay => "time_decay",
            AttributionModel::PositionBased => "position_based",
            AttributionModel::DataDriven => "data_driven",
            AttributionModel::MachineLearning => "machine_learning",
        }
    }
}

impl fmt::Display for AttributionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributionModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AttributionModel::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| EngineError::UnknownModel(s.to_string()))
    }
}

/// What produced an attribution result: one model, or the weighted blend
/// of all of them. Serialized as a plain string (`"linear"`, `"ensemble"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelSelection {
    Single(AttributionModel),
    Ensemble,
}

impl ModelSelection {
    pub const ENSEMBLE: &'static str = "ensemble";
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelection::Single(model) => model.fmt(f),
            ModelSelection::Ensemble => f.write_str(Self::ENSEMBLE),
        }
    }
}

impl From<AttributionModel> for ModelSelection {
    fn from(model: AttributionModel) -> Self {
        ModelSelection::Single(model)
    }
}

impl From<ModelSelection> for String {
    fn from(selection: ModelSelection) -> Self {
        selection.to_string()
    }
}

impl FromStr for ModelSelection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::ENSEMBLE) {
            Ok(ModelSelection::Ensemble)
        } else {
            s.parse().map(ModelSelection::Single)
        }
    }
}

impl TryFrom<String> for ModelSelection {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_round_trips_through_str() {
        for model in AttributionModel::ALL {
            assert_eq!(model.as_str().parse::<AttributionModel>().unwrap(), model);
        }
    }

    #[test]
    fn test_model_accepts_dashes() {
        assert_eq!(
            "Time-Decay".parse::<AttributionModel>().unwrap(),
            AttributionModel::TimeDecay
        );
    }

    #[test]
    fn test_unknown_model() {
        let err = "shapley".parse::<AttributionModel>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownModel(ref m) if m == "shapley"));
    }

    #[test]
    fn test_selection_serializes_as_string() {
        let single = serde_json::to_string(&ModelSelection::Single(AttributionModel::Linear)).unwrap();
        assert_eq!(single, "\"linear\"");
        let ensemble = serde_json::to_string(&ModelSelection::Ensemble).unwrap();
        assert_eq!(ensemble, "\"ensemble\"");

        let back: ModelSelection = serde_json::from_str("\"ensemble\"").unwrap();
        assert_eq!(back, ModelSelection::Ensemble);
    }
}
