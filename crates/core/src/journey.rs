//! Customer journeys: chronological touchpoints for one customer, closed by
//! at most one conversion.
//!
//! Input order is validated, never repaired. A journey that arrives out of
//! order is rejected so the defect surfaces at the event source.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::touchpoint::{Platform, RawTouchpoint, Touchpoint};

/// Wire shape of a journey as replayed from an event source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JourneyRecord {
    pub customer_key: String,
    pub touchpoints: Vec<RawTouchpoint>,
}

/// A validated customer journey. The only way to obtain one is through
/// [`Journey::build`], [`Journey::from_touchpoints`] or [`JourneyBuilder`],
/// so every instance satisfies the ordering and conversion invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JourneyRecord")]
pub struct Journey {
    customer_key: String,
    touchpoints: Vec<Touchpoint>,
}

impl Journey {
    /// Build a journey from raw event-source records.
    pub fn build(
        customer_key: impl Into<String>,
        raw: Vec<RawTouchpoint>,
    ) -> Result<Self, ValidationError> {
        let touchpoints = raw
            .into_iter()
            .map(Touchpoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_touchpoints(customer_key, touchpoints)
    }

    /// Build a journey from already-typed touchpoints.
    pub fn from_touchpoints(
        customer_key: impl Into<String>,
        touchpoints: Vec<Touchpoint>,
    ) -> Result<Self, ValidationError> {
        check_conversion_placement(&touchpoints)?;

        let mut builder = JourneyBuilder::new(customer_key);
        for tp in touchpoints {
            builder.push(tp)?;
        }
        builder.build()
    }

    /// Append a touchpoint to an open journey. Fails once a conversion
    /// has been recorded.
    pub fn append(&mut self, touchpoint: Touchpoint) -> Result<(), ValidationError> {
        check_append(&self.touchpoints, &touchpoint)?;
        self.touchpoints.push(touchpoint);
        Ok(())
    }

    /// Re-check every invariant. Cheap; used at calculation boundaries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_key.trim().is_empty() {
            return Err(ValidationError::EmptyCustomerKey);
        }
        if self.touchpoints.is_empty() {
            return Err(ValidationError::EmptyJourney);
        }
        check_conversion_placement(&self.touchpoints)?;
        for i in 0..self.touchpoints.len() {
            check_append(&self.touchpoints[..i], &self.touchpoints[i])?;
        }
        Ok(())
    }

    pub fn customer_key(&self) -> &str {
        &self.customer_key
    }

    /// All touchpoints, conversion included.
    pub fn touchpoints(&self) -> &[Touchpoint] {
        &self.touchpoints
    }

    /// The conversion event, if the journey has converted.
    pub fn conversion(&self) -> Option<&Touchpoint> {
        self.touchpoints.last().filter(|tp| tp.is_conversion())
    }

    pub fn is_closed(&self) -> bool {
        self.conversion().is_some()
    }

    /// Touchpoints eligible for credit: everything before the conversion.
    pub fn attributable(&self) -> &[Touchpoint] {
        match self.conversion() {
            Some(_) => &self.touchpoints[..self.touchpoints.len() - 1],
            None => &self.touchpoints,
        }
    }

    pub fn conversion_value(&self) -> Option<f64> {
        self.conversion().and_then(|c| c.value)
    }

    /// Time from the first touchpoint to the last one.
    pub fn duration(&self) -> Duration {
        match (self.touchpoints.first(), self.touchpoints.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => Duration::zero(),
        }
    }

    /// Time from attributable touchpoint `index` to the conversion.
    pub fn time_to_conversion(&self, index: usize) -> Option<Duration> {
        let conversion = self.conversion()?;
        let tp = self.attributable().get(index)?;
        Some(conversion.timestamp - tp.timestamp)
    }

    pub fn converted_at(&self) -> Option<DateTime<Utc>> {
        self.conversion().map(|c| c.timestamp)
    }

    pub fn platform_sequence(&self) -> Vec<Platform> {
        self.attributable().iter().map(|tp| tp.platform).collect()
    }
}

impl TryFrom<JourneyRecord> for Journey {
    type Error = ValidationError;

    fn try_from(record: JourneyRecord) -> Result<Self, Self::Error> {
        Journey::build(record.customer_key, record.touchpoints)
    }
}

/// Incremental journey construction, one event at a time.
#[derive(Debug, Clone)]
pub struct JourneyBuilder {
    customer_key: String,
    touchpoints: Vec<Touchpoint>,
}

impl JourneyBuilder {
    pub fn new(customer_key: impl Into<String>) -> Self {
        Self {
            customer_key: customer_key.into(),
            touchpoints: Vec::new(),
        }
    }

    pub fn push(&mut self, touchpoint: Touchpoint) -> Result<(), ValidationError> {
        check_append(&self.touchpoints, &touchpoint)?;
        self.touchpoints.push(touchpoint);
        Ok(())
    }

    pub fn build(self) -> Result<Journey, ValidationError> {
        if self.customer_key.trim().is_empty() {
            return Err(ValidationError::EmptyCustomerKey);
        }
        if self.touchpoints.is_empty() {
            return Err(ValidationError::EmptyJourney);
        }
        Ok(Journey {
            customer_key: self.customer_key,
            touchpoints: self.touchpoints,
        })
    }
}

/// At most one conversion, and only in last position.
fn check_conversion_placement(touchpoints: &[Touchpoint]) -> Result<(), ValidationError> {
    let mut conversions = touchpoints
        .iter()
        .enumerate()
        .filter(|(_, tp)| tp.is_conversion())
        .map(|(i, _)| i);

    if let Some(first) = conversions.next() {
        if let Some(second) = conversions.next() {
            return Err(ValidationError::MultipleConversions { index: second });
        }
        if first + 1 != touchpoints.len() {
            return Err(ValidationError::ConversionNotLast { index: first });
        }
    }
    Ok(())
}

fn check_append(existing: &[Touchpoint], tp: &Touchpoint) -> Result<(), ValidationError> {
    let index = existing.len();

    if let Some(last) = existing.last() {
        if last.is_conversion() {
            return Err(if tp.is_conversion() {
                ValidationError::MultipleConversions { index }
            } else {
                ValidationError::AppendAfterConversion
            });
        }
        if tp.timestamp < last.timestamp {
            return Err(ValidationError::NonMonotonicTimestamp { index });
        }
    }

    if tp.campaign_id.trim().is_empty() {
        return Err(ValidationError::EmptyCampaignId { index });
    }

    match (tp.is_conversion(), tp.value) {
        (false, Some(_)) => Err(ValidationError::ValueOnNonConversion { index }),
        (true, Some(value)) if !value.is_finite() || value < 0.0 => {
            Err(ValidationError::InvalidConversionValue { index, value })
        }
        _ => Ok(()),
    }
}
