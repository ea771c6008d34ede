use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Most properties the comparison view shows side by side
pub const MAX_COMPARED: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amenities {
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub garden: bool,
    #[serde(default)]
    pub balcony: bool,
    #[serde(default)]
    pub furnished: bool,
}

impl Amenities {
    /// Number of amenities present, out of five
    pub fn count(&self) -> u32 {
        [self.parking, self.pool, self.garden, self.balcony, self.furnished]
            .iter()
            .filter(|&&present| present)
            .count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub price: f64,
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(default)]
    pub amenities: Amenities,
}

/// Radar-chart values for one property, each on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonScores {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub area: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub features: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("select at least one property to compare")]
    Empty,
    #[error("at most {max} properties can be compared, got {got}")]
    TooMany { max: usize, got: usize },
}

/// Raw facet values in chart order: price, area, bedrooms, bathrooms, features
fn facets(record: &PropertyRecord) -> [f64; 5] {
    [
        sanitize(record.price),
        sanitize(record.area),
        record.bedrooms as f64,
        record.bathrooms as f64,
        record.amenities.count() as f64,
    ]
}

// Negative or NaN inputs would push scores outside 0-100
fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Scales every facet against the largest value in the compared set.
/// A facet whose maximum is zero is divided by one instead.
pub fn normalize_scores(records: &[PropertyRecord]) -> Result<Vec<ComparisonScores>, CompareError> {
    if records.is_empty() {
        return Err(CompareError::Empty);
    }
    if records.len() > MAX_COMPARED {
        return Err(CompareError::TooMany {
            max: MAX_COMPARED,
            got: records.len(),
        });
    }

    let raw: Vec<[f64; 5]> = records.iter().map(facets).collect();
    let mut max = [0.0f64; 5];
    for values in &raw {
        for (slot, value) in max.iter_mut().zip(values) {
            *slot = slot.max(*value);
        }
    }
    let divisors = max.map(|m| if m == 0.0 { 1.0 } else { m });

    Ok(records
        .iter()
        .zip(&raw)
        .map(|(record, values)| {
            let scaled: Vec<f64> = values
                .iter()
                .zip(&divisors)
                .map(|(value, divisor)| value / divisor * 100.0)
                .collect();
            ComparisonScores {
                id: record.id.clone(),
                title: record.title.clone(),
                price: scaled[0],
                area: scaled[1],
                bedrooms: scaled[2],
                bathrooms: scaled[3],
                features: scaled[4],
            }
        })
        .collect())
}
