//! Feature Set Assembly

use serde::Serialize;

/// Number of model inputs
pub const FEATURE_COUNT: usize = 8;

/// Dataset medians, in model input order
pub const DEFAULTS: [(&str, f64); FEATURE_COUNT] = [
    ("MedInc", 3.5348),
    ("HouseAge", 29.0),
    ("AveRooms", 5.229),
    ("AveBedrms", 1.1),
    ("Population", 1166.0),
    ("AveOccup", 2.8181),
    ("Latitude", 34.26),
    ("Longitude", -118.49),
];

/// Allowed request keys, in model input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    DEFAULTS[0].0,
    DEFAULTS[1].0,
    DEFAULTS[2].0,
    DEFAULTS[3].0,
    DEFAULTS[4].0,
    DEFAULTS[5].0,
    DEFAULTS[6].0,
    DEFAULTS[7].0,
];

/// Fully populated model input for one block group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureSet {
    /// Median income (tens of thousands of dollars)
    pub med_inc: f64,
    /// Median house age (years)
    pub house_age: f64,
    /// Average rooms per household
    pub ave_rooms: f64,
    /// Average bedrooms per household
    pub ave_bedrms: f64,
    /// Block group population
    pub population: f64,
    /// Average household occupancy
    pub ave_occup: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl FeatureSet {
    /// Build from a row in model input order
    pub fn from_row(row: [f64; FEATURE_COUNT]) -> Self {
        let [med_inc, house_age, ave_rooms, ave_bedrms, population, ave_occup, latitude, longitude] =
            row;
        Self {
            med_inc,
            house_age,
            ave_rooms,
            ave_bedrms,
            population,
            ave_occup,
            latitude,
            longitude,
        }
    }

    /// Single model input row in fixed field order
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.med_inc,
            self.house_age,
            self.ave_rooms,
            self.ave_bedrms,
            self.population,
            self.ave_occup,
            self.latitude,
            self.longitude,
        ]
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::from_row(DEFAULTS.map(|(_, value)| value))
    }
}
