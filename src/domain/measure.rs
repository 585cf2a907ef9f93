use serde::{Deserialize, Serialize};

const GRAMS_PER_POUND: f64 = 453.592_37;
const GRAMS_PER_OUNCE: f64 = GRAMS_PER_POUND / 16.0;
const CENTIMETERS_PER_INCH: f64 = 2.54;

/// Mass, held in grams.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Weight {
    grams: f64,
}

impl Weight {
    pub fn from_grams(grams: f64) -> Self {
        Self { grams }
    }

    pub fn from_kilograms(kilograms: f64) -> Self {
        Self::from_grams(kilograms * 1000.0)
    }

    pub fn from_pounds(pounds: f64) -> Self {
        Self::from_grams(pounds * GRAMS_PER_POUND)
    }

    pub fn from_ounces(ounces: f64) -> Self {
        Self::from_grams(ounces * GRAMS_PER_OUNCE)
    }

    pub fn to_grams(self) -> f64 {
        self.grams
    }

    pub fn to_kilograms(self) -> f64 {
        self.grams / 1000.0
    }

    pub fn to_pounds(self) -> f64 {
        self.grams / GRAMS_PER_POUND
    }

    pub fn to_ounces(self) -> f64 {
        self.grams / GRAMS_PER_OUNCE
    }
}

/// Linear dimension, held in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Length {
    centimeters: f64,
}

impl Length {
    pub fn from_centimeters(centimeters: f64) -> Self {
        Self { centimeters }
    }

    pub fn from_inches(inches: f64) -> Self {
        Self::from_centimeters(inches * CENTIMETERS_PER_INCH)
    }

    pub fn to_centimeters(self) -> f64 {
        self.centimeters
    }

    pub fn to_inches(self) -> f64 {
        self.centimeters / CENTIMETERS_PER_INCH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Length,
    Width,
    Height,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Length, Axis::Width, Axis::Height];

    /// Element name used by the XML carriers.
    pub fn label(self) -> &'static str {
        match self {
            Axis::Length => "Length",
            Axis::Width => "Width",
            Axis::Height => "Height",
        }
    }
}

/// Rounds to three decimals for wire output; `2.0` renders as `2`.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
