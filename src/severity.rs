use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Green,
        Severity::Yellow,
        Severity::Orange,
        Severity::Red,
    ];

    /// Buckets are half-open on the lower bound: 1, 10 and 50 land in the higher tier.
    /// NaN fails every comparison and ends up red.
    pub fn classify(value: f64) -> Self {
        if value < 1.0 {
            Severity::Green
        } else if value < 10.0 {
            Severity::Yellow
        } else if value < 50.0 {
            Severity::Orange
        } else {
            Severity::Red
        }
    }

    pub fn for_measurement(value: Option<f64>) -> Self {
        Self::classify(value.unwrap_or(f64::NAN))
    }

    pub fn color(self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Yellow => "yellow",
            Severity::Orange => "orange",
            Severity::Red => "red",
        }
    }

    pub fn legend_label(self) -> &'static str {
        match self {
            Severity::Green => "Groen",
            Severity::Yellow => "Geel",
            Severity::Orange => "Oranje",
            Severity::Red => "Rood",
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            Severity::Green => "kleiner dan 1",
            Severity::Yellow => "1 tot 10",
            Severity::Orange => "10 tot 50",
            Severity::Red => "50 of hoger",
        }
    }
}
