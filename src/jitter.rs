use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use thiserror::Error;

use crate::models::Coordinate;
use crate::towns;

pub const LAT_SIGMA: f64 = 0.004;
pub const LON_SIGMA: f64 = 0.006;

#[derive(Debug, Error)]
pub enum JitterError {
    #[error("jitter sigma must be positive and finite, got {0}")]
    InvalidSigma(f64),
    #[error(transparent)]
    Distribution(#[from] NormalError),
}

/// Gaussian offsets that spread co-located records around their town centre.
#[derive(Debug, Clone)]
pub struct Jitter {
    lat: Normal<f64>,
    lon: Normal<f64>,
}

impl Jitter {
    pub fn new(lat_sigma: f64, lon_sigma: f64) -> Result<Self, JitterError> {
        for sigma in [lat_sigma, lon_sigma] {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(JitterError::InvalidSigma(sigma));
            }
        }
        Ok(Self {
            lat: Normal::new(0.0, lat_sigma)?,
            lon: Normal::new(0.0, lon_sigma)?,
        })
    }

    /// Draws latitude noise first, then longitude, from the same generator.
    pub fn apply<R: Rng + ?Sized>(&self, base: Coordinate, rng: &mut R) -> Coordinate {
        let lat = base.lat + self.lat.sample(rng);
        let lon = base.lon + self.lon.sample(rng);
        Coordinate { lat, lon }
    }

    /// Jittered position for a town, or `None` when the town is not in the table.
    pub fn place<R: Rng + ?Sized>(&self, town: &str, rng: &mut R) -> Option<Coordinate> {
        towns::lookup(town).map(|base| self.apply(base, rng))
    }
}
