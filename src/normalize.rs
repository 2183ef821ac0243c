//! Best effort unit detection and fitting of freshly loaded meshes.
//!
//! STL carries no units. Models that are absurdly large are shrunk by 25.4,
//! absurdly small ones are assumed to be in meters. The thresholds are configurable because
//! a legitimately tiny or huge part will be misread.

use crate::{
    config::PlateConfig,
    geo::{get_bounds, move_to_plate, Triangle3d},
    stl::MeshError,
};
use log::{debug, info};
use rayon::prelude::*;

pub const MM_PER_INCH: f32 = 25.4;
pub const MM_PER_METER: f32 = 1000.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeConfig {
    /// largest extent above this is treated as inch scaled
    pub inch_threshold: f32,
    /// largest extent below this is treated as meters
    pub meter_threshold: f32,
    /// extra shrink applied after fitting an oversized model to the plate
    pub fit_shrink: f32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            inch_threshold: 1000.,
            meter_threshold: 1.,
            fit_shrink: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGuess {
    Millimeters,
    Inches,
    Meters,
}

/// What normalization did to a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub unit: UnitGuess,
    /// total uniform scale applied to the source coordinates
    pub scale: f32,
    pub fitted: bool,
}

/// Rescale and move `tris` so they sit centered on the plate
///
/// # Examples
///
/// ```
/// use printer_plate::{config::PlateConfig, geo::{get_bounds, Triangle3d}, normalize::*};
/// let mut tris = vec![Triangle3d::new((0., 0., 0.), (0.01, 0., 0.), (0., 0.02, 0.01))];
/// let result = normalize(&mut tris, &NormalizeConfig::default(), &PlateConfig::default()).unwrap();
/// assert_eq!(result.unit, UnitGuess::Meters);
/// let bounds = get_bounds(&tris).unwrap();
/// assert!((bounds.size().y - 20.).abs() < 1e-3);
/// assert_eq!(bounds.min.pos.z, 0.);
/// ```
pub fn normalize(
    tris: &mut [Triangle3d],
    config: &NormalizeConfig,
    plate: &PlateConfig,
) -> Result<Normalized, MeshError> {
    let bounds = get_bounds(tris).ok_or(MeshError::Empty)?;
    let extent = bounds.max_extent();
    let (unit, mut scale) = if extent > config.inch_threshold {
        (UnitGuess::Inches, 1. / MM_PER_INCH)
    } else if extent > 0. && extent < config.meter_threshold {
        (UnitGuess::Meters, MM_PER_METER)
    } else {
        (UnitGuess::Millimeters, 1.)
    };
    if unit != UnitGuess::Millimeters {
        info!("largest extent {} looks like {:?}, scaling by {}", extent, unit, scale);
    }

    let size = bounds.size() * scale;
    let fit = (plate.width / size.x)
        .min(plate.depth / size.y)
        .min(plate.height / size.z);
    let fitted = fit < 1.;
    if fitted {
        debug!("model {:?} exceeds plate, fitting by {}", size, fit);
        scale *= fit * config.fit_shrink;
    }

    if (scale - 1.).abs() > f32::EPSILON {
        tris.par_iter_mut().for_each(|tri| tri.scale(scale));
    }
    move_to_plate(tris);

    Ok(Normalized { unit, scale, fitted })
}
