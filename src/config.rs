use clap::arg_enum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use structopt::StructOpt;
use thiserror::Error;

pub const DEFAULT_SERVER: &str = "http://localhost:5050";

/// Nozzle diameters offered by the printer, in mm
pub const NOZZLE_SIZES: [f32; 7] = [0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 1.0];

#[derive(Error, Debug)]
/// Error types for slicing parameters
pub enum ConfigError {
    #[error("layer height must be between 0.05 and 0.5")]
    LayerHeight,
    #[error("infill density must be between 0 and 100")]
    Infill,
    #[error("nozzle size must be one of 0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 1.0")]
    Nozzle,
    #[error("layer range start must not be past its end")]
    LayerRange,
    #[error("Not a decimal number")]
    ParseFloat(#[from] std::num::ParseFloatError),
    #[error("Not a whole number")]
    ParseInt(#[from] std::num::ParseIntError),
}

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum InfillPattern {
        Grid,
        Lines,
        Gyroid,
        Honeycomb,
        Triangles
    }
}

impl Default for InfillPattern {
    fn default() -> Self { InfillPattern::Grid }
}

pub fn check_layer_height(layer_height: f32) -> Result<f32, ConfigError> {
    if !(0.05..=0.5).contains(&layer_height) {
        Err(ConfigError::LayerHeight)
    } else {
        Ok(layer_height)
    }
}

pub fn check_infill(infill: u8) -> Result<u8, ConfigError> {
    if infill > 100 {
        Err(ConfigError::Infill)
    } else {
        Ok(infill)
    }
}

pub fn check_nozzle(nozzle: f32) -> Result<f32, ConfigError> {
    NOZZLE_SIZES
        .iter()
        .copied()
        .find(|size| (size - nozzle).abs() < 1e-4)
        .ok_or(ConfigError::Nozzle)
}

fn parse_layer_height(src: &str) -> Result<f32, ConfigError> { check_layer_height(src.parse::<f32>()?) }

fn parse_infill(src: &str) -> Result<u8, ConfigError> {
    let infill = src.trim_end_matches('%').parse::<u16>()?;
    if infill > 100 {
        Err(ConfigError::Infill)
    } else {
        Ok(infill as u8)
    }
}

fn parse_nozzle(src: &str) -> Result<f32, ConfigError> { check_nozzle(src.parse::<f32>()?) }

/// Knobs sent to the slicing service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlicingParameters {
    pub layer_height: f32,
    pub infill_pattern: InfillPattern,
    pub infill_density: u8,
    pub nozzle_size: f32,
}

impl Default for SlicingParameters {
    fn default() -> Self {
        SlicingParameters {
            layer_height: 0.2,
            infill_pattern: InfillPattern::Grid,
            infill_density: 20,
            nozzle_size: 0.4,
        }
    }
}

/// Partial update of [`SlicingParameters`], unset fields keep their value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterUpdate {
    pub layer_height: Option<f32>,
    pub infill_pattern: Option<InfillPattern>,
    pub infill_density: Option<u8>,
    pub nozzle_size: Option<f32>,
}

impl From<SlicingParameters> for ParameterUpdate {
    fn from(params: SlicingParameters) -> Self {
        ParameterUpdate {
            layer_height: Some(params.layer_height),
            infill_pattern: Some(params.infill_pattern),
            infill_density: Some(params.infill_density),
            nozzle_size: Some(params.nozzle_size),
        }
    }
}

impl SlicingParameters {
    /// Merge `update` onto a copy of these parameters
    ///
    /// # Examples
    ///
    /// ```
    /// use printer_plate::config::{ParameterUpdate, SlicingParameters};
    /// let params = SlicingParameters::default();
    /// let update = ParameterUpdate { infill_density: Some(40), ..Default::default() };
    /// let updated = params.update(update).unwrap();
    /// assert_eq!(updated.infill_density, 40);
    /// assert_eq!(updated.layer_height, params.layer_height);
    /// ```
    pub fn update(&self, update: ParameterUpdate) -> Result<SlicingParameters, ConfigError> {
        let mut params = *self;
        if let Some(layer_height) = update.layer_height {
            params.layer_height = check_layer_height(layer_height)?;
        }
        if let Some(pattern) = update.infill_pattern {
            params.infill_pattern = pattern;
        }
        if let Some(infill) = update.infill_density {
            params.infill_density = check_infill(infill)?;
        }
        if let Some(nozzle) = update.nozzle_size {
            params.nozzle_size = check_nozzle(nozzle)?;
        }
        Ok(params)
    }

    /// Hashable form, lengths rounded to whole microns
    pub fn key(&self) -> ParameterKey {
        ParameterKey {
            layer_height_um: (self.layer_height * 1000.).round() as u32,
            infill_pattern: self.infill_pattern,
            infill_density: self.infill_density,
            nozzle_um: (self.nozzle_size * 1000.).round() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterKey {
    layer_height_um: u32,
    infill_pattern: InfillPattern,
    infill_density: u8,
    nozzle_um: u32,
}

/// Size of the printable area in mm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateConfig {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Default for PlateConfig {
    fn default() -> Self {
        PlateConfig {
            width: 220.,
            depth: 220.,
            height: 250.,
        }
    }
}

// set up program arguments
#[derive(Debug, StructOpt)]
#[structopt(name = "printer_plate")]
pub struct Opt {
    /// STL files to place on the plate
    #[structopt(short, long, parse(from_os_str), required = true)]
    pub input: Vec<PathBuf>,

    /// Where to write the sliced G-code
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Write the merged plate as a binary STL
    #[structopt(long, parse(from_os_str))]
    pub combined: Option<PathBuf>,

    /// Render the toolpath to an SVG preview
    #[structopt(long, parse(from_os_str))]
    pub svg: Option<PathBuf>,

    #[structopt(long)]
    pub debug: bool,

    /// Base address of the slicing service [default: http://localhost:5050]
    #[structopt(long)]
    pub server: Option<String>,

    #[structopt(short, long, default_value="0.2", parse(try_from_str = parse_layer_height))]
    pub layer_height: f32,

    #[structopt(long, default_value="20", parse(try_from_str = parse_infill))]
    pub infill: u8,

    #[structopt(short, long, possible_values = &InfillPattern::variants(), default_value="grid", case_insensitive = true)]
    pub pattern: InfillPattern,

    #[structopt(short, long, default_value="0.4", parse(try_from_str = parse_nozzle))]
    pub nozzle: f32,

    #[structopt(long)]
    pub first_layer: Option<usize>,

    #[structopt(long)]
    pub last_layer: Option<usize>,
}

impl Opt {
    pub fn server(&self) -> &str { self.server.as_deref().unwrap_or(DEFAULT_SERVER) }

    pub fn parameters(&self) -> SlicingParameters {
        SlicingParameters {
            layer_height: self.layer_height,
            infill_pattern: self.pattern,
            infill_density: self.infill,
            nozzle_size: self.nozzle,
        }
    }

    pub fn layer_range(&self) -> Result<Option<(usize, usize)>, ConfigError> {
        match (self.first_layer, self.last_layer) {
            (None, None) => Ok(None),
            (first, last) => {
                let first = first.unwrap_or(0);
                let last = last.unwrap_or(usize::MAX);
                if first > last {
                    Err(ConfigError::LayerRange)
                } else {
                    Ok(Some((first, last)))
                }
            },
        }
    }
}
