//! # Gcode
//!
//! Reads the moves out of sliced G-code and groups them into layers

use crate::geo::BoundingBox;
use ultraviolet::Vec3;

/// Price per mm of filament used by the print shop
pub const PRICE_PER_MM: f32 = 0.02;

const LAYER_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec3,
    pub to: Vec3,
    /// true when filament is pushed during the move
    pub extrude: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub z: f32,
    pub segments: Vec<Segment>,
}

impl Layer {
    pub fn extrusions(&self) -> impl Iterator<Item = &Segment> { self.segments.iter().filter(|s| s.extrude) }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolpath {
    pub layers: Vec<Layer>,
    /// value of the slicer's `filament used` comment
    pub filament_used: Option<f32>,
}

impl Toolpath {
    pub fn layer_count(&self) -> usize { self.layers.len() }

    /// Bounds of the extrusion moves in `layers`
    pub fn bounds(&self, layers: &[Layer]) -> Option<BoundingBox> {
        let points: Vec<Vec3> = layers
            .iter()
            .flat_map(|l| l.extrusions())
            .flat_map(|s| vec![s.from, s.to])
            .collect();
        BoundingBox::from_points(&points)
    }

    pub fn total_bounds(&self) -> Option<BoundingBox> { self.bounds(&self.layers) }

    pub fn estimated_price(&self) -> Option<f32> { self.filament_used.map(estimate_price) }
}

/// Cost of printing `filament_mm` of filament, rounded to cents
///
/// # Examples
///
/// ```
/// use printer_plate::gcode::estimate_price;
/// assert_eq!(estimate_price(1000.), 20.);
/// assert_eq!(estimate_price(123.4), 2.47);
/// ```
pub fn estimate_price(filament_mm: f32) -> f32 { (filament_mm * PRICE_PER_MM * 100.).round() / 100. }

struct Machine {
    pos: Vec3,
    e: f32,
    absolute: bool,
    absolute_e: bool,
    units: f32,
}

impl Default for Machine {
    fn default() -> Self {
        Machine {
            pos: Vec3::zero(),
            e: 0.,
            absolute: true,
            absolute_e: true,
            units: 1.,
        }
    }
}

fn words(code: &str) -> impl Iterator<Item = (char, f32)> + '_ {
    code.split_whitespace().filter_map(|word| {
        let mut chars = word.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let value = chars.as_str().parse::<f32>().ok()?;
        Some((letter, value))
    })
}

fn filament_comment(comment: &str) -> Option<f32> {
    let comment = comment.trim();
    if !comment.starts_with("filament used") {
        return None;
    }
    let (label, value) = comment.split_at(comment.find('=')?);
    if label.contains('[') && !label.contains("[mm]") {
        return None;
    }
    value[1..].split_whitespace().next()?.parse().ok()
}

/// Parse G-code text. Unknown commands are skipped.
///
/// # Examples
///
/// ```
/// use printer_plate::gcode::parse;
/// let path = parse("G1 Z0.2\nG1 X10 E1\nG1 Z0.4\nG1 X0 E2\n");
/// assert_eq!(path.layer_count(), 2);
/// assert_eq!(path.layers[1].z, 0.4);
/// ```
pub fn parse(text: &str) -> Toolpath {
    let mut machine = Machine::default();
    let mut toolpath = Toolpath::default();
    // travel moves seen before the first extrusion of a new layer
    let mut pending: Vec<Segment> = Vec::new();

    for line in text.lines() {
        let (code, comment) = match line.find(';') {
            Some(index) => (&line[..index], Some(&line[index + 1..])),
            None => (line, None),
        };
        if let Some(used) = comment.and_then(filament_comment) {
            toolpath.filament_used = Some(used);
        }
        let mut parts = code.split_whitespace();
        let command = match parts.next() {
            Some(command) => command.to_ascii_uppercase(),
            None => continue,
        };
        let args = &code[code.find(|c: char| !c.is_whitespace()).unwrap_or(0) + command.len()..];
        match command.as_str() {
            "G0" | "G00" | "G1" | "G01" => {
                let mut target = if machine.absolute { machine.pos } else { Vec3::zero() };
                let mut e = None;
                for (letter, value) in words(args) {
                    match letter {
                        'X' => target.x = value * machine.units,
                        'Y' => target.y = value * machine.units,
                        'Z' => target.z = value * machine.units,
                        'E' => e = Some(value * machine.units),
                        _ => {},
                    }
                }
                if !machine.absolute {
                    target += machine.pos;
                }
                let extrude = match e {
                    Some(e) if machine.absolute_e => {
                        let pushed = e > machine.e;
                        machine.e = e;
                        pushed
                    },
                    Some(e) => e > 0.,
                    None => false,
                };
                let segment = Segment {
                    from: machine.pos,
                    to: target,
                    extrude,
                };
                machine.pos = target;
                if segment.from == segment.to {
                    continue;
                }
                if extrude {
                    let new_layer = match toolpath.layers.last() {
                        Some(layer) => (layer.z - target.z).abs() > LAYER_TOLERANCE,
                        None => true,
                    };
                    if new_layer {
                        toolpath.layers.push(Layer {
                            z: target.z,
                            segments: Vec::new(),
                        });
                    }
                    if let Some(layer) = toolpath.layers.last_mut() {
                        layer.segments.append(&mut pending);
                        layer.segments.push(segment);
                    }
                } else {
                    pending.push(segment);
                }
            },
            "G20" => machine.units = 25.4,
            "G21" => machine.units = 1.,
            "G28" => {
                let axes: Vec<char> = args.split_whitespace().filter_map(|w| w.chars().next()).collect();
                let all = axes.is_empty();
                if all || axes.iter().any(|a| a.eq_ignore_ascii_case(&'X')) {
                    machine.pos.x = 0.;
                }
                if all || axes.iter().any(|a| a.eq_ignore_ascii_case(&'Y')) {
                    machine.pos.y = 0.;
                }
                if all || axes.iter().any(|a| a.eq_ignore_ascii_case(&'Z')) {
                    machine.pos.z = 0.;
                }
            },
            "G90" => {
                machine.absolute = true;
                machine.absolute_e = true;
            },
            "G91" => {
                machine.absolute = false;
                machine.absolute_e = false;
            },
            "M82" => machine.absolute_e = true,
            "M83" => machine.absolute_e = false,
            "G92" => {
                for (letter, value) in words(args) {
                    match letter {
                        'X' => machine.pos.x = value * machine.units,
                        'Y' => machine.pos.y = value * machine.units,
                        'Z' => machine.pos.z = value * machine.units,
                        'E' => machine.e = value * machine.units,
                        _ => {},
                    }
                }
            },
            _ => {},
        }
    }
    // trailing travel, e.g. the final lift and park
    if let Some(layer) = toolpath.layers.last_mut() {
        layer.segments.append(&mut pending);
    }
    toolpath
}
