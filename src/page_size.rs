//! Page geometry for the rendered matter, in PDF points.

use clap::ValueEnum;

/// Unit in which the page width/height are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitSystem {
    #[value(name = "in")]
    Inch,
    Cm,
    Mm,
}

impl UnitSystem {
    pub fn to_points(&self, v: f64) -> f64 {
        match self {
            UnitSystem::Inch => v * 72.0,
            UnitSystem::Cm => v / 2.54 * 72.0,
            UnitSystem::Mm => v / 25.4 * 72.0,
        }
    }
}

/// Size of the rendered front/back matter pages, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64, unit: UnitSystem) -> Self {
        Self {
            width: unit.to_points(width),
            height: unit.to_points(height),
        }
    }

    /// ISO A4, 210 x 297 mm.
    pub fn a4() -> Self {
        Self::new(210.0, 297.0, UnitSystem::Mm)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::a4()
    }
}
