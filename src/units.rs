//! Unit Conversion Utilities
//!
//! Scalar conversions for depth, pressure, volume and volumetric rate used
//! when normalising imported production data.
//!
//! Conversion is permissive: an unknown unit string, or a pair of units from
//! different dimensions, returns the value unchanged so new unit labels in
//! source files never abort an import.
//!
//! ```ignore
//! use dca_engine::units::convert;
//!
//! let ft = convert(10.0, "M", "FT"); // 32.8084
//! ```

use std::str::FromStr;

// ============================================================================
// Conversion Constants (to SI base of each dimension)
// ============================================================================

/// Feet to metres (exact)
const FT_TO_M: f64 = 0.3048;
/// Inches to metres (exact)
const IN_TO_M: f64 = 0.0254;
/// Statute miles to metres (exact)
const MI_TO_M: f64 = 1_609.344;

/// PSI to pascals
const PSI_TO_PA: f64 = 6_894.757_293_168;
/// Standard atmosphere to pascals (exact)
const ATM_TO_PA: f64 = 101_325.0;

/// Oilfield barrel (42 US gal) to cubic metres
const BBL_TO_M3: f64 = 0.158_987_294_928;
/// Cubic feet to cubic metres (exact)
const FT3_TO_M3: f64 = 0.028_316_846_592;
/// US gallon to cubic metres (exact)
const GAL_TO_M3: f64 = 0.003_785_411_784;

// ============================================================================
// Units
// ============================================================================

/// Physical dimension a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Pressure,
    Volume,
    /// Volume per day
    VolumeRate,
}

/// Supported units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    // Length
    Metre,
    Kilometre,
    Centimetre,
    Foot,
    Inch,
    Mile,
    // Pressure
    Pascal,
    Kilopascal,
    Megapascal,
    Bar,
    Psi,
    Atmosphere,
    // Volume
    CubicMetre,
    Barrel,
    CubicFoot,
    Litre,
    Gallon,
    StandardCubicFoot,
    ThousandCubicFeet,
    MillionCubicFeet,
    // Rate (per day)
    CubicMetrePerDay,
    BarrelPerDay,
    StandardCubicFootPerDay,
    ThousandCubicFeetPerDay,
    LitrePerDay,
}

impl Unit {
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Metre | Self::Kilometre | Self::Centimetre | Self::Foot | Self::Inch | Self::Mile => {
                Dimension::Length
            }
            Self::Pascal
            | Self::Kilopascal
            | Self::Megapascal
            | Self::Bar
            | Self::Psi
            | Self::Atmosphere => Dimension::Pressure,
            Self::CubicMetre
            | Self::Barrel
            | Self::CubicFoot
            | Self::Litre
            | Self::Gallon
            | Self::StandardCubicFoot
            | Self::ThousandCubicFeet
            | Self::MillionCubicFeet => Dimension::Volume,
            Self::CubicMetrePerDay
            | Self::BarrelPerDay
            | Self::StandardCubicFootPerDay
            | Self::ThousandCubicFeetPerDay
            | Self::LitrePerDay => Dimension::VolumeRate,
        }
    }

    /// Multiplier taking a value in this unit to the dimension's SI base
    /// (m, Pa, m³, m³/d).
    pub const fn factor_to_base(self) -> f64 {
        match self {
            Self::Metre | Self::Pascal | Self::CubicMetre | Self::CubicMetrePerDay => 1.0,
            Self::Kilometre => 1_000.0,
            Self::Centimetre => 0.01,
            Self::Foot => FT_TO_M,
            Self::Inch => IN_TO_M,
            Self::Mile => MI_TO_M,
            Self::Kilopascal => 1_000.0,
            Self::Megapascal => 1_000_000.0,
            Self::Bar => 100_000.0,
            Self::Psi => PSI_TO_PA,
            Self::Atmosphere => ATM_TO_PA,
            Self::Barrel | Self::BarrelPerDay => BBL_TO_M3,
            Self::CubicFoot | Self::StandardCubicFoot | Self::StandardCubicFootPerDay => FT3_TO_M3,
            Self::Litre | Self::LitrePerDay => 0.001,
            Self::Gallon => GAL_TO_M3,
            Self::ThousandCubicFeet | Self::ThousandCubicFeetPerDay => FT3_TO_M3 * 1_000.0,
            Self::MillionCubicFeet => FT3_TO_M3 * 1_000_000.0,
        }
    }

    /// Convert `value` from this unit to `target`.
    ///
    /// Returns `None` when the units measure different dimensions.
    pub fn convert_to(self, value: f64, target: Self) -> Option<f64> {
        if self == target {
            return Some(value);
        }
        if self.dimension() != target.dimension() {
            return None;
        }
        Some(value * self.factor_to_base() / target.factor_to_base())
    }
}

impl FromStr for Unit {
    type Err = String;

    /// Case-insensitive; accepts the common oilfield spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let unit = match normalized.as_str() {
            "m" | "metre" | "meter" | "metres" | "meters" => Self::Metre,
            "km" => Self::Kilometre,
            "cm" => Self::Centimetre,
            "ft" | "feet" | "foot" => Self::Foot,
            "in" | "inch" | "inches" => Self::Inch,
            "mi" | "mile" | "miles" => Self::Mile,
            "pa" => Self::Pascal,
            "kpa" => Self::Kilopascal,
            "mpa" => Self::Megapascal,
            "bar" => Self::Bar,
            "psi" | "psia" => Self::Psi,
            "atm" => Self::Atmosphere,
            "m3" | "m^3" | "sm3" => Self::CubicMetre,
            "bbl" | "stb" | "bbls" => Self::Barrel,
            "ft3" | "ft^3" | "cf" => Self::CubicFoot,
            "l" | "litre" | "liter" => Self::Litre,
            "gal" | "gallon" => Self::Gallon,
            "scf" => Self::StandardCubicFoot,
            "mcf" | "mscf" => Self::ThousandCubicFeet,
            "mmcf" | "mmscf" => Self::MillionCubicFeet,
            "m3/d" | "sm3/d" | "m3/day" => Self::CubicMetrePerDay,
            "bbl/d" | "bopd" | "bwpd" | "stb/d" | "bbl/day" => Self::BarrelPerDay,
            "scf/d" => Self::StandardCubicFootPerDay,
            "mcf/d" | "mcfd" | "mscf/d" => Self::ThousandCubicFeetPerDay,
            "l/d" => Self::LitrePerDay,
            other => return Err(format!("unknown unit '{other}'")),
        };
        Ok(unit)
    }
}

// ============================================================================
// String API
// ============================================================================

/// Convert `value` between two unit labels.
///
/// - Same label (case-insensitive) returns `value` untouched.
/// - Unknown labels or mismatched dimensions return `value` untouched.
pub fn convert(value: f64, from: &str, to: &str) -> f64 {
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return value;
    }

    match (from.parse::<Unit>(), to.parse::<Unit>()) {
        (Ok(f), Ok(t)) => f.convert_to(value, t).unwrap_or_else(|| {
            tracing::debug!(from, to, "Unit dimensions differ, passing value through");
            value
        }),
        _ => {
            tracing::debug!(from, to, "Unknown unit, passing value through");
            value
        }
    }
}
