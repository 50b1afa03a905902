//! Product code conventions
//!
//! Level 1 and 2 cubes follow `L{level}_{PRODUCT}_{RESOLUTION}`, e.g.
//! `L1_AETI_D`. Level 3 cubes are area specific and have to be named
//! explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WaporError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    /// Actual evapotranspiration and interception
    Aeti,
    /// Precipitation
    Pcp,
    /// Reference evapotranspiration
    Ret,
    /// Net primary production
    Npp,
    /// Land cover classification
    Lcc,
    /// Interception
    I,
}

impl Product {
    pub const ALL: [Product; 6] = [
        Product::Aeti,
        Product::Pcp,
        Product::Ret,
        Product::Npp,
        Product::Lcc,
        Product::I,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Product::Aeti => "AETI",
            Product::Pcp => "PCP",
            Product::Ret => "RET",
            Product::Npp => "NPP",
            Product::Lcc => "LCC",
            Product::I => "I",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Product {
    type Err = WaporError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Product::ALL
            .into_iter()
            .find(|p| p.code() == upper)
            .ok_or_else(|| WaporError::InvalidInput {
                field: "product".to_string(),
                reason: format!("unknown product \"{}\" (expected AETI, PCP, RET, NPP, LCC or I)", s),
            })
    }
}

/// Temporal resolution suffix of a cube code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Daily,
    Dekadal,
    Monthly,
    Annual,
}

impl Resolution {
    pub fn suffix(&self) -> char {
        match self {
            Resolution::Daily => 'E',
            Resolution::Dekadal => 'D',
            Resolution::Monthly => 'M',
            Resolution::Annual => 'A',
        }
    }

    /// Period label used in local file names
    pub fn period_name(&self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::Dekadal => "dekad",
            Resolution::Monthly => "month",
            Resolution::Annual => "annually",
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'E' => Some(Resolution::Daily),
            'D' => Some(Resolution::Dekadal),
            'M' => Some(Resolution::Monthly),
            'A' => Some(Resolution::Annual),
            _ => None,
        }
    }
}

impl FromStr for Resolution {
    type Err = WaporError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e" | "daily" | "day" => Ok(Resolution::Daily),
            "d" | "dekadal" | "dekad" => Ok(Resolution::Dekadal),
            "m" | "monthly" | "month" => Ok(Resolution::Monthly),
            "a" | "annual" | "year" => Ok(Resolution::Annual),
            _ => Err(WaporError::InvalidInput {
                field: "resolution".to_string(),
                reason: format!("unknown resolution \"{}\" (expected daily, dekadal, monthly or annual)", s),
            }),
        }
    }
}

/// Build a level 1/2 cube code such as `L1_AETI_D`
pub fn cube_code(product: Product, level: u8, resolution: Resolution) -> Result<String> {
    if !(1..=2).contains(&level) {
        return Err(WaporError::InvalidInput {
            field: "level".to_string(),
            reason: format!("level {} cubes must be named explicitly", level),
        });
    }
    Ok(format!("L{}_{}_{}", level, product.code(), resolution.suffix()))
}

/// Level and resolution parsed back from a `L{n}_..._{R}` code
pub fn parse_cube_code(code: &str) -> Option<(u8, Resolution)> {
    let rest = code.strip_prefix('L')?;
    let level = rest.chars().next()?.to_digit(10)? as u8;
    let resolution = Resolution::from_suffix(code.rsplit('_').next()?.chars().next()?)?;
    Some((level, resolution))
}

/// Local file name for a downloaded raster:
/// `{PRODUCT}_WAPOR.v{version}_l{level}-{period}-1_{raster_id}.tif`
pub fn output_file_name(product: &str, version: u8, level: u8, period: &str, raster_id: &str) -> String {
    format!(
        "{}_WAPOR.v{}_l{}-{}-1_{}.tif",
        product, version, level, period, raster_id
    )
}
