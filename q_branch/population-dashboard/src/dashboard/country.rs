//! Country record, population year columns and the country input form.
//!
//! A [`Country`] only ever exists client-side as the body of an insert or
//! update request. Reads never go through this type: the API answers are kept
//! as untyped [`Table`](crate::dashboard::Table) rows.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Population years
// ============================================================================

/// Years for which a country record carries a population count.
///
/// The set is closed: the dataset has exactly these columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PopulationYear {
    #[default]
    Y1980,
    Y2000,
    Y2010,
    Y2022,
    Y2023,
    Y2030,
    Y2050,
}

impl PopulationYear {
    /// Every year column of a country record, in column order.
    pub const ALL: [PopulationYear; 7] = [
        PopulationYear::Y1980,
        PopulationYear::Y2000,
        PopulationYear::Y2010,
        PopulationYear::Y2022,
        PopulationYear::Y2023,
        PopulationYear::Y2030,
        PopulationYear::Y2050,
    ];

    /// Years offered by the year selectors and plotted by the trend chart.
    /// 2022 is stored but never offered.
    pub const SELECTABLE: [PopulationYear; 6] = [
        PopulationYear::Y1980,
        PopulationYear::Y2000,
        PopulationYear::Y2010,
        PopulationYear::Y2023,
        PopulationYear::Y2030,
        PopulationYear::Y2050,
    ];

    pub fn year(&self) -> u16 {
        match self {
            PopulationYear::Y1980 => 1980,
            PopulationYear::Y2000 => 2000,
            PopulationYear::Y2010 => 2010,
            PopulationYear::Y2022 => 2022,
            PopulationYear::Y2023 => 2023,
            PopulationYear::Y2030 => 2030,
            PopulationYear::Y2050 => 2050,
        }
    }

    pub fn from_year(year: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|y| y.year() == year)
    }

    /// Name of the matching column in API rows, e.g. `pop2023`.
    pub fn column(&self) -> &'static str {
        match self {
            PopulationYear::Y1980 => "pop1980",
            PopulationYear::Y2000 => "pop2000",
            PopulationYear::Y2010 => "pop2010",
            PopulationYear::Y2022 => "pop2022",
            PopulationYear::Y2023 => "pop2023",
            PopulationYear::Y2030 => "pop2030",
            PopulationYear::Y2050 => "pop2050",
        }
    }

    pub fn is_selectable(&self) -> bool {
        Self::SELECTABLE.contains(self)
    }
}

impl std::fmt::Display for PopulationYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

impl std::str::FromStr for PopulationYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .ok()
            .and_then(Self::from_year)
            .ok_or_else(|| format!("unknown population year: {s}"))
    }
}

/// Years travel as plain numbers: `2023`.
impl<'de> Deserialize<'de> for PopulationYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let year = u16::deserialize(deserializer)?;
        Self::from_year(year).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown population year: {year}, expected one of 1980, 2000, 2010, 2022, 2023, 2030, 2050"
            ))
        })
    }
}

impl Serialize for PopulationYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.year())
    }
}

// ============================================================================
// Country record
// ============================================================================

/// Wire shape of a country sent to `/insert_country/` and `/update_country/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub country: String,
    pub rank: i64,
    pub area: f64,
    pub land_area_km: f64,
    pub cca2: String,
    pub cca3: String,
    pub net_change: f64,
    pub growth_rate: f64,
    pub world_percentage: f64,
    pub density: f64,
    pub density_mi: f64,
    pub place: i64,
    pub pop1980: i64,
    pub pop2000: i64,
    pub pop2010: i64,
    pub pop2022: i64,
    pub pop2023: i64,
    pub pop2030: i64,
    pub pop2050: i64,
}

impl Country {
    pub fn population(&self, year: PopulationYear) -> i64 {
        match year {
            PopulationYear::Y1980 => self.pop1980,
            PopulationYear::Y2000 => self.pop2000,
            PopulationYear::Y2010 => self.pop2010,
            PopulationYear::Y2022 => self.pop2022,
            PopulationYear::Y2023 => self.pop2023,
            PopulationYear::Y2030 => self.pop2030,
            PopulationYear::Y2050 => self.pop2050,
        }
    }

    /// Field/value pairs in wire order, used for the transposed confirmation table.
    pub fn field_values(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("country", self.country.clone()),
            ("rank", self.rank.to_string()),
            ("area", self.area.to_string()),
            ("landAreaKm", self.land_area_km.to_string()),
            ("cca2", self.cca2.clone()),
            ("cca3", self.cca3.clone()),
            ("netChange", self.net_change.to_string()),
            ("growthRate", self.growth_rate.to_string()),
            ("worldPercentage", self.world_percentage.to_string()),
            ("density", self.density.to_string()),
            ("densityMi", self.density_mi.to_string()),
            ("place", self.place.to_string()),
        ];
        for year in PopulationYear::ALL {
            fields.push((year.column(), self.population(year).to_string()));
        }
        fields
    }
}

// ============================================================================
// Input form
// ============================================================================

/// `area` default of the input form. An untouched field means "no area".
pub const AREA_SENTINEL: f64 = 1.0;

/// `growthRate` default of the input form. An untouched field means "no rate".
pub const GROWTH_RATE_SENTINEL: f64 = -1.1;

/// Form validation errors, reported to the user; nothing is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum { field: &'static str, min: f64, value: f64 },

    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum { field: &'static str, max: f64, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

/// Raw values of the country form, as typed by the user.
///
/// Defaults match the form widgets: every number starts at its minimum,
/// which is why `area` and `growthRate` start at their sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryForm {
    pub country: String,
    pub rank: i64,
    pub area: f64,
    pub land_area_km: f64,
    pub cca2: String,
    pub cca3: String,
    pub net_change: f64,
    pub growth_rate: f64,
    pub world_percentage: f64,
    pub density: f64,
    pub density_mi: f64,
    pub place: i64,
    pub pop1980: i64,
    pub pop2000: i64,
    pub pop2010: i64,
    pub pop2022: i64,
    pub pop2023: i64,
    pub pop2030: i64,
    pub pop2050: i64,
}

impl Default for CountryForm {
    fn default() -> Self {
        Self {
            country: String::new(),
            rank: 0,
            area: AREA_SENTINEL,
            land_area_km: 0.0,
            cca2: String::new(),
            cca3: String::new(),
            net_change: 0.0,
            growth_rate: GROWTH_RATE_SENTINEL,
            world_percentage: 0.0,
            density: 0.0,
            density_mi: 0.0,
            place: 0,
            pop1980: 0,
            pop2000: 0,
            pop2010: 0,
            pop2022: 0,
            pop2023: 0,
            pop2030: 0,
            pop2050: 0,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: Option<f64>) -> Result<(), FormError> {
    if !value.is_finite() {
        return Err(FormError::NotFinite { field });
    }
    if value < min {
        return Err(FormError::BelowMinimum { field, min, value });
    }
    if let Some(max) = max {
        if value > max {
            return Err(FormError::AboveMaximum { field, max, value });
        }
    }
    Ok(())
}

impl CountryForm {
    /// Check every field against its widget bounds.
    pub fn validate(&self) -> Result<(), FormError> {
        check_range("rank", self.rank as f64, 0.0, Some(250.0))?;
        check_range("area", self.area, AREA_SENTINEL, None)?;
        check_range("landAreaKm", self.land_area_km, 0.0, None)?;
        check_range("netChange", self.net_change, 0.0, None)?;
        check_range("growthRate", self.growth_rate, GROWTH_RATE_SENTINEL, Some(1.0))?;
        check_range("worldPercentage", self.world_percentage, 0.0, Some(1.0))?;
        check_range("density", self.density, 0.0, None)?;
        check_range("densityMi", self.density_mi, 0.0, None)?;
        check_range("place", self.place as f64, 0.0, None)?;
        let pops = [
            ("pop1980", self.pop1980),
            ("pop2000", self.pop2000),
            ("pop2010", self.pop2010),
            ("pop2022", self.pop2022),
            ("pop2023", self.pop2023),
            ("pop2030", self.pop2030),
            ("pop2050", self.pop2050),
        ];
        for (field, value) in pops {
            check_range(field, value as f64, 0.0, None)?;
        }
        Ok(())
    }

    /// Validate, then build the record to transmit with sentinels normalised.
    pub fn into_country(self) -> Result<Country, FormError> {
        self.validate()?;
        let mut country = Country {
            country: self.country,
            rank: self.rank,
            area: self.area,
            land_area_km: self.land_area_km,
            cca2: self.cca2,
            cca3: self.cca3,
            net_change: self.net_change,
            growth_rate: self.growth_rate,
            world_percentage: self.world_percentage,
            density: self.density,
            density_mi: self.density_mi,
            place: self.place,
            pop1980: self.pop1980,
            pop2000: self.pop2000,
            pop2010: self.pop2010,
            pop2022: self.pop2022,
            pop2023: self.pop2023,
            pop2030: self.pop2030,
            pop2050: self.pop2050,
        };
        normalize_sentinels(&mut country);
        Ok(country)
    }
}

/// Replace untouched form defaults with zero.
///
/// Keyed on the exact sentinel values: `area == 1.0` and `growthRate == -1.1`.
pub fn normalize_sentinels(country: &mut Country) {
    if country.area == AREA_SENTINEL {
        country.area = 0.0;
    }
    if country.growth_rate == GROWTH_RATE_SENTINEL {
        country.growth_rate = 0.0;
    }
}
