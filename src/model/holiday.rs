use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::member::Location;

pub const DEFAULT_HOLIDAY_COLOR: &str = "#4CAF50";

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum HolidayScope {
    #[serde(rename = "UAE")]
    #[strum(serialize = "UAE")]
    Uae,
    India,
    Both,
}

impl HolidayScope {
    pub fn applies_to(&self, location: Location) -> bool {
        match self {
            HolidayScope::Both => true,
            HolidayScope::Uae => location == Location::Uae,
            HolidayScope::India => location == Location::India,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HolidayEntry {
    pub id: u64,
    #[schema(example = "National Day Holiday (UAE)")]
    pub name: String,
    #[schema(example = "2026-12-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub location: HolidayScope,
    #[schema(example = "#2196F3")]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct NewHoliday {
    #[schema(example = "New Year's Day")]
    pub name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub location: HolidayScope,
    pub color: Option<String>,
}
