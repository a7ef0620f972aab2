//! The category registry: one table row per health-data domain, iterated
//! uniformly by discovery and aggregation. Adding a category is a new entry
//! here, not a new branch anywhere else.

use crate::loader::{FileFormat, RawData};
use crate::normalize::{anthro, lungs, meals, vitals, NormalizeError, NormalizedSeries};

/// One health-data domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Anthro,
    BloodPressure,
    HeartRate,
    Sleep,
    Spo2,
    Steps,
    Temperature,
    Meals,
    LungFunction,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anthro => "anthro",
            Category::BloodPressure => "blood_pressure",
            Category::HeartRate => "heart_rate",
            Category::Sleep => "sleep",
            Category::Spo2 => "spo2",
            Category::Steps => "steps",
            Category::Temperature => "temperature",
            Category::Meals => "meals",
            Category::LungFunction => "lung_function",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filename matching rule, applied to the lowercased file name.
#[derive(Debug, Clone, Copy)]
pub enum NameRule {
    /// Any file with the right extension.
    Any,
    /// Name contains one of these needles.
    Contains(&'static [&'static str]),
    /// Name starts with the prefix, or contains the needle.
    PrefixOrContains(&'static str, &'static str),
}

impl NameRule {
    pub fn matches(&self, lower_name: &str) -> bool {
        match self {
            NameRule::Any => true,
            NameRule::Contains(needles) => needles.iter().any(|n| lower_name.contains(n)),
            NameRule::PrefixOrContains(prefix, needle) => {
                lower_name.starts_with(prefix) || lower_name.contains(needle)
            }
        }
    }
}

/// Which fields the category contributes to the participant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// time_series + metrics, plus moving_averages when rolling columns exist.
    TimeSeries,
    /// metrics only (no time dimension exposed).
    MetricsOnly,
    /// time_series + by-date dish grouping.
    MealsLog,
}

/// Everything the pipeline needs to know about one category.
pub struct CategorySpec {
    pub category: Category,
    pub subfolder: &'static str,
    pub extension: &'static str,
    pub name_rule: NameRule,
    pub format: FileFormat,
    pub normalize: fn(&RawData) -> Result<NormalizedSeries, NormalizeError>,
    pub metric_columns: &'static [&'static str],
    pub rolling_columns: &'static [&'static str],
    pub shape: OutputShape,
}

pub static REGISTRY: &[CategorySpec] = &[
    CategorySpec {
        category: Category::Anthro,
        subfolder: "anthro_data",
        extension: "csv",
        name_rule: NameRule::Any,
        format: FileFormat::Csv,
        normalize: anthro::normalize_anthro,
        metric_columns: &[
            "height_cm",
            "weight_kg",
            "mid_arm_circumference_cm",
            "waist_circumference_cm",
            "hip_circumference_cm",
            "skinfold_biceps_mm",
            "skinfold_subscapular_mm",
            "grip_strength_left_kg",
            "grip_strength_right_kg",
            "bmi",
        ],
        rolling_columns: &[],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::BloodPressure,
        subfolder: "physio_data",
        extension: "csv",
        name_rule: NameRule::PrefixOrContains("bp_", "blood_pressure"),
        format: FileFormat::Csv,
        normalize: vitals::normalize_blood_pressure,
        metric_columns: &["systolic", "diastolic"],
        rolling_columns: &["systolic", "diastolic"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::HeartRate,
        subfolder: "physio_data",
        extension: "json",
        name_rule: NameRule::Contains(&["heart_rate", "heartrate"]),
        format: FileFormat::Json,
        normalize: vitals::normalize_heart_rate,
        metric_columns: &["averageHeartRate", "maxHeartRate", "minHeartRate"],
        rolling_columns: &["averageHeartRate"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::Sleep,
        subfolder: "physio_data",
        extension: "csv",
        name_rule: NameRule::Contains(&["sleep"]),
        format: FileFormat::Csv,
        normalize: vitals::normalize_sleep,
        metric_columns: &["lightSleep", "deepSleep", "remSleep", "almostAwake", "totalSleep"],
        rolling_columns: &["totalSleep"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::Spo2,
        subfolder: "physio_data",
        extension: "json",
        name_rule: NameRule::Contains(&["spo2"]),
        format: FileFormat::Json,
        normalize: vitals::normalize_spo2,
        metric_columns: &["spo2"],
        rolling_columns: &["spo2"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::Steps,
        subfolder: "physio_data",
        extension: "csv",
        name_rule: NameRule::Contains(&["steps"]),
        format: FileFormat::Csv,
        normalize: vitals::normalize_steps,
        metric_columns: &["steps"],
        rolling_columns: &["steps"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::Temperature,
        subfolder: "physio_data",
        extension: "json",
        name_rule: NameRule::Contains(&["temperature"]),
        format: FileFormat::Json,
        normalize: vitals::normalize_temperature,
        metric_columns: &["temperature"],
        rolling_columns: &["temperature"],
        shape: OutputShape::TimeSeries,
    },
    CategorySpec {
        category: Category::Meals,
        subfolder: "meals_data",
        extension: "csv",
        name_rule: NameRule::Any,
        format: FileFormat::Csv,
        normalize: meals::normalize_meals,
        metric_columns: &[],
        rolling_columns: &[],
        shape: OutputShape::MealsLog,
    },
    CategorySpec {
        category: Category::LungFunction,
        subfolder: "lungs_data",
        extension: "csv",
        name_rule: NameRule::Any,
        format: FileFormat::Csv,
        normalize: lungs::normalize_lung_function,
        metric_columns: &["fev1", "fev1_fvc"],
        rolling_columns: &[],
        shape: OutputShape::MetricsOnly,
    },
];

/// Looks up a registry entry by category.
pub fn spec_for(category: Category) -> &'static CategorySpec {
    REGISTRY
        .iter()
        .find(|spec| spec.category == category)
        .expect("every category has a registry entry")
}
