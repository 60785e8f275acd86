use serde::{Deserialize, Serialize};

use super::lenient;

/// A student's daily ibadah targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalThresholds {
    #[serde(rename = "salawat_goal_daily")]
    pub salawat: u32,
    #[serde(rename = "adhkar_goal_daily")]
    pub adhkar: u32,
    #[serde(rename = "istighfar_goal_daily")]
    pub istighfar: u32,
}

/// Counts a student has logged for one day. Missing rows mean zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub salawat_done: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub adhkar_done: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub istighfar_done: u32,
}
