use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum StepStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl StepStatus {
    /// Case-insensitive parse of the labels the client uses.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not started" | "locked" => Some(StepStatus::NotStarted),
            "in progress" | "in-progress" => Some(StepStatus::InProgress),
            "completed" => Some(StepStatus::Completed),
            _ => None,
        }
    }
}

/// Stored roadmaps come from an external generator, so labels are matched the
/// same way as client input. Null or blank means not started.
impl<'de> Deserialize<'de> for StepStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(StepStatus::NotStarted),
            Some(label) => StepStatus::parse(label).ok_or_else(|| {
                de::Error::unknown_variant(label, &["Not Started", "In Progress", "Completed"])
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<f64>,
    /// Quiz content, links, subtopics and whatever else the generator attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A learning roadmap stored at `users/{userId}/roadmaps/{roadmapId}`.
/// Generated outside this service; only step progress is written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub steps: Vec<RoadmapStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
