use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            other => anyhow::bail!("unknown attendance status `{other}`"),
        }
    }
}

impl<'de> Deserialize<'de> for AttendanceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<AttendanceStatus>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default, deserialize_with = "optional_id")]
    pub course_id: Option<String>,
    #[serde(default)]
    pub course_name: String,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub date: String,
}

impl AttendanceRecord {
    /// Bucket key: the course id when present, otherwise the course name.
    pub fn course_key(&self) -> &str {
        self.course_id.as_deref().unwrap_or(&self.course_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(deserialize_with = "id")]
    pub department_id: String,
    #[serde(deserialize_with = "id")]
    pub level: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub department_id: String,
    pub level: String,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Excellent,
    Good,
    Warning,
    Danger,
    Blocked,
}

impl Standing {
    pub fn label(&self) -> &'static str {
        match self {
            Standing::Excellent => "ممتاز",
            Standing::Good => "جيد",
            Standing::Warning => "تحذير",
            Standing::Danger => "خطر",
            Standing::Blocked => "محروم",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Standing::Excellent => "green",
            Standing::Good => "blue",
            Standing::Warning => "orange",
            Standing::Danger => "red",
            Standing::Blocked => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub standing: Standing,
    pub text: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseStats {
    pub course_id: String,
    pub course_name: String,
    pub course_code: Option<String>,
    pub total_lectures: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub excused_count: usize,
    pub late_count: usize,
    pub attendance_rate: i32,
    pub absence_rate: i32,
    pub status: Standing,
    pub status_text: String,
    pub status_color: String,
}

impl CourseStats {
    pub fn effective_present(&self) -> usize {
        self.present_count + self.excused_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_lectures: usize,
    pub total_present: usize,
    pub total_absent: usize,
    pub overall_rate: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingSummary {
    pub max_absence_percent: i32,
    pub courses: Vec<CourseStats>,
    pub overall: OverallStats,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(value) => value,
            RawId::Integer(value) => value.to_string(),
            RawId::Float(value) => value.to_string(),
        }
    }
}

fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(non_empty(raw.map(String::from)))
}

/// Blank ids are treated as missing so records fall back to the course name.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
