use sqlx::PgPool;
use tracing::{info, warn};

use crate::aggregate;
use crate::api::ApiClient;
use crate::db;
use crate::enrollment;
use crate::models::{AttendanceRecord, Course, Enrollment, StandingSummary};
use crate::standing::DEFAULT_MAX_ABSENCE_PERCENT;

/// Where attendance data is read from.
pub enum Source {
    Api(ApiClient),
    Postgres(PgPool),
}

impl Source {
    pub async fn fetch_attendance(&self, student_id: &str) -> anyhow::Result<Vec<AttendanceRecord>> {
        match self {
            Source::Api(client) => client.fetch_attendance(student_id).await,
            Source::Postgres(pool) => db::fetch_attendance(pool, student_id).await,
        }
    }

    pub async fn fetch_max_absence_percent(&self) -> anyhow::Result<Option<i32>> {
        match self {
            Source::Api(client) => client.fetch_max_absence_percent().await,
            Source::Postgres(pool) => db::fetch_max_absence_percent(pool).await,
        }
    }

    pub async fn fetch_courses(&self) -> anyhow::Result<Vec<Course>> {
        match self {
            Source::Api(client) => client.fetch_courses().await,
            Source::Postgres(pool) => db::fetch_courses(pool).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<AttendanceRecord>,
    pub courses: Vec<Course>,
    pub max_absence_percent: i32,
}

impl Snapshot {
    pub fn summarize(&self) -> StandingSummary {
        aggregate::summarize(&self.records, &self.courses, self.max_absence_percent)
    }
}

/// Fetches records, policy and courses concurrently. A failed fetch is logged
/// and replaced by its default so the student still gets a standing.
pub async fn load_snapshot(
    source: &Source,
    student_id: &str,
    enrollment: &Enrollment,
    max_absence_override: Option<i32>,
) -> Snapshot {
    let policy = async {
        match max_absence_override {
            Some(value) => Ok(Some(value)),
            None => source.fetch_max_absence_percent().await,
        }
    };

    let (records, policy, courses) = tokio::join!(
        source.fetch_attendance(student_id),
        policy,
        source.fetch_courses(),
    );

    let records = records.unwrap_or_else(|err| {
        warn!(student_id, error = %format!("{err:#}"), "failed to fetch attendance records");
        Vec::new()
    });

    let max_absence_percent = match policy {
        Ok(Some(value)) => value,
        Ok(None) => {
            info!(
                fallback = DEFAULT_MAX_ABSENCE_PERCENT,
                "no absence limit configured"
            );
            DEFAULT_MAX_ABSENCE_PERCENT
        }
        Err(err) => {
            warn!(
                error = %format!("{err:#}"),
                fallback = DEFAULT_MAX_ABSENCE_PERCENT,
                "failed to fetch absence policy"
            );
            DEFAULT_MAX_ABSENCE_PERCENT
        }
    };

    let courses = match courses {
        Ok(all) => enrollment::enrolled_courses(&all, enrollment),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to fetch courses");
            Vec::new()
        }
    };

    info!(
        student_id,
        records = records.len(),
        courses = courses.len(),
        max_absence_percent,
        "attendance snapshot loaded"
    );

    Snapshot {
        records,
        courses,
        max_absence_percent,
    }
}
