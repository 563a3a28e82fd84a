use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{self, AttendanceRecord, AttendanceStatus, Course};
use crate::standing;

const MAX_ABSENCE_KEY: &str = "max_absence_percent";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let courses = vec![
        ("cs-301", "Operating Systems", Some("CS301"), "cs", "3", Some("A")),
        ("cs-302", "Computer Networks", Some("CS302"), "cs", "3", Some("A")),
        ("cs-303", "Database Systems", Some("CS303"), "cs", "3", None),
        ("cs-304", "Software Engineering", None, "cs", "3", Some("B")),
        ("cs-305", "Compiler Design", Some("CS305"), "cs", "3", None),
    ];

    for (id, name, code, department_id, level, section) in courses {
        sqlx::query(
            r#"
            INSERT INTO attendance_standing.courses (id, name, code, department_id, level, section)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, code = EXCLUDED.code,
                department_id = EXCLUDED.department_id, level = EXCLUDED.level,
                section = EXCLUDED.section
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(code)
        .bind(department_id)
        .bind(level)
        .bind(section)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO attendance_standing.settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(MAX_ABSENCE_KEY)
    .bind("25")
    .execute(pool)
    .await?;

    let student_id = "20230417";
    let sessions = vec![
        (
            "cs-301",
            "Operating Systems",
            vec!["present", "present", "absent", "present", "excused", "present", "present", "present"],
        ),
        (
            "cs-302",
            "Computer Networks",
            vec!["absent", "present", "absent", "late", "present", "absent"],
        ),
        (
            "cs-303",
            "Database Systems",
            vec!["present", "present", "present", "absent", "present"],
        ),
    ];

    let first_week = NaiveDate::from_ymd_opt(2026, 2, 1).context("invalid date")?;

    for (course_id, course_name, statuses) in sessions {
        for (week, status) in statuses.into_iter().enumerate() {
            let lecture_date = first_week + chrono::Duration::weeks(week as i64);
            let source_key = format!("seed-{student_id}-{course_id}-{week}");

            sqlx::query(
                r#"
                INSERT INTO attendance_standing.attendance_records
                (id, student_id, course_id, course_name, status, lecture_date, source_key)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (source_key) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(course_id)
            .bind(course_name)
            .bind(status)
            .bind(lecture_date)
            .bind(source_key)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

pub async fn fetch_attendance(pool: &PgPool, student_id: &str) -> anyhow::Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT course_id, course_name, status, lecture_date \
         FROM attendance_standing.attendance_records \
         WHERE student_id = $1 \
         ORDER BY lecture_date, source_key",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let status: String = row.get("status");
        let lecture_date: NaiveDate = row.get("lecture_date");
        records.push(AttendanceRecord {
            course_id: models::non_empty(row.get("course_id")),
            course_name: row.get("course_name"),
            status: status.parse()?,
            date: lecture_date.to_string(),
        });
    }

    Ok(records)
}

pub async fn fetch_max_absence_percent(pool: &PgPool) -> anyhow::Result<Option<i32>> {
    let value: Option<String> = sqlx::query_scalar(
        "SELECT value FROM attendance_standing.settings WHERE key = $1",
    )
    .bind(MAX_ABSENCE_KEY)
    .fetch_optional(pool)
    .await?;

    value
        .map(|raw| {
            standing::parse_policy(&raw)
                .with_context(|| format!("{MAX_ABSENCE_KEY} setting is unusable"))
        })
        .transpose()
}

pub async fn fetch_courses(pool: &PgPool) -> anyhow::Result<Vec<Course>> {
    let rows = sqlx::query(
        "SELECT id, name, code, department_id, level, section \
         FROM attendance_standing.courses \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let courses = rows
        .into_iter()
        .map(|row| Course {
            id: row.get("id"),
            name: row.get("name"),
            code: row.get("code"),
            department_id: row.get("department_id"),
            level: row.get("level"),
            section: row.get("section"),
        })
        .collect();

    Ok(courses)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_id: String,
        course_id: Option<String>,
        course_name: String,
        status: String,
        date: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let status: AttendanceStatus = row
            .status
            .parse()
            .with_context(|| format!("row {} of {}", line + 1, csv_path.display()))?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_standing.attendance_records
            (id, student_id, course_id, course_name, status, lecture_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.student_id)
        .bind(models::non_empty(row.course_id))
        .bind(&row.course_name)
        .bind(status.as_str())
        .bind(row.date)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
