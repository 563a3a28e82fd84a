use std::collections::HashMap;

use crate::models::{
    AttendanceRecord, AttendanceStatus, Course, CourseStats, OverallStats, StandingSummary,
};
use crate::standing;

pub fn group_by_course(records: &[AttendanceRecord]) -> HashMap<String, Vec<&AttendanceRecord>> {
    let mut buckets: HashMap<String, Vec<&AttendanceRecord>> = HashMap::new();

    for record in records {
        buckets
            .entry(record.course_key().to_string())
            .or_default()
            .push(record);
    }

    buckets
}

/// One entry per enrolled course, worst attendance first and courses without
/// lectures last.
pub fn course_stats(
    records: &[AttendanceRecord],
    courses: &[Course],
    max_absence_percent: i32,
) -> Vec<CourseStats> {
    let mut buckets = group_by_course(records);

    // A bucket is claimed by the first course that matches it, so every record
    // feeds at most one course.
    let mut stats: Vec<CourseStats> = courses
        .iter()
        .map(|course| {
            let bucket = buckets
                .remove(&course.id)
                .or_else(|| buckets.remove(&course.name))
                .unwrap_or_default();
            stats_for(course, &bucket, max_absence_percent)
        })
        .collect();

    stats.sort_by(|a, b| {
        (a.total_lectures == 0)
            .cmp(&(b.total_lectures == 0))
            .then(a.attendance_rate.cmp(&b.attendance_rate))
    });
    stats
}

fn stats_for(course: &Course, bucket: &[&AttendanceRecord], max_absence_percent: i32) -> CourseStats {
    let count = |status: AttendanceStatus| bucket.iter().filter(|r| r.status == status).count();

    let present = count(AttendanceStatus::Present);
    let absent = count(AttendanceStatus::Absent);
    let excused = count(AttendanceStatus::Excused);
    let late = count(AttendanceStatus::Late);
    let total = bucket.len();

    let (attendance_rate, absence_rate, classification) = if total == 0 {
        (100, 0, standing::new_course())
    } else {
        let rate = standing::percent(present + excused, total);
        (
            rate,
            standing::percent(absent, total),
            standing::classify(rate, max_absence_percent),
        )
    };

    CourseStats {
        course_id: course.id.clone(),
        course_name: course.name.clone(),
        course_code: course.code.clone(),
        total_lectures: total,
        present_count: present,
        absent_count: absent,
        excused_count: excused,
        late_count: late,
        attendance_rate,
        absence_rate,
        status: classification.standing,
        status_text: classification.text.to_string(),
        status_color: classification.color.to_string(),
    }
}

pub fn overall_stats(courses: &[CourseStats]) -> OverallStats {
    let total_lectures: usize = courses.iter().map(|c| c.total_lectures).sum();
    let total_present: usize = courses.iter().map(CourseStats::effective_present).sum();
    let total_absent: usize = courses.iter().map(|c| c.absent_count).sum();

    OverallStats {
        total_lectures,
        total_present,
        total_absent,
        overall_rate: if total_lectures > 0 {
            standing::percent(total_present, total_lectures)
        } else {
            100
        },
    }
}

pub fn summarize(
    records: &[AttendanceRecord],
    courses: &[Course],
    max_absence_percent: i32,
) -> StandingSummary {
    let courses = course_stats(records, courses, max_absence_percent);
    let overall = overall_stats(&courses);

    StandingSummary {
        max_absence_percent,
        courses,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Standing;

    fn course(id: &str, name: &str) -> Course {
        Course {
            id: id.to_string(),
            name: name.to_string(),
            code: Some(format!("CS-{id}")),
            department_id: "1".to_string(),
            level: "2".to_string(),
            section: None,
        }
    }

    fn record(course_id: Option<&str>, course_name: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            course_id: course_id.map(str::to_string),
            course_name: course_name.to_string(),
            status,
            date: "2026-02-01".to_string(),
        }
    }

    fn records_for(id: &str, statuses: &[(AttendanceStatus, usize)]) -> Vec<AttendanceRecord> {
        statuses
            .iter()
            .flat_map(|(status, n)| std::iter::repeat_with(move || record(Some(id), "", *status)).take(*n))
            .collect()
    }

    #[test]
    fn excused_counts_as_attendance() {
        let records = records_for(
            "a",
            &[
                (AttendanceStatus::Present, 5),
                (AttendanceStatus::Absent, 2),
                (AttendanceStatus::Excused, 3),
            ],
        );
        let stats = course_stats(&records, &[course("a", "Algorithms")], 25);

        assert_eq!(stats[0].total_lectures, 10);
        assert_eq!(stats[0].effective_present(), 8);
        assert_eq!(stats[0].attendance_rate, 80);
        assert_eq!(stats[0].absence_rate, 20);
        assert_eq!(stats[0].status, Standing::Danger);
    }

    #[test]
    fn courses_without_lectures_are_new_regardless_of_policy() {
        for max in [1, 25, 100] {
            let stats = course_stats(&[], &[course("a", "Algorithms")], max);
            assert_eq!(stats[0].total_lectures, 0);
            assert_eq!(stats[0].attendance_rate, 100);
            assert_eq!(stats[0].absence_rate, 0);
            assert_eq!(stats[0].status, Standing::Excellent);
            assert_eq!(stats[0].status_text, "جديد");
            assert_eq!(stats[0].status_color, "green");
        }
    }

    #[test]
    fn late_records_only_count_toward_total() {
        let records = records_for(
            "a",
            &[(AttendanceStatus::Present, 2), (AttendanceStatus::Late, 2)],
        );
        let stats = course_stats(&records, &[course("a", "Algorithms")], 25);

        assert_eq!(stats[0].total_lectures, 4);
        assert_eq!(stats[0].late_count, 2);
        assert_eq!(
            stats[0].present_count + stats[0].absent_count + stats[0].excused_count,
            2
        );
        assert_eq!(stats[0].attendance_rate, 50);
        assert_eq!(stats[0].absence_rate, 0);
        assert_eq!(stats[0].status, Standing::Blocked);
    }

    #[test]
    fn sorts_worst_first_and_new_courses_last() {
        let mut records = records_for(
            "b",
            &[(AttendanceStatus::Present, 9), (AttendanceStatus::Absent, 1)],
        );
        records.extend(records_for(
            "c",
            &[(AttendanceStatus::Present, 2), (AttendanceStatus::Absent, 3)],
        ));
        let courses = vec![course("a", "A"), course("b", "B"), course("c", "C")];

        let stats = course_stats(&records, &courses, 25);
        let order: Vec<&str> = stats.iter().map(|s| s.course_id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        assert_eq!(stats[0].attendance_rate, 40);
        assert_eq!(stats[1].attendance_rate, 90);
    }

    #[test]
    fn overall_rollup_sums_effective_presence() {
        let mut records = records_for(
            "1",
            &[(AttendanceStatus::Present, 3), (AttendanceStatus::Absent, 1)],
        );
        records.extend(records_for("2", &[(AttendanceStatus::Excused, 2)]));
        let courses = vec![course("1", "Course1"), course("2", "Course2")];

        let summary = summarize(&records, &courses, 25);
        assert_eq!(summary.overall.total_lectures, 6);
        assert_eq!(summary.overall.total_present, 5);
        assert_eq!(summary.overall.total_absent, 1);
        assert_eq!(summary.overall.overall_rate, 83);
    }

    #[test]
    fn empty_rollup_defaults_to_full_attendance() {
        let overall = overall_stats(&[]);
        assert_eq!(overall.total_lectures, 0);
        assert_eq!(overall.overall_rate, 100);
    }

    #[test]
    fn records_without_course_id_group_by_name() {
        let records = vec![
            record(None, "Networks", AttendanceStatus::Absent),
            record(None, "Networks", AttendanceStatus::Present),
            record(Some("7"), "Networks", AttendanceStatus::Present),
        ];
        let buckets = group_by_course(&records);
        assert_eq!(buckets["Networks"].len(), 2);
        assert_eq!(buckets["7"].len(), 1);

        let stats = course_stats(&records, &[course("9", "Networks")], 25);
        assert_eq!(stats[0].total_lectures, 2);
        assert_eq!(stats[0].attendance_rate, 50);
    }

    #[test]
    fn same_named_courses_do_not_share_records() {
        let records: Vec<AttendanceRecord> = (0..4)
            .map(|_| record(None, "Lab", AttendanceStatus::Absent))
            .collect();
        let courses = vec![course("1", "Lab"), course("2", "Lab")];

        let summary = summarize(&records, &courses, 25);
        let totals: Vec<usize> = summary.courses.iter().map(|c| c.total_lectures).collect();
        assert_eq!(totals, vec![4, 0]);
        assert_eq!(summary.courses[0].course_id, "1");
        assert_eq!(summary.overall.total_lectures, records.len());
        assert_eq!(summary.overall.total_absent, 4);
    }

    #[test]
    fn id_bucket_does_not_claim_name_bucket() {
        let records = vec![
            record(Some("1"), "Lab", AttendanceStatus::Present),
            record(None, "Lab", AttendanceStatus::Absent),
        ];
        let courses = vec![course("1", "Lab"), course("2", "Lab")];

        let summary = summarize(&records, &courses, 25);
        assert_eq!(summary.overall.total_lectures, 2);
        let by_id = |id: &str| summary.courses.iter().find(|c| c.course_id == id).unwrap();
        assert_eq!(by_id("1").present_count, 1);
        assert_eq!(by_id("2").absent_count, 1);
    }

    #[test]
    fn records_for_other_courses_are_ignored() {
        let records = records_for("x", &[(AttendanceStatus::Absent, 4)]);
        let stats = course_stats(&records, &[course("a", "Algorithms")], 25);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_lectures, 0);
    }

    #[test]
    fn rerunning_produces_identical_output() {
        let mut records = records_for(
            "a",
            &[(AttendanceStatus::Present, 3), (AttendanceStatus::Late, 1)],
        );
        records.extend(records_for("b", &[(AttendanceStatus::Absent, 2)]));
        let courses = vec![course("a", "A"), course("b", "B"), course("c", "C")];

        let first = serde_json::to_string(&summarize(&records, &courses, 25)).unwrap();
        let second = serde_json::to_string(&summarize(&records, &courses, 25)).unwrap();
        assert_eq!(first, second);
    }
}
