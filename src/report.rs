use std::fmt::Write;

use crate::models::{
    AttendanceRecord, AttendanceStatus, CourseStats, Enrollment, Standing, StandingSummary,
};

pub fn at_risk(summary: &StandingSummary) -> Vec<&CourseStats> {
    summary
        .courses
        .iter()
        .filter(|course| course.status >= Standing::Danger)
        .collect()
}

/// Course name followed by its code in parentheses when it has one.
pub fn course_label(course: &CourseStats) -> String {
    match course.course_code.as_deref().filter(|code| !code.is_empty()) {
        Some(code) => format!("{} ({})", course.course_name, code),
        None => course.course_name.clone(),
    }
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

pub fn build_report(
    student_id: &str,
    enrollment: &Enrollment,
    summary: &StandingSummary,
    records: &[AttendanceRecord],
) -> String {
    let mut output = String::new();
    let section = enrollment.section.as_deref().unwrap_or("all sections");

    let _ = writeln!(output, "# Attendance Standing Report");
    let _ = writeln!(
        output,
        "Student {} (department {}, level {}, {})",
        student_id, enrollment.department_id, enrollment.level, section
    );
    let _ = writeln!(
        output,
        "Absence limit: {}% per course",
        summary.max_absence_percent
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");

    let overall = &summary.overall;
    if overall.total_lectures == 0 {
        let _ = writeln!(output, "No lectures recorded yet.");
    } else {
        let _ = writeln!(
            output,
            "- {} lectures, {} attended, {} absent ({}% attendance)",
            overall.total_lectures, overall.total_present, overall.total_absent, overall.overall_rate
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Courses");

    if summary.courses.is_empty() {
        let _ = writeln!(output, "No enrolled courses found.");
    } else {
        let _ = writeln!(
            output,
            "| Course | Code | Lectures | Present | Absent | Excused | Late | Rate | Status |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|");
        for course in summary.courses.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {}% | {} |",
                table_cell(&course.course_name),
                table_cell(course.course_code.as_deref().unwrap_or("")),
                course.total_lectures,
                course.present_count,
                course.absent_count,
                course.excused_count,
                course.late_count,
                course.attendance_rate,
                course.status_text
            );
        }
    }

    let risky = at_risk(summary);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Courses at Risk");

    if risky.is_empty() {
        let _ = writeln!(output, "No courses near the absence limit.");
    } else {
        for course in risky {
            let _ = writeln!(
                output,
                "- {}: {}% absent ({})",
                course.course_name, course.absence_rate, course.status_text
            );
        }
    }

    let mut absences: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Absent)
        .collect();
    absences.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Absences");

    if absences.is_empty() {
        let _ = writeln!(output, "No absences recorded.");
    } else {
        for record in absences.iter().take(5) {
            let _ = writeln!(output, "- {} on {}", record.course_name, record.date);
        }
    }

    output
}
