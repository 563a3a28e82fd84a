use crate::models::{Course, Enrollment};

/// Courses offered to the student's department and level, narrowed to the
/// student's section only when one is set.
pub fn enrolled_courses(all: &[Course], enrollment: &Enrollment) -> Vec<Course> {
    all.iter()
        .filter(|course| {
            course.department_id == enrollment.department_id
                && course.level == enrollment.level
                && enrollment
                    .section
                    .as_ref()
                    .map_or(true, |section| course.section.as_ref() == Some(section))
        })
        .cloned()
        .collect()
}
