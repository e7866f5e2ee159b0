use serde_json::json;

use crate::error::StoreError;
use crate::models::catalog::Course;
use crate::store::CatalogStore;
use crate::tools::args::BuildScheduleArgs;
use crate::tools::builtin::Handled;

const DEFAULT_SEMESTER: &str = "Current";

pub fn total_credits(courses: &[Course]) -> u32 {
    courses.iter().map(Course::credit_weight).sum()
}

/// Assembles a schedule from course codes. Only the credit ceiling is checked;
/// meeting times are not considered.
pub fn build_semester_schedule(
    store: &dyn CatalogStore,
    args: BuildScheduleArgs,
) -> Result<Handled, StoreError> {
    let courses = store.courses_by_codes(&args.course_codes)?;
    let unresolved: Vec<&String> = args
        .course_codes
        .iter()
        .filter(|code| !courses.iter().any(|c| &c.course_code == *code))
        .collect();
    let total = total_credits(&courses);
    let max_credits = args.max_credits;

    if total > max_credits {
        return Ok(Handled::unsatisfied(
            json!({
                "total_credits": total,
                "max_credits": max_credits,
                "unresolved_codes": unresolved
            }),
            format!("Schedule exceeds credit limit: {total} > {max_credits} credits"),
        ));
    }

    let count = courses.len();
    let semester = args.semester.unwrap_or_else(|| DEFAULT_SEMESTER.to_string());
    Ok(Handled::success(
        json!({
            "schedule": {
                "semester": semester,
                "courses": courses,
                "total_credits": total,
                "remaining_capacity": max_credits - total
            },
            "unresolved_codes": unresolved
        }),
        format!("Built schedule with {count} courses ({total} credits)"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixture::FixtureCatalog;
    use crate::store::sqlite::tests::course;
    use crate::tools::definition::ToolOutcome;

    fn store() -> FixtureCatalog {
        FixtureCatalog::new(
            vec![
                course("CS-5", "CS", "HMC", Some(3), &[]),
                course("MATH-10", "MATH", "HMC", Some(3), &[]),
                course("PHYS-24", "PHYS", "HMC", Some(3), &[]),
                course("WRIT-1", "WRIT", "HMC", None, &[]),
            ],
            Vec::new(),
        )
    }

    fn args(codes: &[&str], max_credits: u32) -> BuildScheduleArgs {
        BuildScheduleArgs {
            course_codes: codes.iter().map(|s| s.to_string()).collect(),
            max_credits,
            semester: None,
        }
    }

    #[test]
    fn schedule_at_exact_capacity_succeeds() {
        let handled = build_semester_schedule(&store(), args(&["CS-5", "MATH-10"], 6)).unwrap();
        let ToolOutcome::Success { data } = handled.outcome else {
            panic!("expected success");
        };
        assert_eq!(data["schedule"]["remaining_capacity"], 0);
        assert_eq!(data["schedule"]["total_credits"], 6);
        assert_eq!(data["schedule"]["semester"], "Current");
        assert_eq!(handled.message, "Built schedule with 2 courses (6 credits)");
    }

    #[test]
    fn schedule_over_capacity_is_a_soft_failure() {
        let handled =
            build_semester_schedule(&store(), args(&["CS-5", "MATH-10", "PHYS-24"], 6)).unwrap();
        assert!(matches!(handled.outcome, ToolOutcome::Unsatisfied { .. }));
        assert!(handled.message.contains("9 > 6"));
    }

    #[test]
    fn missing_credits_and_unknown_codes_count_as_zero() {
        let handled =
            build_semester_schedule(&store(), args(&["CS-5", "WRIT-1", "NOPE-9"], 3)).unwrap();
        let ToolOutcome::Success { data } = handled.outcome else {
            panic!("expected success");
        };
        assert_eq!(data["schedule"]["total_credits"], 3);
        assert_eq!(data["unresolved_codes"], json!(["NOPE-9"]));
    }
}
