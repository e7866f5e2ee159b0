use serde_json::json;

use crate::error::StoreError;
use crate::store::CatalogStore;
use crate::tools::args::CheckPrerequisitesArgs;
use crate::tools::builtin::Handled;

/// Prerequisites not yet completed, in declaration order.
pub fn missing_prerequisites(prerequisites: &[String], completed: &[String]) -> Vec<String> {
    prerequisites
        .iter()
        .filter(|p| !completed.contains(p))
        .cloned()
        .collect()
}

pub fn check_prerequisites(
    store: &dyn CatalogStore,
    args: CheckPrerequisitesArgs,
) -> Result<Handled, StoreError> {
    let Some(course) = store.course_prerequisites(&args.course_code)? else {
        return Ok(Handled::not_found(format!("Course '{}' not found", args.course_code)));
    };

    let missing = missing_prerequisites(&course.prerequisites, &args.completed_courses);
    let completed: Vec<&String> = args
        .completed_courses
        .iter()
        .filter(|c| course.prerequisites.contains(c))
        .collect();
    let can_enroll = missing.is_empty();

    let message = if can_enroll {
        format!("You can enroll in {}", course.course_code)
    } else {
        format!(
            "You need to complete: {} before taking {}",
            missing.join(", "),
            course.course_code
        )
    };

    Ok(Handled::success(
        json!({
            "course": course,
            "prerequisites": course.prerequisites,
            "completed_prerequisites": completed,
            "missing_prerequisites": missing,
            "can_enroll": can_enroll
        }),
        message,
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
                course("CS-1", "CS", "HMC", Some(3), &[]),
                course("MATH-10", "MATH", "HMC", Some(3), &[]),
                course("CS-5", "CS", "HMC", Some(3), &["CS-1", "MATH-10"]),
            ],
            Vec::new(),
        )
    }

    fn args(code: &str, completed: &[&str]) -> CheckPrerequisitesArgs {
        CheckPrerequisitesArgs {
            course_code: code.to_string(),
            completed_courses: completed.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn reports_missing_prerequisites_in_declaration_order() {
        let handled = check_prerequisites(&store(), args("CS-5", &["CS-1"])).unwrap();
        let ToolOutcome::Success { data } = handled.outcome else {
            panic!("expected success");
        };
        assert_eq!(data["missing_prerequisites"], json!(["MATH-10"]));
        assert_eq!(data["can_enroll"], false);
        assert_eq!(handled.message, "You need to complete: MATH-10 before taking CS-5");
    }

    #[test]
    fn all_prerequisites_completed_allows_enrollment() {
        let handled = check_prerequisites(&store(), args("CS-5", &["MATH-10", "CS-1"])).unwrap();
        let ToolOutcome::Success { data } = handled.outcome else {
            panic!("expected success");
        };
        assert_eq!(data["missing_prerequisites"], json!([]));
        assert_eq!(data["can_enroll"], true);
        assert_eq!(data["completed_prerequisites"], json!(["MATH-10", "CS-1"]));
    }

    #[test]
    fn unknown_course_is_a_soft_not_found() {
        let handled = check_prerequisites(&store(), args("CS-999", &[])).unwrap();
        assert_eq!(handled.outcome, ToolOutcome::NotFound);
        assert_eq!(handled.message, "Course 'CS-999' not found");
    }

    #[test]
    fn set_difference_ignores_unrelated_completed_courses() {
        let prereqs = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let completed = vec!["Z".to_string(), "B".to_string()];
        assert_eq!(missing_prerequisites(&prereqs, &completed), vec!["A", "C"]);
    }
}
