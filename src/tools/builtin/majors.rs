use serde_json::json;

use crate::error::StoreError;
use crate::store::CatalogStore;
use crate::tools::args::{GraduationPathArgs, MajorLookupArgs};
use crate::tools::builtin::schedule::total_credits;
use crate::tools::builtin::Handled;

fn major_not_found(major_name: &str, college_code: &str) -> Handled {
    Handled::not_found(format!("Major '{major_name}' not found at {college_code}"))
}

pub fn get_major_requirements(store: &dyn CatalogStore, args: MajorLookupArgs) -> Result<Handled, StoreError> {
    let Some(major) = store.find_major(&args.major_name, &args.college_code)? else {
        return Ok(major_not_found(&args.major_name, &args.college_code));
    };
    let message = format!("Found requirements for {} at {}", major.name, major.colleges.name);
    Ok(Handled::success(json!({ "major": major }), message))
}

pub fn validate_graduation_path(
    store: &dyn CatalogStore,
    args: GraduationPathArgs,
) -> Result<Handled, StoreError> {
    let Some(major) = store.find_major(&args.major_name, &args.college_code)? else {
        return Ok(major_not_found(&args.major_name, &args.college_code));
    };
    let courses = store.courses_by_codes(&args.planned_courses)?;

    let planned = total_credits(&courses);
    let required = major.required_credits();
    let meets_requirements = planned >= required;
    let remaining = required.saturating_sub(planned);

    let message = if meets_requirements {
        "Your planned courses meet graduation requirements".to_string()
    } else {
        format!("You need {remaining} more credits to graduate")
    };

    Ok(Handled::success(
        json!({
            "validation": {
                "major": major.name,
                "planned_courses": courses.len(),
                "total_planned_credits": planned,
                "required_credits": required,
                "credits_remaining": remaining,
                "meets_requirements": meets_requirements
            }
        }),
        message,
    ))
}
