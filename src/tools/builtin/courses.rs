use serde_json::json;

use crate::error::StoreError;
use crate::models::catalog::CourseSearch;
use crate::store::CatalogStore;
use crate::tools::args::{DepartmentCoursesArgs, SearchCoursesArgs};
use crate::tools::builtin::Handled;

pub fn search_courses(store: &dyn CatalogStore, args: SearchCoursesArgs) -> Result<Handled, StoreError> {
    let search = CourseSearch {
        major: args.major,
        college: args.college,
        level: args.level,
        keywords: args.keywords,
        limit: args.limit,
    };
    let courses = store.search_courses(&search)?;
    let count = courses.len();
    Ok(Handled::success(
        json!({ "courses": courses, "count": count }),
        format!("Found {count} courses matching your criteria"),
    ))
}

/// An empty department is still a successful lookup.
pub fn courses_in_department(
    store: &dyn CatalogStore,
    args: DepartmentCoursesArgs,
) -> Result<Handled, StoreError> {
    let department = args.department_code.trim().to_uppercase();
    let college = args.college_code.trim().to_uppercase();
    let courses = store.courses_in_department(&department, &college)?;
    let count = courses.len();
    Ok(Handled::success(
        json!({ "courses": courses, "count": count }),
        format!("Found {count} courses in {department} department at {college}"),
    ))
}
