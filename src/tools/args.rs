//! Strongly-typed argument structs, one per tool.
//!
//! Payloads reach these only after [`crate::tools::registry::ToolRegistry::validate`]
//! has checked them against the declared schema and filled in defaults.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::models::catalog::CourseLevel;
use crate::tools::builtin::{DEFAULT_MAX_CREDITS, DEFAULT_SEARCH_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchCourses,
    GetMajorRequirements,
    CheckPrerequisites,
    GetCoursesInDepartment,
    BuildSemesterSchedule,
    ValidateGraduationPath,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::SearchCourses,
        ToolName::GetMajorRequirements,
        ToolName::CheckPrerequisites,
        ToolName::GetCoursesInDepartment,
        ToolName::BuildSemesterSchedule,
        ToolName::ValidateGraduationPath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchCourses => "search_courses",
            ToolName::GetMajorRequirements => "get_major_requirements",
            ToolName::CheckPrerequisites => "check_prerequisites",
            ToolName::GetCoursesInDepartment => "get_courses_in_department",
            ToolName::BuildSemesterSchedule => "build_semester_schedule",
            ToolName::ValidateGraduationPath => "validate_graduation_path",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchCoursesArgs {
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub level: Option<CourseLevel>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MajorLookupArgs {
    pub major_name: String,
    pub college_code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckPrerequisitesArgs {
    pub course_code: String,
    #[serde(default)]
    pub completed_courses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepartmentCoursesArgs {
    pub department_code: String,
    pub college_code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildScheduleArgs {
    pub course_codes: Vec<String>,
    #[serde(default = "default_max_credits")]
    pub max_credits: u32,
    #[serde(default)]
    pub semester: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraduationPathArgs {
    pub major_name: String,
    pub college_code: String,
    pub planned_courses: Vec<String>,
}

/// A validated invocation, ready for its handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    SearchCourses(SearchCoursesArgs),
    GetMajorRequirements(MajorLookupArgs),
    CheckPrerequisites(CheckPrerequisitesArgs),
    GetCoursesInDepartment(DepartmentCoursesArgs),
    BuildSemesterSchedule(BuildScheduleArgs),
    ValidateGraduationPath(GraduationPathArgs),
}

impl ToolRequest {
    pub fn decode(name: ToolName, args: Value) -> Result<Self, serde_json::Error> {
        Ok(match name {
            ToolName::SearchCourses => ToolRequest::SearchCourses(from_value(args)?),
            ToolName::GetMajorRequirements => ToolRequest::GetMajorRequirements(from_value(args)?),
            ToolName::CheckPrerequisites => ToolRequest::CheckPrerequisites(from_value(args)?),
            ToolName::GetCoursesInDepartment => ToolRequest::GetCoursesInDepartment(from_value(args)?),
            ToolName::BuildSemesterSchedule => ToolRequest::BuildSemesterSchedule(from_value(args)?),
            ToolName::ValidateGraduationPath => ToolRequest::ValidateGraduationPath(from_value(args)?),
        })
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolRequest::SearchCourses(_) => ToolName::SearchCourses,
            ToolRequest::GetMajorRequirements(_) => ToolName::GetMajorRequirements,
            ToolRequest::CheckPrerequisites(_) => ToolName::CheckPrerequisites,
            ToolRequest::GetCoursesInDepartment(_) => ToolName::GetCoursesInDepartment,
            ToolRequest::BuildSemesterSchedule(_) => ToolName::BuildSemesterSchedule,
            ToolRequest::ValidateGraduationPath(_) => ToolName::ValidateGraduationPath,
        }
    }
}

fn from_value<T: DeserializeOwned>(args: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(args)
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

fn default_max_credits() -> u32 {
    DEFAULT_MAX_CREDITS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_through_the_closed_enumeration() {
        for name in ToolName::ALL {
            assert_eq!(ToolName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(ToolName::from_name("searchCourses"), None);
    }

    #[test]
    fn decode_rejects_unknown_fields() {
        let err = ToolRequest::decode(
            ToolName::GetCoursesInDepartment,
            json!({ "department_code": "CS", "college_code": "HMC", "term": "fall" }),
        );
        assert!(err.is_err());
    }

    #[test]
    fn decode_applies_struct_defaults() {
        let req = ToolRequest::decode(ToolName::BuildSemesterSchedule, json!({ "course_codes": ["CS-5"] }))
            .unwrap();
        match req {
            ToolRequest::BuildSemesterSchedule(args) => {
                assert_eq!(args.max_credits, 18);
                assert_eq!(args.semester, None);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }
}
