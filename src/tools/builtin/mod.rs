pub mod courses;
pub mod majors;
pub mod prerequisites;
pub mod schedule;

use serde_json::{json, Value};

use crate::models::catalog::CourseLevel;
use crate::tools::definition::{ParamSpec, ParamType, ToolOutcome, ToolSpec};

const COLLEGE_CODES: &str = "College code (HMC, CMC, POMONA, SCRIPPS, PITZER)";

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_MAX_CREDITS: u32 = 18;

pub fn definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "search_courses".to_string(),
            description: "Search for courses across Claremont Colleges based on criteria".to_string(),
            parameters: vec![
                ParamSpec::new(
                    "major",
                    ParamType::String,
                    "Major or field of study (e.g., 'Computer Science', 'Mathematics')",
                ),
                ParamSpec::new("college", ParamType::String, COLLEGE_CODES),
                ParamSpec::new(
                    "level",
                    ParamType::Enum {
                        values: CourseLevel::ALL.iter().map(|s| s.to_string()).collect(),
                    },
                    "Course difficulty level",
                ),
                ParamSpec::new(
                    "keywords",
                    ParamType::String,
                    "Keywords to search in course titles and descriptions",
                ),
                ParamSpec::new("limit", ParamType::Integer, "Maximum number of courses to return")
                    .with_default(json!(DEFAULT_SEARCH_LIMIT)),
            ],
        },
        ToolSpec {
            name: "get_major_requirements".to_string(),
            description: "Get graduation requirements for a specific major at a college".to_string(),
            parameters: vec![
                ParamSpec::new(
                    "major_name",
                    ParamType::String,
                    "Name of the major (e.g., 'Computer Science', 'Economics')",
                )
                .required(),
                ParamSpec::new("college_code", ParamType::String, COLLEGE_CODES).required(),
            ],
        },
        ToolSpec {
            name: "check_prerequisites".to_string(),
            description: "Check prerequisites for a specific course".to_string(),
            parameters: vec![
                ParamSpec::new("course_code", ParamType::String, "Course code (e.g., 'CS-5', 'MATH-55')")
                    .required(),
                ParamSpec::new(
                    "completed_courses",
                    ParamType::StringArray,
                    "List of course codes the student has completed",
                ),
            ],
        },
        ToolSpec {
            name: "get_courses_in_department".to_string(),
            description: "Get all courses in a specific department at a college".to_string(),
            parameters: vec![
                ParamSpec::new(
                    "department_code",
                    ParamType::String,
                    "Department code (e.g., 'CS', 'MATH', 'ECON')",
                )
                .required(),
                ParamSpec::new("college_code", ParamType::String, COLLEGE_CODES).required(),
            ],
        },
        ToolSpec {
            name: "build_semester_schedule".to_string(),
            description: "Generate a suggested semester schedule based on courses and constraints"
                .to_string(),
            parameters: vec![
                ParamSpec::new(
                    "course_codes",
                    ParamType::StringArray,
                    "List of course codes to include in schedule",
                )
                .required(),
                ParamSpec::new("max_credits", ParamType::Integer, "Maximum credit hours per semester")
                    .with_default(json!(DEFAULT_MAX_CREDITS)),
                ParamSpec::new(
                    "semester",
                    ParamType::String,
                    "Target semester (e.g., 'fall2024', 'spring2025')",
                ),
            ],
        },
        ToolSpec {
            name: "validate_graduation_path".to_string(),
            description: "Validate if a planned course sequence meets graduation requirements"
                .to_string(),
            parameters: vec![
                ParamSpec::new("major_name", ParamType::String, "Name of the major").required(),
                ParamSpec::new("college_code", ParamType::String, "College code").required(),
                ParamSpec::new(
                    "planned_courses",
                    ParamType::StringArray,
                    "List of all planned course codes",
                )
                .required(),
            ],
        },
    ]
}

/// What a handler hands back to the executor when the store answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub outcome: ToolOutcome,
    pub message: String,
}

impl Handled {
    pub fn success(data: Value, message: impl Into<String>) -> Self {
        Self {
            outcome: ToolOutcome::Success { data },
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            outcome: ToolOutcome::NotFound,
            message: message.into(),
        }
    }

    pub fn unsatisfied(data: Value, message: impl Into<String>) -> Self {
        Self {
            outcome: ToolOutcome::Unsatisfied { data },
            message: message.into(),
        }
    }
}
