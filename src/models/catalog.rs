use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollegeRef {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Introductory,
    Intermediate,
    Advanced,
    Graduate,
}

impl CourseLevel {
    pub const ALL: [&'static str; 4] = ["introductory", "intermediate", "advanced", "graduate"];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Introductory => "introductory",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
            CourseLevel::Graduate => "graduate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub level: Option<CourseLevel>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub corequisites: Vec<String>,
    pub departments: DepartmentRef,
    pub colleges: CollegeRef,
}

impl Course {
    /// Missing credit weight counts as zero.
    pub fn credit_weight(&self) -> u32 {
        self.credits.unwrap_or(0)
    }
}

/// The prerequisite projection of a course row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePrerequisites {
    pub course_code: String,
    pub title: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub corequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorRequirement {
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub credits_required: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Major {
    pub name: String,
    #[serde(default)]
    pub total_credits: Option<u32>,
    #[serde(default)]
    pub major_requirements: Vec<MajorRequirement>,
    pub colleges: CollegeRef,
}

pub const DEFAULT_REQUIRED_CREDITS: u32 = 120;

impl Major {
    pub fn required_credits(&self) -> u32 {
        self.total_credits.unwrap_or(DEFAULT_REQUIRED_CREDITS)
    }
}

/// Filters accepted by the catalog's course search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseSearch {
    pub major: Option<String>,
    pub college: Option<String>,
    pub level: Option<CourseLevel>,
    pub keywords: Option<String>,
    pub limit: u32,
}
