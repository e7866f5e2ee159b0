use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::catalog::{CollegeRef, Course, CourseLevel, DepartmentRef, Major, MajorRequirement};
use crate::store::sqlite::SqliteCatalog;

const CATALOG_JSON: &str = include_str!("../assets/catalog.json");

#[derive(Debug, Deserialize)]
struct SeedCatalog {
    colleges: Vec<SeedCollege>,
    departments: Vec<SeedDepartment>,
    courses: Vec<SeedCourse>,
    majors: Vec<SeedMajor>,
}

#[derive(Debug, Deserialize)]
struct SeedCollege {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedDepartment {
    college: String,
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedCourse {
    code: String,
    college: String,
    department: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    credits: Option<u32>,
    #[serde(default)]
    level: Option<CourseLevel>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    corequisites: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedMajor {
    name: String,
    college: String,
    #[serde(default)]
    total_credits: Option<u32>,
    #[serde(default)]
    requirements: Vec<MajorRequirement>,
}

/// Loads the bundled catalog into an empty store. Returns whether anything was written.
pub fn seed_if_empty(store: &SqliteCatalog) -> Result<bool, AppError> {
    if !store.is_empty()? {
        return Ok(false);
    }

    let (courses, majors) = parse_catalog(CATALOG_JSON)?;
    for course in courses.iter() {
        store.upsert_course(course)?;
    }
    for major in majors.iter() {
        store.upsert_major(major)?;
    }

    info!(
        event_name = "catalog.seeded",
        courses = courses.len(),
        majors = majors.len(),
        path = %store.path().display(),
        "seeded course catalog"
    );
    Ok(true)
}

fn parse_catalog(raw: &str) -> Result<(Vec<Course>, Vec<Major>), AppError> {
    let parsed: SeedCatalog = serde_json::from_str(raw)
        .map_err(|e| AppError::Message(format!("Invalid catalog.json: {e}")))?;

    let colleges: HashMap<String, String> = parsed
        .colleges
        .iter()
        .map(|c| (c.code.to_uppercase(), c.name.clone()))
        .collect();
    if colleges.len() != parsed.colleges.len() {
        return Err(AppError::Message(
            "catalog.json contains duplicate college codes".to_string(),
        ));
    }

    let mut departments: HashMap<(String, String), String> = HashMap::new();
    for d in parsed.departments.iter() {
        let college = d.college.to_uppercase();
        if !colleges.contains_key(&college) {
            return Err(AppError::Message(format!(
                "catalog.json department '{}' references unknown college '{}'",
                d.code, d.college
            )));
        }
        if departments
            .insert((college, d.code.to_uppercase()), d.name.clone())
            .is_some()
        {
            return Err(AppError::Message(format!(
                "catalog.json contains duplicate department '{}' at {}",
                d.code, d.college
            )));
        }
    }

    let course_codes: HashSet<String> = parsed.courses.iter().map(|c| c.code.clone()).collect();
    if course_codes.len() != parsed.courses.len() {
        return Err(AppError::Message(
            "catalog.json contains duplicate course codes".to_string(),
        ));
    }

    let mut courses = Vec::with_capacity(parsed.courses.len());
    for c in parsed.courses {
        let college = c.college.to_uppercase();
        let department = c.department.to_uppercase();
        let Some(department_name) = departments.get(&(college.clone(), department.clone())) else {
            return Err(AppError::Message(format!(
                "catalog.json course '{}' references unknown department '{}' at {}",
                c.code, c.department, c.college
            )));
        };
        for code in c.prerequisites.iter().chain(c.corequisites.iter()) {
            if !course_codes.contains(code) {
                return Err(AppError::Message(format!(
                    "catalog.json course '{}' references unknown course '{}'",
                    c.code, code
                )));
            }
        }
        courses.push(Course {
            course_code: c.code,
            title: c.title,
            description: c.description,
            credits: c.credits,
            level: c.level,
            prerequisites: c.prerequisites,
            corequisites: c.corequisites,
            departments: DepartmentRef {
                name: department_name.clone(),
                code: department,
            },
            colleges: CollegeRef {
                name: colleges.get(&college).cloned().unwrap_or_default(),
                code: college,
            },
        });
    }

    let mut majors = Vec::with_capacity(parsed.majors.len());
    let mut major_keys = HashSet::new();
    for m in parsed.majors {
        let college = m.college.to_uppercase();
        let Some(college_name) = colleges.get(&college) else {
            return Err(AppError::Message(format!(
                "catalog.json major '{}' references unknown college '{}'",
                m.name, m.college
            )));
        };
        if !major_keys.insert((college.clone(), m.name.to_lowercase())) {
            return Err(AppError::Message(format!(
                "catalog.json contains duplicate major '{}' at {}",
                m.name, m.college
            )));
        }
        for req in m.requirements.iter() {
            if let Some(code) = req.courses.iter().find(|code| !course_codes.contains(*code)) {
                return Err(AppError::Message(format!(
                    "catalog.json major '{}' requirement '{}' references unknown course '{}'",
                    m.name, req.category, code
                )));
            }
        }
        majors.push(Major {
            name: m.name,
            total_credits: m.total_credits,
            major_requirements: m.requirements,
            colleges: CollegeRef {
                name: college_name.clone(),
                code: college,
            },
        });
    }

    Ok((courses, majors))
}
