use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;
use crate::models::catalog::{Course, CoursePrerequisites, CourseSearch, Major};
use crate::store::CatalogStore;

/// In-process catalog for unit tests; can be switched into a failing state.
pub struct FixtureCatalog {
    courses: Vec<Course>,
    majors: Vec<Major>,
    down: AtomicBool,
}

impl FixtureCatalog {
    pub fn new(courses: Vec<Course>, majors: Vec<Major>) -> Self {
        Self {
            courses,
            majors,
            down: AtomicBool::new(false),
        }
    }

    pub fn unreachable() -> Self {
        let store = Self::new(Vec::new(), Vec::new());
        store.down.store(true, Ordering::SeqCst);
        store
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl CatalogStore for FixtureCatalog {
    fn search_courses(&self, search: &CourseSearch) -> Result<Vec<Course>, StoreError> {
        self.check()?;
        Ok(self
            .courses
            .iter()
            .filter(|c| {
                search
                    .college
                    .as_ref()
                    .map_or(true, |code| c.colleges.code.eq_ignore_ascii_case(code))
            })
            .filter(|c| search.level.as_ref().map_or(true, |l| c.level.as_ref() == Some(l)))
            .filter(|c| {
                search.major.as_ref().map_or(true, |m| {
                    let m = m.to_lowercase();
                    c.departments.name.to_lowercase().contains(&m)
                        || c.departments.code.to_lowercase().contains(&m)
                })
            })
            .filter(|c| {
                search.keywords.as_ref().map_or(true, |k| {
                    let k = k.to_lowercase();
                    c.title.to_lowercase().contains(&k)
                        || c.description.as_deref().unwrap_or("").to_lowercase().contains(&k)
                })
            })
            .take(search.limit as usize)
            .cloned()
            .collect())
    }

    fn find_major(&self, major_name: &str, college_code: &str) -> Result<Option<Major>, StoreError> {
        self.check()?;
        let needle = major_name.to_lowercase();
        Ok(self
            .majors
            .iter()
            .find(|m| {
                m.name.to_lowercase().contains(&needle)
                    && m.colleges.code.eq_ignore_ascii_case(college_code)
            })
            .cloned())
    }

    fn courses_by_codes(&self, course_codes: &[String]) -> Result<Vec<Course>, StoreError> {
        self.check()?;
        Ok(course_codes
            .iter()
            .filter_map(|code| self.courses.iter().find(|c| &c.course_code == code))
            .cloned()
            .collect())
    }

    fn courses_in_department(
        &self,
        department_code: &str,
        college_code: &str,
    ) -> Result<Vec<Course>, StoreError> {
        self.check()?;
        Ok(self
            .courses
            .iter()
            .filter(|c| {
                c.departments.code.eq_ignore_ascii_case(department_code)
                    && c.colleges.code.eq_ignore_ascii_case(college_code)
            })
            .cloned()
            .collect())
    }

    fn course_prerequisites(&self, course_code: &str) -> Result<Option<CoursePrerequisites>, StoreError> {
        self.check()?;
        Ok(self
            .courses
            .iter()
            .find(|c| c.course_code == course_code)
            .map(|c| CoursePrerequisites {
                course_code: c.course_code.clone(),
                title: c.title.clone(),
                prerequisites: c.prerequisites.clone(),
                corequisites: c.corequisites.clone(),
            }))
    }
}
