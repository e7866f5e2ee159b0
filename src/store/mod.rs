//! Course catalog data access.
//!
//! The executor only sees [`CatalogStore`]; `SqliteCatalog` is the backing the
//! binary wires in. Every method is blocking and is driven from
//! `tokio::task::spawn_blocking` by the tool executor.

#[cfg(test)]
pub(crate) mod fixture;
pub mod sqlite;

use crate::error::StoreError;
use crate::models::catalog::{Course, CoursePrerequisites, CourseSearch, Major};

pub trait CatalogStore: Send + Sync {
    /// Filtered search, bounded by `search.limit`.
    fn search_courses(&self, search: &CourseSearch) -> Result<Vec<Course>, StoreError>;

    /// Case-insensitive substring match on the major name, exact college code.
    fn find_major(&self, major_name: &str, college_code: &str) -> Result<Option<Major>, StoreError>;

    /// Batch lookup; results follow the order of `course_codes`, unknown codes are skipped.
    fn courses_by_codes(&self, course_codes: &[String]) -> Result<Vec<Course>, StoreError>;

    fn courses_in_department(
        &self,
        department_code: &str,
        college_code: &str,
    ) -> Result<Vec<Course>, StoreError>;

    fn course_prerequisites(&self, course_code: &str) -> Result<Option<CoursePrerequisites>, StoreError>;
}
