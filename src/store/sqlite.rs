use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::{AppError, StoreError};
use crate::models::catalog::{Course, CoursePrerequisites, CourseSearch, Major, MajorRequirement};
use crate::store::CatalogStore;

pub struct SqliteCatalog {
    db_path: PathBuf,
}

impl SqliteCatalog {
    pub fn new(db_path: PathBuf) -> Result<Self, AppError> {
        init_db(&db_path)?;
        Ok(Self { db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        let conn = self.open()?;
        let courses: Option<i32> = conn
            .query_row("SELECT 1 FROM courses LIMIT 1;", [], |row| row.get(0))
            .optional()?;
        let majors: Option<i32> = conn
            .query_row("SELECT 1 FROM majors LIMIT 1;", [], |row| row.get(0))
            .optional()?;
        Ok(courses.is_none() && majors.is_none())
    }

    pub fn upsert_course(&self, course: &Course) -> Result<(), StoreError> {
        let payload = serde_json::to_string(course)?;
        let college_code = course.colleges.code.to_uppercase();
        let department_code = course.departments.code.to_uppercase();
        let conn = self.open()?;
        conn.execute(
            "INSERT OR IGNORE INTO colleges(code, name) VALUES(?1, ?2);",
            params![college_code, course.colleges.name],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO departments(college_code, code, name) VALUES(?1, ?2, ?3);",
            params![college_code, department_code, course.departments.name],
        )?;
        conn.execute(
            r#"
            INSERT INTO courses(course_code, college_code, department_code, department_name, level, title, description, data_json)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(course_code) DO UPDATE SET
                college_code=excluded.college_code,
                department_code=excluded.department_code,
                department_name=excluded.department_name,
                level=excluded.level,
                title=excluded.title,
                description=excluded.description,
                data_json=excluded.data_json;
            "#,
            params![
                course.course_code,
                college_code,
                department_code,
                course.departments.name,
                course.level.as_ref().map(|l| l.as_str()),
                course.title,
                course.description,
                payload
            ],
        )?;
        Ok(())
    }

    pub fn upsert_major(&self, major: &Major) -> Result<(), StoreError> {
        let college_code = major.colleges.code.to_uppercase();
        let major_id = format!("{college_code}:{}", major.name);
        let mut header = major.clone();
        header.major_requirements = Vec::new();
        let payload = serde_json::to_string(&header)?;

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO colleges(code, name) VALUES(?1, ?2);",
            params![college_code, major.colleges.name],
        )?;
        tx.execute(
            r#"
            INSERT INTO majors(id, college_code, name, data_json)
            VALUES(?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET data_json=excluded.data_json;
            "#,
            params![major_id, college_code, major.name, payload],
        )?;
        tx.execute("DELETE FROM major_requirements WHERE major_id=?1;", params![major_id])?;
        for (sequence, requirement) in major.major_requirements.iter().enumerate() {
            tx.execute(
                "INSERT INTO major_requirements(major_id, sequence, data_json) VALUES(?1, ?2, ?3);",
                params![major_id, sequence as i64, serde_json::to_string(requirement)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn open(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn query_courses(
        &self,
        sql: &str,
        values: &[String],
    ) -> Result<Vec<Course>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;
        let mut items = Vec::new();
        for row in rows {
            let json = row?;
            items.push(serde_json::from_str(&json)?);
        }
        Ok(items)
    }
}

impl CatalogStore for SqliteCatalog {
    fn search_courses(&self, search: &CourseSearch) -> Result<Vec<Course>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(college) = search.college.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            values.push(college.to_uppercase());
            clauses.push(format!("college_code = ?{}", values.len()));
        }
        if let Some(level) = &search.level {
            values.push(level.as_str().to_string());
            clauses.push(format!("level = ?{}", values.len()));
        }
        if let Some(major) = search.major.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            values.push(format!("%{}%", major.to_lowercase()));
            let n = values.len();
            clauses.push(format!(
                "(LOWER(department_name) LIKE ?{n} OR LOWER(department_code) LIKE ?{n})"
            ));
        }
        if let Some(keywords) = search.keywords.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            values.push(format!("%{}%", keywords.to_lowercase()));
            let n = values.len();
            clauses.push(format!(
                "(LOWER(title) LIKE ?{n} OR LOWER(COALESCE(description, '')) LIKE ?{n})"
            ));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT data_json FROM courses {where_sql} ORDER BY course_code LIMIT {};",
            search.limit
        );
        self.query_courses(&sql, &values)
    }

    fn find_major(&self, major_name: &str, college_code: &str) -> Result<Option<Major>, StoreError> {
        let conn = self.open()?;
        let row: Option<(String, String)> = conn
            .query_row(
                r#"
                SELECT id, data_json FROM majors
                WHERE LOWER(name) LIKE ?1 AND college_code = ?2
                ORDER BY name
                LIMIT 1;
                "#,
                params![
                    format!("%{}%", major_name.trim().to_lowercase()),
                    college_code.trim().to_uppercase()
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((major_id, json)) = row else {
            return Ok(None);
        };
        let mut major: Major = serde_json::from_str(&json)?;

        let mut stmt = conn.prepare(
            "SELECT data_json FROM major_requirements WHERE major_id=?1 ORDER BY sequence;",
        )?;
        let rows = stmt.query_map(params![major_id], |row| row.get::<_, String>(0))?;
        let mut requirements: Vec<MajorRequirement> = Vec::new();
        for row in rows {
            requirements.push(serde_json::from_str(&row?)?);
        }
        major.major_requirements = requirements;
        Ok(Some(major))
    }

    fn courses_by_codes(&self, course_codes: &[String]) -> Result<Vec<Course>, StoreError> {
        if course_codes.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=course_codes.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT data_json FROM courses WHERE course_code IN ({placeholders});");
        let found = self.query_courses(&sql, course_codes)?;

        let mut by_code: HashMap<String, Course> =
            found.into_iter().map(|c| (c.course_code.clone(), c)).collect();
        Ok(course_codes.iter().filter_map(|code| by_code.remove(code)).collect())
    }

    fn courses_in_department(
        &self,
        department_code: &str,
        college_code: &str,
    ) -> Result<Vec<Course>, StoreError> {
        self.query_courses(
            "SELECT data_json FROM courses WHERE department_code = ?1 AND college_code = ?2 ORDER BY course_code;",
            &[
                department_code.trim().to_uppercase(),
                college_code.trim().to_uppercase(),
            ],
        )
    }

    fn course_prerequisites(&self, course_code: &str) -> Result<Option<CoursePrerequisites>, StoreError> {
        let conn = self.open()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT data_json FROM courses WHERE course_code=?1;",
                params![course_code.trim()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(j) => {
                let course: Course = serde_json::from_str(&j)?;
                Ok(Some(CoursePrerequisites {
                    course_code: course.course_code,
                    title: course.title,
                    prerequisites: course.prerequisites,
                    corequisites: course.corequisites,
                }))
            }
            None => Ok(None),
        }
    }
}

fn init_db(db_path: &Path) -> Result<(), AppError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);
        INSERT INTO schema_version(version)
        SELECT 1
        WHERE NOT EXISTS (SELECT 1 FROM schema_version);

        CREATE TABLE IF NOT EXISTS colleges (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS departments (
            college_code TEXT NOT NULL,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (college_code, code)
        );

        CREATE TABLE IF NOT EXISTS courses (
            course_code TEXT PRIMARY KEY,
            college_code TEXT NOT NULL,
            department_code TEXT NOT NULL,
            department_name TEXT NOT NULL,
            level TEXT,
            title TEXT NOT NULL,
            description TEXT,
            data_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_courses_dept
        ON courses (college_code, department_code);

        CREATE TABLE IF NOT EXISTS majors (
            id TEXT PRIMARY KEY,
            college_code TEXT NOT NULL,
            name TEXT NOT NULL,
            data_json TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS major_requirements (
            major_id TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            data_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_major_requirements_major_seq
        ON major_requirements (major_id, sequence);
        "#,
    )?;

    Ok(())
}

pub fn default_sqlite_path(app_name: &str) -> Result<PathBuf, AppError> {
    if let Ok(override_path) = std::env::var("STORE_SQLITE_PATH") {
        return resolve_path(&override_path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".local").join("share"));
    Ok(base.join(app_name).join("catalog.db"))
}

pub fn resolve_path(raw: &str) -> Result<PathBuf, AppError> {
    let mut path = expand_tilde(PathBuf::from(raw));
    if path.is_relative() {
        path = std::env::current_dir()?.join(path);
    }
    Ok(path)
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    let s = path.to_string_lossy().to_string();
    if s == "~" {
        return PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()));
    }
    if let Some(rest) = s.strip_prefix("~/") {
        return PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string())).join(rest);
    }
    path
}
