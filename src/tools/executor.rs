use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{StoreError, ToolError};
use crate::store::CatalogStore;
use crate::tools::args::{ToolName, ToolRequest};
use crate::tools::builtin::{self, Handled};
use crate::tools::definition::{ToolCall, ToolOutcome, ToolResult, ToolSpec};
use crate::tools::registry::ToolRegistry;

/// Runs tool invocations against the catalog store.
///
/// `execute` is total: schema violations, unknown tools, store faults and
/// panics inside the blocking store call all come back as a [`ToolResult`].
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    store: Arc<dyn CatalogStore>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, store: Arc<dyn CatalogStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn definitions(&self) -> &[ToolSpec] {
        self.registry.list()
    }

    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let started = Instant::now();

        let handled = match self.registry.validate(&call) {
            Ok(request) => self.run(request).await,
            Err(err) => {
                warn!(
                    event_name = "tool.rejected",
                    tool_name = %call.name,
                    tool_call_id = %call.id,
                    error = %err,
                    "tool invocation rejected before execution"
                );
                rejected(&call.name, err)
            }
        };

        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        debug!(
            event_name = "tool.executed",
            tool_name = %call.name,
            tool_call_id = %call.id,
            duration_ms,
            "tool invocation finished"
        );

        ToolResult {
            tool_call_id: call.id,
            name: call.name,
            outcome: handled.outcome,
            message: handled.message,
            duration_ms: Some(duration_ms),
        }
    }

    async fn run(&self, request: ToolRequest) -> Handled {
        let name = request.name();
        let store = self.store.clone();
        let joined = tokio::task::spawn_blocking(move || dispatch(store.as_ref(), request)).await;

        match joined {
            Ok(Ok(handled)) => handled,
            Ok(Err(store_err)) => {
                warn!(
                    event_name = "tool.store_fault",
                    tool_name = %name,
                    error = %store_err,
                    "catalog store fault"
                );
                fault(name, store_err.to_string())
            }
            Err(join_err) => fault(name, join_err.to_string()),
        }
    }
}

fn dispatch(store: &dyn CatalogStore, request: ToolRequest) -> Result<Handled, StoreError> {
    match request {
        ToolRequest::SearchCourses(args) => builtin::courses::search_courses(store, args),
        ToolRequest::GetMajorRequirements(args) => builtin::majors::get_major_requirements(store, args),
        ToolRequest::CheckPrerequisites(args) => builtin::prerequisites::check_prerequisites(store, args),
        ToolRequest::GetCoursesInDepartment(args) => builtin::courses::courses_in_department(store, args),
        ToolRequest::BuildSemesterSchedule(args) => builtin::schedule::build_semester_schedule(store, args),
        ToolRequest::ValidateGraduationPath(args) => builtin::majors::validate_graduation_path(store, args),
    }
}

fn failure_message(name: ToolName) -> &'static str {
    match name {
        ToolName::SearchCourses => "Failed to search courses",
        ToolName::GetMajorRequirements => "Failed to get major requirements",
        ToolName::CheckPrerequisites => "Failed to check prerequisites",
        ToolName::GetCoursesInDepartment => "Failed to get department courses",
        ToolName::BuildSemesterSchedule => "Failed to build semester schedule",
        ToolName::ValidateGraduationPath => "Failed to validate graduation path",
    }
}

fn fault(name: ToolName, detail: String) -> Handled {
    Handled {
        outcome: ToolOutcome::Fault { detail },
        message: failure_message(name).to_string(),
    }
}

fn rejected(tool_name: &str, err: ToolError) -> Handled {
    Handled {
        outcome: ToolOutcome::Rejected {
            parameters: err.parameters().to_vec(),
        },
        message: format!("Failed to execute {tool_name}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixture::FixtureCatalog;
    use crate::store::sqlite::tests::course;
    use serde_json::{json, Value};

    fn executor(store: FixtureCatalog) -> ToolExecutor {
        ToolExecutor::new(Arc::new(ToolRegistry::builtin().unwrap()), Arc::new(store))
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: format!("call_{name}"),
            name: name.to_string(),
            arguments,
        }
    }

    fn valid_calls() -> Vec<ToolCall> {
        vec![
            call("search_courses", json!({})),
            call("get_major_requirements", json!({ "major_name": "CS", "college_code": "HMC" })),
            call("check_prerequisites", json!({ "course_code": "CS-5" })),
            call("get_courses_in_department", json!({ "department_code": "CS", "college_code": "HMC" })),
            call("build_semester_schedule", json!({ "course_codes": ["CS-5"] })),
            call(
                "validate_graduation_path",
                json!({ "major_name": "CS", "college_code": "HMC", "planned_courses": [] }),
            ),
        ]
    }

    #[tokio::test]
    async fn every_registered_tool_returns_an_envelope() {
        let exec = executor(FixtureCatalog::new(vec![course("CS-5", "CS", "HMC", Some(3), &[])], Vec::new()));
        for c in valid_calls() {
            let id = c.id.clone();
            let result = exec.execute(c).await;
            assert_eq!(result.tool_call_id, id);
            assert!(result.error_detail().is_none());
            assert!(!result.message.is_empty());
        }
    }

    #[tokio::test]
    async fn store_faults_surface_as_error_detail() {
        let exec = executor(FixtureCatalog::unreachable());
        for c in valid_calls() {
            let name = c.name.clone();
            let result = exec.execute(c).await;
            assert!(!result.success(), "{name} should fail");
            assert_eq!(result.error_detail(), Some("Database error: connection refused"));
            assert!(result.message.starts_with("Failed to"));
        }
    }

    #[tokio::test]
    async fn invalid_arguments_become_soft_rejections() {
        let exec = executor(FixtureCatalog::new(Vec::new(), Vec::new()));
        let result = exec
            .execute(call("search_courses", json!({ "level": "expert" })))
            .await;
        assert_eq!(
            result.outcome,
            ToolOutcome::Rejected {
                parameters: vec!["level".to_string()]
            }
        );
        assert!(result.to_wire().get("error").is_none());
        assert_eq!(result.to_wire()["data"]["invalid_parameters"], json!(["level"]));
    }

    #[tokio::test]
    async fn unknown_tool_is_folded_into_an_envelope() {
        let exec = executor(FixtureCatalog::new(Vec::new(), Vec::new()));
        let result = exec.execute(call("enroll_student", json!({}))).await;
        assert!(!result.success());
        assert!(result.message.contains("Unknown tool 'enroll_student'"));
    }
}
