use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Task, TaskPatch, TaskPayload, TaskQuery};
use crate::request::ApiRequest;

use super::{TASK_PATH, TASKS_PATH, task_path};

impl ApiClient {
    /// `GET /tasks`: one page of tasks matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Cancelled`] when `cancel` fires first, and
    /// otherwise propagates transport, status, and decode failures.
    pub async fn fetch_tasks(
        &self,
        query: &TaskQuery,
        cancel: Option<&CancellationToken>,
    ) -> ApiResult<Vec<Task>> {
        let request = ApiRequest::get(TASKS_PATH).with_query(query.to_pairs());
        self.send_cancellable(request, cancel).await?.json()
    }

    /// `POST /task`: create a task.
    ///
    /// Returns `None` when the server acknowledges without a body.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn add_task(&self, payload: &TaskPayload) -> ApiResult<Option<Task>> {
        let request = ApiRequest::post(TASK_PATH).with_json(payload)?;
        self.send(request).await?.json_optional()
    }

    /// `DELETE /task/:id`.
    ///
    /// # Errors
    ///
    /// Propagates transport and status failures.
    pub async fn remove_task(&self, id: &str) -> ApiResult<()> {
        self.send(ApiRequest::delete(task_path(id))).await?;
        Ok(())
    }

    /// `PATCH /task/:id`: set the completion flag.
    ///
    /// Returns `None` when the server acknowledges without a body.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn edit_task(&self, id: &str, completed: bool) -> ApiResult<Option<Task>> {
        let request = ApiRequest::patch(task_path(id)).with_json(&TaskPatch { completed })?;
        self.send(request).await?.json_optional()
    }
}
