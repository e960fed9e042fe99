// Asynchronous task tracking
//
// Mutating calls return a `<Task>`. Callers poll its href until the status
// is terminal; success is `Ok`, anything else becomes `Error::Task`.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{Task, TaskStatus};
use crate::xml;

/// Default delay between task polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling on how long to wait for a task.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

impl VcdClient {
    /// Fetch the current state of a task.
    pub async fn get_task(&self, href: &str) -> Result<Task, Error> {
        let body = self.get_xml(&Url::parse(href)?).await?;
        let doc = xml::parse(&body)?;
        Task::from_node(doc.root_element())
    }

    /// Poll `task` until it reaches a terminal state.
    ///
    /// Returns the final task on success. A task ending in any other
    /// terminal state yields [`Error::Task`]; running past `timeout` yields
    /// [`Error::TaskTimeout`].
    pub async fn wait_for_task(
        &self,
        task: Task,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Task, Error> {
        let deadline = Instant::now() + timeout;
        let mut current = task;

        loop {
            if current.status.is_terminal() {
                break;
            }
            if Instant::now() >= deadline {
                warn!(operation = %current.operation, "task timed out");
                return Err(Error::TaskTimeout {
                    operation: current.operation,
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(poll_interval).await;
            current = self.get_task(&current.href).await?;
            debug!(
                operation = %current.operation,
                status = current.status.as_str(),
                "task poll"
            );
        }

        if current.status == TaskStatus::Success {
            Ok(current)
        } else {
            Err(Error::Task {
                message: current
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no error detail returned".into()),
                status: current.status.as_str().to_owned(),
                operation: current.operation,
            })
        }
    }
}
