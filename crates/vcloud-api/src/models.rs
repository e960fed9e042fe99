// vCloud resource records
//
// Plain structs decoded from XML bodies. Decoding lives next to each type as
// `from_node`, keeping endpoint methods to fetch + parse + collect.

use roxmltree::Node;

use crate::error::Error;
use crate::xml::VcdNode;

// ── Query results ────────────────────────────────────────────────────

/// One row of `GET /api/vApps/query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VAppRecord {
    pub name: String,
    pub href: String,
}

impl VAppRecord {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        Ok(Self {
            name: node.required_attr("VAppRecord", "name")?.to_owned(),
            href: node.required_attr("VAppRecord", "href")?.to_owned(),
        })
    }
}

// ── Virtual machines ─────────────────────────────────────────────────

/// A `<Vm>` inside a vApp body.
///
/// `ip_address` is the text of the first `<IpAddress>` in the VM subtree
/// (document order); `None` when there is no such element or it is blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmRecord {
    pub name: String,
    pub href: String,
    pub ip_address: Option<String>,
}

impl VmRecord {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        Ok(Self {
            name: node.required_attr("Vm", "name")?.to_owned(),
            href: node.required_attr("Vm", "href")?.to_owned(),
            ip_address: node.first_vcd_text("IpAddress").map(str::to_owned),
        })
    }
}

// ── Metadata ─────────────────────────────────────────────────────────

/// A `<MetadataEntry>`: its key and the text of every `<Value>` inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub values: Vec<String>,
}

impl MetadataEntry {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        let key = node
            .first_vcd_text("Key")
            .ok_or_else(|| Error::MissingElement {
                element: "Key",
                context: "MetadataEntry".into(),
            })?
            .to_owned();
        let values = node
            .vcd_descendants("Value")
            .filter_map(|v| v.text())
            .map(str::to_owned)
            .collect();
        Ok(Self { key, values })
    }
}

// ── Entity references ────────────────────────────────────────────────

/// A named link to another entity (org, VDC, vApp, network).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub name: String,
    pub href: String,
}

impl EntityRef {
    pub(crate) fn from_node(element: &'static str, node: Node<'_, '_>) -> Result<Self, Error> {
        Ok(Self {
            name: node.required_attr(element, "name")?.to_owned(),
            href: node.required_attr(element, "href")?.to_owned(),
        })
    }
}

// ── Tasks ────────────────────────────────────────────────────────────

/// Lifecycle state of an asynchronous `<Task>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    PreRunning,
    Running,
    Success,
    Error,
    Canceled,
    Aborted,
    Other(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "preRunning" => Self::PreRunning,
            "running" => Self::Running,
            "success" => Self::Success,
            "error" => Self::Error,
            "canceled" => Self::Canceled,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether the task will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Error | Self::Canceled | Self::Aborted
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::PreRunning => "preRunning",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Other(s) => s,
        }
    }
}

/// A `<Task>` returned by mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub href: String,
    pub operation: String,
    pub status: TaskStatus,
    /// `message` attribute of the nested `<Error>`, when the task failed.
    pub error_message: Option<String>,
}

impl Task {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        let task = node.first_vcd("Task").ok_or_else(|| Error::MissingElement {
            element: "Task",
            context: "task response".into(),
        })?;
        Ok(Self {
            href: task.required_attr("Task", "href")?.to_owned(),
            operation: task
                .attribute("operationName")
                .or_else(|| task.attribute("operation"))
                .unwrap_or("task")
                .to_owned(),
            status: TaskStatus::parse(task.required_attr("Task", "status")?),
            error_message: task
                .vcd_child("Error")
                .and_then(|e| e.attribute("message"))
                .map(str::to_owned),
        })
    }
}
