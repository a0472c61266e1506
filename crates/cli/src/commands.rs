#![forbid(unsafe_code)]

use rowsync_core::{BatchRequest, CheckpointRequest, Operation, OperationBody, OperationKind};
use rowsync_storage::{Persister, StoreError};
use serde_json::{Value, json};
use tracing::error;

pub(crate) const DEFAULT_USER_ID: &str = "UserID";
pub(crate) const DEFAULT_CLIENT_ID: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    BadRequest,
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub status: Status,
    pub body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: Status::BadRequest,
            body: json!({ "message": message.into() }),
        }
    }

    fn from_store_error(context: &str, err: &StoreError) -> Self {
        error!(error = %err, "{context} failed");
        let status = if err.is_validation() {
            Status::BadRequest
        } else {
            Status::Failed
        };
        Self {
            status,
            body: json!({ "message": format!("Request failed: {err}") }),
        }
    }

    pub(crate) fn exit_code(&self) -> u8 {
        match self.status {
            Status::Ok => 0,
            Status::Failed => 1,
            Status::BadRequest => 2,
        }
    }
}

pub(crate) fn run_batch(persister: &dyn Persister, raw: &str) -> Reply {
    let request = match serde_json::from_str::<BatchRequest>(raw) {
        Ok(request) => request,
        Err(err) => return Reply::bad_request(format!("Invalid body provided: {err}")),
    };

    match persister.apply_batch(&request.batch) {
        Ok(outcome) => Reply::ok(json!({
            "message": "Batch completed",
            "operations": outcome.operations,
            "rows_changed": outcome.rows_changed,
        })),
        Err(err) => Reply::from_store_error("batch", &err),
    }
}

/// One operation whose kind is fixed by the command, not the body.
pub(crate) fn run_single(persister: &dyn Persister, kind: OperationKind, raw: &str) -> Reply {
    let body = match serde_json::from_str::<OperationBody>(raw) {
        Ok(body) => body,
        Err(err) => return Reply::bad_request(format!("Invalid body provided: {err}")),
    };

    let complete = match kind {
        OperationKind::Put | OperationKind::Patch => body.table.is_some() && body.data.is_some(),
        OperationKind::Delete => body.table.is_some() && body.id.is_some(),
    };
    if !complete {
        return Reply::bad_request(match kind {
            OperationKind::Delete => "Invalid body provided, expected table and id",
            OperationKind::Put | OperationKind::Patch => {
                "Invalid body provided, expected table and data"
            }
        });
    }

    let op = body.into_operation(kind);
    if let Err(err) = persister.apply_batch(std::slice::from_ref(&op)) {
        return Reply::from_store_error(kind.as_str(), &err);
    }
    Reply::ok(json!({ "message": completion_message(&op) }))
}

fn completion_message(op: &Operation) -> String {
    match (op.kind, op.row_id()) {
        (OperationKind::Patch, _) | (_, Err(_)) => format!("{} completed for {}", op.kind, op.table),
        (kind, Ok(id)) => format!("{kind} completed for {} {id}", op.table),
    }
}

pub(crate) fn run_checkpoint(
    persister: &dyn Persister,
    user_id: Option<String>,
    client_id: Option<String>,
    raw: Option<&str>,
) -> Reply {
    let body = match raw.map(serde_json::from_str::<CheckpointRequest>).transpose() {
        Ok(body) => body.unwrap_or_default(),
        Err(err) => return Reply::bad_request(format!("Invalid body provided: {err}")),
    };

    let user_id = user_id
        .or(body.user_id)
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let client_id = client_id
        .or(body.client_id)
        .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

    match persister.create_checkpoint(&user_id, &client_id) {
        Ok(checkpoint) => Reply::ok(json!({ "checkpoint": checkpoint })),
        Err(err) => Reply::from_store_error("checkpoint", &err),
    }
}
