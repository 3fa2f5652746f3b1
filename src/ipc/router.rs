use super::handlers;
use super::types::Request;
use crate::ipc::error::err;
use tracing::debug;

pub fn handle_request(req: Request) -> serde_json::Value {
    debug!(id = %req.id, method = %req.method, "request");
    if let Some(resp) = handlers::core::try_handle(&req) {
        return resp;
    }
    if let Some(resp) = handlers::input::try_handle(&req) {
        return resp;
    }
    if let Some(resp) = handlers::failing::try_handle(&req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
