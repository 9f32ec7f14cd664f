use crate::commands::Out;
use crate::error::find_pub_error;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, warn};

pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Renders a command result as a tool result. Failures become an error result whose text is the
/// `{"detail": ...}` body, prefixed with the status code.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            let text = match find_pub_error(&e) {
                Some(p) => format!("{} {}", p.status(), p.body()),
                None => format!("{e:#}"),
            };
            warn!("Tool call failed: {text}");
            CallToolResult::error(vec![Content::text(text)])
        }
    })
}
