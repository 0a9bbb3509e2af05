//! Content handlers (GET, HEAD, PUT, DELETE)

use super::DavContext;
use crate::error::{DavError, ErrorKind};
use crate::resolver::ResolvedEntity;
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use docdav_client::CreateFileOptions;
use futures::TryStreamExt;
use tracing::{debug, warn};

fn content_type(entity: &ResolvedEntity) -> String {
    mime_guess::from_path(&entity.name)
        .first_or_octet_stream()
        .to_string()
}

fn build(builder: axum::http::response::Builder, body: Body) -> Result<Response, DavError> {
    builder
        .body(body)
        .map_err(|e| DavError::new(ErrorKind::Internal, e.to_string()))
}

/// GET - stream a file's original content
pub async fn get(ctx: &DavContext) -> Result<Response, DavError> {
    let entity = ctx.resolver().resolve(&ctx.path).await?;
    if entity.is_folder() {
        return Err(DavError::new(ErrorKind::MethodNotAllowed, format!("GET on collection {}", ctx.path)));
    }

    let stream = ctx.documents().download_original(ctx.token(), &entity.file).await?;

    // Headers are already sent when the stream fails; the connection is aborted
    let path = ctx.path.to_string();
    let stream = stream.inspect_err(move |e| {
        warn!(path = %path, error = %e, "Download stream aborted");
    });

    build(
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, entity.size_bytes.unwrap_or(0).to_string())
            .header(header::CONTENT_TYPE, content_type(&entity)),
        Body::from_stream(stream),
    )
}

/// HEAD - metadata without a body
pub async fn head(ctx: &DavContext) -> Result<Response, DavError> {
    let entity = ctx.resolver().resolve(&ctx.path).await?;

    let mut builder = Response::builder().status(StatusCode::OK);
    if !entity.is_folder() {
        builder = builder
            .header(header::CONTENT_LENGTH, entity.size_bytes.unwrap_or(0).to_string())
            .header(header::CONTENT_TYPE, content_type(&entity));
    }
    build(builder, Body::empty())
}

/// Lock files office suites drop next to documents they open
fn is_office_lock_file(name: &str) -> bool {
    name.starts_with("~$") || (name.starts_with(".~lock.") && name.ends_with('#'))
}

fn payload_too_large(ctx: &DavContext) -> DavError {
    DavError::new(
        ErrorKind::PayloadTooLarge,
        format!("body for {} exceeds {} bytes", ctx.path, ctx.state.config.max_body_size),
    )
}

/// PUT - create or replace a file
pub async fn put(ctx: &DavContext, body: Body) -> Result<Response, DavError> {
    let name = ctx
        .path
        .leaf_name()
        .ok_or_else(|| DavError::new(ErrorKind::MethodNotAllowed, "PUT on the root collection"))?
        .to_string();

    if is_office_lock_file(&name) {
        debug!(path = %ctx.path, "Discarding office lock file");
        return Ok(StatusCode::CREATED.into_response());
    }

    let max_body_size = ctx.state.config.max_body_size;
    let declared = ctx.header("content-length").and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_body_size as u64) {
        return Err(payload_too_large(ctx));
    }

    let resolver = ctx.resolver();
    let parent = match resolver.resolve_parent(&ctx.path).await {
        Ok(parent) if parent.is_folder() => parent,
        Ok(_) => return Err(DavError::new(ErrorKind::Conflict, format!("parent of {} is a file", ctx.path))),
        // A PUT into a missing directory is a server-side failure, not a 404
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DavError::new(ErrorKind::UpstreamFailure, format!("parent of {} not found", ctx.path)));
        }
        Err(e) => return Err(e),
    };

    let existing = resolver.try_resolve(&ctx.path).await?;
    if existing.as_ref().is_some_and(ResolvedEntity::is_folder) {
        return Err(DavError::new(ErrorKind::MethodNotAllowed, format!("PUT on collection {}", ctx.path)));
    }

    let data = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(|e| {
            let over_limit = std::error::Error::source(&e)
                .is_some_and(|s| s.is::<http_body_util::LengthLimitError>());
            if over_limit {
                payload_too_large(ctx)
            } else {
                DavError::new(ErrorKind::StreamFault, format!("reading body for {}: {}", ctx.path, e))
            }
        })?;

    let replaced = existing.is_some();
    if let Some(existing) = existing {
        ctx.documents().delete(ctx.token(), &existing.id).await?;
    }

    let options = CreateFileOptions {
        workspace_id: parent.workspace_id.clone(),
        parent_id: parent.id.clone(),
        name,
        data,
    };
    if let Err(e) = ctx.documents().create_file(ctx.token(), options).await {
        if replaced {
            return Err(DavError::partial_failure(&format!("deleting previous {}", ctx.path), &e));
        }
        return Err(e.into());
    }

    Ok(StatusCode::CREATED.into_response())
}

/// DELETE - remove a file or folder (recursively)
pub async fn delete(ctx: &DavContext) -> Result<Response, DavError> {
    let entity = ctx.resolver().resolve(&ctx.path).await?;
    if ctx.path.is_root() {
        return Err(DavError::new(ErrorKind::Forbidden, "cannot delete the root collection"));
    }

    ctx.documents().delete(ctx.token(), &entity.id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("~$report.docx", true)]
    #[case(".~lock.report.odt#", true)]
    #[case(".~lock.report.odt", false)]
    #[case("report.docx", false)]
    #[case("a~$b.txt", false)]
    fn test_office_lock_files(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_office_lock_file(name), expected);
    }
}
