//! COPY and MOVE handlers

use super::DavContext;
use crate::error::{DavError, ErrorKind};
use crate::path::{DavPath, parse_destination};
use crate::resolver::ResolvedEntity;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docdav_client::ClientError;
use tracing::debug;

/// A validated COPY or MOVE request; nothing has been mutated yet
struct Transfer {
    source: ResolvedEntity,
    destination: DavPath,
    target_name: String,
    target_parent: ResolvedEntity,
    existing: Option<ResolvedEntity>,
}

/// Map a failed step, reporting a partial failure once an earlier step changed the backend
fn step_failed(completed: Option<&str>, error: ClientError) -> DavError {
    match completed {
        Some(step) => DavError::partial_failure(step, &error),
        None => error.into(),
    }
}

async fn prepare(ctx: &DavContext, method: &str) -> Result<Transfer, DavError> {
    let header = ctx
        .header("destination")
        .ok_or_else(|| DavError::bad_request(format!("{} without Destination", method)))?;
    let destination = parse_destination(header)?;
    let target_name = destination
        .leaf_name()
        .ok_or_else(|| DavError::bad_request(format!("{} to the root collection", method)))?
        .to_string();

    let resolver = ctx.resolver();
    let source = resolver.resolve(&ctx.path).await?;

    // Clearing an ancestor destination would delete the source with it
    if ctx.path.is_root() || destination.starts_with(&ctx.path) || ctx.path.starts_with(&destination) {
        return Err(DavError::new(
            ErrorKind::Forbidden,
            format!("{} {} overlaps {}", method, ctx.path, destination),
        ));
    }

    let target_parent = match resolver.resolve_parent(&destination).await {
        Ok(parent) if parent.is_folder() => parent,
        Ok(_) => return Err(DavError::new(ErrorKind::Conflict, format!("parent of {} is a file", destination))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DavError::new(ErrorKind::Conflict, format!("parent of {} not found", destination)));
        }
        Err(e) => return Err(e),
    };

    if target_parent.workspace_id != source.workspace_id {
        return Err(DavError::new(
            ErrorKind::CrossWorkspace,
            format!(
                "{} from workspace {} to workspace {}",
                method, source.workspace_id, target_parent.workspace_id
            ),
        ));
    }

    let existing = resolver.try_resolve(&destination).await?;
    let overwrite = ctx
        .header("overwrite")
        .map(|v| !v.trim().eq_ignore_ascii_case("f"))
        .unwrap_or(true);
    if existing.is_some() && !overwrite {
        return Err(DavError::new(
            ErrorKind::PreconditionFailed,
            format!("{} exists and Overwrite is F", destination),
        ));
    }

    Ok(Transfer {
        source,
        destination,
        target_name,
        target_parent,
        existing,
    })
}

/// Delete whatever the destination currently holds, returning the completed step
async fn clear_destination(ctx: &DavContext, transfer: &Transfer) -> Result<Option<String>, DavError> {
    match &transfer.existing {
        Some(existing) => {
            ctx.documents().delete(ctx.token(), &existing.id).await?;
            Ok(Some(format!("deleting previous {}", transfer.destination)))
        }
        None => Ok(None),
    }
}

/// COPY - clone into the destination folder, then give the clone its new name
pub async fn copy(ctx: &DavContext) -> Result<Response, DavError> {
    let transfer = prepare(ctx, "COPY").await?;
    let documents = ctx.documents();

    let completed = clear_destination(ctx, &transfer).await?;

    let clone = documents
        .copy(ctx.token(), &transfer.source.id, &transfer.target_parent.id)
        .await
        .map_err(|e| step_failed(completed.as_deref(), e))?;

    if clone.name != transfer.target_name {
        let step = format!("copying {} as {}", ctx.path, clone.name);
        documents
            .rename(ctx.token(), &clone.id, &transfer.target_name)
            .await
            .map_err(|e| step_failed(Some(&step), e))?;
    }

    debug!(source = %ctx.path, destination = %transfer.destination, "Copied");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// MOVE - re-parent and/or rename in place
pub async fn move_entity(ctx: &DavContext) -> Result<Response, DavError> {
    let transfer = prepare(ctx, "MOVE").await?;
    let documents = ctx.documents();
    let source = &transfer.source;

    let mut completed = clear_destination(ctx, &transfer).await?;

    if source.parent_id.as_deref() != Some(transfer.target_parent.id.as_str()) {
        documents
            .move_to(ctx.token(), &source.id, &transfer.target_parent.id)
            .await
            .map_err(|e| step_failed(completed.as_deref(), e))?;
        completed = Some(format!("moving {} into {}", ctx.path, transfer.destination.parent()));
    }

    if source.name != transfer.target_name {
        documents
            .rename(ctx.token(), &source.id, &transfer.target_name)
            .await
            .map_err(|e| step_failed(completed.as_deref(), e))?;
    }

    debug!(source = %ctx.path, destination = %transfer.destination, "Moved");
    Ok(StatusCode::NO_CONTENT.into_response())
}
