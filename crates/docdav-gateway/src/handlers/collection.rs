//! Collection handlers (MKCOL, PROPFIND)

use super::DavContext;
use crate::error::{DavError, ErrorKind};
use crate::xml::{self, PropEntry};
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use docdav_client::CreateFolderOptions;

/// MKCOL - create a folder
pub async fn mkcol(ctx: &DavContext) -> Result<Response, DavError> {
    let name = ctx
        .path
        .leaf_name()
        .ok_or_else(|| DavError::new(ErrorKind::MethodNotAllowed, "the root collection already exists"))?;

    let resolver = ctx.resolver();
    if resolver.try_resolve(&ctx.path).await?.is_some() {
        return Err(DavError::new(ErrorKind::MethodNotAllowed, format!("{} already exists", ctx.path)));
    }

    let parent = match resolver.resolve_parent(&ctx.path).await {
        Ok(parent) if parent.is_folder() => parent,
        Ok(_) => return Err(DavError::new(ErrorKind::Conflict, format!("parent of {} is a file", ctx.path))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DavError::new(ErrorKind::Conflict, format!("parent of {} not found", ctx.path)));
        }
        Err(e) => return Err(e),
    };

    let options = CreateFolderOptions {
        workspace_id: parent.workspace_id,
        parent_id: parent.id,
        name: name.to_string(),
    };
    ctx.documents().create_folder(ctx.token(), options).await?;

    Ok(StatusCode::CREATED.into_response())
}

/// PROPFIND - describe an entity and, for folders, its immediate children
pub async fn propfind(ctx: &DavContext) -> Result<Response, DavError> {
    let resolver = ctx.resolver();
    let entity = resolver.resolve(&ctx.path).await?;

    let mut entries = vec![PropEntry::from_entity(&ctx.path, &entity)];

    // Only "0" narrows the response; "1" and "infinity" both list one level
    let depth_zero = ctx.header("depth").is_some_and(|d| d.trim() == "0");
    if entity.is_folder() && !depth_zero {
        for child in resolver.children(&ctx.path).await? {
            entries.push(PropEntry::from_entity(&ctx.path.join(&child.name), &child));
        }
    }

    let body = xml::multistatus(&entries)?;
    Ok((
        StatusCode::MULTI_STATUS,
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        body,
    )
        .into_response())
}
