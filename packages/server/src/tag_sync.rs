//! Reconciles the tags embedded in a blog payload with the tag table.
//!
//! Callers validate the whole descriptor list first and run [`attach_tags`]
//! inside the same transaction that writes the blog, so a failure leaves
//! neither tags nor associations behind.

use std::collections::HashSet;

use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::debug;

use crate::entity::{blog_tag, tag};
use crate::models::blog::TagDescriptor;

/// Trimmed tag names in first-seen order, duplicates removed.
pub fn distinct_names(tags: &[TagDescriptor]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.name.trim().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Find the tag with exactly this name, creating it if absent.
///
/// The insert and the conflict check are one statement against the unique
/// index on `tag.name`, so racing callers end up sharing a single row.
/// Returns the tag and whether this call created it.
pub async fn get_or_create_tag<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<(tag::Model, bool), DbErr> {
    let model = tag::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };

    let result = tag::Entity::insert(model)
        .on_conflict(
            OnConflict::column(tag::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    let created = match result {
        Ok(rows) => rows > 0,
        Err(DbErr::RecordNotInserted) => false,
        Err(e) => return Err(e),
    };

    let tag = tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tag {name:?} missing after insert")))?;

    Ok((tag, created))
}

/// Link a tag to a blog. Linking an already-linked tag is a no-op.
async fn link<C: ConnectionTrait>(db: &C, blog_id: i32, tag_id: i32) -> Result<(), DbErr> {
    let row = blog_tag::ActiveModel {
        blog_id: Set(blog_id),
        tag_id: Set(tag_id),
        ..Default::default()
    };

    let result = blog_tag::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([blog_tag::Column::BlogId, blog_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Resolve each descriptor to a tag row and associate it with the blog.
///
/// Only adds associations; tags already on the blog but absent from
/// `tags` stay attached.
pub async fn attach_tags<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
    tags: &[TagDescriptor],
) -> Result<Vec<tag::Model>, DbErr> {
    let names = distinct_names(tags);
    let mut resolved = Vec::with_capacity(names.len());

    for name in names {
        let (tag, created) = get_or_create_tag(db, &name).await?;
        if created {
            debug!(tag_id = tag.id, name = %tag.name, "Created tag");
        }
        link(db, blog_id, tag.id).await?;
        resolved.push(tag);
    }

    Ok(resolved)
}
