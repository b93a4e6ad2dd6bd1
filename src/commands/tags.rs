// tag list | show | create | update | delete

use super::Context;
use crate::api::ResourceKind;
use crate::cli::{TagCommand, TagFields};
use crate::error::{Error, Result};
use crate::ui;
use crate::views;
use serde_json::{json, Value};

pub fn run(command: TagCommand, ctx: &mut Context) -> Result<()> {
    match command {
        TagCommand::List(page) => {
            let query = page.query()?;
            let tags = ctx.api()?.resource(ResourceKind::Tag).list(&query)?;
            ctx.printer().list(&views::TAGS, &tags)
        }
        TagCommand::Show { id } => {
            let tag = ctx.api()?.resource(ResourceKind::Tag).show(id)?;
            ctx.printer().detail(&views::TAG_DETAIL, &tag)
        }
        TagCommand::Create(fields) => {
            let api = ctx.api()?;
            let body = tag_body(resolve_fields(fields, ctx.interactive)?)?;
            let reply = api.resource(ResourceKind::Tag).create(&body)?;
            finish(ctx, &reply, "Tag created successfully!".into())
        }
        TagCommand::Update { id, fields } => {
            let api = ctx.api()?;
            let id = resolve_id(id, ctx.interactive)?;
            let body = tag_body(resolve_fields(fields, ctx.interactive)?)?;
            let reply = api.resource(ResourceKind::Tag).update(id, &body)?;
            finish(ctx, &reply, format!("Tag {} updated successfully!", id))
        }
        TagCommand::Delete { id } => {
            let api = ctx.api()?;
            let id = resolve_id(id, ctx.interactive)?;
            let reply = api.resource(ResourceKind::Tag).delete(id)?;
            finish(ctx, &reply, format!("Tag {} deleted successfully!", id))
        }
    }
}

fn resolve_id(id: Option<u64>, interactive: bool) -> Result<u64> {
    match id {
        Some(id) => Ok(id),
        None if interactive => ui::prompt_id("Tag"),
        None => Err(Error::Validation(
            "Tag ID is required. Use -i flag for interactive mode or provide tag_id argument"
                .into(),
        )),
    }
}

fn resolve_fields(fields: TagFields, interactive: bool) -> Result<TagFields> {
    if interactive {
        ui::prompt_tag_fields(fields)
    } else {
        Ok(fields)
    }
}

/// `{"tag": {name, user_id, group_id}}`; every field is required.
fn tag_body(fields: TagFields) -> Result<Value> {
    let name = fields
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| missing("Tag name", "--name"))?;
    let user_id = fields.user_id.ok_or_else(|| missing("User ID", "--user-id"))?;
    let group_id = fields
        .group_id
        .ok_or_else(|| missing("Group ID", "--group-id"))?;
    Ok(json!({"tag": {"name": name, "user_id": user_id, "group_id": group_id}}))
}

fn missing(what: &str, flag: &str) -> Error {
    Error::Validation(format!(
        "{} is required. Use {} flag or -i for interactive mode",
        what, flag
    ))
}

fn finish(ctx: &mut Context, reply: &Value, message: String) -> Result<()> {
    let mut out = ctx.printer();
    if out.structured(reply)? {
        return Ok(());
    }
    out.line(message)
}
