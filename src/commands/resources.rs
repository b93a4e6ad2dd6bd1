// Read-mostly resources whose handlers are plain list/show plus a few
// member actions: data providers, tools, tool configs, background
// activities and remote resources.

use super::Context;
use crate::api::resource::MAX_PER_PAGE;
use crate::api::{ListQuery, Pagination, ResourceKind};
use crate::cli::{
    BackgroundCommand, DataProviderCommand, RemoteResourceCommand, ToolCommand, ToolConfigCommand,
};
use crate::error::{Error, Result};
use crate::views;
use serde_json::Value;

pub fn data_providers(command: DataProviderCommand, ctx: &mut Context) -> Result<()> {
    let kind = ResourceKind::DataProvider;
    match command {
        DataProviderCommand::List(page) => {
            let query = page.query()?;
            let providers = ctx.api()?.resource(kind).list(&query)?;
            ctx.printer().list(&views::DATA_PROVIDERS, &providers)
        }
        DataProviderCommand::Show { id } => {
            let provider = ctx.api()?.resource(kind).show(id)?;
            ctx.printer().detail(&views::DATA_PROVIDER_DETAIL, &provider)
        }
        DataProviderCommand::IsAlive { id } => {
            let reply = ctx.api()?.resource(kind).member_get(id, "is_alive")?;
            ctx.printer().json(&reply)
        }
        DataProviderCommand::DeleteUnregisteredFiles { id } => {
            let reply = ctx.api()?.resource(kind).member_post(id, "delete")?;
            ctx.printer().json(&reply)
        }
    }
}

pub fn tools(command: ToolCommand, ctx: &mut Context) -> Result<()> {
    let kind = ResourceKind::Tool;
    match command {
        ToolCommand::List(page) => {
            let query = page.query()?;
            let tools = ctx.api()?.resource(kind).list(&query)?;
            ctx.printer().list(&views::TOOLS, &tools)
        }
        ToolCommand::Show { id } => {
            // No member route for tools; pick it out of the collection.
            let query = ListQuery::paged(Pagination::new(1, MAX_PER_PAGE)?);
            let tools = ctx.api()?.resource(kind).list(&query)?;
            let tool = find_by_id(&tools, id).ok_or_else(|| Error::NotFound(kind.not_found(id)))?;
            ctx.printer().detail(&views::TOOL_DETAIL, &tool)
        }
    }
}

fn find_by_id(records: &Value, id: u64) -> Option<Value> {
    records
        .as_array()?
        .iter()
        .find(|r| r.get("id").and_then(Value::as_u64) == Some(id))
        .cloned()
}

pub fn tool_configs(command: ToolConfigCommand, ctx: &mut Context) -> Result<()> {
    let kind = ResourceKind::ToolConfig;
    match command {
        ToolConfigCommand::List(page) => {
            let query = page.query()?;
            let configs = ctx.api()?.resource(kind).list(&query)?;
            ctx.printer().list(&views::TOOL_CONFIGS, &configs)
        }
        ToolConfigCommand::Show { id } => {
            let config = ctx.api()?.resource(kind).show(id)?;
            json_or_notice(ctx, &config, "No tool configuration found.")
        }
        ToolConfigCommand::BoutiquesDescriptor { id } => {
            let descriptor = ctx.api()?.resource(kind).member_get(id, "boutiques_descriptor")?;
            json_or_notice(ctx, &descriptor, "No Boutiques descriptor found.")
        }
    }
}

/// Documents with no table form are always printed as JSON.
fn json_or_notice(ctx: &mut Context, value: &Value, empty: &str) -> Result<()> {
    let is_empty = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    let mut out = ctx.printer();
    if is_empty {
        return out.line(empty);
    }
    out.json(value)
}

pub fn background_activities(command: BackgroundCommand, ctx: &mut Context) -> Result<()> {
    let kind = ResourceKind::BackgroundActivity;
    match command {
        BackgroundCommand::List(page) => {
            let query = page.query()?;
            let activities = ctx.api()?.resource(kind).list(&query)?;
            ctx.printer().list(&views::BACKGROUND_ACTIVITIES, &activities)
        }
        BackgroundCommand::Show { id } => {
            let activity = ctx.api()?.resource(kind).show(id)?;
            ctx.printer()
                .detail(&views::BACKGROUND_ACTIVITY_DETAIL, &activity)
        }
    }
}

pub fn remote_resources(command: RemoteResourceCommand, ctx: &mut Context) -> Result<()> {
    let kind = ResourceKind::RemoteResource;
    match command {
        RemoteResourceCommand::List(page) => {
            let query = page.query()?;
            let resources = ctx.api()?.resource(kind).list(&query)?;
            ctx.printer().list(&views::REMOTE_RESOURCES, &resources)
        }
        RemoteResourceCommand::Show { id } => {
            let resource = ctx.api()?.resource(kind).show(id)?;
            ctx.printer()
                .detail(&views::REMOTE_RESOURCE_DETAIL, &resource)
        }
    }
}
