// task list [bourreau-id N] | show | operation

use super::Context;
use crate::api::ResourceKind;
use crate::cli::{TaskCommand, TaskFilter};
use crate::error::{Error, Result};
use crate::views;
use serde_json::json;

pub fn run(command: TaskCommand, ctx: &mut Context) -> Result<()> {
    match command {
        TaskCommand::List { filter, page } => {
            let bourreau = filter.map(|TaskFilter::BourreauId { id }| id);
            let query = page.query()?.filter("bourreau_id", bourreau);
            let tasks = ctx.api()?.resource(ResourceKind::Task).list(&query)?;
            ctx.printer().list(&views::TASKS, &tasks)
        }
        TaskCommand::Show { id } => {
            let task = ctx.api()?.resource(ResourceKind::Task).show(id)?;
            ctx.printer().detail(&views::TASK_DETAIL, &task)
        }
        TaskCommand::Operation { name, task_ids } => {
            if task_ids.is_empty() {
                return Err(Error::Validation("Task ID(s) are required".into()));
            }
            let api = ctx.api()?;
            let body = json!({"operation": name, "tasklist": task_ids});
            let reply = api.resource(ResourceKind::Task).collection_post(
                "operation",
                &[] as &[(&str, &str)],
                Some(&body),
            )?;
            ctx.printer().json(&reply)
        }
    }
}
