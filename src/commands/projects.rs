// project list | show [id] | switch <id>

use super::Context;
use crate::api::ResourceKind;
use crate::cli::ProjectCommand;
use crate::error::{Error, Result};
use crate::views;
use serde_json::{json, Value};
use tracing::info;

const NO_PROJECT: &str = "No current project set. Use 'cbrain project switch <ID>' to set a project.";

pub fn run(command: ProjectCommand, ctx: &mut Context) -> Result<()> {
    match command {
        ProjectCommand::List(page) => {
            let query = page.query()?;
            let projects = ctx.api()?.resource(ResourceKind::Project).list(&query)?;
            ctx.printer().list(&views::PROJECTS, &projects)
        }
        ProjectCommand::Show { id: Some(id) } => {
            let project = ctx.api()?.resource(ResourceKind::Project).show(id)?;
            ctx.printer().detail(&views::PROJECT_DETAIL, &project)
        }
        ProjectCommand::Show { id: None } => show_current(ctx),
        ProjectCommand::Switch { id } => switch(id, ctx),
    }
}

fn show_current(ctx: &mut Context) -> Result<()> {
    let api = ctx.api()?;
    let current = ctx.session.require_auth()?.current_group_id;
    let Some(id) = current else {
        return ctx.printer().line(NO_PROJECT);
    };

    match api.resource(ResourceKind::Project).show(id) {
        Ok(project) => print_current(ctx, &project, id),
        Err(Error::NotFound(_)) => {
            ctx.session.clear_current_project()?;
            Err(Error::NotFound(format!(
                "Current project (ID {}) no longer exists",
                id
            )))
        }
        Err(e) => Err(e),
    }
}

fn switch(id: u64, ctx: &mut Context) -> Result<()> {
    let api = ctx.api()?;
    let projects = api.resource(ResourceKind::Project);
    projects
        .collection_post("switch", &[("id", id)], None)
        .map_err(|e| e.or_not_found(|| ResourceKind::Project.not_found(id)))?;
    let project = projects.show(id)?;
    let name = project
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    ctx.session.set_current_project(id, &name)?;
    info!(project = id, %name, "switched project");
    print_current(ctx, &project, id)
}

fn print_current(ctx: &mut Context, project: &Value, id: u64) -> Result<()> {
    let name = project
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let mut out = ctx.printer();
    if out.structured(&json!({"id": id, "name": name}))? {
        return Ok(());
    }
    out.line(format!("Current project is \"{}\" ID={}", name, id))
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use crate::api::testing::TestServer;
    use crate::cli::{Command, ProjectArgs, ProjectCommand};
    use crate::output::OutputFormat;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn project(command: ProjectCommand) -> Command {
        Command::Project(ProjectArgs { command })
    }

    #[test]
    fn switch_stores_current_project() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/groups/switch"))
                .and(query_param("id", "8"))
                .respond_with(ResponseTemplate::new(200)),
        );
        server.mount(
            Mock::given(method("GET"))
                .and(path("/groups/8"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"id": 8, "name": "Demo"})),
                ),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(OutputFormat::Table, project(ProjectCommand::Switch { id: 8 }))
            .unwrap();
        assert_eq!(h.stdout(), "Current project is \"Demo\" ID=8\n");

        let stored = h.store().load().unwrap().unwrap();
        assert_eq!(stored.current_group_id, Some(8));
        assert_eq!(stored.current_group_name.as_deref(), Some("Demo"));
    }

    #[test]
    fn show_without_current_project() {
        let server = TestServer::start();
        let mut h = Harness::logged_in(&server.uri());
        h.run(OutputFormat::Table, project(ProjectCommand::Show { id: None }))
            .unwrap();
        assert!(h.stdout().starts_with("No current project set."));
        assert!(server.received().is_empty());
    }

    #[test]
    fn vanished_current_project_is_cleared() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/groups/8"))
                .respond_with(ResponseTemplate::new(404)),
        );
        let mut h = Harness::logged_in(&server.uri());
        let store = h.store();
        let mut stored = store.load().unwrap().unwrap();
        stored.current_group_id = Some(8);
        stored.current_group_name = Some("Gone".into());
        store.save(&stored).unwrap();

        let err = h
            .run(OutputFormat::Table, project(ProjectCommand::Show { id: None }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: Current project (ID 8) no longer exists");
        assert_eq!(store.load().unwrap().unwrap().current_group_id, None);
    }

    #[test]
    fn json_list_is_projected() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/groups"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"id": 1, "type": "WorkGroup", "name": "lab", "site_id": 4}
                ]))),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(
            OutputFormat::Jsonl,
            project(ProjectCommand::List(crate::cli::PageArgs {
                page: 1,
                per_page: 25,
            })),
        )
        .unwrap();
        let line: serde_json::Value = serde_json::from_str(h.stdout().trim_end()).unwrap();
        assert_eq!(line, json!({"id": 1, "type": "WorkGroup", "name": "lab"}));
        assert_eq!(h.stdout().lines().count(), 1);
    }
}
