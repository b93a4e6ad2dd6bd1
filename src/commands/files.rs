// file list | show | upload | copy | move | delete

use super::Context;
use crate::api::{ChangeProvider, ResourceKind, TransferMode, UploadRequest};
use crate::cli::{FileCommand, TransferArgs, UploadArgs};
use crate::error::Result;
use crate::ui;
use crate::views;
use serde_json::Value;
use tracing::info;

pub fn run(command: FileCommand, ctx: &mut Context) -> Result<()> {
    match command {
        FileCommand::List {
            group_id,
            dp_id,
            user_id,
            parent_id,
            file_type,
            page,
        } => {
            let query = page
                .query()?
                .filter("group_id", group_id)
                .filter("data_provider_id", dp_id)
                .filter("user_id", user_id)
                .filter("parent_id", parent_id)
                .filter("type", file_type);
            let files = ctx.api()?.resource(ResourceKind::File).list(&query)?;
            ctx.printer().list(&views::FILES, &files)
        }
        FileCommand::Show { id } => {
            let file = ctx.api()?.resource(ResourceKind::File).show(id)?;
            ctx.printer().detail(&views::FILE_DETAIL, &file)
        }
        FileCommand::Upload(args) => upload(args, ctx),
        FileCommand::Copy(args) => transfer(args, TransferMode::Copy, ctx),
        FileCommand::Move(args) => transfer(args, TransferMode::Move, ctx),
        FileCommand::Delete { id } => {
            let reply = ctx
                .api()?
                .delete_files(&[id])
                .map_err(|e| e.or_not_found(|| ResourceKind::File.not_found(id)))?;
            let mut out = ctx.printer();
            if out.structured(&reply)? {
                return Ok(());
            }
            match notice(&reply) {
                Some(text) => out.line(text),
                None => out.line(format!("File {} deleted successfully", id)),
            }
        }
    }
}

fn upload(args: UploadArgs, ctx: &mut Context) -> Result<()> {
    let api = ctx.api()?;
    let req = UploadRequest {
        path: args.path.clone(),
        data_provider_id: args.data_provider,
        group_id: args.group_id,
        file_type: args.file_type().to_string(),
    };
    let size = std::fs::metadata(&req.path).map(|m| m.len()).unwrap_or(0);
    let name = req.file_name();

    let reply = ui::with_spinner(&format!("Uploading {}...", name), || api.upload_file(&req))?;
    info!(file = %name, size, data_provider = req.data_provider_id, "uploaded");

    let mut out = ctx.printer();
    if out.structured(&reply)? {
        return Ok(());
    }
    out.line(format!(
        "Uploading {} ({} bytes) to data provider {}...",
        name, size, req.data_provider_id
    ))?;
    out.line("File uploaded successfully!")?;
    if let Some(text) = notice(&reply) {
        out.line(format!("Server response: {}", text))?;
    }
    Ok(())
}

fn transfer(args: TransferArgs, mode: TransferMode, ctx: &mut Context) -> Result<()> {
    let api = ctx.api()?;
    let req = ChangeProvider {
        file_ids: args.file_ids,
        data_provider_id: args.dp_id,
        mode,
    };
    let verb = mode.key();
    let reply = ui::with_spinner(&format!("Requesting {}...", verb), || {
        api.change_provider(&req)
    })?;

    let activity_id = reply.get("background_activity_id").and_then(Value::as_u64);
    {
        let mut out = ctx.printer();
        if !out.structured(&reply)? {
            if let Some(message) = reply
                .get("message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
            {
                out.line(message)?;
            }
            match activity_id {
                Some(id) => out.line(format!("Background activity ID: {}", id))?,
                None => out.line(format!("File {} initiated successfully", verb))?,
            }
        }
    }

    // The transfer runs server-side; show the activity tracking it.
    if let Some(id) = activity_id {
        let activity = api.resource(ResourceKind::BackgroundActivity).show(id)?;
        ctx.printer()
            .detail(&views::BACKGROUND_ACTIVITY_DETAIL, &activity)?;
    }
    Ok(())
}

fn notice(reply: &Value) -> Option<String> {
    ["notice", "message"]
        .iter()
        .find_map(|key| reply.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use crate::api::testing::TestServer;
    use crate::cli::{Command, FileArgs, FileCommand, PageArgs, TransferArgs};
    use crate::error::Error;
    use crate::output::OutputFormat;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn file(command: FileCommand) -> Command {
        Command::File(FileArgs { command })
    }

    fn list(page: PageArgs) -> FileCommand {
        FileCommand::List {
            group_id: Some(3),
            dp_id: None,
            user_id: None,
            parent_id: None,
            file_type: None,
            page,
        }
    }

    #[test]
    fn list_sends_filters_and_paging() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/userfiles"))
                .and(query_param("group_id", "3"))
                .and(query_param("page", "1"))
                .and(query_param("per_page", "25"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"id": 1, "type": "TextFile", "name": "a.txt"}
                ]))),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(
            OutputFormat::Table,
            file(list(PageArgs {
                page: 1,
                per_page: 25,
            })),
        )
        .unwrap();
        assert!(h.stdout().contains("1  TextFile a.txt"));
    }

    #[test]
    fn bad_page_size_makes_no_request() {
        let server = TestServer::start();
        let mut h = Harness::logged_in(&server.uri());
        let err = h
            .run(
                OutputFormat::Table,
                file(list(PageArgs {
                    page: 1,
                    per_page: 4,
                })),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(server.received().is_empty());
    }

    #[test]
    fn move_follows_up_with_background_activity() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/userfiles/change_provider"))
                .and(body_json(
                    json!({"file_ids": [7], "data_provider_id_for_mv_cp": 2, "move": ""}),
                ))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"message": "ok", "background_activity_id": 42})),
                ),
        );
        server.mount(
            Mock::given(method("GET"))
                .and(path("/background_activities/42"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"id": 42, "status": "InProgress", "items": [7]})),
                ),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(
            OutputFormat::Table,
            file(FileCommand::Move(TransferArgs {
                file_ids: vec![7],
                dp_id: 2,
            })),
        )
        .unwrap();
        let out = h.stdout();
        assert!(out.starts_with("ok\nBackground activity ID: 42\nid: 42\n"));
        assert!(out.contains("status: InProgress"));
        assert!(out.contains("items: [7]"));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/userfiles/99"))
                .respond_with(ResponseTemplate::new(404)),
        );
        let mut h = Harness::logged_in(&server.uri());
        let err = h
            .run(OutputFormat::Table, file(FileCommand::Show { id: 99 }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: File with ID 99 not found");
    }

    #[test]
    fn deleting_missing_file_is_reported_as_not_found() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("DELETE"))
                .and(path("/userfiles/delete_files"))
                .respond_with(ResponseTemplate::new(404)),
        );
        let mut h = Harness::logged_in(&server.uri());
        let err = h
            .run(OutputFormat::Table, file(FileCommand::Delete { id: 99 }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: File with ID 99 not found");
        assert_eq!(h.stdout(), "");
    }
}
