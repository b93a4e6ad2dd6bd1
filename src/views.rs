// Per-resource presentation: which columns a list shows, how records are
// reshaped before display, and how a single record is laid out.

use crate::output::field_text;
use serde_json::{json, Value};
use std::io::{self, Write};

/// One table column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
    pub max_width: Option<usize>,
    pub wrap: bool,
}

const fn col(key: &'static str, header: &'static str) -> Column {
    Column {
        key,
        header,
        max_width: None,
        wrap: false,
    }
}

const fn capped(key: &'static str, header: &'static str, width: usize) -> Column {
    Column {
        key,
        header,
        max_width: Some(width),
        wrap: false,
    }
}

const fn wrapped(key: &'static str, header: &'static str) -> Column {
    Column {
        key,
        header,
        max_width: None,
        wrap: true,
    }
}

/// How a list of records is shown in table mode.
pub struct ListView {
    pub title: Option<&'static str>,
    pub columns: &'static [Column],
    /// Message instead of the table when there are no records. `None`
    /// falls through to the table's own notice.
    pub empty: Option<&'static str>,
    /// Noun for the `Total: N <noun>(s)` footer.
    pub noun: Option<&'static str>,
    /// Length of the rules around title and footer.
    pub rule: usize,
    pub project: fn(&Value) -> Value,
    /// Emit projected records in JSON modes instead of the raw ones.
    pub structured_projection: bool,
    pub indent_wrapped: bool,
    pub max_row_lines: Option<usize>,
    pub preserve_blank_lines: bool,
}

const BASE: ListView = ListView {
    title: None,
    columns: &[],
    empty: None,
    noun: None,
    rule: 40,
    project: identity,
    structured_projection: false,
    indent_wrapped: false,
    max_row_lines: None,
    preserve_blank_lines: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStyle {
    /// `key: value` lines.
    Lines,
    /// Titled Field/Value tables separated by blank lines.
    Sections,
}

pub struct Section {
    pub title: Option<&'static str>,
    /// (record key, label)
    pub fields: &'static [(&'static str, &'static str)],
}

pub struct DetailView {
    pub style: DetailStyle,
    pub sections: &'static [Section],
    /// Trailing output that depends on the record (optional fields).
    pub extras: fn(&Value, &mut dyn Write) -> io::Result<()>,
}

fn identity(record: &Value) -> Value {
    record.clone()
}

fn no_extras(_: &Value, _: &mut dyn Write) -> io::Result<()> {
    Ok(())
}

fn yes_no(record: &Value, key: &str) -> &'static str {
    if record.get(key).and_then(Value::as_bool).unwrap_or(false) {
        "Yes"
    } else {
        "No"
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
    }
}

// Files

pub const FILES: ListView = ListView {
    columns: &[col("id", "ID"), col("type", "Type"), col("name", "File Name")],
    ..BASE
};

pub const FILE_DETAIL: DetailView = DetailView {
    style: DetailStyle::Lines,
    sections: &[Section {
        title: None,
        fields: &[
            ("id", "id"),
            ("type", "type"),
            ("name", "name"),
            ("data_provider_id", "data_provider"),
            ("size", "size"),
            ("num_files", "num_files"),
            ("user_id", "user_id"),
            ("group_id", "group_id"),
        ],
    }],
    extras: file_flags,
};

fn file_flags(record: &Value, out: &mut dyn Write) -> io::Result<()> {
    for key in ["description", "hidden", "immutable", "archived"] {
        if truthy(record.get(key)) {
            writeln!(out, "{}: {}", key, field_text(record, key))?;
        }
    }
    Ok(())
}

// Data providers

pub const DATA_PROVIDERS: ListView = ListView {
    columns: &[
        col("id", "ID"),
        col("name", "Name"),
        col("type", "Type"),
        col("remote_host", "Host"),
        col("online", "Online"),
    ],
    empty: Some("No data providers found."),
    project: data_provider_row,
    ..BASE
};

fn data_provider_row(record: &Value) -> Value {
    json!({
        "id": record.get("id"),
        "name": record.get("name"),
        "type": record.get("type"),
        "remote_host": record.get("remote_host"),
        "online": yes_no(record, "online"),
    })
}

pub const DATA_PROVIDER_DETAIL: DetailView = DetailView {
    style: DetailStyle::Sections,
    sections: &[
        Section {
            title: Some("DATA PROVIDER DETAILS"),
            fields: &[
                ("id", "ID"),
                ("name", "Name"),
                ("type", "Type"),
                ("description", "Description"),
            ],
        },
        Section {
            title: Some("CONNECTION INFO"),
            fields: &[
                ("remote_user", "Remote User"),
                ("remote_host", "Remote Host"),
                ("remote_dir", "Remote Directory"),
                ("remote_port", "Remote Port"),
            ],
        },
        Section {
            title: Some("OWNERSHIP & STATUS"),
            fields: &[
                ("user_id", "User ID"),
                ("group_id", "Group ID"),
                ("online", "Online"),
                ("read_only", "Read Only"),
                ("is_browsable", "Is Browsable"),
                ("is_fast_syncing", "Is Fast Syncing"),
                ("allow_file_owner_change", "Allow File Owner Change"),
                (
                    "content_storage_shared_between_users",
                    "Content Storage Shared Between Users",
                ),
            ],
        },
    ],
    extras: no_extras,
};

// Projects

pub const PROJECTS: ListView = ListView {
    columns: &[col("id", "ID"), col("type", "Type"), col("name", "Project Name")],
    project: project_row,
    structured_projection: true,
    ..BASE
};

fn project_row(record: &Value) -> Value {
    json!({
        "id": record.get("id"),
        "type": record.get("type"),
        "name": record.get("name"),
    })
}

pub const PROJECT_DETAIL: DetailView = DetailView {
    style: DetailStyle::Lines,
    sections: &[Section {
        title: None,
        fields: &[
            ("id", "id"),
            ("name", "name"),
            ("type", "type"),
            ("description", "description"),
            ("creator_id", "creator_id"),
            ("site_id", "site_id"),
            ("invisible", "invisible"),
            ("public", "public"),
            ("not_assignable", "not_assignable"),
            ("created_at", "created_at"),
            ("updated_at", "updated_at"),
        ],
    }],
    extras: no_extras,
};

// Tools

pub const TOOLS: ListView = ListView {
    columns: &[
        col("id", "ID"),
        col("name", "Name"),
        col("category", "Category"),
        wrapped("description", "Description"),
    ],
    empty: Some("No tools found."),
    noun: Some("tool"),
    rule: 80,
    indent_wrapped: true,
    max_row_lines: Some(3),
    preserve_blank_lines: false,
    ..BASE
};

pub const TOOL_DETAIL: DetailView = DetailView {
    style: DetailStyle::Lines,
    sections: &[Section {
        title: None,
        fields: &[
            ("id", "id"),
            ("name", "name"),
            ("user_id", "user_id"),
            ("group_id", "group_id"),
            ("category", "category"),
            ("description", "description"),
            ("url", "url"),
        ],
    }],
    extras: no_extras,
};

// Tool configurations

pub const TOOL_CONFIGS: ListView = ListView {
    columns: &[
        capped("id", "ID", 8),
        capped("version_name", "Version", 12),
        capped("tool_id", "Tool ID", 8),
        capped("bourreau_id", "Bourreau", 10),
        capped("group_id", "Group", 6),
        capped("ncpus", "CPUs", 4),
        wrapped("description", "Description"),
    ],
    empty: Some("No tool configurations found."),
    noun: Some("configuration"),
    rule: 85,
    project: tool_config_row,
    indent_wrapped: true,
    max_row_lines: Some(3),
    preserve_blank_lines: false,
    ..BASE
};

fn tool_config_row(record: &Value) -> Value {
    let ncpus = match record.get("ncpus") {
        None | Some(Value::Null) => json!("1"),
        Some(v) => v.clone(),
    };
    json!({
        "id": record.get("id"),
        "version_name": record.get("version_name"),
        "tool_id": record.get("tool_id"),
        "bourreau_id": record.get("bourreau_id"),
        "group_id": record.get("group_id"),
        "ncpus": ncpus,
        "description": record.get("description"),
    })
}

// Tags

pub const TAGS: ListView = ListView {
    title: Some("TAGS"),
    columns: &[
        col("id", "ID"),
        col("name", "Name"),
        col("user_id", "User"),
        col("group_id", "Group"),
    ],
    empty: Some("No tags found."),
    noun: Some("tag"),
    ..BASE
};

pub const TAG_DETAIL: DetailView = DetailView {
    style: DetailStyle::Sections,
    sections: &[Section {
        title: Some("TAG DETAILS"),
        fields: &[
            ("id", "ID"),
            ("name", "Name"),
            ("user_id", "User ID"),
            ("group_id", "Group ID"),
        ],
    }],
    extras: no_extras,
};

// Tasks

const TASK_TYPE_PREFIX: &str = "BoutiquesTask::";

pub const TASKS: ListView = ListView {
    columns: &[
        col("id", "ID"),
        col("type", "Type"),
        col("status", "Status"),
        col("bourreau_id", "Bourreau"),
        col("user_id", "User"),
        col("group_id", "Group"),
    ],
    empty: Some("No tasks found."),
    noun: Some("task"),
    rule: 85,
    project: task_row,
    ..BASE
};

fn task_row(record: &Value) -> Value {
    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace(TASK_TYPE_PREFIX, "");
    json!({
        "id": record.get("id"),
        "type": kind,
        "status": record.get("status"),
        "bourreau_id": record.get("bourreau_id"),
        "user_id": record.get("user_id"),
        "group_id": record.get("group_id"),
    })
}

pub const TASK_DETAIL: DetailView = DetailView {
    style: DetailStyle::Sections,
    sections: &[
        Section {
            title: None,
            fields: &[("id", "ID"), ("type", "Type"), ("status", "Status")],
        },
        Section {
            title: Some("OWNERSHIP & ASSIGNMENT"),
            fields: &[
                ("user_id", "User ID"),
                ("group_id", "Group ID"),
                ("bourreau_id", "Bourreau ID"),
                ("tool_config_id", "Tool Config ID"),
                ("batch_id", "Batch ID"),
            ],
        },
        Section {
            title: Some("EXECUTION INFO"),
            fields: &[
                ("run_number", "Run Number"),
                ("results_data_provider_id", "Results Data Provider ID"),
                ("cluster_workdir_size", "Cluster Workdir Size"),
                ("workdir_archived", "Workdir Archived"),
                ("workdir_archive_userfile_id", "Workdir Archive File ID"),
            ],
        },
        Section {
            title: Some("TIMESTAMPS"),
            fields: &[("created_at", "Created At"), ("updated_at", "Updated At")],
        },
    ],
    extras: task_extras,
};

fn task_extras(record: &Value, out: &mut dyn Write) -> io::Result<()> {
    if let Some(description) = record.get("description").and_then(Value::as_str) {
        let description = description.trim();
        if !description.is_empty() {
            writeln!(out, "\nDESCRIPTION\n{}", "-".repeat(30))?;
            for line in description.lines() {
                writeln!(out, "{}", line)?;
            }
        }
    }
    if let Some(params) = record.get("params").filter(|p| truthy(Some(p))) {
        let text = serde_json::to_string_pretty(params).map_err(io::Error::other)?;
        writeln!(out, "\nPARAMETERS\n{}\n{}", "-".repeat(30), text)?;
    }
    Ok(())
}

// Remote resources

pub const REMOTE_RESOURCES: ListView = ListView {
    title: Some("REMOTE RESOURCES (EXECUTION SERVERS)"),
    columns: &[
        col("id", "ID"),
        capped("name", "Name", 24),
        col("user_id", "User"),
        col("group_id", "Group"),
        col("online", "Online"),
        col("read_only", "Read-Only"),
    ],
    empty: Some("No remote resources found."),
    noun: Some("remote resource"),
    rule: 80,
    project: remote_resource_row,
    ..BASE
};

fn remote_resource_row(record: &Value) -> Value {
    json!({
        "id": record.get("id"),
        "name": record.get("name"),
        "user_id": record.get("user_id"),
        "group_id": record.get("group_id"),
        "online": yes_no(record, "online"),
        "read_only": yes_no(record, "read_only"),
    })
}

pub const REMOTE_RESOURCE_DETAIL: DetailView = DetailView {
    style: DetailStyle::Sections,
    sections: &[
        Section {
            title: Some("REMOTE RESOURCE DETAILS"),
            fields: &[("id", "ID"), ("name", "Name"), ("type", "Type")],
        },
        Section {
            title: Some("OWNERSHIP & ACCESS"),
            fields: &[
                ("user_id", "User ID"),
                ("group_id", "Group ID"),
                ("online", "Online"),
                ("read_only", "Read Only"),
            ],
        },
    ],
    extras: no_extras,
};

// Background activities

pub const BACKGROUND_ACTIVITIES: ListView = ListView {
    columns: &[
        col("id", "ID"),
        col("user_id", "User ID"),
        col("remote_resource_id", "Resource ID"),
        col("status", "Status"),
        col("created_at", "Created At"),
        col("items", "Items"),
        col("num_successes", "Successes"),
        col("num_failures", "Failures"),
    ],
    project: background_activity_row,
    ..BASE
};

fn background_activity_row(record: &Value) -> Value {
    let created_at = record
        .get("created_at")
        .and_then(Value::as_str)
        .map(short_timestamp)
        .unwrap_or_default();
    json!({
        "id": record.get("id"),
        "user_id": record.get("user_id"),
        "remote_resource_id": record.get("remote_resource_id"),
        "status": record.get("status"),
        "created_at": created_at,
        "items": record.get("items"),
        "num_successes": record.get("num_successes").cloned().unwrap_or(json!(0)),
        "num_failures": record.get("num_failures").cloned().unwrap_or(json!(0)),
    })
}

/// `2024-05-01T12:30:45.000-04:00` -> `2024-05-01 12:30:45`.
pub fn short_timestamp(stamp: &str) -> String {
    match stamp.split_once('T') {
        Some((date, time)) => {
            let time = time.split('.').next().unwrap_or(time);
            let end = time.find(['+', '-', 'Z']).unwrap_or(time.len());
            format!("{} {}", date, &time[..end])
        }
        None => stamp.to_string(),
    }
}

pub const BACKGROUND_ACTIVITY_DETAIL: DetailView = DetailView {
    style: DetailStyle::Lines,
    sections: &[Section {
        title: None,
        fields: &[
            ("id", "id"),
            ("type", "type"),
            ("user_id", "user_id"),
            ("remote_resource_id", "remote_resource_id"),
            ("status", "status"),
            ("handler_lock", "handler_lock"),
            ("items", "items"),
            ("current_item", "current_item"),
            ("num_successes", "num_successes"),
            ("num_failures", "num_failures"),
            ("messages", "messages"),
            ("options", "options"),
            ("created_at", "created_at"),
            ("updated_at", "updated_at"),
            ("start_at", "start_at"),
            ("repeat", "repeat"),
            ("retry_count", "retry_count"),
            ("retry_delay", "retry_delay"),
        ],
    }],
    extras: no_extras,
};
