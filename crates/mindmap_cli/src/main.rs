//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to inspect `.smmx` files through `mindmap_api`.
//! - Keep output deterministic for quick local sanity checks.

use mindmap_api::{
    find_nodes_without_notes, get_node_path, read_mindmap, search_nodes, ApiConfig, ApiError,
    ReadFormat, ReadResponse,
};
use std::process::ExitCode;

const USAGE: &str = "usage: mindmap <summary|markdown|json|search|path|incomplete> <file> [arg]";

fn main() -> ExitCode {
    let config = ApiConfig::from_env();
    if let Err(err) = config.init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let [command, file, rest @ ..] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let arg = rest.first().map(String::as_str);

    match run(command, file, arg) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_else(|_| err.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(command: &str, file: &str, arg: Option<&str>) -> Result<String, ApiError> {
    match command {
        "summary" => to_json(&read_mindmap(file, ReadFormat::Summary)?),
        "markdown" => match read_mindmap(file, ReadFormat::Markdown)? {
            ReadResponse::Markdown(outline) => Ok(outline),
            other => to_json(&other),
        },
        "json" => match read_mindmap(file, ReadFormat::Json)? {
            ReadResponse::Json(json) => Ok(json),
            other => to_json(&other),
        },
        "search" => to_json(&search_nodes(file, required(arg, "query")?, true)?),
        "path" => Ok(get_node_path(file, required(arg, "node id")?)?.breadcrumb),
        "incomplete" => {
            let response = find_nodes_without_notes(file)?;
            Ok(response
                .items
                .iter()
                .map(|item| format!("{}\t{}", item.id, item.breadcrumb))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        other => Err(usage_error(format!("unknown command `{other}`"))),
    }
}

fn required<'a>(arg: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    arg.ok_or_else(|| usage_error(format!("missing {name}")))
}

fn usage_error(message: String) -> ApiError {
    ApiError {
        kind: "invalid_operation".to_string(),
        message: format!("{message}; {USAGE}"),
        path: None,
        node_id: None,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|err| ApiError {
        kind: "invalid_operation".to_string(),
        message: format!("json rendering failed: {err}"),
        path: None,
        node_id: None,
    })
}
