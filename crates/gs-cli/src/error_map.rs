use gs_core::ScenarioError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> ScenarioError {
    ScenarioError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ScenarioError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    let message = match &error.location {
        Some(location) => format!("{} ({})", error.message, location),
        None => error.message.clone(),
    };
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&message).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> ScenarioError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> ScenarioError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ScenarioError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_config_invalid(error: serde_json::Error) -> ScenarioError {
    map_error("CLI_CONFIG_INVALID", error)
}

pub(crate) fn map_cli_runtime(error: std::io::Error) -> ScenarioError {
    map_error("CLI_RUNTIME", error)
}
