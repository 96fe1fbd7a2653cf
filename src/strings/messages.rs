//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.
//! Rejection details are meant to be shown to the end user as-is.

pub const EMPTY_COMMAND: &str = "Command is empty";

pub fn tool_requirement(tool: &str, detail: &str) -> String {
    format!("{tool} command {detail}")
}

pub fn unrecognized_tool(tool: &str) -> String {
    format!("Command '{tool}' is not in the list of recognized tools.")
}

pub fn command_rejected(reason: &str, detail: &str) -> String {
    format!("❌ Rejected ({reason}): {detail}")
}

pub fn command_accepted(route: &str) -> String {
    format!("✅ Accepted, would run via the {route} route")
}

pub fn command_output_format(workdir: &str, command: &str, output: &str) -> String {
    format!("[{workdir}] $ {command}\n{output}")
}

pub fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("[Exit Code: {code}]"),
        None => "[Terminated by signal]".to_string(),
    }
}

pub fn produced_files(files: &[String]) -> String {
    if files.is_empty() {
        "No new files were produced.".to_string()
    } else {
        format!("Produced: {}", files.join(", "))
    }
}

pub fn missing_outputs(files: &[String]) -> String {
    format!("⚠️ Expected output(s) not found: {}", files.join(", "))
}

pub fn execution_failed(kind: &str, err: &str) -> String {
    format!("❌ Execution failed ({kind}): {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_requirement() {
        assert_eq!(
            tool_requirement("ffmpeg", "is missing the -i input file flag"),
            "ffmpeg command is missing the -i input file flag"
        );
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(Some(1)), "[Exit Code: 1]");
        assert_eq!(exit_status(None), "[Terminated by signal]");
    }
}
