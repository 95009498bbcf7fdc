use serde::{Deserialize, Serialize};
use std::fmt;

/// One run request for the external sandbox compiler service.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExecuteRequest {
    /// Data fed to the program on stdin. Empty input is valid.
    pub input: String,
    /// Source code to compile and run.
    pub code: String,
    /// Wall-clock budget for the run, in milliseconds.
    pub timeout: u64,
}

/// Outcome of one sandbox run.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExecuteResponse {
    /// Captured stdout of the program.
    pub output: String,
    pub exit_code: i32,
    pub exit_status: ExitStatus,
    /// Milliseconds consumed, `-1` when the sandbox was never reached.
    pub used_time: i32,
}

impl ExecuteResponse {
    /// Sentinel for an unreachable sandbox.
    ///
    /// The execution client returns this instead of raising, so that judging
    /// can fold a sandbox hiccup into a failed test case while verification
    /// treats it as fatal.
    pub fn cant_connect() -> Self {
        Self {
            output: String::new(),
            exit_code: 1,
            exit_status: ExitStatus::CantConnectToCompiler,
            used_time: -1,
        }
    }

    /// Returns true if the sandbox itself was never reached, meaning the
    /// output carries no information about the submitted code.
    pub fn is_infra_failure(&self) -> bool {
        matches!(self.exit_status, ExitStatus::CantConnectToCompiler)
    }
}

/// How a sandbox run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitStatus {
    Success,
    CompileError,
    RuntimeError,
    Timeout,
    MemoryExceeded,
    /// The sandbox service could not be reached at all.
    CantConnectToCompiler,
}

impl ExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::CompileError => "COMPILE_ERROR",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::MemoryExceeded => "MEMORY_EXCEEDED",
            Self::CantConnectToCompiler => "CANT_CONNECT_TO_COMPILER",
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let request = ExecuteRequest {
            input: "1 2".into(),
            code: "print(3)".into(),
            timeout: 100,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"], "1 2");
        assert_eq!(json["timeout"], 100);

        let response: ExecuteResponse = serde_json::from_value(serde_json::json!({
            "output": "3\n",
            "exit_code": 0,
            "exit_status": "SUCCESS",
            "used_time": 12,
        }))
        .unwrap();
        assert_eq!(response.exit_status, ExitStatus::Success);
        assert!(!response.is_infra_failure());
    }

    #[test]
    fn test_cant_connect_sentinel() {
        let sentinel = ExecuteResponse::cant_connect();
        assert!(sentinel.is_infra_failure());
        assert_eq!(sentinel.exit_code, 1);
        assert_eq!(sentinel.used_time, -1);
        assert_eq!(
            serde_json::to_value(sentinel.exit_status).unwrap(),
            "CANT_CONNECT_TO_COMPILER"
        );
    }
}
