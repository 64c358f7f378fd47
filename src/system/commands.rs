use crate::demo;
use crate::error::{DiagError, DiagResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time;

/// Abstraction for command execution to enable testing without real commands
#[async_trait]
pub trait CommandExecutor {
    async fn execute(&self, command: &str, args: &[&str]) -> DiagResult<String>;
    async fn execute_with_timeout(
        &self,
        command: &str,
        args: &[&str],
        timeout_duration: Duration,
    ) -> DiagResult<String>;
}

/// Real command executor using tokio::process::Command
pub struct RealCommandExecutor;

#[async_trait]
impl CommandExecutor for RealCommandExecutor {
    async fn execute(&self, command: &str, args: &[&str]) -> DiagResult<String> {
        tracing::debug!(command, ?args, "running command");
        let output = TokioCommand::new(command)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DiagError::Command {
                command: command.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
                source: Box::new(e),
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| DiagError::Command {
                command: command.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
                source: Box::new(e),
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DiagError::command_error(command, args, stderr.trim()))
        }
    }

    async fn execute_with_timeout(
        &self,
        command: &str,
        args: &[&str],
        timeout_duration: Duration,
    ) -> DiagResult<String> {
        let result = time::timeout(timeout_duration, self.execute(command, args)).await;
        match result {
            Ok(output) => output,
            Err(_) => Err(DiagError::timeout_error(
                &format!("{} {}", command, args.join(" ")),
                timeout_duration,
            )),
        }
    }
}

/// Demo command executor that returns predefined responses
pub struct DemoCommandExecutor;

impl DemoCommandExecutor {
    fn get_demo_response(&self, command: &str, args: &[&str]) -> Option<&'static str> {
        match (command, args) {
            ("zpool", ["list", "-H", "-o", "name"]) => Some(demo::DEMO_ZPOOL_LIST),
            ("zpool", ["list", "-Hp", "-o", _, "data"]) => Some(demo::DEMO_ZPOOL_LIST_DATA),
            ("zpool", ["list", "-Hp", "-o", _, "boot-pool"]) => Some(demo::DEMO_ZPOOL_LIST_BOOT),
            ("zpool", ["status", "-p", "data"]) => Some(demo::DEMO_ZPOOL_STATUS_DATA),
            ("zpool", ["status", "-p", "boot-pool"]) => Some(demo::DEMO_ZPOOL_STATUS_BOOT),
            _ => None,
        }
    }
}

#[async_trait]
impl CommandExecutor for DemoCommandExecutor {
    async fn execute(&self, command: &str, args: &[&str]) -> DiagResult<String> {
        if let Some(response) = self.get_demo_response(command, args) {
            Ok(response.to_string())
        } else {
            Err(DiagError::command_error(
                command,
                args,
                "Demo: Command not mocked",
            ))
        }
    }

    async fn execute_with_timeout(
        &self,
        command: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> DiagResult<String> {
        self.execute(command, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_real_executor_captures_stdout() {
        let output = RealCommandExecutor
            .execute("echo", &["zpool_stats"])
            .await
            .unwrap();
        assert_eq!(output, "zpool_stats\n");
    }

    #[tokio::test]
    async fn test_real_executor_missing_binary() {
        let result = RealCommandExecutor
            .execute("/nonexistent/zpool", &["list"])
            .await;
        assert!(matches!(result, Err(DiagError::Command { .. })));
    }

    #[tokio::test]
    async fn test_real_executor_times_out() {
        let result = RealCommandExecutor
            .execute_with_timeout("sleep", &["5"], Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(DiagError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_demo_executor_knows_pool_commands() {
        let output = DemoCommandExecutor
            .execute("zpool", &["list", "-H", "-o", "name"])
            .await
            .unwrap();
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["boot-pool", "data"]);

        let status = DemoCommandExecutor
            .execute("zpool", &["status", "-p", "data"])
            .await
            .unwrap();
        assert!(status.contains("scan: scrub repaired"));

        assert!(DemoCommandExecutor.execute("zpool", &["iostat"]).await.is_err());
    }
}
