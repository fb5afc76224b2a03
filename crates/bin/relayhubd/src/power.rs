//! Host power control after `app.shutdown` / `app.reboot`.

use std::process::ExitStatus;

use tokio::process::Command;

/// Failure to hand the power request to the host.
#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("no command configured")]
    EmptyCommand,
    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Run the configured power command (`program arg…`) and wait for it.
///
/// # Errors
///
/// Returns [`PowerError`] if the command is empty, cannot be started, or
/// exits unsuccessfully.
pub async fn run(command: &[String]) -> Result<(), PowerError> {
    let [program, args @ ..] = command else {
        return Err(PowerError::EmptyCommand);
    };
    tracing::info!(%program, ?args, "handing power request to the host");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| PowerError::Spawn {
            program: program.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(PowerError::Failed {
            program: program.clone(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn should_reject_empty_command() {
        assert!(matches!(run(&[]).await, Err(PowerError::EmptyCommand)));
    }

    #[tokio::test]
    async fn should_succeed_when_command_succeeds() {
        assert!(run(&command(&["true"])).await.is_ok());
    }

    #[tokio::test]
    async fn should_report_failing_command() {
        assert!(matches!(
            run(&command(&["false"])).await,
            Err(PowerError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn should_report_missing_program() {
        assert!(matches!(
            run(&command(&["relayhub-no-such-program"])).await,
            Err(PowerError::Spawn { .. })
        ));
    }
}
