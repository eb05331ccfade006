use agent_core::permission::{PermissionDecision, PermissionPrompter, PermissionRequest};
use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Asks on the controlling terminal: `[y]es`, `[a]lways` or `[N]o`.
pub struct TerminalPrompter;

#[async_trait]
impl PermissionPrompter for TerminalPrompter {
    async fn ask(&self, request: &PermissionRequest) -> PermissionDecision {
        let question = format!(
            "\n\x1b[1;33m  Permission required\x1b[0m ({} / {})\n    {}\n    in {}\n  Allow? [y]es / [a]lways this session / [N]o: ",
            request.tool_name,
            request.action,
            request.description,
            request.path.display(),
        );

        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(question.as_bytes());
            let _ = stderr.flush();

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => parse_decision(&line),
            Ok(Err(e)) => {
                tracing::warn!("Failed to read permission answer: {}", e);
                PermissionDecision::Deny
            }
            Err(e) => {
                tracing::warn!("Permission prompt task failed: {}", e);
                PermissionDecision::Deny
            }
        }
    }
}

fn parse_decision(answer: &str) -> PermissionDecision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => PermissionDecision::Allow,
        "a" | "always" => PermissionDecision::AllowForSession,
        _ => PermissionDecision::Deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("y\n"), PermissionDecision::Allow);
        assert_eq!(parse_decision(" YES "), PermissionDecision::Allow);
        assert_eq!(parse_decision("a\n"), PermissionDecision::AllowForSession);
        assert_eq!(parse_decision("always"), PermissionDecision::AllowForSession);
        assert_eq!(parse_decision("\n"), PermissionDecision::Deny);
        assert_eq!(parse_decision("nope"), PermissionDecision::Deny);
    }
}
