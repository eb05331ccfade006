//! The bash tool's self-description.

use crate::truncate::MAX_OUTPUT_LENGTH;
use agent_core::config::AttributionConfig;

const GENERATED_WITH: &str = "Generated with agent-bash";
const CO_AUTHORED_BY: &str = "Co-Authored-By: agent-bash <agent-bash@users.noreply.github.com>";

/// Build the description shown to the model, including commit attribution.
pub fn bash_description(attribution: &AttributionConfig) -> String {
    let mut parts = Vec::new();
    if attribution.generated_with {
        parts.push(GENERATED_WITH);
    }
    if attribution.co_authored_by {
        parts.push(CO_AUTHORED_BY);
    }

    let (commit_step, commit_example) = if parts.is_empty() {
        (
            "4. Create the commit with your commit message.".to_string(),
            "git commit -m \"$(cat <<'EOF'\n Commit message here.\n EOF\n)\"".to_string(),
        )
    } else {
        (
            format!(
                "4. Create the commit with a message ending with:\n{}",
                parts.join("\n")
            ),
            format!(
                "git commit -m \"$(cat <<'EOF'\n Commit message here.\n\n {}\n EOF\n)\"",
                parts.join("\n ")
            ),
        )
    };

    let pr_attribution = if attribution.generated_with {
        format!("\n\n{}", GENERATED_WITH)
    } else {
        String::new()
    };

    format!(
        r#"Executes a bash command in a persistent shell session with an optional timeout.

The session keeps its working directory between calls, so `cd` affects later commands. Each command runs in a fresh process; exported variables do not persist.

Before running a command:
1. If the command creates files or directories, check the parent directory exists first.
2. Read-only commands such as `ls`, `pwd`, `git status` or `git log` run without asking. Everything else needs the user's permission and may be refused.

Usage notes:
- The `command` argument is required.
- `timeout` is optional, in milliseconds, up to 600000 (10 minutes). Commands time out after 60000 ms (1 minute) by default.
- stdout and stderr are each limited to {max_output} characters; longer output keeps its beginning and end and reports how many lines were dropped in between.
- Chain dependent commands with `&&` or `;` instead of newlines.
- Prefer absolute paths over `cd`.
- Avoid interactive commands; stdin is not connected.
- The working directory after the command is reported in a trailing <cwd> tag.

Committing changes with git:
1. Run `git status`, `git diff` and `git log -5 --oneline` to see what changed and how commit messages are written here.
2. Stage only the relevant files.
3. Write a concise message that explains why the change was made.
{commit_step}

<example>
{commit_example}
</example>

Never update git config, push, or force anything unless the user explicitly asks.

Creating pull requests:
Use `gh pr create` with a short title and a body that summarises the change and how it was tested.{pr_attribution}"#,
        max_output = MAX_OUTPUT_LENGTH,
        commit_step = commit_step,
        commit_example = commit_example,
        pr_attribution = pr_attribution,
    )
}
