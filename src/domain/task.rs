// ============================================================
// Layer 3 — Launcher Task Types
// ============================================================
// A launcher job is a text file with one shell command per line:
//
//   # gpucommandlines
//   flow-matching-2d train --lr 0.001 --hidden-dim 256
//   flow-matching-2d train --lr 0.0005 --hidden-dim 512
//   flow-matching-2d smoke --job-id 3
//
// Each non-empty, non-comment line becomes one LaunchTask.
// Task ids are 0-based in file order and are exported to the
// child process as LAUNCHER_TSK_ID.
//
// Reference: Rust Book §6 (Enums), §9 (Error Handling)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

// ─── LaunchTask ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTask {
    pub id:      usize,
    pub command: String,
}

/// Parse a command-lines file into tasks.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_command_lines(text: &str) -> Vec<LaunchTask> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .enumerate()
        .map(|(id, command)| LaunchTask { id, command: command.to_string() })
        .collect()
}

// ─── DebugFlags ───────────────────────────────────────────────────────────────
/// Which categories of launcher events get logged.
/// Parsed from a `+`-separated list such as `host+job`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugFlags {
    /// Slot allocation per task
    pub host: bool,
    /// Exact command lines as executed
    pub exec: bool,
    /// Per-task start / finish
    pub task: bool,
    /// Job start / finish summary
    pub job:  bool,
    /// Remote shell details (single node: accepted, nothing to log)
    pub ssh:  bool,
}

impl FromStr for DebugFlags {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut flags = DebugFlags::default();
        for word in s.split('+').map(str::trim).filter(|w| !w.is_empty()) {
            match word {
                "host" => flags.host = true,
                "exec" => flags.exec = true,
                "task" => flags.task = true,
                "job"  => flags.job  = true,
                "ssh"  => flags.ssh  = true,
                other  => bail!(
                    "Unknown debug flag '{other}' (expected host, exec, task, job or ssh)"
                ),
            }
        }
        Ok(flags)
    }
}

impl fmt::Display for DebugFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = [
            (self.host, "host"),
            (self.exec, "exec"),
            (self.task, "task"),
            (self.job,  "job"),
            (self.ssh,  "ssh"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, w)| *w)
        .collect();
        write!(f, "{}", words.join("+"))
    }
}

// ─── TaskOutcome ──────────────────────────────────────────────────────────────
/// What happened to one task after it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id:   usize,
    /// GPU slot the task ran on
    pub slot:      usize,
    /// None when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub elapsed:   Duration,
}

impl TaskOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let text  = "# header\n\necho a\n   \n  echo b  \n#echo c\n";
        let tasks = parse_command_lines(text);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], LaunchTask { id: 0, command: "echo a".into() });
        assert_eq!(tasks[1], LaunchTask { id: 1, command: "echo b".into() });
    }

    #[test]
    fn test_debug_flags_parse() {
        let f: DebugFlags = "host+job".parse().unwrap();
        assert!(f.host && f.job);
        assert!(!f.exec && !f.task && !f.ssh);
        assert_eq!(f.to_string(), "host+job");
    }

    #[test]
    fn test_debug_flags_empty_and_unknown() {
        assert_eq!("".parse::<DebugFlags>().unwrap(), DebugFlags::default());
        assert!("host+verbose".parse::<DebugFlags>().is_err());
    }

    #[test]
    fn test_outcome_success() {
        let ok = TaskOutcome { task_id: 0, slot: 1, exit_code: Some(0), elapsed: Duration::ZERO };
        let killed = TaskOutcome { exit_code: None, ..ok.clone() };
        assert!(ok.success());
        assert!(!killed.success());
    }
}
