//! Progress reporting shared by the seo-brief engine and its front ends.
//!
//! Two channels exist side by side:
//!
//! - [`BriefLog`] structured events, serialized as JSON lines on stderr with
//!   the [`EVENT_PREFIX`] so a UI process can follow a run;
//! - colored console macros (`log_info!`, `log_warning!`, ...) for humans
//!   running the CLI.
//!
//! [`ActivityLog`] collects the timestamped, human-readable lines an
//! analysis run produces for every external fetch.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

static EVENTS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn structured event output on stderr on or off for this process.
pub fn set_event_output(enabled: bool) {
    EVENTS_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn event_output_enabled() -> bool {
    EVENTS_ENABLED.load(Ordering::Relaxed)
}

/// Structured events emitted while a brief is being built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BriefLog {
    /// Phase started (analysis, one brief step, article generation)
    PhaseStarted {
        phase: usize,
        name: String,
        total_phases: usize,
    },
    PhaseCompleted {
        phase: usize,
        name: String,
    },
    PhaseFailed {
        phase: usize,
        name: String,
        error: String,
    },
    /// Task started (one keyword fetch, one page fetch, one section)
    TaskStarted {
        phase: usize,
        task_id: String,
        description: String,
        total_tasks: Option<usize>,
    },
    TaskProgress {
        task_id: String,
        message: String,
    },
    TaskCompleted {
        task_id: String,
        result: Option<String>,
    },
    TaskFailed {
        task_id: String,
        error: String,
    },
    /// A model call started
    AgentStarted {
        task_id: String,
        agent_name: String,
        description: String,
    },
    /// Streaming text from a model call
    AgentMessage {
        task_id: String,
        agent_name: String,
        message: String,
    },
    AgentCompleted {
        task_id: String,
        agent_name: String,
        result: Option<String>,
    },
    AgentFailed {
        task_id: String,
        agent_name: String,
        error: String,
    },
    /// Session state written to the store
    StateSaved {
        brief_id: String,
        description: String,
    },
    /// Human-readable activity line
    Activity {
        timestamp: DateTime<Local>,
        message: String,
    },
}

impl BriefLog {
    /// Emit this event to stderr when event output is enabled
    pub fn emit(&self) {
        if !event_output_enabled() {
            return;
        }
        match serde_json::to_string(self) {
            Ok(json) => {
                let mut err = std::io::stderr().lock();
                let _ = writeln!(err, "{}{}", EVENT_PREFIX, json);
                let _ = err.flush();
            }
            Err(e) => eprintln!("unserializable brief event: {}", e),
        }
    }

    pub fn phase(phase: usize, name: impl fmt::Display, total_phases: usize) -> Self {
        Self::PhaseStarted {
            phase,
            name: name.to_string(),
            total_phases,
        }
    }

    pub fn task(
        phase: usize,
        task_id: impl fmt::Display,
        description: impl fmt::Display,
        total_tasks: Option<usize>,
    ) -> Self {
        Self::TaskStarted {
            phase,
            task_id: task_id.to_string(),
            description: description.to_string(),
            total_tasks,
        }
    }

    pub fn agent(task_id: impl fmt::Display, agent_name: impl fmt::Display, description: impl fmt::Display) -> Self {
        Self::AgentStarted {
            task_id: task_id.to_string(),
            agent_name: agent_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Prefix marking an event line on stderr
pub const EVENT_PREFIX: &str = "__BRIEF_EVENT__:";

// Event macros. Every argument only needs `Display`.

#[macro_export]
macro_rules! log_phase_start {
    ($phase:expr, $name:expr, $total:expr) => {
        $crate::BriefLog::phase($phase, $name, $total).emit()
    };
}

#[macro_export]
macro_rules! log_phase_complete {
    ($phase:expr, $name:expr) => {
        $crate::BriefLog::PhaseCompleted { phase: $phase, name: format!("{}", $name) }.emit()
    };
}

#[macro_export]
macro_rules! log_phase_failed {
    ($phase:expr, $name:expr, $error:expr) => {
        $crate::BriefLog::PhaseFailed {
            phase: $phase,
            name: format!("{}", $name),
            error: format!("{}", $error),
        }
        .emit()
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($phase:expr, $task_id:expr, $desc:expr) => {
        $crate::BriefLog::task($phase, $task_id, $desc, None).emit()
    };
    ($phase:expr, $task_id:expr, $desc:expr, $total:expr) => {
        $crate::BriefLog::task($phase, $task_id, $desc, Some($total)).emit()
    };
}

#[macro_export]
macro_rules! log_task_progress {
    ($task_id:expr, $msg:expr) => {
        $crate::BriefLog::TaskProgress { task_id: format!("{}", $task_id), message: format!("{}", $msg) }.emit()
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        $crate::BriefLog::TaskCompleted { task_id: format!("{}", $task_id), result: None }.emit()
    };
    ($task_id:expr, $result:expr) => {
        $crate::BriefLog::TaskCompleted {
            task_id: format!("{}", $task_id),
            result: Some(format!("{}", $result)),
        }
        .emit()
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        $crate::BriefLog::TaskFailed { task_id: format!("{}", $task_id), error: format!("{}", $error) }.emit()
    };
}

#[macro_export]
macro_rules! log_agent_start {
    ($task_id:expr, $agent:expr, $desc:expr) => {
        $crate::BriefLog::agent($task_id, $agent, $desc).emit()
    };
}

#[macro_export]
macro_rules! log_agent_message {
    ($task_id:expr, $agent:expr, $msg:expr) => {
        $crate::BriefLog::AgentMessage {
            task_id: format!("{}", $task_id),
            agent_name: format!("{}", $agent),
            message: format!("{}", $msg),
        }
        .emit()
    };
}

#[macro_export]
macro_rules! log_agent_complete {
    ($task_id:expr, $agent:expr) => {
        $crate::BriefLog::AgentCompleted {
            task_id: format!("{}", $task_id),
            agent_name: format!("{}", $agent),
            result: None,
        }
        .emit()
    };
}

#[macro_export]
macro_rules! log_agent_failed {
    ($task_id:expr, $agent:expr, $error:expr) => {
        $crate::BriefLog::AgentFailed {
            task_id: format!("{}", $task_id),
            agent_name: format!("{}", $agent),
            error: format!("{}", $error),
        }
        .emit()
    };
}

#[macro_export]
macro_rules! log_state_saved {
    ($brief_id:expr, $desc:expr) => {
        $crate::BriefLog::StateSaved { brief_id: format!("{}", $brief_id), description: format!("{}", $desc) }.emit()
    };
}

// ============================================================================
// Activity log
// ============================================================================

/// One timestamped activity line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Collects activity lines for one run and fans them out to live subscribers.
#[derive(Debug)]
pub struct ActivityLog {
    lines: Vec<LogLine>,
    sender: broadcast::Sender<LogLine>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            lines: Vec::new(),
            sender,
        }
    }

    /// Receive every line pushed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.sender.subscribe()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let line = LogLine {
            timestamp: Local::now(),
            message: message.into(),
        };
        BriefLog::Activity {
            timestamp: line.timestamp,
            message: line.message.clone(),
        }
        .emit();
        // No receivers is fine.
        let _ = self.sender.send(line.clone());
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ============================================================================
// Console output
// ============================================================================

/// Banner for a CLI stage.
///
/// # Example
/// ```
/// use seo_brief_sdk::log_phase_start_console;
/// log_phase_start_console!(0, "Competitor Analysis", "4 keywords in United States");
/// ```
#[macro_export]
macro_rules! log_phase_start_console {
    ($phase:expr, $title:expr, $description:expr) => {{
        println!("\x1b[1;36m── [{}] {} ──\x1b[0m", $phase, $title);
        println!("\x1b[2m{}\x1b[0m", $description);
    }};
}

#[macro_export]
macro_rules! log_phase_complete_console {
    ($phase:expr) => {
        println!("\x1b[32m✓ [{}] done\x1b[0m", $phase)
    };
}

/// `3/7 brief steps`
///
/// # Example
/// ```
/// use seo_brief_sdk::log_progress;
/// log_progress!(3, 7, "brief steps");
/// ```
#[macro_export]
macro_rules! log_progress {
    ($current:expr, $total:expr, $item_type:expr) => {
        println!("\x1b[36m  {}/{} {}\x1b[0m", $current, $total, $item_type)
    };
}

#[macro_export]
macro_rules! log_found {
    ($count:expr, $item_type:expr) => {
        println!("\x1b[36m  {} {}\x1b[0m", $count, $item_type)
    };
}

/// Informational line. Takes a single value or a format string.
///
/// # Example
/// ```
/// use seo_brief_sdk::log_info;
/// log_info!("Session {}", "abc");
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::log_info!(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m! {}\x1b[0m", $message)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::log_warning!(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ wrote {}\x1b[0m", $path)
    };
}
