//! Process enumeration from `/proc` and termination by signal.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use panbridge_core::{PanBridgeError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    pub argv: Vec<String>,
}

/// Splits a NUL-separated `/proc/<pid>/cmdline`.
pub fn parse_cmdline(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}

pub fn list_processes() -> Result<Vec<ProcessInfo>> {
    list_processes_in(Path::new("/proc"))
}

pub fn list_processes_in(root: &Path) -> Result<Vec<ProcessInfo>> {
    let mut processes = Vec::new();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<i32>().ok()) else {
            continue;
        };

        // Processes can exit between readdir and read.
        let Ok(raw) = std::fs::read(entry.path().join("cmdline")) else {
            continue;
        };

        let argv = parse_cmdline(&raw);
        if !argv.is_empty() {
            processes.push(ProcessInfo { pid, argv });
        }
    }

    processes.sort_by_key(|p| p.pid);
    Ok(processes)
}

/// True when `program` is the executable or, for interpreted tools, the
/// script passed to the interpreter.
pub fn runs_program(argv: &[String], program: &str) -> bool {
    let wanted = basename(program);
    argv.iter().take(2).any(|arg| basename(arg) == wanted)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Sends SIGKILL. A process that is already gone is not an error.
pub fn terminate(pid: i32) -> Result<()> {
    match signal::kill(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(PanBridgeError::process(format!("kill pid {pid}"), e)),
    }
}

/// Applies `kill` to every pid. A failure does not stop the remaining pids;
/// the first one is returned once all have been tried.
pub fn terminate_each(
    pids: impl IntoIterator<Item = i32>,
    kill: impl Fn(i32) -> Result<()>,
) -> Result<usize> {
    let mut killed = 0;
    let mut first_error = None;

    for pid in pids {
        match kill(pid) {
            Ok(()) => killed += 1,
            Err(e) => {
                warn!("Could not kill {}: {}", pid, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(killed),
    }
}

/// Kills every process accepted by `matches`, never this process itself.
pub fn kill_where(matches: impl Fn(&ProcessInfo) -> bool) -> Result<usize> {
    let own = std::process::id() as i32;
    let targets: Vec<i32> = list_processes()?
        .into_iter()
        .filter(|p| p.pid != own && matches(p))
        .inspect(|p| debug!("Killing {} ({})", p.pid, p.argv.join(" ")))
        .map(|p| p.pid)
        .collect();

    terminate_each(targets, terminate)
}

async fn blocking<T, F>(operation: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PanBridgeError::process(operation, e))?
}

/// [`list_processes`] on the blocking pool.
pub async fn scan_processes() -> Result<Vec<ProcessInfo>> {
    blocking("list processes", list_processes).await
}

/// [`kill_where`] on the blocking pool, for use from async code.
pub async fn kill_matching<F>(matches: F) -> Result<usize>
where
    F: Fn(&ProcessInfo) -> bool + Send + 'static,
{
    blocking("kill processes", move || kill_where(matches)).await
}

pub async fn kill_program(program: &str) -> Result<usize> {
    let name = program.to_string();
    let killed = kill_matching(move |p| runs_program(&p.argv, &name)).await?;
    if killed > 0 {
        info!("Killed {} stray {} process(es)", killed, program);
    }
    Ok(killed)
}
