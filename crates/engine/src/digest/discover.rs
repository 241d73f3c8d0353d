// SPDX-License-Identifier: MIT

//! Log file discovery.
//!
//! A spawned agent embeds `<session_id>sess_…</session_id>` near the top
//! of its JSONL log. Discovery scans the Claude project directories first
//! (the session's project working directory maps to a directory name by
//! replacing `/` with `-`), then falls back to walking the Codex session
//! tree.

use super::DigestConfig;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Which agent CLI wrote the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Claude,
    Codex,
}

/// Bytes of header scanned for the session marker on the first attempt.
const MARKER_SCAN_BYTES: usize = 256 * 1024;

/// Retry window when the header is one giant session-meta line.
const MARKER_SCAN_RETRY_BYTES: usize = 1024 * 1024;

/// Find the log file for a session id, with its detected source format.
pub(super) fn find_log_file(
    config: &DigestConfig,
    session_id: &str,
    working_dir: Option<&Path>,
) -> Option<(PathBuf, LogSource)> {
    let marker = format!("<session_id>{session_id}</session_id>");

    for dir in candidate_claude_dirs(config, working_dir) {
        if let Some(path) = scan_dir_for_marker(&dir, &marker) {
            return Some((path, LogSource::Claude));
        }
    }

    let mut found = None;
    walk_jsonl(&config.codex_sessions_dir, &mut |path| {
        if found.is_none() && header_contains(path, &marker) {
            found = Some(path.to_path_buf());
        }
    });
    found.map(|path| (path, LogSource::Codex))
}

/// The directory derived from the working dir, then every project dir.
fn candidate_claude_dirs(config: &DigestConfig, working_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(working_dir) = working_dir {
        let munged = working_dir.to_string_lossy().replace(['/', '\\'], "-");
        dirs.push(config.claude_projects_dir.join(munged));
    }
    if let Ok(entries) = std::fs::read_dir(&config.claude_projects_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && !dirs.contains(&path) {
                dirs.push(path);
            }
        }
    }
    dirs
}

fn scan_dir_for_marker(dir: &Path, marker: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") && header_contains(&path, marker) {
            return Some(path);
        }
    }
    None
}

/// Scan the head of a file for the marker, retrying with a bigger window
/// when the first line alone fills the whole first window.
fn header_contains(path: &Path, marker: &str) -> bool {
    let Some(head) = read_head(path, MARKER_SCAN_BYTES) else {
        return false;
    };
    if head.contains(marker) {
        return true;
    }
    let filled_window = head.len() >= MARKER_SCAN_BYTES;
    let single_line = !head.contains('\n');
    if filled_window && single_line {
        if let Some(head) = read_head(path, MARKER_SCAN_RETRY_BYTES) {
            return head.contains(marker);
        }
    }
    false
}

fn read_head(path: &Path, limit: usize) -> Option<String> {
    let mut file = File::open(path).ok()?;
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    loop {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return None,
        }
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);
    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Depth-first walk invoking the callback for every `.jsonl` file.
fn walk_jsonl(root: &Path, visit: &mut impl FnMut(&Path)) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_jsonl(&path, visit);
        } else if path.extension().is_some_and(|ext| ext == "jsonl") {
            visit(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> DigestConfig {
        DigestConfig {
            claude_projects_dir: root.join("claude"),
            codex_sessions_dir: root.join("codex"),
        }
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_log_in_munged_working_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let log = cfg.claude_projects_dir.join("-root-work").join("abc.jsonl");
        write(&log, "{\"type\":\"user\",\"message\":\"<session_id>sess_1</session_id>\"}\n");

        let found = find_log_file(&cfg, "sess_1", Some(Path::new("/root/work"))).unwrap();
        assert_eq!(found.0, log);
        assert_eq!(found.1, LogSource::Claude);
    }

    #[test]
    fn falls_back_to_any_project_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let log = cfg.claude_projects_dir.join("-elsewhere").join("x.jsonl");
        write(&log, "<session_id>sess_2</session_id>\n");

        let found = find_log_file(&cfg, "sess_2", Some(Path::new("/root/work"))).unwrap();
        assert_eq!(found.0, log);
    }

    #[test]
    fn falls_back_to_codex_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let log = cfg.codex_sessions_dir.join("2026").join("07").join("rollout.jsonl");
        write(&log, "{\"type\":\"session_meta\"}\n<session_id>sess_3</session_id>\n");

        let found = find_log_file(&cfg, "sess_3", None).unwrap();
        assert_eq!(found.0, log);
        assert_eq!(found.1, LogSource::Codex);
    }

    #[test]
    fn unknown_session_finds_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        assert!(find_log_file(&cfg, "sess_missing", None).is_none());
    }

    #[test]
    fn non_jsonl_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());
        let log = cfg.claude_projects_dir.join("-p").join("notes.txt");
        write(&log, "<session_id>sess_4</session_id>");
        assert!(find_log_file(&cfg, "sess_4", None).is_none());
    }
}
