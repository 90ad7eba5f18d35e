//! Git output parsing helpers.

use std::process::Output;

use super::types::{FileStatus, GitStatus};

/// Formats a git error with both stdout and stderr for better debugging.
pub fn format_git_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}

/// Extracts ahead/behind counts from git status branch line.
/// Returns `None` when no bracket info is present.
pub fn extract_ahead_behind(line: &str) -> Option<(u32, u32)> {
    let bracket_start = line.find('[')?;
    let bracket_end = line.find(']')?;
    if bracket_end <= bracket_start {
        return None;
    }

    let info = &line[bracket_start + 1..bracket_end];
    let mut ahead = 0;
    let mut behind = 0;

    for part in info.split(',') {
        let part = part.trim();
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.parse().unwrap_or(0);
        }
    }

    Some((ahead, behind))
}

/// Extracts the branch name from a `## branch...upstream [..]` header line.
fn extract_branch(line: &str) -> Option<String> {
    // "## No commits yet on main" on a fresh repository
    if let Some(name) = line.strip_prefix("## No commits yet on ") {
        return Some(name.trim().to_string());
    }

    let rest = line.strip_prefix("## ")?;
    let rest = rest.split(' ').next().unwrap_or(rest);
    let name = rest.split("...").next().unwrap_or(rest);

    if name.is_empty() || name == "HEAD" {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parses `git status --porcelain -b` output.
pub fn parse_status(text: &str) -> GitStatus {
    let mut status = GitStatus::default();

    for line in text.lines() {
        if line.starts_with("##") {
            status.branch = extract_branch(line);
            if let Some((ahead, behind)) = extract_ahead_behind(line) {
                status.ahead = ahead;
                status.behind = behind;
            }
            continue;
        }

        if line.len() < 3 {
            continue;
        }

        let index_status = line.chars().next().unwrap_or(' ');
        let worktree_status = line.chars().nth(1).unwrap_or(' ');
        let file_path = line[3..].trim();

        // Renamed files: "R  old -> new"
        let path = file_path
            .split(" -> ")
            .last()
            .unwrap_or(file_path)
            .trim_matches('"')
            .to_string();

        if line.starts_with("??") {
            status.files.push(FileStatus {
                path,
                status: '?',
                staged: false,
            });
            continue;
        }

        let (code, staged) = if worktree_status == 'D' {
            ('D', false)
        } else if index_status != ' ' && index_status != '?' {
            (index_status, true)
        } else if worktree_status != ' ' {
            (worktree_status, false)
        } else {
            continue;
        };

        status.files.push(FileStatus {
            path,
            status: code,
            staged,
        });
    }

    status.is_clean = status.files.is_empty();
    status
}

/// Counts changed files from git pull output.
pub fn count_changed_files(output: &str) -> u32 {
    // "X files changed, Y insertions(+)" / "1 file changed"
    for line in output.lines() {
        if line.contains("file") && line.contains("changed") {
            for word in line.split_whitespace() {
                if let Ok(n) = word.parse::<u32>() {
                    return n;
                }
            }
        }
    }
    0
}

/// Replaces any userinfo in a URL so it can be logged.
pub fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let authority_end = rest.find('/').unwrap_or(rest.len());
            match rest[..authority_end].rfind('@') {
                Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
                None => url.to_string(),
            }
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ahead_behind() {
        assert_eq!(
            extract_ahead_behind("## main...origin/main [ahead 2]"),
            Some((2, 0))
        );
        assert_eq!(
            extract_ahead_behind("## main...origin/main [ahead 1, behind 2]"),
            Some((1, 2))
        );
        assert_eq!(extract_ahead_behind("## main"), None);
    }

    #[test]
    fn test_parse_status_clean() {
        let status = parse_status("## main...origin/main\n");
        assert!(status.is_clean);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert!(status.files.is_empty());
    }

    #[test]
    fn test_parse_status_mixed() {
        let text = "## feature...origin/feature [behind 3]\n M ongoku.yaml\nA  goku_schema/users.yml\n?? notes.txt\nR  old.yml -> goku_schema/new.yml\n D gone.txt\n";
        let status = parse_status(text);

        assert!(!status.is_clean);
        assert_eq!(status.branch.as_deref(), Some("feature"));
        assert_eq!(status.behind, 3);
        assert_eq!(
            status.changed_paths(),
            vec![
                "ongoku.yaml",
                "goku_schema/users.yml",
                "notes.txt",
                "goku_schema/new.yml",
                "gone.txt"
            ]
        );
        assert_eq!(status.files[0].status, 'M');
        assert!(!status.files[0].staged);
        assert!(status.files[1].staged);
        assert_eq!(status.files[2].status, '?');
        assert_eq!(status.files[4].status, 'D');
    }

    #[test]
    fn test_parse_status_fresh_repository() {
        let status = parse_status("## No commits yet on main\n");
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert!(status.is_clean);
    }

    #[test]
    fn test_count_changed_files() {
        assert_eq!(count_changed_files("3 files changed, 10 insertions(+)"), 3);
        assert_eq!(count_changed_files(" 1 file changed, 1 insertion(+)"), 1);
        assert_eq!(count_changed_files("Already up to date."), 0);
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://s3cr3t@git.example.com/org/proj.git"),
            "https://***@git.example.com/org/proj.git"
        );
        assert_eq!(
            redact_url("https://git.example.com/org/proj.git"),
            "https://git.example.com/org/proj.git"
        );
        assert_eq!(redact_url("git@host:org/proj.git"), "git@host:org/proj.git");
    }

    #[cfg(unix)]
    mod unix_tests {
        use super::*;
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        fn make_output(status_code: i32, stdout: &[u8], stderr: &[u8]) -> Output {
            Output {
                status: ExitStatus::from_raw(status_code << 8),
                stdout: stdout.to_vec(),
                stderr: stderr.to_vec(),
            }
        }

        #[test]
        fn test_format_git_error_empty_output() {
            let output = make_output(1, b"", b"");
            assert_eq!(format_git_error(&output), "Command failed with exit code 1");
        }

        #[test]
        fn test_format_git_error_both() {
            let output = make_output(1, b"some output", b"some error");
            assert_eq!(format_git_error(&output), "some error\nsome output");
        }
    }
}
