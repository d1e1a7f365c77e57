//! Structured compiler diagnostics.
//!
//! Distinct from `util::diagnostic`'s CLI-facing, ANSI-colored presentation
//! type: this one models a single parsed line of compiler stderr/stdout, to
//! be rendered by whatever caller wants it (terminal, JSON, IDE protocol).
//! Parsing is lossy and line-local by design — lines that don't match a
//! known grammar are silently dropped, and multi-line diagnostics are not
//! reassembled.

use std::path::PathBuf;

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Note,
    Warning,
    Error,
    Fatal,
}

/// A single parsed diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
    /// Compiler-specific diagnostic code, e.g. "C4996" or "-Wunused-variable".
    pub code: Option<String>,
}

/// Parse GCC/Clang-style diagnostics: `file:line:col: level: message [code]`.
///
/// Also accepts the `file:line: level: message` form (no column), which
/// both compilers emit for some driver-level diagnostics.
pub fn parse_gcc_clang(output: &str) -> Vec<Diagnostic> {
    output.lines().filter_map(parse_gcc_clang_line).collect()
}

fn parse_gcc_clang_line(line: &str) -> Option<Diagnostic> {
    let line = line.trim_end();

    // Find the level keyword by scanning colon-separated segments after a
    // path-like prefix. GCC/Clang paths may contain ':' on Windows (drive
    // letter), so search from the back for one of the known level words
    // surrounded by colons instead of naively splitting on ':'.
    let levels = [
        (": fatal error: ", Level::Fatal),
        (": error: ", Level::Error),
        (": warning: ", Level::Warning),
        (": note: ", Level::Note),
    ];

    let (marker, level) = levels.iter().find_map(|(marker, level)| {
        line.find(marker).map(|idx| (idx, *level))
    })?;

    let (marker_text, _) = levels.iter().find(|(_, l)| *l == level).unwrap();
    let head = &line[..marker];
    let mut rest = line[marker + marker_text.len()..].to_string();

    let code = extract_trailing_bracket_code(&mut rest);

    let mut parts = head.rsplitn(3, ':');
    let third = parts.next();
    let second = parts.next();
    let first = parts.next();

    let (file, ln, col) = match (first, second, third) {
        (Some(f), Some(l), Some(c)) if l.parse::<u32>().is_ok() && c.parse::<u32>().is_ok() => {
            (Some(PathBuf::from(f)), l.parse().ok(), c.parse().ok())
        }
        (None, Some(f), Some(l)) if l.parse::<u32>().is_ok() => {
            (Some(PathBuf::from(f)), l.parse().ok(), None)
        }
        _ => (None, None, None),
    };

    Some(Diagnostic {
        level,
        file,
        line: ln,
        column: col,
        message: rest.trim().to_string(),
        code,
    })
}

fn extract_trailing_bracket_code(message: &mut String) -> Option<String> {
    let trimmed = message.trim_end();
    if trimmed.ends_with(']') {
        if let Some(open) = trimmed.rfind('[') {
            let code = trimmed[open + 1..trimmed.len() - 1].to_string();
            *message = trimmed[..open].trim_end().to_string();
            return Some(code);
        }
    }
    None
}

/// Parse MSVC-style diagnostics: `file(line[,col]): level code: message`.
pub fn parse_msvc(output: &str) -> Vec<Diagnostic> {
    output.lines().filter_map(parse_msvc_line).collect()
}

fn parse_msvc_line(line: &str) -> Option<Diagnostic> {
    let line = line.trim_end();
    let open = line.find('(')?;
    let close = line[open..].find(')')? + open;
    let file = &line[..open];
    let loc = &line[open + 1..close];

    let (ln, col) = if let Some((l, c)) = loc.split_once(',') {
        (l.trim().parse().ok(), c.trim().parse().ok())
    } else {
        (loc.trim().parse().ok(), None)
    };

    let after = line[close + 1..].trim_start();
    let after = after.strip_prefix(':')?.trim_start();

    let (level, after) = if let Some(r) = after.strip_prefix("fatal error") {
        (Level::Fatal, r)
    } else if let Some(r) = after.strip_prefix("error") {
        (Level::Error, r)
    } else if let Some(r) = after.strip_prefix("warning") {
        (Level::Warning, r)
    } else if let Some(r) = after.strip_prefix("note") {
        (Level::Note, r)
    } else {
        return None;
    };

    let after = after.trim_start();
    let (code, message) = match after.split_once(':') {
        Some((code, msg)) if !code.contains(' ') && !code.is_empty() => {
            (Some(code.trim().to_string()), msg.trim().to_string())
        }
        _ => (None, after.trim_start_matches(':').trim().to_string()),
    };

    Some(Diagnostic {
        level,
        file: Some(PathBuf::from(file)),
        line: ln,
        column: col,
        message,
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gcc_error_with_code() {
        let out = "foo.cpp:12:5: error: 'x' was not declared in this scope";
        let diags = parse_gcc_clang(out);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, Level::Error);
        assert_eq!(diags[0].line, Some(12));
        assert_eq!(diags[0].column, Some(5));
        assert_eq!(diags[0].file, Some(PathBuf::from("foo.cpp")));
    }

    #[test]
    fn test_parse_clang_warning_with_bracket_code() {
        let out = "bar.cpp:3:1: warning: unused variable 'y' [-Wunused-variable]";
        let diags = parse_gcc_clang(out);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, Level::Warning);
        assert_eq!(diags[0].code.as_deref(), Some("-Wunused-variable"));
        assert_eq!(diags[0].message, "unused variable 'y'");
    }

    #[test]
    fn test_parse_gcc_unparsable_line_dropped() {
        let out = "In file included from foo.cpp:1:\nno colon markers here at all";
        assert!(parse_gcc_clang(out).is_empty());
    }

    #[test]
    fn test_parse_msvc_error_with_code() {
        let out = r"foo.cpp(10,3): error C2065: 'x': undeclared identifier";
        let diags = parse_msvc(out);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, Level::Error);
        assert_eq!(diags[0].line, Some(10));
        assert_eq!(diags[0].column, Some(3));
        assert_eq!(diags[0].code.as_deref(), Some("C2065"));
    }

    #[test]
    fn test_parse_msvc_no_column() {
        let out = r"bar.cpp(5): warning C4996: 'foo' deprecated";
        let diags = parse_msvc(out);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(5));
        assert_eq!(diags[0].column, None);
    }

    #[test]
    fn test_parse_mixed_output_multiple_lines() {
        let out = "a.cpp:1:1: warning: foo\nunrelated noise\na.cpp:2:1: error: bar";
        let diags = parse_gcc_clang(out);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[1].level, Level::Error);
    }
}
