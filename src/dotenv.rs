//! `.env` support for the CLI: the `--env-file` flag and a small `KEY=value` reader.
//!
//! Values already present in the process environment are never overridden.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const ENV_FILE_FLAG: &str = "--env-file";

/// Where the environment file came from, for the startup log line.
#[derive(Debug, PartialEq)]
pub struct EnvFileSource {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Pull `--env-file PATH` / `--env-file=PATH` out of the arguments that precede the
/// command. Everything from the first positional argument onwards is returned untouched.
pub fn split_env_flag<I>(args: I) -> Result<(Option<PathBuf>, Vec<String>), String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut env_file: Option<PathBuf> = None;
    let mut command = Vec::new();

    while let Some(raw) = args.next() {
        let arg = raw
            .into_string()
            .map_err(|bad| format!("non UTF-8 argument: {}", bad.to_string_lossy()))?;
        if !command.is_empty() {
            command.push(arg);
            continue;
        }

        let path = if arg == ENV_FILE_FLAG {
            args.next().map(PathBuf::from)
        } else if let Some(inline) = arg.strip_prefix(ENV_FILE_FLAG).and_then(|s| s.strip_prefix('=')) {
            Some(PathBuf::from(inline)).filter(|p| !p.as_os_str().is_empty())
        } else {
            if arg != "--" {
                command.push(arg);
            }
            continue;
        };

        let path = path.ok_or_else(|| format!("{} expects a file path", ENV_FILE_FLAG))?;
        if let Some(previous) = env_file.replace(path) {
            return Err(format!(
                "{} given twice (first was {})",
                ENV_FILE_FLAG,
                previous.display()
            ));
        }
    }

    Ok((env_file, command))
}

/// Load the explicitly named file, or `./.env` if it exists.
pub fn load_for_cli(explicit: Option<PathBuf>) -> Result<Option<EnvFileSource>, String> {
    let source = match explicit {
        Some(path) if path.is_file() => EnvFileSource { path, explicit: true },
        Some(path) => return Err(format!("no such env file: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("cannot resolve working directory: {}", e))?;
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            EnvFileSource { path, explicit: false }
        }
    };
    apply_file(&source.path)?;
    Ok(Some(source))
}

/// Returns how many variables were newly set.
pub fn apply_file(path: &Path) -> Result<usize, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read env file {}: {}", path.display(), e))?;
    let assignments = parse_contents(&contents).map_err(|e| format!("{}: {}", path.display(), e))?;

    let mut applied = 0;
    for (key, value) in assignments {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        // SAFETY: called once from main before any other thread exists.
        unsafe {
            std::env::set_var(&key, value);
        }
        applied += 1;
    }
    Ok(applied)
}

/// Parse a whole file, reporting the first bad line by number.
pub fn parse_contents(contents: &str) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        if let Some(pair) = parse_line(line).map_err(|e| format!("line {}: {}", number + 1, e))? {
            out.push(pair);
        }
    }
    Ok(out)
}

/// `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let line = line.strip_prefix("export ").map_or(line, str::trim_start);

    let Some((key, value)) = line.split_once('=') else {
        return Err(format!("expected KEY=value, got {:?}", line));
    };
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(format!("invalid variable name {:?}", key));
    }
    Ok(Some((key.to_string(), parse_value(value)?)))
}

fn parse_value(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Ok(raw.split('#').next().unwrap_or_default().trim_end().to_string()),
    };

    let body = &raw[1..];
    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((at, c)) = chars.next() {
        if c == '\\' && quote == '"' {
            let (_, escaped) = chars.next().ok_or("value ends in a lone backslash")?;
            value.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
        } else if c == quote {
            let trailing = body[at + 1..].trim();
            if !trailing.is_empty() && !trailing.starts_with('#') {
                return Err(format!("unexpected {:?} after quoted value", trailing));
            }
            return Ok(value);
        } else {
            value.push(c);
        }
    }
    Err(format!("quoted value is missing its closing {}", quote))
}
