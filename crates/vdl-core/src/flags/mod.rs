//! Launcher flags, parsed gflags-style out of the full argument vector.
//!
//! Only the launcher's own flags are interpreted here. Everything else belongs to the
//! subordinate binaries and is left for the flag forwarder.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use vdl_observe::{LoggerFormat, Verbosity};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("invalid value {value:?} for --{flag}: {reason}")]
    InvalidValue {
        flag: &'static str,
        value: String,
        reason: String,
    },
    #[error("missing value for --{0}")]
    MissingValue(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Value,
}

struct FlagDef {
    name: &'static str,
    kind: Kind,
    /// Not understood by the assembler or runner; never forwarded.
    launcher_only: bool,
    help: &'static str,
}

const FLAGS: &[FlagDef] = &[
    FlagDef {
        name: "run_file_discovery",
        kind: Kind::Bool,
        launcher_only: true,
        help: "Whether to run file discovery or get input files from stdin.",
    },
    FlagDef {
        name: "num_instances",
        kind: Kind::Value,
        launcher_only: false,
        help: "Number of device instances to launch.",
    },
    FlagDef {
        name: "base_instance_num",
        kind: Kind::Value,
        launcher_only: false,
        help: "Instance number of the first device. With --num_instances=N, N numbers \
               are claimed starting here.",
    },
    FlagDef {
        name: "instance_nums",
        kind: Kind::Value,
        launcher_only: false,
        help: "Comma-separated list of instance numbers to use. Mutually exclusive \
               with --base_instance_num.",
    },
    FlagDef {
        name: "report_anonymous_usage_stats",
        kind: Kind::Value,
        launcher_only: false,
        help: "Report anonymous usage statistics (y/n). Asks when empty.",
    },
    FlagDef {
        name: "verbosity",
        kind: Kind::Value,
        launcher_only: false,
        help: "Console logging verbosity: VERBOSE, DEBUG, INFO, WARNING, ERROR.",
    },
    FlagDef {
        name: "file_verbosity",
        kind: Kind::Value,
        launcher_only: false,
        help: "Log file verbosity: VERBOSE, DEBUG, INFO, WARNING, ERROR.",
    },
    FlagDef {
        name: "log_format",
        kind: Kind::Value,
        launcher_only: true,
        help: "Launcher log format: text, json or journald.",
    },
    FlagDef {
        name: "use_overlay",
        kind: Kind::Bool,
        launcher_only: false,
        help: "Capture disk writes in an overlay. Required for multiple instances.",
    },
    FlagDef {
        name: "share_sched_core",
        kind: Kind::Bool,
        launcher_only: true,
        help: "Enable sharing cores between device processes.",
    },
    FlagDef {
        name: "track_host_tools_crc",
        kind: Kind::Bool,
        launcher_only: true,
        help: "Track changes to host executables.",
    },
    FlagDef {
        name: "system_image_dir",
        kind: Kind::Value,
        launcher_only: true,
        help: "Directory holding the system images.",
    },
    FlagDef {
        name: "launcher_log",
        kind: Kind::Value,
        launcher_only: true,
        help: "Also write the launcher's own log to this file (at --file_verbosity).",
    },
    FlagDef {
        name: "help",
        kind: Kind::Bool,
        launcher_only: true,
        help: "Show this help.",
    },
];

fn lookup(name: &str) -> Option<&'static FlagDef> {
    FLAGS.iter().find(|def| def.name == name)
}

/// Parsed launcher flags.
///
/// Instance-number flags stay `None` unless given so conflicting forms can be detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchFlags {
    pub run_file_discovery: bool,
    pub num_instances: Option<i64>,
    pub base_instance_num: Option<i64>,
    pub instance_nums: Option<String>,
    pub report_anonymous_usage_stats: String,
    pub verbosity: Verbosity,
    pub file_verbosity: Verbosity,
    pub log_format: LoggerFormat,
    pub use_overlay: bool,
    pub share_sched_core: bool,
    pub track_host_tools_crc: bool,
    pub system_image_dir: Option<String>,
    pub launcher_log: Option<PathBuf>,
    pub help: bool,
}

impl Default for LaunchFlags {
    fn default() -> Self {
        Self {
            run_file_discovery: true,
            num_instances: None,
            base_instance_num: None,
            instance_nums: None,
            report_anonymous_usage_stats: String::new(),
            verbosity: Verbosity::Info,
            file_verbosity: Verbosity::Debug,
            log_format: LoggerFormat::Text,
            use_overlay: true,
            share_sched_core: false,
            track_host_tools_crc: false,
            system_image_dir: None,
            launcher_log: None,
            help: false,
        }
    }
}

impl LaunchFlags {
    /// Parse launcher flags; unknown flags and positional tokens are skipped.
    ///
    /// Accepts `-name=value`, `--name=value`, `-name value`, and for booleans the bare
    /// `-name` / `-noname` forms. A lone `--` ends flag parsing. Later occurrences win.
    pub fn parse(args: &[String]) -> Result<Self, FlagError> {
        let mut flags = LaunchFlags::default();
        let mut iter = args.iter();

        while let Some(token) = iter.next() {
            if token == "--" {
                break;
            }
            let Some(body) = strip_dashes(token) else {
                continue;
            };
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };

            if let Some(def) = lookup(name) {
                match def.kind {
                    Kind::Bool => {
                        let value = match inline {
                            Some(raw) => parse_bool(def.name, raw)?,
                            None => true,
                        };
                        flags.set_bool(def.name, value);
                    }
                    Kind::Value => {
                        let raw = match inline {
                            Some(raw) => raw,
                            None => iter
                                .next()
                                .map(String::as_str)
                                .ok_or(FlagError::MissingValue(def.name))?,
                        };
                        flags.set_value(def.name, raw)?;
                    }
                }
                continue;
            }

            if inline.is_none()
                && let Some(def) = name
                    .strip_prefix("no")
                    .and_then(lookup)
                    .filter(|def| def.kind == Kind::Bool)
            {
                flags.set_bool(def.name, false);
            }
        }

        Ok(flags)
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        match name {
            "run_file_discovery" => self.run_file_discovery = value,
            "use_overlay" => self.use_overlay = value,
            "share_sched_core" => self.share_sched_core = value,
            "track_host_tools_crc" => self.track_host_tools_crc = value,
            "help" => self.help = value,
            _ => {}
        }
    }

    fn set_value(&mut self, name: &'static str, raw: &str) -> Result<(), FlagError> {
        match name {
            "num_instances" => self.num_instances = Some(parse_from_str(name, raw)?),
            "base_instance_num" => self.base_instance_num = Some(parse_from_str(name, raw)?),
            "instance_nums" => self.instance_nums = Some(raw.to_string()),
            "report_anonymous_usage_stats" => {
                self.report_anonymous_usage_stats = raw.to_string()
            }
            "verbosity" => self.verbosity = parse_from_str(name, raw)?,
            "file_verbosity" => self.file_verbosity = parse_from_str(name, raw)?,
            "log_format" => self.log_format = parse_from_str(name, raw)?,
            "system_image_dir" => {
                self.system_image_dir = Some(raw.to_string()).filter(|s| !s.is_empty())
            }
            "launcher_log" => {
                self.launcher_log = Some(PathBuf::from(raw)).filter(|p| !p.as_os_str().is_empty())
            }
            _ => {}
        }
        Ok(())
    }

    /// Usage text listing the launcher's own flags.
    pub fn usage() -> String {
        let defaults = LaunchFlags::default();
        let mut out = String::from(
            "Launch one or more virtual devices.\n\n\
             Flags not listed here are forwarded to the assembler and runners.\n\n",
        );
        for def in FLAGS {
            let default = defaults.default_repr(def.name);
            out.push_str(&format!("  -{}  {}", def.name, def.help));
            if !default.is_empty() {
                out.push_str(&format!(" (default: {default})"));
            }
            out.push('\n');
        }
        out
    }

    fn default_repr(&self, name: &str) -> String {
        match name {
            "run_file_discovery" => self.run_file_discovery.to_string(),
            "use_overlay" => self.use_overlay.to_string(),
            "share_sched_core" => self.share_sched_core.to_string(),
            "track_host_tools_crc" => self.track_host_tools_crc.to_string(),
            "verbosity" => self.verbosity.to_string(),
            "file_verbosity" => self.file_verbosity.to_string(),
            "log_format" => self.log_format.to_string(),
            _ => String::new(),
        }
    }
}

/// Replace every occurrence of `--name` in `args` with a single `--name=value`.
///
/// Appends the flag when absent. Used to forward a value the launcher decided on.
pub fn set_flag(args: &mut Vec<String>, name: &str, value: &str) {
    let explicit = format!("--{name}={value}");
    let mut out = Vec::with_capacity(args.len() + 1);
    let mut placed = false;
    let mut iter = args.drain(..);

    while let Some(token) = iter.next() {
        if token == "--" {
            out.push(token);
            out.extend(iter.by_ref());
            break;
        }
        let matched = match strip_dashes(&token) {
            Some(body) if body == name => {
                // Separated form: the next token is the old value.
                if lookup(name).is_some_and(|def| def.kind == Kind::Value) {
                    iter.next();
                }
                true
            }
            Some(body) => body
                .split_once('=')
                .is_some_and(|(flag, _)| flag == name),
            None => false,
        };
        if matched {
            if !placed {
                out.push(explicit.clone());
                placed = true;
            }
        } else {
            out.push(token);
        }
    }
    drop(iter);

    if !placed {
        let at = out.iter().position(|t| t == "--").unwrap_or(out.len());
        out.insert(at, explicit);
    }
    *args = out;
}

/// Drop every flag only the launcher understands, including a separated value.
///
/// Whatever follows a lone `--` is kept untouched.
pub fn strip_launcher_flags(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(token) = iter.next() {
        if token == "--" {
            out.push(token.clone());
            out.extend(iter.by_ref().cloned());
            break;
        }
        let Some(body) = strip_dashes(token) else {
            out.push(token.clone());
            continue;
        };
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let def = lookup(name).or_else(|| {
            name.strip_prefix("no")
                .and_then(lookup)
                .filter(|def| def.kind == Kind::Bool && inline.is_none())
        });
        match def {
            Some(def) if def.launcher_only => {
                if def.kind == Kind::Value && inline.is_none() {
                    iter.next();
                }
            }
            _ => out.push(token.clone()),
        }
    }
    out
}

fn strip_dashes(token: &str) -> Option<&str> {
    let body = token.strip_prefix('-')?;
    let body = body.strip_prefix('-').unwrap_or(body);
    (!body.is_empty()).then_some(body)
}

fn parse_bool(flag: &'static str, raw: &str) -> Result<bool, FlagError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => Err(FlagError::InvalidValue {
            flag,
            value: raw.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_from_str<T>(flag: &'static str, raw: &str) -> Result<T, FlagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| FlagError::InvalidValue {
        flag,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
