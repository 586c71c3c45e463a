//! Interactive consent for anonymous usage statistics.

use std::io::{self, BufRead, Read, Write};

use vdl_model::{Answer, PersistedConfig};

const RULE: &str = "===================================================================";

/// Decide the usage-statistics answer, asking on `input` when undecided.
///
/// An empty `raw` reuses the previous run's recorded answer. Returns `"y"` or `"n"`;
/// end of input counts as `"n"`.
pub fn confirm_metrics<R, W>(
    raw: &str,
    previous: Option<&PersistedConfig>,
    input: &mut R,
    out: &mut W,
) -> io::Result<&'static str>
where
    R: BufRead,
    W: Write,
{
    let mut raw = raw.trim();
    if raw.is_empty() {
        raw = match previous.map(|p| p.enable_metrics) {
            Some(Answer::Yes) => "y",
            Some(Answer::No) => "n",
            _ => "",
        };
    }

    writeln!(out, "{RULE}")?;
    writeln!(out, "NOTICE:\n")?;
    write!(
        out,
        "Usage of this virtual device is subject to the platform's terms of service\n\
         and privacy policy."
    )?;

    let mut ch = raw.chars().next().map(|c| c.to_ascii_lowercase());
    if ch != Some('n') {
        if raw.is_empty() {
            write!(
                out,
                "\n{RULE}\n\
                 Automatically send diagnostic information, such as crash reports and\n\
                 usage data, from this virtual device? You can change this at any time\n\
                 with \"-report_anonymous_usage_stats=n\". (Y/n)?:"
            )?;
        } else {
            write!(
                out,
                " You can stop sending diagnostic information at any time\n\
                 with \"-report_anonymous_usage_stats=n\".\n{RULE}\n\n"
            )?;
        }
    } else {
        write!(out, "\n{RULE}\n\n")?;
    }
    out.flush()?;

    loop {
        match ch {
            Some('\0' | '\r' | '\n' | 'y') => return Ok("y"),
            Some('n') => return Ok("n"),
            Some(_) => {
                write!(
                    out,
                    "Must accept/reject anonymous usage statistics reporting (Y/n): "
                )?;
                out.flush()?;
                ch = Some(read_char(input, out)?);
            }
            None => ch = Some(read_char(input, out)?),
        }
    }
}

fn read_char<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<char> {
    let mut byte = [0u8; 1];
    match input.read(&mut byte)? {
        0 => {
            // No tty: echo the implied answer so the transcript reads consistently.
            writeln!(out, "n")?;
            Ok('n')
        }
        _ => Ok(char::from(byte[0]).to_ascii_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(raw: &str, previous: Option<&PersistedConfig>, typed: &str) -> (&'static str, String) {
        let mut input = Cursor::new(typed.as_bytes().to_vec());
        let mut out = Vec::new();
        let answer = confirm_metrics(raw, previous, &mut input, &mut out).unwrap();
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn explicit_flag_needs_no_input() {
        assert_eq!(ask("y", None, "").0, "y");
        assert_eq!(ask("No", None, "").0, "n");
        assert_eq!(ask("YES", None, "").0, "y");
    }

    #[test]
    fn previous_answer_is_reused() {
        let previous = PersistedConfig {
            enable_metrics: Answer::No,
            ..Default::default()
        };
        let (answer, out) = ask("", Some(&previous), "");
        assert_eq!(answer, "n");
        assert!(!out.contains("(Y/n)?"));
    }

    #[test]
    fn prompts_when_undecided() {
        let (answer, out) = ask("", None, "y\n");
        assert_eq!(answer, "y");
        assert!(out.contains("(Y/n)?:"));
    }

    #[test]
    fn enter_accepts() {
        assert_eq!(ask("", None, "\n").0, "y");
    }

    #[test]
    fn end_of_input_declines() {
        let (answer, out) = ask("", None, "");
        assert_eq!(answer, "n");
        assert!(out.ends_with("n\n"));
    }

    #[test]
    fn garbage_reprompts_until_decided() {
        let (answer, out) = ask("maybe", None, "qN");
        assert_eq!(answer, "n");
        assert_eq!(out.matches("Must accept/reject").count(), 2);
    }
}
