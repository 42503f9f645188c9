// Interactive session mirroring the admin page controls

use crate::api::ConsultationApi;
use crate::console::{ActionOutcome, Console, PromptConfirm};
use crate::filter::DayBucket;
use crate::view::render_table;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use eyre::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  refresh                  fetch consultations from the server
  day <today|yesterday|none>
  from <YYYY-MM-DD|clear>
  to <YYYY-MM-DD|clear>
  apply                    apply the selected filters
  show                     print the current list
  export [PATH]            write the current list to a spreadsheet
  delete <ID>              delete a consultation
  help
  quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Refresh,
    Day(DayBucket),
    From(Option<NaiveDate>),
    To(Option<NaiveDate>),
    Apply,
    Show,
    Export(Option<PathBuf>),
    Delete(String),
    Help,
    Quit,
}

fn parse_date_arg(arg: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match arg {
        None => Err("expected a date (YYYY-MM-DD) or 'clear'".to_string()),
        Some("clear") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s)),
    }
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "refresh" | "r" => ShellCommand::Refresh,
            "day" => match arg {
                Some(bucket) => ShellCommand::Day(bucket.parse().unwrap_or_default()),
                None => return Err("expected 'today', 'yesterday' or 'none'".to_string()),
            },
            "from" => ShellCommand::From(parse_date_arg(arg)?),
            "to" => ShellCommand::To(parse_date_arg(arg)?),
            "apply" | "filter" => ShellCommand::Apply,
            "show" | "ls" => ShellCommand::Show,
            "export" => ShellCommand::Export(arg.map(PathBuf::from)),
            "delete" | "rm" => match arg {
                Some(id) => ShellCommand::Delete(id.to_string()),
                None => return Err("expected a record id".to_string()),
            },
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(Some(command))
    }
}

/// Interactive loop over `input`, writing results to `output`.
///
/// `clock` supplies "now" for each filter evaluation.
pub fn run<A, R, W, Tz, C>(
    console: &mut Console<A>,
    mut input: R,
    mut output: W,
    default_output: PathBuf,
    clock: C,
) -> Result<()>
where
    A: ConsultationApi,
    R: BufRead,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    C: Fn() -> DateTime<Tz>,
{
    writeln!(output, "{} consultations loaded. Type 'help' for commands.", console.store().all().len())?;

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(output, "{}", msg)?;
                continue;
            }
        };

        match command {
            ShellCommand::Refresh => match console.refresh() {
                ActionOutcome::Done => writeln!(output, "{} consultations loaded", console.store().all().len())?,
                _ => writeln!(output, "Refresh failed, showing previous data")?,
            },
            ShellCommand::Day(bucket) => console.criteria_mut().day_bucket = bucket,
            ShellCommand::From(date) => console.criteria_mut().from_date = date,
            ShellCommand::To(date) => console.criteria_mut().to_date = date,
            ShellCommand::Apply => {
                let count = console.apply_filters(&clock());
                writeln!(output, "{} of {} consultations match", count, console.store().all().len())?;
            }
            ShellCommand::Show => {
                let tz = clock().timezone();
                write!(output, "{}", render_table(console.store().filtered(), console.formats(), &tz))?;
            }
            ShellCommand::Export(path) => {
                let path = path.unwrap_or_else(|| default_output.clone());
                let tz = clock().timezone();
                match console.export(&path, &tz) {
                    Ok(rows) => writeln!(output, "Wrote {} rows to {}", rows, path.display())?,
                    Err(e) => writeln!(output, "Export failed: {:#}", e)?,
                }
            }
            ShellCommand::Delete(id) => {
                let outcome = {
                    let mut confirm = PromptConfirm::new(&mut input, &mut output);
                    console.delete(&id, &mut confirm)
                };
                match outcome {
                    ActionOutcome::Done => writeln!(output, "Deleted {}", id)?,
                    ActionOutcome::Cancelled => writeln!(output, "Cancelled")?,
                    ActionOutcome::Failed => writeln!(output, "Delete failed")?,
                }
            }
            ShellCommand::Help => write!(output, "{}", HELP)?,
            ShellCommand::Quit => break,
        }
    }

    Ok(())
}

/// Wall clock in the system time zone
pub fn local_clock() -> DateTime<Local> {
    Local::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::{ScriptedApi, now, sample};
    use crate::export::DateTimeFormats;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn session(script: &str, console: &mut Console<ScriptedApi>, default_output: PathBuf) -> String {
        let mut out = Vec::new();
        run(console, Cursor::new(script.to_string()), &mut out, default_output, now).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
        assert_eq!(ShellCommand::parse("refresh").unwrap(), Some(ShellCommand::Refresh));
        assert_eq!(
            ShellCommand::parse("day Today").unwrap(),
            Some(ShellCommand::Day(DayBucket::Today))
        );
        assert_eq!(ShellCommand::parse("day none").unwrap(), Some(ShellCommand::Day(DayBucket::None)));
        assert_eq!(
            ShellCommand::parse("from 2024-01-05").unwrap(),
            Some(ShellCommand::From(NaiveDate::from_ymd_opt(2024, 1, 5)))
        );
        assert_eq!(ShellCommand::parse("to clear").unwrap(), Some(ShellCommand::To(None)));
        assert_eq!(ShellCommand::parse("export").unwrap(), Some(ShellCommand::Export(None)));
        assert_eq!(
            ShellCommand::parse("delete abc123").unwrap(),
            Some(ShellCommand::Delete("abc123".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("from 05/01/2024").is_err());
        assert!(ShellCommand::parse("to").is_err());
        assert!(ShellCommand::parse("delete").is_err());
        assert!(ShellCommand::parse("frobnicate").is_err());
    }

    #[test]
    fn test_filter_then_show() {
        let mut console = Console::new(ScriptedApi::with_records(sample()), DateTimeFormats::default());
        console.refresh();

        let out = session("day yesterday\napply\nshow\nquit\n", &mut console, PathBuf::from("unused.xlsx"));
        assert!(out.contains("1 of 3 consultations match"));
        assert!(out.contains("Patient 2"));
        assert!(!out.contains("Patient 1"));
        assert_eq!(console.store().filtered().len(), 1);
    }

    #[test]
    fn test_delete_prompts_for_confirmation() {
        let mut console = Console::new(ScriptedApi::with_records(sample()), DateTimeFormats::default());
        console.refresh();

        let out = session("delete 1\nn\ndelete 2\ny\n", &mut console, PathBuf::from("unused.xlsx"));
        assert!(out.contains("Cancelled"));
        assert!(out.contains("Deleted 2"));
        let ids: Vec<&str> = console.store().all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_export_to_default_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("consultations.xlsx");
        let mut console = Console::new(ScriptedApi::with_records(sample()), DateTimeFormats::default());
        console.refresh();

        let out = session("export\n", &mut console, path.clone());
        assert!(out.contains("Wrote 3 rows"));
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_command_keeps_going() {
        let mut console = Console::new(ScriptedApi::with_records(sample()), DateTimeFormats::default());

        let out = session("bogus\nrefresh\n", &mut console, PathBuf::from("unused.xlsx"));
        assert!(out.contains("unknown command 'bogus'"));
        assert!(out.contains("3 consultations loaded"));
    }
}
