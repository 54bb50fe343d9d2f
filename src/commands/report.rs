use std::io::Write as _;
use strata_jobs::{Execution, Failure, Status};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use time::{macros::format_description, OffsetDateTime};

fn write_color(stdout: &mut StandardStream, text: &str, fg_color: Color) -> std::io::Result<()> {
    stdout.set_color(ColorSpec::new().set_fg(Some(fg_color)))?;
    let result = stdout.write_all(text.as_bytes());
    stdout.reset().ok();
    result
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => Color::Green,
        Status::Stopped | Status::Stopping => Color::Yellow,
        Status::Starting | Status::Started => Color::Cyan,
        Status::Failed | Status::Abandoned => Color::Red,
    }
}

fn timestamp(t: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    t.format(&format).unwrap_or_else(|_| t.to_string())
}

fn print_failures(
    stdout: &mut StandardStream,
    label: &str,
    color: Color,
    failures: &[Failure],
) -> std::io::Result<()> {
    for failure in failures {
        write!(stdout, "  ")?;
        write_color(stdout, label, color)?;
        writeln!(stdout, " {}", failure)?;
    }
    Ok(())
}

/// Prints the outcome of a finished execution.
pub fn print(execution: &Execution) -> eyre::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let status = execution.status();

    write!(
        stdout,
        "{} {} [{}]: ",
        execution.kind(),
        execution.id(),
        execution.archive()
    )?;
    write_color(&mut stdout, &status.to_string(), status_color(status))?;
    if execution.parameters().dry_run {
        write!(stdout, " (dry run)")?;
    }
    writeln!(stdout)?;

    write!(stdout, "  started {}", timestamp(execution.started()))?;
    if let Some(ended) = execution.ended() {
        write!(stdout, ", ended {}", timestamp(ended))?;
    }
    writeln!(stdout)?;
    writeln!(
        stdout,
        "  steps {}/{}",
        execution.executed_steps(),
        execution.total_steps()
    )?;

    let staged = execution.staged();
    if !staged.is_empty() {
        let counts = staged
            .iter()
            .map(|(kind, count)| format!("{} {}", kind, count))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(stdout, "  staged {}", counts)?;
    }

    print_failures(&mut stdout, "warning:", Color::Yellow, &execution.warnings())?;
    print_failures(&mut stdout, "error:", Color::Red, &execution.failures())?;
    Ok(())
}
