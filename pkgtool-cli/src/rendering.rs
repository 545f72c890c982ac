// src/rendering.rs
use colored::*;
use std::io::{self, Write};

use pkgtool_core::{ToolDefinition, ToolOutcome};

fn write_stream<W: Write>(writer: &mut W, label: &str, content: &str) -> io::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{}", format!("--- {} ---", label).dimmed())?;
    write!(writer, "{}", content)?;
    if !content.ends_with('\n') {
        writeln!(writer)?;
    }
    Ok(())
}

/// Human-readable rendering of a tool outcome.
pub fn render_outcome<W: Write>(
    writer: &mut W,
    tool_name: &str,
    outcome: &ToolOutcome,
) -> io::Result<()> {
    match outcome {
        ToolOutcome::Success(output) => {
            writeln!(writer, "{}", format!("{} succeeded", tool_name).green().bold())?;
            write_stream(writer, "stdout", &output.stdout)?;
            write_stream(writer, "stderr", &output.stderr)?;
        }
        ToolOutcome::Failure(failure) => {
            let status = match failure.exit_code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            writeln!(
                writer,
                "{} {} ({})",
                format!("{} failed:", tool_name).red().bold(),
                failure.error,
                status
            )?;
            write_stream(writer, "stdout", &failure.stdout)?;
            write_stream(writer, "stderr", &failure.stderr)?;
        }
    }
    Ok(())
}

/// Short listing of the available tools; the full schema goes through `--json`.
pub fn render_definitions<W: Write>(
    writer: &mut W,
    definitions: &[ToolDefinition],
) -> io::Result<()> {
    for def in definitions {
        writeln!(writer, "{}  {}", def.name.cyan().bold(), def.description)?;
        for (name, param) in &def.parameters.properties {
            let required = if def.parameters.required.contains(name) {
                " (required)"
            } else {
                ""
            };
            writeln!(
                writer,
                "    {}: {:?}{} - {}",
                name,
                param.param_type,
                required,
                param.description
            )?;
        }
    }
    Ok(())
}
