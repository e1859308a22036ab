use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::chart::ChartView;
use crate::config::Config;
use crate::task::Task;

const BAR_WIDTH: u64 = 40;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[&Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_task_table(&mut out, tasks)
    }

    fn write_task_table<W: Write>(&self, mut writer: W, tasks: &[&Task]) -> anyhow::Result<()> {
        // An empty derived view gets its own state, not a bare header.
        if tasks.is_empty() {
            writeln!(writer, "No tasks available.")?;
            return Ok(());
        }

        let today = Local::now().date_naive();

        let headers = ["ID", "Title", "Status", "Pri", "Due", "Members"];
        let rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|task| {
                let overdue = task.due().map(|due| due < today).unwrap_or(false);
                let due = if overdue {
                    self.paint(&task.due_date, "31")
                } else {
                    task.due_date.clone()
                };

                vec![
                    self.paint(&task.id, "33"),
                    task.title.clone(),
                    task.status.label().to_string(),
                    task.priority.label().to_string(),
                    due,
                    task.members.join(", "),
                ]
            })
            .collect();

        write_table(&mut writer, &headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &Task) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "status    {}", task.status)?;
        writeln!(out, "priority  {}", task.priority)?;
        writeln!(out, "due       {}", task.due_date)?;
        if !task.members.is_empty() {
            writeln!(out, "members   {}", task.members.join(", "))?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, chart))]
    pub fn print_chart(&mut self, chart: &ChartView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Tasks by status")?;
        write_bars(
            &mut out,
            &[
                ("not-started", chart.status.not_started),
                ("in-progress", chart.status.in_progress),
                ("done", chart.status.done),
            ],
        )?;

        writeln!(out)?;
        writeln!(out, "Tasks by priority")?;
        write_bars(
            &mut out,
            &[
                ("high", chart.priority.high),
                ("medium", chart.priority.medium),
                ("low", chart.priority.low),
            ],
        )?;

        Ok(())
    }

    pub fn print_notice(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(io::stdout().lock(), "{message}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in widths.iter().copied() {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_bars<W: Write>(mut writer: W, rows: &[(&str, u64)]) -> anyhow::Result<()> {
    let label_width = rows
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0);
    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);

    for (label, count) in rows {
        let bar_len = if max == 0 {
            0
        } else {
            (count * BAR_WIDTH / max) as usize
        };
        writeln!(
            writer,
            "{:label_width$}  {:>4}  {}",
            label,
            count,
            "#".repeat(bar_len)
        )?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
