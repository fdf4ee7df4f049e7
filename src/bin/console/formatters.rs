use rustmq_console::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "Invalid output format: {}. Valid formats: table, json, yaml, csv",
                s
            )),
        }
    }
}

/// Resolved output preferences for one invocation
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub format: OutputFormat,
    pub no_color: bool,
}

impl Output {
    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        println!("{}", format_output(data, self.format, self.no_color)?);
        Ok(())
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.paint("31", "Error:", message));
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.paint("32", "Success:", message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.paint("33", "Warning:", message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.paint("34", "Info:", message));
    }

    fn paint(&self, color: &str, label: &str, message: &str) -> String {
        if self.no_color {
            format!("{} {}", label, message)
        } else {
            format!("\x1b[{}m{}\x1b[0m {}", color, label, message)
        }
    }
}

pub fn format_output<T: Serialize>(data: &T, format: OutputFormat, no_color: bool) -> Result<String> {
    let value = serde_json::to_value(data)?;
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&value)?,
        OutputFormat::Yaml => format_yaml(&value, 0),
        OutputFormat::Csv => format_csv(&value),
        OutputFormat::Table => format_table(&value, no_color),
    })
}

fn format_yaml(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match value {
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Object(fields) if fields.is_empty() => "{}".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) | Value::Array(_) => {
                    format!("{}-\n{}", pad, format_yaml(item, indent + 1))
                }
                _ => format!("{}- {}", pad, yaml_scalar(item)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, field)| match field {
                Value::Array(items) if !items.is_empty() => {
                    format!("{}{}:\n{}", pad, key, format_yaml(field, indent + 1))
                }
                Value::Object(inner) if !inner.is_empty() => {
                    format!("{}{}:\n{}", pad, key, format_yaml(field, indent + 1))
                }
                _ => format!("{}{}: {}", pad, key, format_yaml(field, indent + 1).trim_start()),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => format!("{}{}", pad, yaml_scalar(value)),
    }
}

fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!(
            "\"{}\"",
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t")
        ),
        other => other.to_string(),
    }
}

fn format_csv(value: &Value) -> String {
    match value {
        Value::Array(rows) => {
            let Some(Value::Object(first)) = rows.first() else {
                return rows.iter().map(csv_escape_value).collect::<Vec<_>>().join("\n");
            };
            let headers: Vec<&String> = first.keys().collect();
            let mut lines = vec![headers
                .iter()
                .map(|h| h.as_str())
                .collect::<Vec<_>>()
                .join(",")];
            for row in rows {
                if let Value::Object(fields) = row {
                    lines.push(
                        headers
                            .iter()
                            .map(|h| fields.get(*h).map(csv_escape_value).unwrap_or_default())
                            .collect::<Vec<_>>()
                            .join(","),
                    );
                }
            }
            lines.join("\n")
        }
        Value::Object(fields) => {
            let mut lines = vec!["field,value".to_string()];
            lines.extend(
                fields
                    .iter()
                    .map(|(k, v)| format!("{},{}", k, csv_escape_value(v))),
            );
            lines.join("\n")
        }
        other => csv_escape_value(other),
    }
}

pub fn csv_escape_value(value: &Value) -> String {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

fn format_table(value: &Value, no_color: bool) -> String {
    let bold = |line: String| {
        if no_color {
            line
        } else {
            format!("\x1b[1m{}\x1b[0m", line)
        }
    };

    match value {
        Value::Array(rows) if rows.is_empty() => "No data available".to_string(),
        Value::Array(rows) => {
            let Some(Value::Object(first)) = rows.first() else {
                return rows
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("{}: {}", i, table_cell(v)))
                    .collect::<Vec<_>>()
                    .join("\n");
            };

            let headers: Vec<&String> = first.keys().collect();
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| {
                    headers
                        .iter()
                        .map(|h| row.get(h.as_str()).map(table_cell).unwrap_or_default())
                        .collect()
                })
                .collect();
            let widths: Vec<usize> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    cells
                        .iter()
                        .map(|r| r[i].chars().count())
                        .max()
                        .unwrap_or(0)
                        .max(h.len())
                })
                .collect();

            let mut lines = Vec::with_capacity(rows.len() + 2);
            lines.push(bold(
                headers
                    .iter()
                    .zip(&widths)
                    .map(|(h, w)| format!("{:<width$}", h.to_uppercase(), width = w))
                    .collect::<Vec<_>>()
                    .join(" | "),
            ));
            lines.push(widths.iter().map(|w| "=".repeat(*w)).collect::<Vec<_>>().join("=+="));
            for row in cells {
                lines.push(
                    row.iter()
                        .zip(&widths)
                        .map(|(c, w)| format!("{:<width$}", c, width = w))
                        .collect::<Vec<_>>()
                        .join(" | "),
                );
            }
            lines.join("\n")
        }
        Value::Object(fields) => {
            let key_width = fields.keys().map(|k| k.len()).max().unwrap_or(0).max(5);
            let mut lines = vec![
                bold(format!("{:<width$} | VALUE", "FIELD", width = key_width)),
                format!("{}=+={}", "=".repeat(key_width), "=".repeat(20)),
            ];
            lines.extend(
                fields
                    .iter()
                    .map(|(k, v)| format!("{:<width$} | {}", k, table_cell(v), width = key_width)),
            );
            lines.join("\n")
        }
        other => table_cell(other),
    }
}

fn table_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.chars().count() > 60 => {
            format!("{}...", s.chars().take(57).collect::<String>())
        }
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() <= 3 => format!(
            "[{}]",
            items.iter().map(table_cell).collect::<Vec<_>>().join(", ")
        ),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{object}".to_string(),
        other => other.to_string(),
    }
}

/// Ask before a destructive operation. The prompt goes to stderr so stdout
/// stays machine-readable.
pub fn confirm_operation(operation: &str, target: &str) -> bool {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stderr(), operation, target)
}

pub fn confirm_with<R, W>(input: &mut R, prompt: &mut W, operation: &str, target: &str) -> bool
where
    R: BufRead,
    W: Write,
{
    if write!(prompt, "Are you sure you want to {} '{}'? [y/N]: ", operation, target).is_err()
        || prompt.flush().is_err()
    {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
