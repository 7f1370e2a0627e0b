//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::schema::{FieldKind, FieldValue, Presence, ResourceData, Schema};
use crate::state::ProviderState;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Schema field row for table display.
#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Presence")]
    presence: String,
    #[tabled(rename = "Force New")]
    force_new: String,
    #[tabled(rename = "Normalized")]
    normalized: String,
}

/// Tracked resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "IP Configs")]
    ip_configurations: usize,
    #[tabled(rename = "Rules")]
    rules: usize,
    #[tabled(rename = "ID")]
    id: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a resource schema.
    #[must_use]
    pub fn format_schema(&self, resource_type: &str, schema: &Schema) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&SchemaJson::new(resource_type, schema))
                    .unwrap_or_default()
            }
            OutputFormat::Text => {
                let rows: Vec<SchemaRow> = schema
                    .fields()
                    .iter()
                    .map(|f| SchemaRow {
                        name: f.name.to_string(),
                        kind: kind_name(f.kind).to_string(),
                        presence: presence_name(f.presence).to_string(),
                        force_new: if f.force_new { "yes" } else { "no" }.to_string(),
                        normalized: if f.normalize.is_some() { "yes" } else { "-" }.to_string(),
                    })
                    .collect();

                format!("\n{}\n\n{}\n", resource_type.bold(), Table::new(rows))
            }
        }
    }

    /// Formats the observed data of one resource.
    #[must_use]
    pub fn format_resource(&self, name: &str, data: &ResourceData) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "name": name,
                "id": data.id(),
                "attributes": data.fields().collect::<std::collections::BTreeMap<_, _>>(),
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                match data.id() {
                    Some(id) => {
                        let _ = writeln!(output, "{} {name}", "✓".green());
                        let _ = writeln!(output, "   ID: {id}");
                    }
                    None => {
                        let _ = writeln!(output, "{} {name} (not found, removed from state)", "-".yellow());
                        return output;
                    }
                }
                for (field, value) in data.fields() {
                    let _ = writeln!(output, "   {field}: {}", format_value(value));
                }
                output
            }
        }
    }

    /// Formats provider state.
    #[must_use]
    pub fn format_state(&self, state: &ProviderState) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(state).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                let _ = writeln!(output, "\nState");
                let _ = writeln!(output, "   Version: {}", state.version);
                let _ = writeln!(output, "   Last updated: {}", state.last_updated);
                let _ = writeln!(output, "   Resources: {}\n", state.resources.len());

                if !state.resources.is_empty() {
                    let rows: Vec<ResourceRow> = state
                        .resources
                        .values()
                        .map(|r| ResourceRow {
                            name: r.name.clone(),
                            resource_type: r.resource_type.clone(),
                            ip_configurations: set_len(r.attributes.get("backend_ip_configurations")),
                            rules: set_len(r.attributes.get("load_balancing_rules")),
                            id: Self::truncate(&r.id, 60),
                        })
                        .collect();
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                if !state.history.is_empty() {
                    let _ = writeln!(output, "\n   Recent history ({}):", state.history.len());
                    for entry in state.history.iter().rev().take(5) {
                        let status = if entry.success { "✓".green() } else { "✗".red() };
                        let _ = writeln!(
                            output,
                            "     {status} {} - {} ({})",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.operation,
                            entry.resource
                        );
                    }
                }

                output
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": result.is_valid(),
                "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid!\n", "✓".green())
                } else {
                    format!("{} Configuration has {} error(s)\n", "✗".red(), result.error_count())
                };
                for error in &result.errors {
                    let _ = writeln!(output, "  - {error}");
                }
                if show_warnings && result.warning_count() > 0 {
                    let _ = writeln!(output, "\nWarnings:");
                    for warning in &result.warnings {
                        let _ = writeln!(output, "  {} {warning}", "⚠".yellow());
                    }
                }
                output
            }
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        self.message("success", &"✓".green().to_string(), message)
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        self.message("error", &"✗".red().to_string(), message)
    }

    /// Formats a warning message.
    #[must_use]
    pub fn warning(&self, message: &str) -> String {
        self.message("warning", &"⚠".yellow().to_string(), message)
    }

    fn message(&self, status: &str, marker: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(
                &serde_json::json!({ "status": status, "message": message }),
            )
            .unwrap_or_default(),
            OutputFormat::Text => format!("{marker} {message}"),
        }
    }

    /// Truncates a string to a maximum length.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }
}

const fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "string",
        FieldKind::StringSet => "set(string)",
    }
}

const fn presence_name(presence: Presence) -> &'static str {
    match presence {
        Presence::Required => "required",
        Presence::Optional => "optional",
        Presence::Computed => "computed",
    }
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Str(s) => s.clone(),
        FieldValue::Set(values) if values.is_empty() => String::from("[]"),
        FieldValue::Set(values) => format!(
            "[{}]",
            values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn set_len(value: Option<&FieldValue>) -> usize {
    match value {
        Some(FieldValue::Set(values)) => values.len(),
        _ => 0,
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct SchemaJson {
    resource_type: String,
    fields: Vec<FieldJson>,
}

#[derive(serde::Serialize)]
struct FieldJson {
    name: &'static str,
    kind: &'static str,
    presence: &'static str,
    force_new: bool,
    normalized: bool,
}

impl SchemaJson {
    fn new(resource_type: &str, schema: &Schema) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            fields: schema
                .fields()
                .iter()
                .map(|f| FieldJson {
                    name: f.name,
                    kind: kind_name(f.kind),
                    presence: presence_name(f.presence),
                    force_new: f.force_new,
                    normalized: f.normalize.is_some(),
                })
                .collect(),
        }
    }
}
