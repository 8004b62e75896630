use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use vtree_diff::diff_snapshot;
use vtree_payload::{MultipartCodec, Part, PartBody, PayloadConfig};
use vtree_sdk::{SaveOutcome, SavePlan, VariantSaver};
use vtree_types::VariantSnapshot;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let output = match cli.command {
        Command::Diff(args) => cmd_diff(&args, cli.format)?,
        Command::Prepare(args) => cmd_prepare(&args, &config, cli.format)?,
        Command::Inspect(args) => cmd_inspect(&args, &config, cli.format)?,
        Command::Config => config.to_toml_string()?,
    };
    print!("{output}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PayloadConfig> {
    match path {
        Some(path) => PayloadConfig::load(path)
            .with_context(|| format!("loading payload config {}", path.display())),
        None => Ok(PayloadConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<VariantSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    VariantSnapshot::from_json(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn cmd_diff(args: &DiffArgs, format: OutputFormat) -> anyhow::Result<String> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let changes = diff_snapshot(&snapshot);

    let mut out = String::new();
    match (format, changes) {
        (OutputFormat::Json, changes) => {
            let value = json!({ "changes": changes, "summary": changes.as_ref().map(|c| c.summary()) });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        (OutputFormat::Text, None) => writeln!(out, "No changes.")?,
        (OutputFormat::Text, Some(changes)) => {
            writeln!(out, "{} {}", "Changes:".bold(), changes.summary())?;
            for id in &changes.delete_feature_ids {
                writeln!(out, "  {} feature {}", "-".red(), id)?;
            }
            for feature in &changes.create_features {
                let name = feature.id.as_ref().map_or("<new>", |id| id.as_str());
                writeln!(out, "  {} feature {} ({} values)", "+".green(), name, feature.values.len())?;
            }
            for feature in &changes.update_features {
                let name = feature.id.as_ref().map_or("<unknown>", |id| id.as_str());
                writeln!(out, "  {} feature {}", "~".yellow(), name)?;
            }
            for (feature_id, values) in &changes.values_by_feature_id {
                writeln!(
                    out,
                    "  {} values +{} ~{} -{}",
                    feature_id.as_str().cyan(),
                    values.create_values.len(),
                    values.update_values.len(),
                    values.delete_value_ids.len(),
                )?;
            }
        }
    }
    Ok(out)
}

fn cmd_prepare(
    args: &PrepareArgs,
    config: &PayloadConfig,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let saver = VariantSaver::new(config.clone());

    let plan = match saver.prepare(&args.product_id, &snapshot)? {
        SaveOutcome::NoChanges => {
            return Ok(match format {
                OutputFormat::Json => format!("{}\n", json!({ "changes": null })),
                OutputFormat::Text => "No changes.\n".to_string(),
            });
        }
        SaveOutcome::Ready(plan) => plan,
    };

    if let Some(out) = &args.out {
        let body = plan.encode_body()?;
        std::fs::write(out, &body).with_context(|| format!("writing body {}", out.display()))?;
    }

    match format {
        OutputFormat::Json => render_plan_json(&plan),
        OutputFormat::Text => render_plan_text(&plan, args.out.as_deref()),
    }
}

fn render_plan_json(plan: &SavePlan) -> anyhow::Result<String> {
    let document: serde_json::Value = serde_json::from_str(
        plan.payload
            .document_json()
            .context("payload is missing its update document")?,
    )?;
    let parts: Vec<_> = plan.payload.parts().iter().map(part_json).collect();
    let value = json!({
        "product_id": plan.product_id,
        "content_type": plan.content_type(),
        "summary": plan.summary,
        "parts": parts,
        "document": document,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}

fn render_plan_text(plan: &SavePlan, out: Option<&Path>) -> anyhow::Result<String> {
    let mut s = String::new();
    writeln!(s, "{} Payload for product {}", "✓".green().bold(), plan.product_id.bold())?;
    writeln!(s, "  Changes: {}", plan.summary)?;
    writeln!(s, "  Content-Type: {}", plan.content_type().dimmed())?;
    writeln!(s, "{}", "Parts:".bold())?;
    for part in plan.payload.parts() {
        writeln!(s, "  {}", describe_part(part))?;
    }
    if let Some(json) = plan.payload.document_json() {
        let pretty = serde_json::to_string_pretty(&serde_json::from_str::<serde_json::Value>(json)?)?;
        writeln!(s, "{}\n{}", "Document:".bold(), pretty)?;
    }
    if let Some(out) = out {
        writeln!(s, "Body written to {}", out.display().to_string().yellow())?;
    }
    Ok(s)
}

fn cmd_inspect(
    args: &InspectArgs,
    config: &PayloadConfig,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let body = std::fs::read(&args.body)
        .with_context(|| format!("reading body {}", args.body.display()))?;
    let boundary = args.boundary.as_deref().unwrap_or(&config.boundary);
    let parts = MultipartCodec::decode(&body, boundary)
        .with_context(|| format!("decoding {}", args.body.display()))?;

    match format {
        OutputFormat::Json => {
            let parts: Vec<_> = parts.iter().map(part_json).collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&parts)?))
        }
        OutputFormat::Text => {
            let mut s = String::new();
            writeln!(s, "{} part(s)", parts.len().to_string().bold())?;
            for part in &parts {
                writeln!(s, "  {}", describe_part(part))?;
            }
            Ok(s)
        }
    }
}

fn describe_part(part: &Part) -> String {
    match &part.body {
        PartBody::Text(text) => format!("{} text, {} bytes", part.name.cyan(), text.len()),
        PartBody::Binary(binary) => format!(
            "{} binary, {} bytes, {}",
            part.name.yellow(),
            binary.len(),
            binary.effective_content_type()
        ),
    }
}

fn part_json(part: &Part) -> serde_json::Value {
    match &part.body {
        PartBody::Text(text) => json!({ "name": part.name, "kind": "text", "bytes": text.len() }),
        PartBody::Binary(binary) => json!({
            "name": part.name,
            "kind": "binary",
            "bytes": binary.len(),
            "content_type": binary.effective_content_type(),
        }),
    }
}
