use colored::*;

use crate::events::{Event, EventManager};
use crate::pipeline::{PipelineResult, StageSpec};
use crate::sanitize;

/// Environment variable that enables machine-readable JSON logs when set to "1" or "true".
const MACHINE_LOG_ENV: &str = "AGENTCHAIN_MACHINE_LOG";

pub fn init_logging() {
    // Internal logs are opt-in via RUST_LOG; console output below is separate.
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Warn);
    }
    let _ = builder.try_init();
}

fn machine_log_enabled() -> bool {
    matches!(
        std::env::var(MACHINE_LOG_ENV)
            .ok()
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("1") | Some("true")
    )
}

fn emit_machine_event(kind: &str, data: serde_json::Value) {
    if !machine_log_enabled() {
        return;
    }

    let event = serde_json::json!({
        "kind": kind,
        "data": data,
    });

    if let Ok(line) = serde_json::to_string(&event) {
        eprintln!("{line}");
    }
}

pub fn info(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    println!("{}", sanitize::sanitize_preview_for_console(raw));
    emit_machine_event("info", serde_json::json!({ "message": raw }));
}

pub fn error(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    eprintln!("{}", sanitize::sanitize_preview_for_console(raw).red());
    emit_machine_event("error", serde_json::json!({ "message": raw }));
}

pub fn banner(pipeline: &str, endpoint: &str, credentials: &str) {
    let p = sanitize::sanitize_preview_for_console(pipeline);
    let e = sanitize::sanitize_preview_for_console(endpoint);

    println!("{} {} | {}", ">>".bold(), "agentchain".bold(), p.cyan());
    println!("{} {}", "Endpoint:".dimmed(), e.dimmed());
    println!("{} {}", "Credentials:".dimmed(), credentials.dimmed());
    emit_machine_event(
        "banner",
        serde_json::json!({
            "pipeline": pipeline,
            "endpoint": endpoint,
            "credentials": credentials,
        }),
    );
}

pub fn model_table(stages: &[StageSpec]) {
    println!("\n{}", "Model Configuration:".bold());
    let width = stages.iter().map(|s| s.name().len()).max().unwrap_or(0) + 1;
    for stage in stages {
        let model = stage.agent().model();
        println!(
            "  {:<width$} {} {}",
            format!("{}:", stage.name()),
            model.as_str().cyan(),
            format!("({})", model.family()).dimmed()
        );
    }
    println!();
    emit_machine_event(
        "models",
        serde_json::Value::Array(
            stages
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "stage": s.name(),
                        "model": s.agent().model().as_str(),
                    })
                })
                .collect(),
        ),
    );
}

/// Console progress driven by orchestrator events.
///
/// `quiet` suppresses the stage output bodies.
pub fn progress_events(quiet: bool) -> EventManager {
    let mut events = EventManager::new();

    events.on(Event::PipelineStart, |_, ctx| {
        let count = ctx.stage_count.unwrap_or_default();
        println!("Starting {count}-stage pipeline...\n");
        emit_machine_event("pipeline_start", serde_json::json!({ "stages": count }));
    });

    events.on(Event::StageStart, |_, ctx| {
        println!(
            "{} {} with {}...",
            format!(
                "[{}/{}]",
                ctx.stage_index.unwrap_or_default(),
                ctx.stage_count.unwrap_or_default()
            )
            .bold(),
            ctx.description.as_deref().unwrap_or_default(),
            ctx.model.as_deref().unwrap_or_default().cyan()
        );
        emit_machine_event(
            "stage_start",
            serde_json::json!({
                "index": ctx.stage_index,
                "stage": ctx.stage_name,
                "model": ctx.model,
            }),
        );
    });

    events.on(Event::StageSuccess, move |_, ctx| {
        let name = ctx.stage_name.as_deref().unwrap_or_default();
        let secs = ctx.duration.map(|d| d.as_secs_f64()).unwrap_or_default();
        if !quiet {
            println!("\n{}", format!("=== {} ===", name.to_uppercase()).bold());
            println!(
                "{}\n",
                sanitize::sanitize_preview_for_console(ctx.output.as_deref().unwrap_or_default())
            );
        }
        println!(
            "{} Stage {} completed successfully in {secs:.2} seconds\n",
            "[SUCCESS]".green(),
            ctx.stage_index.unwrap_or_default()
        );
        emit_machine_event(
            "stage_success",
            serde_json::json!({ "stage": name, "duration_seconds": secs }),
        );
    });

    events.on(Event::StageFailure, |_, ctx| {
        let name = ctx.stage_name.as_deref().unwrap_or_default();
        let error = ctx.error.as_deref().unwrap_or_default();
        let secs = ctx.duration.map(|d| d.as_secs_f64()).unwrap_or_default();
        eprintln!(
            "{} Stage {} ({}) failed after {secs:.2} seconds: {}",
            "[FAILED]".red(),
            ctx.stage_index.unwrap_or_default(),
            name,
            sanitize::sanitize_preview_for_console(error)
        );
        emit_machine_event(
            "stage_failure",
            serde_json::json!({ "stage": name, "error": error, "duration_seconds": secs }),
        );
    });

    events
}

pub fn pipeline_complete(result: &PipelineResult) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    println!(
        "{} PIPELINE COMPLETE - {} STAGES SUCCEEDED",
        "[SUCCESS]".green().bold(),
        result.stage_count()
    );
    println!("{rule}");
    for outcome in result.outcomes() {
        println!("{} {}", "[DONE]".green(), outcome.name());
    }
    println!("{rule}\n");
    emit_machine_event(
        "pipeline_complete",
        serde_json::json!({ "total_duration_seconds": result.total_duration_seconds() }),
    );
}

pub fn failure(report: &str) {
    eprintln!();
    for (i, line) in report.lines().enumerate() {
        let safe = sanitize::sanitize_preview_for_console(line);
        if i == 0 {
            eprintln!("{}", safe.red().bold());
        } else {
            eprintln!("{safe}");
        }
    }
    emit_machine_event("pipeline_failed", serde_json::json!({ "report": report }));
}

/// Fixed-width reports are printed unstyled so columns stay aligned.
pub fn report(text: &str) {
    println!("\n{text}");
}

pub fn preflight_start() {
    println!("{}", "Testing Bedrock connectivity...".dimmed());
}

pub fn preflight_ok(reply: &str) {
    println!(
        "{} Connected ({})\n",
        "[SUCCESS]".green(),
        sanitize::sanitize_preview_for_console(reply.trim()).dimmed()
    );
    emit_machine_event("preflight", serde_json::json!({ "ok": true }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn machine_log_disabled_by_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        // SAFETY: test-only environment mutation.
        unsafe {
            std::env::remove_var(MACHINE_LOG_ENV);
        }
        assert!(!machine_log_enabled());
    }

    #[test]
    fn machine_log_enabled_with_true_like_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        for v in &["1", "true", "True", "TRUE"] {
            // SAFETY: test-only environment mutation.
            unsafe {
                std::env::set_var(MACHINE_LOG_ENV, v);
            }
            assert!(machine_log_enabled(), "value {v} should enable machine log");
        }
        // SAFETY: test-only environment mutation.
        unsafe {
            std::env::remove_var(MACHINE_LOG_ENV);
        }
    }

    #[test]
    fn progress_events_cover_every_stage_event() {
        let events = progress_events(true);
        for event in [
            Event::PipelineStart,
            Event::StageStart,
            Event::StageSuccess,
            Event::StageFailure,
        ] {
            assert!(events.has_handlers(event), "{} has no handler", event.name());
        }
    }
}
