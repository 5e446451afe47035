use anyhow::{Result, anyhow};
use std::process::ExitCode;
use std::time::Duration;

use agentchain::config::{ConfigWarning, PipelineConfig, ResolvedConfig};
use agentchain::config_file::ConfigFile;
use agentchain::providers::bedrock::BedrockModelCatalog;
use agentchain::providers::create_client;
use agentchain::report::{
    BenchmarkSummary, failure_hints, failure_summary, model_catalog, timing_summary,
};
use agentchain::{PipelineDefinition, PipelineOrchestrator, PipelineResult, ui};

mod args;
use args::{CliArgs, USAGE};

const PREFLIGHT_PROMPT: &str = "Say 'Hello World'";

#[tokio::main]
async fn main() -> ExitCode {
    ui::init_logging();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            ui::error(format!("Error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = CliArgs::parse()?;
    if args.help {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = dotenvy::dotenv() {
        ConfigWarning::DotenvUnavailable(e.to_string()).log();
    }

    if args.list_models {
        return list_models(&args).await;
    }

    let definition = match (&args.pipeline, &args.builtin) {
        (Some(path), _) => PipelineDefinition::load(path)?,
        (None, Some(name)) => PipelineDefinition::builtin(name)
            .ok_or_else(|| anyhow!("unknown built-in pipeline '{name}'"))?,
        (None, None) => PipelineDefinition::game_development(),
    };
    let request = args.resolve_request(definition.request())?;

    let file = ConfigFile::load()?;
    let ResolvedConfig {
        mut config,
        warnings,
    } = PipelineConfig::load(&file, &definition.model_slots())?;
    for warning in &warnings {
        warning.log();
    }
    if let Some(secs) = args.stage_timeout {
        config.stage_timeout = Some(Duration::from_secs(secs));
    }

    let client = create_client(&config)?;
    let stages = definition.build_stages(&config, client)?;
    let region = config.endpoint.region().map(str::to_string);
    let console = !args.json_output;

    if console {
        ui::banner(
            definition.display_name(),
            &config.endpoint.to_string(),
            &config.credentials.describe(),
        );
        ui::model_table(&stages);
    }

    if args.preflight
        && let Some(last) = stages.last()
    {
        if console {
            ui::preflight_start();
        }
        match last.agent().run(PREFLIGHT_PROMPT).await {
            Ok(reply) => {
                if console {
                    ui::preflight_ok(&reply);
                }
            }
            Err(e) => {
                ui::error(format!("Failed to connect to Bedrock: {e}"));
                print_hints(region.as_deref());
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let mut orchestrator =
        PipelineOrchestrator::new(stages)?.with_stage_timeout(config.stage_timeout);
    if console {
        orchestrator = orchestrator.with_events(ui::progress_events(args.quiet));
    }

    let mut results = Vec::with_capacity(args.runs);
    for run in 1..=args.runs {
        if console && args.runs > 1 {
            ui::info(format!("\n--- Run {run}/{} ---", args.runs));
        }
        let result = orchestrator.execute(&request).await;
        if console {
            print_result(&result, region.as_deref());
        }
        results.push(result);
    }

    let summary = BenchmarkSummary::new(results);
    if args.json_output {
        let json = match summary.runs() {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{json}");
    } else if args.runs > 1 {
        ui::report(&summary.render());
    }

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn list_models(args: &CliArgs) -> Result<ExitCode> {
    let file = ConfigFile::load()?;
    let ResolvedConfig { config, warnings } = PipelineConfig::load(&file, &[])?;
    for warning in &warnings {
        warning.log();
    }

    let catalog = BedrockModelCatalog::from_config(&config)?;
    let region = config.endpoint.region();
    match catalog.list_foundation_models().await {
        Ok(models) => {
            if args.json_output {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                ui::report(&model_catalog(region, &models));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            ui::error(format!("Failed to list Bedrock models: {e}"));
            print_hints(region);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_hints(region: Option<&str>) {
    ui::error("Please check:");
    for (i, hint) in failure_hints(region).iter().enumerate() {
        ui::error(format!("{}. {hint}", i + 1));
    }
}

fn print_result(result: &PipelineResult, region: Option<&str>) {
    if result.overall_success() {
        ui::pipeline_complete(result);
    } else if let Some(text) = failure_summary(result, region) {
        ui::failure(&text);
    }

    if !result.outcomes().is_empty() {
        ui::report(&timing_summary(result.outcomes(), result.total_duration()));
    }
}
