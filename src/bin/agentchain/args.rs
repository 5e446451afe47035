use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

use agentchain::definition::BUILTIN_PIPELINES;

pub const USAGE: &str = "\
Usage: agentchain [OPTIONS]

Runs a sequential multi-stage text-generation pipeline on Amazon Bedrock.

Options:
  -r, --request TEXT      Project request fed to the first stage
  -f, --file PATH         Read the project request from a file
  -p, --pipeline PATH     Load the pipeline definition from YAML
  -b, --builtin NAME      Use a built-in pipeline: game-development (default),
                          content-review, content-pipeline
  -n, --runs N            Run the pipeline N times and print a benchmark summary
      --stage-timeout S   Fail a stage that takes longer than S seconds
      --preflight         Check connectivity with a short prompt first
      --list-models       List the foundation models the endpoint offers and exit
  -q, --quiet             Do not print stage outputs
      --json              Print the result as JSON instead of console output
  -h, --help              Show this help";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub request: Option<String>,   // -r/--request
    pub file: Option<PathBuf>,     // -f/--file
    pub pipeline: Option<PathBuf>, // -p/--pipeline
    pub builtin: Option<String>,   // -b/--builtin
    pub runs: usize,               // -n/--runs
    pub stage_timeout: Option<u64>,
    pub preflight: bool,
    pub list_models: bool,
    pub quiet: bool,
    pub json_output: bool,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            request: None,
            file: None,
            pipeline: None,
            builtin: None,
            runs: 1,
            stage_timeout: None,
            preflight: false,
            list_models: false,
            quiet: false,
            json_output: false,
            help: false,
        }
    }
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::parse_from(&args)
    }

    /// Parse from a slice of arguments (for testing)
    pub fn parse_from(args: &[String]) -> Result<Self> {
        let mut result = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| anyhow!("{arg} requires a value"))
            };

            match arg {
                "-r" | "--request" => result.request = Some(value()?),
                "-f" | "--file" => result.file = Some(PathBuf::from(value()?)),
                "-p" | "--pipeline" => result.pipeline = Some(PathBuf::from(value()?)),
                "-b" | "--builtin" => {
                    let name = value()?;
                    if !BUILTIN_PIPELINES.contains(&name.as_str()) {
                        return Err(anyhow!(
                            "unknown built-in pipeline '{name}' (expected one of: {})",
                            BUILTIN_PIPELINES.join(", ")
                        ));
                    }
                    result.builtin = Some(name);
                }
                "-n" | "--runs" => {
                    let raw = value()?;
                    result.runs = raw
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| anyhow!("{arg} expects a positive integer, got '{raw}'"))?;
                }
                "--stage-timeout" => {
                    let raw = value()?;
                    result.stage_timeout = Some(
                        raw.parse::<u64>()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| {
                                anyhow!("{arg} expects a positive number of seconds, got '{raw}'")
                            })?,
                    );
                }
                "--preflight" => result.preflight = true,
                "--list-models" => result.list_models = true,
                "-q" | "--quiet" => result.quiet = true,
                "--json" => result.json_output = true,
                "-h" | "--help" => result.help = true,
                unknown => return Err(anyhow!("Unknown argument: {unknown}\n\n{USAGE}")),
            }

            i += 1;
        }

        if result.request.is_some() && result.file.is_some() {
            return Err(anyhow!("--request and --file cannot be used together"));
        }
        if result.pipeline.is_some() && result.builtin.is_some() {
            return Err(anyhow!("--pipeline and --builtin cannot be used together"));
        }

        Ok(result)
    }

    /// Request from `--file`, then `--request`, then the definition default.
    pub fn resolve_request(&self, default: Option<&str>) -> Result<String> {
        let request = if let Some(path) = &self.file {
            std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Failed to read file {}: {e}", path.display()))?
                .trim()
                .to_string()
        } else if let Some(request) = &self.request {
            request.clone()
        } else {
            default
                .map(str::to_string)
                .ok_or_else(|| anyhow!("no request given; pass --request or --file"))?
        };

        if request.trim().is_empty() {
            return Err(anyhow!("the project request is empty"));
        }
        Ok(request)
    }
}
