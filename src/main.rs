//! LeadFlow CLI - configuration-driven pipeline runner

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use leadflow::{
    AgentRegistry, CompletionPolicy, EngineConfig, ExecutionResult, FixSuggestion, FlowError,
    Orchestrator, RunStatus, StepStatus, WorkflowSpec,
};

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "LeadFlow - pipeline runner for lead-generation agent workflows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow file
    Run {
        /// Path to a workflow .yaml/.yml/.json file
        file: String,

        /// Override the workflow's completion policy
        #[arg(short, long, value_enum)]
        policy: Option<CompletionPolicy>,

        /// Where to write the execution result document
        #[arg(short, long, default_value = "leadflow_result.json")]
        out: String,
    },

    /// Validate a workflow file without executing it
    Validate {
        /// Path to a workflow .yaml/.yml/.json file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file, policy, out } => run_workflow(&file, policy, &out).await,
        Commands::Validate { file } => validate_workflow(&file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn load_workflow(file: &str) -> Result<WorkflowSpec, FlowError> {
    // Read async to not block the runtime
    let document = tokio::fs::read_to_string(file).await?;
    WorkflowSpec::from_document(Path::new(file), &document)
}

async fn run_workflow(
    file: &str,
    policy_override: Option<CompletionPolicy>,
    out: &str,
) -> Result<(), FlowError> {
    let mut workflow = load_workflow(file).await?;

    // CLI override beats the document
    if let Some(policy) = policy_override {
        workflow.policy = Some(policy);
    }

    println!(
        "{} Running workflow: {} ({} steps)",
        "→".cyan(),
        workflow.workflow_name.cyan().bold(),
        workflow.steps.len()
    );

    let orchestrator = Orchestrator::new(
        Arc::new(AgentRegistry::builtin()),
        EngineConfig::from_env(),
    );
    let result = orchestrator.run(&workflow).await;

    print_summary(&result);

    // The result document is always written, even for a failed run
    tokio::fs::write(out, result.to_json_pretty()).await?;
    println!("{} Results saved to: {}", "→".cyan(), out);

    if result.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn validate_workflow(file: &str) -> Result<(), FlowError> {
    let workflow = load_workflow(file).await?;

    let orchestrator = Orchestrator::new(
        Arc::new(AgentRegistry::builtin()),
        EngineConfig::from_env(),
    );
    orchestrator.validate(&workflow)?;

    println!("{} Workflow '{}' is valid", "✓".green(), file);
    println!("  Name: {}", workflow.workflow_name);
    println!("  Steps: {}", workflow.steps.len());
    for step in &workflow.steps {
        println!("    {} ({})", step.id, step.agent);
    }

    Ok(())
}

fn print_summary(result: &ExecutionResult) {
    println!("{}", "Execution summary:".cyan().bold());
    for step in &result.steps {
        let status = match step.status {
            StepStatus::Completed => "COMPLETED".green(),
            StepStatus::Failed => "FAILED".red(),
            StepStatus::Skipped => "SKIPPED".yellow(),
        };
        println!(
            "  [{}] {} ({}) {:.2}s",
            status, step.step_id, step.agent, step.duration_seconds
        );
        if let Some(error) = &step.error {
            println!("      {}", error.red());
        }
        if let Some(reason) = &step.skip_reason {
            println!("      {}", reason.yellow());
        }
    }

    let status = match result.status {
        RunStatus::Completed => "completed".green().bold(),
        RunStatus::Failed => "failed".red().bold(),
    };
    println!(
        "{} Workflow '{}' {} in {:.2}s",
        "→".cyan(),
        result.workflow_name,
        status,
        result.duration_seconds
    );
    if let Some(error) = &result.error {
        println!("  {}", error.red());
    }
    if !result.final_state.is_empty() {
        println!("  Final state: {}", serde_json::Value::Object(result.final_state.clone()));
    }
}
