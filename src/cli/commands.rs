//! CLI command definitions for evalforge.
//!
//! Four commands cover the pipeline end to end: `ask` answers a single
//! question, `batch` replays a prompt list over a {model × mode} matrix,
//! `judge` scores a persisted cohort, and `report` flattens records to CSV.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use tracing::info;

use crate::error::{BatchError, LlmError};
use crate::llm::agent::{AgentResponder, ChunkStream, HttpAgentClient};
use crate::llm::openai::{ChatCompletionsClient, ChatResponder, GenerationRequest, GenerationResponse};
use crate::llm::retrieval::{HttpKnowledgeBase, KnowledgeBase, Passage};
use crate::llm::{BedrockRuntimeClient, FoundationResponder};
use crate::pipeline::{
    AgencyTable, BatchConfig, BatchRunner, ContextBuilder, JudgeConfig, JudgeRunner, Mode,
    ReportBuilder, ReportConfig, ResponseGenerator, RunConfig, DEFAULT_CONCURRENCY,
};
use crate::record::codec::make_record_key;
use crate::record::InteractionRecord;
use crate::store::{FsObjectStore, ObjectStore, StoreUri};
use crate::transcript::Transcript;

/// Default model for single-shot questions and batch runs.
const DEFAULT_MODEL: &str = "us.amazon.nova-pro-v1:0";

/// Default judge model.
const DEFAULT_JUDGE_MODEL: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Default report columns: the judge's score payload flattened alongside the
/// assessment metadata.
const DEFAULT_REPORT_FIELDS: &str = "response.scores.helpfulness,response.scores.accuracy,\
response.scores.clarity,response.scores.tone,response.scores.conciseness,\
response.urls.totalURLs,response.urls.validURLs,response.assessment,\
assessed_response,response_model,assess_model,runtime,bot_type,cohort_tag";

/// Batch evaluation pipeline for RAG chatbot responses.
#[derive(Parser)]
#[command(name = "evalforge")]
#[command(about = "Replay prompts across models, judge the answers, report the scores")]
#[command(version)]
#[command(
    long_about = "evalforge replays prompt lists against a matrix of models and retrieval modes,\nscores the persisted responses with a judge model, and flattens the results into CSV.\n\nExample usage:\n  evalforge batch --prompt-file prompts.txt --models gpt-4o --cohort-tag run01\n  evalforge judge --cohort-tag run01\n  evalforge report --output run01.csv"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Answer a single question with one model and mode.
    Ask(AskArgs),

    /// Replay a prompt list over a {model × mode} matrix and persist records.
    Batch(BatchArgs),

    /// Score a persisted cohort of records with a judge model.
    Judge(JudgeArgs),

    /// Flatten persisted records into a CSV report.
    Report(ReportArgs),
}

/// Provider endpoints, shared by every command that calls a model.
#[derive(Parser, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL for the foundation-model invoke API.
    #[arg(long, env = "BEDROCK_API_BASE")]
    pub bedrock_api_base: Option<String>,

    /// Bearer token for the foundation-model invoke API.
    #[arg(long, env = "BEDROCK_API_KEY", hide_env_values = true)]
    pub bedrock_api_key: Option<String>,

    /// Base URL for the OpenAI-compatible chat-completions API.
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,

    /// API key for the chat-completions API.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL for the streaming agent runtime.
    #[arg(long, env = "AGENT_API_BASE")]
    pub agent_api_base: Option<String>,

    /// Bearer token for the agent runtime.
    #[arg(long, env = "AGENT_API_KEY", hide_env_values = true)]
    pub agent_api_key: Option<String>,

    /// Agent alias invoked for agent-family model identifiers.
    #[arg(long, default_value = "TSTALIASID")]
    pub agent_alias_id: String,

    /// Base URL for the knowledge-base retrieval API.
    #[arg(long, env = "KB_API_BASE")]
    pub kb_api_base: Option<String>,

    /// Bearer token for the retrieval API.
    #[arg(long, env = "KB_API_KEY", hide_env_values = true)]
    pub kb_api_key: Option<String>,

    /// Knowledge base consulted by KB modes.
    #[arg(long, env = "KB_ID", default_value = "")]
    pub kb_id: String,

    /// Path to the agency lookup CSV for Website-Agencies mode.
    #[arg(long)]
    pub agency_csv: Option<PathBuf>,
}

/// Record storage location, shared by every command that touches the store.
#[derive(Parser, Debug, Clone)]
pub struct StoreArgs {
    /// Store location: a local directory, or an s3://bucket/prefix reference
    /// mirrored under --store-root.
    #[arg(long, default_value = "./data")]
    pub store: String,

    /// Local root under which s3:// references are mirrored.
    #[arg(long, default_value = ".")]
    pub store_root: PathBuf,
}

impl StoreArgs {
    /// Opens the store, returning it along with any base prefix carried by
    /// an s3:// reference. Malformed references fail here, before any work.
    fn open(&self) -> Result<(Arc<dyn ObjectStore>, String), BatchError> {
        if self.store.starts_with("s3://") {
            let uri = StoreUri::parse(&self.store).map_err(BatchError::Store)?;
            let base = self.store_root.join(&uri.bucket);
            Ok((Arc::new(FsObjectStore::new(base)), uri.key))
        } else {
            Ok((Arc::new(FsObjectStore::new(&self.store)), String::new()))
        }
    }
}

/// Arguments for `evalforge ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Questions to answer in order. Later questions see the earlier
    /// exchanges as conversation history.
    #[arg(required = true, num_args = 1..)]
    pub questions: Vec<String>,

    /// Model identifier.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Retrieval mode (Website-Agencies, KB-Website, KB-Legal Assistant).
    #[arg(long, default_value = "KB-Website")]
    pub mode: String,

    /// Persist the answer as an interaction record.
    #[arg(long)]
    pub save: bool,

    /// Cohort tag stamped on the saved record.
    #[arg(long, default_value = "user")]
    pub cohort_tag: String,

    /// Store key prefix for the saved record.
    #[arg(long, default_value = "evaluation_data/users/")]
    pub prefix: String,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for `evalforge batch`.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// File with one prompt per line; blank lines are skipped.
    #[arg(short, long)]
    pub prompt_file: PathBuf,

    /// Comma-separated model identifiers.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub models: String,

    /// Comma-separated retrieval modes.
    #[arg(long, default_value = "KB-Website")]
    pub modes: String,

    /// Cohort tag stamped on every record of this run.
    #[arg(short, long, default_value = "wabotpoc")]
    pub cohort_tag: String,

    /// Tag embedded in generated record filenames (defaults to the cohort tag).
    #[arg(long)]
    pub file_tag: Option<String>,

    /// Store key prefix for persisted records.
    #[arg(long, default_value = "evaluation_data/batch/")]
    pub prefix: String,

    /// Maximum concurrently in-flight model calls.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for `evalforge judge`.
#[derive(Parser, Debug)]
pub struct JudgeArgs {
    /// Store prefix scanned for source records.
    #[arg(long, default_value = "evaluation_data/batch/")]
    pub source_prefix: String,

    /// Only records with this cohort tag are judged.
    #[arg(short, long)]
    pub cohort_tag: String,

    /// Judge model identifier.
    #[arg(short, long, default_value = DEFAULT_JUDGE_MODEL)]
    pub judge_model: String,

    /// Store key prefix for assessment records.
    #[arg(long, default_value = "evaluation_data/assess/")]
    pub output_prefix: String,

    /// Maximum concurrently in-flight judge calls.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for `evalforge report`.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Store prefix scanned for records to flatten.
    #[arg(long, default_value = "evaluation_data/assess/")]
    pub source_prefix: String,

    /// Comma-separated dotted field paths, one column each.
    #[arg(long, default_value = DEFAULT_REPORT_FIELDS)]
    pub fields: String,

    /// Output CSV file path.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Parse CLI arguments without running a command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Ask(args) => run_ask_command(args).await?,
        Commands::Batch(args) => run_batch_command(args).await?,
        Commands::Judge(args) => run_judge_command(args).await?,
        Commands::Report(args) => run_report_command(args).await?,
    }
    Ok(())
}

// ============================================================================
// Backend wiring
// ============================================================================

/// Placeholder responder for provider families with no endpoint configured.
/// Fails at call time, so runs that never route to the family still work.
struct Unconfigured(&'static str);

#[async_trait]
impl FoundationResponder for Unconfigured {
    async fn invoke(&self, _model_id: &str, _body: Value) -> Result<Value, LlmError> {
        Err(LlmError::MissingApiBase(self.0.to_string()))
    }
}

#[async_trait]
impl ChatResponder for Unconfigured {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Err(LlmError::MissingApiBase(self.0.to_string()))
    }
}

#[async_trait]
impl AgentResponder for Unconfigured {
    async fn invoke_agent(
        &self,
        _agent_id: &str,
        _alias_id: &str,
        _session_id: &str,
        _input_text: &str,
    ) -> Result<ChunkStream, LlmError> {
        Err(LlmError::MissingApiBase(self.0.to_string()))
    }
}

#[async_trait]
impl KnowledgeBase for Unconfigured {
    async fn retrieve(&self, _kb_id: &str, _query: &str) -> Result<Vec<Passage>, LlmError> {
        Err(LlmError::MissingApiBase(self.0.to_string()))
    }
}

fn build_generator(backend: &BackendArgs) -> anyhow::Result<ResponseGenerator> {
    let foundation: Arc<dyn FoundationResponder> = match &backend.bedrock_api_base {
        Some(base) => Arc::new(BedrockRuntimeClient::new(
            base.clone(),
            backend.bedrock_api_key.clone(),
        )),
        None => Arc::new(Unconfigured("bedrock")),
    };

    let chat: Arc<dyn ChatResponder> = match (&backend.openai_api_base, &backend.openai_api_key) {
        (Some(base), key) => Arc::new(ChatCompletionsClient::new(base.clone(), key.clone())),
        (None, Some(key)) => Arc::new(ChatCompletionsClient::new(
            "https://api.openai.com/v1".to_string(),
            Some(key.clone()),
        )),
        (None, None) => Arc::new(Unconfigured("openai")),
    };

    let agent: Arc<dyn AgentResponder> = match &backend.agent_api_base {
        Some(base) => Arc::new(HttpAgentClient::new(
            base.clone(),
            backend.agent_api_key.clone(),
        )),
        None => Arc::new(Unconfigured("agent")),
    };

    let knowledge_base: Arc<dyn KnowledgeBase> = match &backend.kb_api_base {
        Some(base) => Arc::new(HttpKnowledgeBase::new(
            base.clone(),
            backend.kb_api_key.clone(),
        )),
        None => Arc::new(Unconfigured("kb")),
    };

    let agencies = match &backend.agency_csv {
        Some(path) => Some(AgencyTable::load(path)?),
        None => None,
    };

    Ok(ResponseGenerator::new(
        foundation,
        chat,
        agent,
        ContextBuilder::new(knowledge_base, agencies),
        backend.agent_alias_id.clone(),
    ))
}

fn split_csv_arg(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_modes(raw: &str) -> Result<Vec<Mode>, BatchError> {
    split_csv_arg(raw).iter().map(|s| s.parse()).collect()
}

/// Reads a prompt list: one prompt per line, blank lines skipped.
async fn read_prompt_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

// ============================================================================
// Command implementations
// ============================================================================

async fn run_ask_command(args: AskArgs) -> anyhow::Result<()> {
    let mode: Mode = args.mode.parse()?;
    let generator = build_generator(&args.backend)?;
    let run = RunConfig::new(&args.model, mode, &args.backend.kb_id);
    let store = if args.save {
        Some(args.store.open()?)
    } else {
        None
    };

    let mut transcript = Transcript::new();
    for question in &args.questions {
        let answer = generator.answer(question, &transcript.render(), &run).await?;
        println!("{}", answer.text);
        println!();
        println!("Model used: {}", args.model);
        println!("Bot type: {}", mode.label());
        println!("Time to run: {}", answer.time_to_run);

        if let Some((store, base_prefix)) = &store {
            let record = InteractionRecord::new(
                question,
                answer.text.clone(),
                &args.model,
                mode.label(),
                &args.cohort_tag,
                answer.time_to_run,
            );
            let key = format!(
                "{}{}{}_{}",
                base_prefix,
                args.prefix,
                args.cohort_tag,
                make_record_key(&args.cohort_tag)
            );
            store.put(&key, record.to_json()?.as_bytes()).await?;
            info!(key = %key, "saved interaction record");
        }

        transcript.record_exchange(question, answer.text);
    }
    Ok(())
}

async fn run_batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let prompts = read_prompt_list(&args.prompt_file).await?;
    let modes = parse_modes(&args.modes)?;
    let (store, base_prefix) = args.store.open()?;

    let file_tag = args.file_tag.clone().unwrap_or_else(|| args.cohort_tag.clone());
    let config = BatchConfig::new(prompts, split_csv_arg(&args.models), modes)
        .with_kb_id(args.backend.kb_id.clone())
        .with_cohort_tag(args.cohort_tag.clone())
        .with_storage_prefix(format!("{}{}", base_prefix, args.prefix))
        .with_file_tag(file_tag)
        .with_concurrency(args.concurrency);

    let generator = Arc::new(build_generator(&args.backend)?);
    let summary = BatchRunner::new(generator, store).run(&config).await?;

    println!(
        "Batch complete: {} dispatched, {} persisted, {} failed",
        summary.dispatched, summary.persisted, summary.failed
    );
    Ok(())
}

async fn run_judge_command(args: JudgeArgs) -> anyhow::Result<()> {
    let (store, base_prefix) = args.store.open()?;
    let config = JudgeConfig::new(
        format!("{}{}", base_prefix, args.source_prefix),
        &args.cohort_tag,
        &args.judge_model,
    )
    .with_output_prefix(format!("{}{}", base_prefix, args.output_prefix))
    .with_concurrency(args.concurrency);

    let generator = Arc::new(build_generator(&args.backend)?);
    let summary = JudgeRunner::new(generator, store).run(&config).await?;

    println!(
        "Judge complete: {} scanned, {} matched, {} assessed, {} skipped, {} failed",
        summary.scanned, summary.matched, summary.assessed, summary.skipped, summary.failed
    );
    Ok(())
}

async fn run_report_command(args: ReportArgs) -> anyhow::Result<()> {
    let (store, base_prefix) = args.store.open()?;
    let config = ReportConfig::new(
        format!("{}{}", base_prefix, args.source_prefix),
        split_csv_arg(&args.fields),
    );

    let bytes = ReportBuilder::new(store).build(&config).await?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&args.output, &bytes).await?;

    println!("Report written to {}", args.output.display());
    Ok(())
}
