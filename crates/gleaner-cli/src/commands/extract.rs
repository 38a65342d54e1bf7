//! Extract command implementation.

use super::{apply_chunk_overrides, load_documents, source_of};
use crate::cli::ExtractArgs;
use crate::config::{Config, PromptSettings};
use crate::error::{CliError, Result};
use crate::output::{DocumentReport, Formatter};
use gleaner_domain::{ModelClient, PromptArgs};
use gleaner_extractor::{Extractor, ExtractorConfig, DOMAIN_ARG, EXAMPLE_QUERIES_ARG};
use gleaner_llm::{OllamaConfig, OllamaProvider};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Settings for one extract run after command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractPlan {
    pub ollama: OllamaConfig,
    pub extractor: ExtractorConfig,
    pub prompt: PromptSettings,
}

impl ExtractPlan {
    /// Merge command-line flags over the loaded configuration.
    pub(crate) fn new(args: &ExtractArgs, config: &Config) -> Self {
        let mut plan = Self {
            ollama: config.ollama.clone(),
            extractor: config.extractor.clone(),
            prompt: config.prompt.clone(),
        };

        apply_chunk_overrides(&mut plan.extractor, &args.input);
        if let Some(model) = &args.model {
            plan.ollama.model = model.clone();
        }
        if let Some(endpoint) = &args.endpoint {
            plan.ollama.endpoint = endpoint.clone();
        }
        if let Some(steps) = args.gleaning_steps {
            plan.extractor.max_gleaning_steps = steps;
        }
        if let Some(concurrency) = args.concurrency {
            plan.extractor.max_concurrency = Some(concurrency);
        }
        if let Some(domain) = &args.domain {
            plan.prompt.domain = domain.clone();
        }
        if !args.example_queries.is_empty() {
            plan.prompt.example_queries = args.example_queries.clone();
        }
        if !args.entity_types.is_empty() {
            plan.prompt.entity_types = args.entity_types.clone();
        }

        plan
    }

    /// Prompt arguments shared by every chunk.
    pub(crate) fn prompt_args(&self) -> PromptArgs {
        PromptArgs::new()
            .with(DOMAIN_ARG, self.prompt.domain.clone())
            .with_list(EXAMPLE_QUERIES_ARG, &self.prompt.example_queries)
    }
}

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let plan = ExtractPlan::new(&args, config);
    let documents = load_documents(&args.input.files)?;

    info!(
        model = %plan.ollama.model,
        endpoint = %plan.ollama.endpoint,
        documents = documents.len(),
        "Starting extraction"
    );
    let model = OllamaProvider::from_config(&plan.ollama);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling extraction");
                cancel.cancel();
            }
        })
    };

    let reports = run(model, &plan, documents, &cancel).await;
    interrupt.abort();
    let reports = reports?;

    println!("{}", formatter.format_documents(&reports, args.pretty)?);

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(CliError::DocumentsFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

/// Extract every document and collect one report per input, in input order.
pub(crate) async fn run<M>(
    model: M,
    plan: &ExtractPlan,
    documents: Vec<gleaner_domain::Document>,
    cancel: &CancellationToken,
) -> Result<Vec<DocumentReport>>
where
    M: ModelClient + 'static,
{
    let extractor = Extractor::new(model, plan.extractor.clone())?;
    let handles = extractor.extract(
        &documents,
        &plan.prompt_args(),
        &plan.prompt.entity_types,
        cancel,
    );

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        let source = source_of(&documents[handle.index()]);
        let report = match handle.wait().await {
            Ok(graph) => DocumentReport {
                source,
                result: Some(graph),
                error: None,
            },
            Err(e) => {
                error!(source = %source, error = %e, "Extraction failed");
                DocumentReport {
                    source,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InputArgs;
    use gleaner_domain::{Document, ModelError, ResponseKind};
    use gleaner_llm::MockProvider;
    use std::path::PathBuf;

    fn extract_args() -> ExtractArgs {
        ExtractArgs {
            input: InputArgs {
                files: vec![PathBuf::from("carol.txt")],
                chunk_tokens: None,
                overlap_tokens: None,
            },
            entity_types: Vec::new(),
            domain: None,
            example_queries: Vec::new(),
            model: None,
            endpoint: None,
            gleaning_steps: None,
            concurrency: None,
            pretty: false,
        }
    }

    fn document(text: &str, source: &str) -> Document {
        Document::new(text).with_metadata("source", source)
    }

    #[test]
    fn test_plan_uses_config_defaults() {
        let config = Config::default();
        let plan = ExtractPlan::new(&extract_args(), &config);

        assert_eq!(plan.ollama, config.ollama);
        assert_eq!(plan.extractor, config.extractor);
        assert_eq!(plan.prompt, config.prompt);
    }

    #[test]
    fn test_plan_applies_overrides() {
        let mut args = extract_args();
        args.model = Some("mistral".to_string());
        args.gleaning_steps = Some(0);
        args.concurrency = Some(2);
        args.domain = Some("Victorian fiction".to_string());
        args.example_queries = vec!["Who is Scrooge?".to_string()];
        args.entity_types = vec!["Character".to_string()];
        args.input.chunk_tokens = Some(300);

        let plan = ExtractPlan::new(&args, &Config::default());
        assert_eq!(plan.ollama.model, "mistral");
        assert_eq!(plan.extractor.max_gleaning_steps, 0);
        assert_eq!(plan.extractor.max_concurrency, Some(2));
        assert_eq!(plan.extractor.chunking.chunk_token_size, 300);
        assert_eq!(plan.prompt.entity_types, vec!["Character"]);

        let prompt_args = plan.prompt_args();
        assert_eq!(prompt_args.get(DOMAIN_ARG), Some("Victorian fiction"));
        assert_eq!(prompt_args.get(EXAMPLE_QUERIES_ARG), Some("Who is Scrooge?"));
    }

    #[tokio::test]
    async fn test_run_reports_in_input_order() {
        let model = MockProvider::new()
            .respond_when_prompt_contains(
                "sat alone",
                ResponseKind::Graph,
                r#"{"entities": [{"name": "Scrooge", "type": "Character"}]}"#,
            )
            .fail_when_prompt_contains(
                "was dead",
                ResponseKind::Graph,
                ModelError::Invocation("down".to_string()),
            );
        let plan = ExtractPlan::new(&extract_args(), &Config::default());
        let documents = vec![
            document("Scrooge sat alone.", "one.txt"),
            document("Marley was dead.", "two.txt"),
        ];

        let reports = run(model, &plan, documents, &CancellationToken::new()).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].source, "one.txt");
        let graph = reports[0].result.as_ref().unwrap();
        assert_eq!(graph.graph.entities[0].entity_type, "CHARACTER");
        assert_eq!(reports[1].source, "two.txt");
        assert!(reports[1].result.is_none());
        assert!(reports[1].error.is_some());
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_settings() {
        let mut plan = ExtractPlan::new(&extract_args(), &Config::default());
        plan.extractor.max_concurrency = Some(0);

        let result = run(MockProvider::new(), &plan, Vec::new(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(CliError::Extraction(_))));
    }
}
