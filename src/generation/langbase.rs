use async_trait::async_trait;
use tracing::{debug, warn};

use super::{parse_candidates, CandidateRecord, GenerationContract, GenerationRequest};
use crate::config::GenerationConfig;
use crate::error::{GenerationResult, LangbaseResult};
use crate::langbase::{CreatePipeRequest, LangbaseClient, Message, PipeRequest};
use crate::prompts::{generation_task_prompt, THOUGHT_GENERATION_PROMPT};

/// Generation backend that asks a Langbase pipe for candidate thoughts.
#[derive(Clone)]
pub struct LangbaseGenerator {
    client: LangbaseClient,
    pipe_name: String,
}

impl LangbaseGenerator {
    /// Create a generator calling the named pipe
    pub fn new(client: LangbaseClient, pipe_name: impl Into<String>) -> Self {
        Self {
            client,
            pipe_name: pipe_name.into(),
        }
    }

    /// Pipe definition upserted at startup.
    pub fn pipe_definition(&self, config: &GenerationConfig) -> CreatePipeRequest {
        CreatePipeRequest::new(&self.pipe_name)
            .with_description("Candidate thought generation for tree-of-thoughts brainstorming")
            .with_model(&config.model)
            .with_upsert(true)
            .with_json_output(true)
            .with_temperature(config.temperature)
            .with_max_tokens(4096)
            .with_messages(vec![Message::system(THOUGHT_GENERATION_PROMPT)])
    }

    /// Create or update the generation pipe.
    pub async fn ensure_pipe(&self, config: &GenerationConfig) -> LangbaseResult<()> {
        self.client.ensure_pipe(self.pipe_definition(config)).await
    }

    fn build_messages(&self, request: &GenerationRequest) -> Vec<Message> {
        vec![
            Message::system(THOUGHT_GENERATION_PROMPT),
            Message::user(generation_task_prompt(
                &request.task,
                &request.criteria,
                request.count,
            )),
        ]
    }
}

#[async_trait]
impl GenerationContract for LangbaseGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<CandidateRecord>> {
        let pipe_request = PipeRequest::new(&self.pipe_name, self.build_messages(request));
        let response = self.client.call_pipe(pipe_request).await?;

        match parse_candidates(&response.completion) {
            Ok(records) => {
                debug!(pipe = %self.pipe_name, count = records.len(), "Parsed candidate thoughts");
                Ok(records)
            }
            Err(e) => {
                warn!(
                    pipe = %self.pipe_name,
                    error = %e,
                    completion_preview = %response.completion.chars().take(200).collect::<String>(),
                    "Could not extract candidate thoughts from completion"
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationBackend, LangbaseConfig, RequestConfig};
    use crate::langbase::MessageRole;
    use crate::reasoning::Criterion;

    fn generator() -> LangbaseGenerator {
        let config = LangbaseConfig {
            api_key: "test_key".to_string(),
            base_url: "https://api.langbase.com".to_string(),
        };
        let client = LangbaseClient::new(&config, RequestConfig::default()).unwrap();
        LangbaseGenerator::new(client, "brainstorm-thoughts-v1")
    }

    #[test]
    fn test_build_messages() {
        let request = GenerationRequest::new("Plant app", Criterion::schema());
        let messages = generator().build_messages(&request);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert!(messages[1].content.contains("Plant app"));
        assert!(messages[1].content.contains("- team_fit (1-10)"));
    }

    #[test]
    fn test_pipe_definition() {
        let config = GenerationConfig {
            backend: GenerationBackend::Langbase,
            model: "openai:gpt-4o".to_string(),
            temperature: 0.8,
        };
        let definition = generator().pipe_definition(&config);
        assert_eq!(definition.name, "brainstorm-thoughts-v1");
        assert_eq!(definition.model.as_deref(), Some("openai:gpt-4o"));
        assert_eq!(definition.upsert, Some(true));
        assert_eq!(definition.temperature, Some(0.8));
    }
}
