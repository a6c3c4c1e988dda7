//! Scripted backends for unit tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolbridge_providers::{
    CliOutput, CliRunner, GeminiCli, LLMProvider, LLMResponse, Message, ProviderError,
    ProviderResult,
};

type Call = (Vec<String>, Option<String>);

/// Records every CLI call and replays canned outputs in order
pub struct ScriptedRunner {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<Vec<ProviderResult<CliOutput>>>,
}

impl ScriptedRunner {
    pub fn new(replies: Vec<ProviderResult<CliOutput>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into_iter().rev().collect()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cli(self: &Arc<Self>) -> Arc<GeminiCli> {
        Arc::new(GeminiCli::new(
            self.clone(),
            None,
            Duration::from_secs(5),
            Duration::from_secs(5),
        ))
    }
}

#[async_trait]
impl CliRunner for ScriptedRunner {
    async fn run(
        &self,
        args: &[String],
        input: Option<&str>,
        _limit: Duration,
    ) -> ProviderResult<CliOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((args.to_vec(), input.map(str::to_string)));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ProviderError::CommandFailed("no reply scripted".into())))
    }
}

pub fn cli_ok(stdout: &str) -> ProviderResult<CliOutput> {
    Ok(CliOutput {
        success: true,
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn cli_failed(stderr: &str) -> ProviderResult<CliOutput> {
    Ok(CliOutput {
        success: false,
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

/// Chat-completions stand-in that records the message lists it receives
pub struct FakeProvider {
    requests: Mutex<Vec<(Vec<Message>, Option<String>)>>,
    replies: Mutex<Vec<ProviderResult<LLMResponse>>>,
}

impl FakeProvider {
    pub fn new(replies: Vec<ProviderResult<LLMResponse>>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into_iter().rev().collect()),
        })
    }

    pub fn requests(&self) -> Vec<(Vec<Message>, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn reply(text: &str) -> ProviderResult<LLMResponse> {
    Ok(LLMResponse {
        content: Some(text.to_string()),
    })
}

#[async_trait]
impl LLMProvider for FakeProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
    ) -> ProviderResult<LLMResponse> {
        self.requests.lock().unwrap().push((messages, model));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ProviderError::ApiError("no reply scripted".into())))
    }

    fn get_default_model(&self) -> String {
        "glm-4.7".to_string()
    }
}
