//! Model backends for toolbridge
//!
//! Two collaborators: the `gemini` CLI driven as a subprocess and the
//! Z.ai GLM chat-completions API.

pub mod base;
pub mod gemini;
pub mod parse;
pub mod zai;

pub use base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};
pub use gemini::{CliOutput, CliRunner, GeminiCli, OutputFormat, ProcessRunner};
pub use parse::{parse_json_output, parse_stream_json, StreamReply};
pub use zai::ZaiClient;
