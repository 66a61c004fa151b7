//! LLM provider implementations for Agentloom.
//!
//! One provider covers the whole target surface: any back-end exposing an
//! OpenAI-compatible `/v1/chat/completions` endpoint, which includes the
//! local LM Studio server this project defaults to, plus Ollama, vLLM, and
//! the hosted APIs.

mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
