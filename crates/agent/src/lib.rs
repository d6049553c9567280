pub mod dispatcher;
pub mod llm;
pub mod pipeline;
pub mod providers;

pub use dispatcher::{Dispatcher, ANALYSIS_TEMPERATURE, REPLY_TEMPERATURE};
pub use llm::LlmClient;
pub use pipeline::ChatPipeline;
pub use providers::{build_client, probe};
