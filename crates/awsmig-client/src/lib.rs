//! Client-side plumbing for the AWS account-migration assistant:
//! - `api` - the step-executor HTTP contract and client
//! - `runner` - the adapter folding execution results into store
//!   transitions
//! - `agent` - the rule-based chat assistant
//!
//! The store itself lives in `awsmig-core` and stays free of I/O; this
//! crate owns every suspension point.

pub mod agent;
pub mod api;
pub mod runner;

pub use agent::{AgentIntent, AgentMessage, ChatAgent, MessageRole};
pub use api::{
    step_path, ExecutorError, HttpExecutor, StepExecution, StepExecutor, BASE_URL_ENV,
    DEFAULT_BASE_URL,
};
pub use runner::StepRunner;
