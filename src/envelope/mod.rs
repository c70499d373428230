pub mod resolver;
pub mod types;

pub use resolver::EnvelopeResolver;
pub use types::DecisionEnvelope;
