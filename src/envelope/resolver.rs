use std::{collections::HashMap, sync::Arc};

use crate::{envelope::types::DecisionEnvelope, types::IntentKey};

/// Plain intent-to-envelope lookup. The mapping is fixed at construction;
/// there is no pattern matching and no runtime mutation. An unknown intent
/// resolves to `None` and the engine substitutes its mandatory default.
pub struct EnvelopeResolver {
    by_intent: HashMap<IntentKey, Arc<DecisionEnvelope>>,
}

impl EnvelopeResolver {
    pub fn new(by_intent: HashMap<IntentKey, Arc<DecisionEnvelope>>) -> Self {
        Self { by_intent }
    }

    pub fn empty() -> Self {
        Self {
            by_intent: HashMap::new(),
        }
    }

    pub fn resolve(&self, intent: &str) -> Option<Arc<DecisionEnvelope>> {
        self.by_intent.get(intent).cloned()
    }
}
