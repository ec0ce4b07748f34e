//! The analysis context of one generation run.
//!
//! Bundles the configuration, the extension broker and the definition
//! index. The caller owns it and passes it by reference to the engine;
//! independent runs use independent contexts (or `reset` in between).

use crate::broker::{Extension, ExtensionBroker};
use crate::config::InferConfig;
use crate::index::DefinitionIndex;

#[derive(Debug, Default)]
pub struct Context {
    config: InferConfig,
    broker: ExtensionBroker,
    index: DefinitionIndex,
}

impl Context {
    pub fn new(config: InferConfig) -> Self {
        Self {
            config,
            broker: ExtensionBroker::new(),
            index: DefinitionIndex::new(),
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.broker.register(extension);
        self
    }

    pub fn register(&mut self, extension: Extension) {
        self.broker.register(extension);
    }

    pub fn config(&self) -> &InferConfig {
        &self.config
    }

    pub fn broker(&self) -> &ExtensionBroker {
        &self.broker
    }

    pub fn index(&self) -> &DefinitionIndex {
        &self.index
    }

    /// Drop every built definition. Configuration and extensions stay.
    pub fn reset(&self) {
        self.index.reset();
    }
}
