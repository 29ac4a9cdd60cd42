//! System prompt synthesis from a base prompt and named mixins.
//!
//! ```rust
//! use pchat::SystemPromptSynthesizer;
//! use pprovider::Role;
//!
//! let mut synthesizer = SystemPromptSynthesizer::new("You are a helpful assistant.", true);
//! synthesizer.add_mixin("lang", "Answer in Rust.").expect("new key");
//!
//! let message = synthesizer.produce();
//! assert_eq!(message.role(), Role::System);
//! assert_eq!(
//!     message.to_wire().content.as_deref(),
//!     Some("You are a helpful assistant.\nAnswer in Rust.")
//! );
//! ```

use pcommon::{MessageId, Registry};
use pprovider::{Message, SystemMessage, UserMessage};

use crate::ChatError;

pub const SYSTEM_PROMPT_ID: &str = "system-prompt";

#[derive(Debug, Clone, Default)]
pub struct SystemPromptSynthesizer {
    base_prompt: String,
    mixins: Registry<String, String>,
    system_role: bool,
}

impl SystemPromptSynthesizer {
    pub fn new(base_prompt: impl Into<String>, system_role: bool) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            mixins: Registry::new(),
            system_role,
        }
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    pub fn set_base_prompt(&mut self, base_prompt: impl Into<String>) {
        self.base_prompt = base_prompt.into();
    }

    pub fn system_role(&self) -> bool {
        self.system_role
    }

    pub fn set_system_role(&mut self, system_role: bool) {
        self.system_role = system_role;
    }

    /// Registers a fragment under `key`; an existing fragment is never replaced.
    pub fn add_mixin(&mut self, key: impl Into<String>, text: impl Into<String>) -> Result<(), ChatError> {
        let key = key.into();
        if self.mixins.contains_key(&key) {
            return Err(ChatError::duplicate_key(format!(
                "mixin with key '{key}' already exists"
            )));
        }

        self.mixins.insert(key, text.into());
        Ok(())
    }

    pub fn remove_mixin(&mut self, key: &str) -> bool {
        self.mixins.remove(key).is_some()
    }

    pub fn mixin(&self, key: &str) -> Option<&str> {
        self.mixins.get(key).map(String::as_str)
    }

    pub fn mixin_keys(&self) -> impl Iterator<Item = &str> {
        self.mixins.keys().map(String::as_str)
    }

    pub fn content(&self) -> String {
        std::iter::once(self.base_prompt.as_str())
            .chain(self.mixins.values().map(String::as_str))
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn produce(&self) -> Message {
        let id = MessageId::new(SYSTEM_PROMPT_ID);
        if self.system_role {
            Message::System(SystemMessage::new(id, self.content()))
        } else {
            Message::User(UserMessage::new(id, self.content()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pprovider::Role;

    use super::*;
    use crate::ChatErrorKind;

    #[test]
    fn mixins_follow_insertion_order() {
        let mut synthesizer = SystemPromptSynthesizer::new("Base.", true);
        synthesizer.add_mixin("zeta", "Z fragment").expect("zeta");
        synthesizer.add_mixin("alpha", "A fragment").expect("alpha");
        synthesizer.add_mixin("empty", "").expect("empty");

        assert_eq!(synthesizer.content(), "Base.\nZ fragment\nA fragment");
        assert_eq!(
            synthesizer.mixin_keys().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "empty"]
        );
    }

    #[test]
    fn duplicate_key_is_rejected_without_mutation() {
        let mut synthesizer = SystemPromptSynthesizer::new("", true);
        synthesizer.add_mixin("style", "Be brief.").expect("first add");

        let error = synthesizer
            .add_mixin("style", "Be verbose.")
            .expect_err("duplicate must fail");
        assert_eq!(error.kind, ChatErrorKind::DuplicateKey);
        assert_eq!(synthesizer.mixin("style"), Some("Be brief."));

        assert!(synthesizer.remove_mixin("style"));
        assert!(!synthesizer.remove_mixin("style"));
        assert_eq!(synthesizer.content(), "");
    }

    #[test]
    fn role_depends_on_system_role_support() {
        let mut synthesizer = SystemPromptSynthesizer::new("Prompt", false);
        let message = synthesizer.produce();
        assert_eq!(message.role(), Role::User);
        assert_eq!(message.id().as_str(), SYSTEM_PROMPT_ID);

        synthesizer.set_system_role(true);
        assert_eq!(synthesizer.produce().role(), Role::System);
    }
}
