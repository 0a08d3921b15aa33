//! Intent registry: the signature table and the alias index.
//!
//! The registry is an immutable value assembled once from [`IntentSource`]s
//! and handed by reference to the scanner and the resolver.

pub mod builtin;

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntentGrepError, Result};

pub use builtin::BuiltinIntents;

/// A fully dotted call target such as `subprocess.run`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Accepts dot-separated identifiers only (`a`, `a.b`, `a.b_c.d2`).
    pub fn parse(raw: &str) -> Option<Signature> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.split('.').all(is_identifier) {
            return None;
        }
        Some(Signature(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl Borrow<str> for Signature {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// A named category of behaviour and the signatures that perform it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDefinition {
    pub name: String,
    pub signatures: BTreeSet<Signature>,
}

/// Anything that contributes intents or aliases to a registry.
///
/// The built-in table and the `[[intents]]` config section are both sources;
/// extensions register the same way, at startup, before the registry is built.
pub trait IntentSource {
    fn name(&self) -> &str;
    fn register(&self, builder: &mut RegistryBuilder) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    intents: BTreeMap<String, BTreeSet<Signature>>,
    aliases: Vec<(String, String)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add signatures to `name`, creating the intent if needed.
    pub fn intent<I, S>(&mut self, name: &str, signatures: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = normalize(name);
        let entry = self.intents.entry(name.clone()).or_default();
        for raw in signatures {
            let raw = raw.as_ref();
            let signature = Signature::parse(raw).ok_or_else(|| IntentGrepError::MalformedSignature {
                intent: name.clone(),
                signature: raw.to_string(),
            })?;
            entry.insert(signature);
        }
        Ok(self)
    }

    pub fn alias<I, S>(&mut self, intent: &str, aliases: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let intent = normalize(intent);
        for alias in aliases {
            self.aliases.push((normalize(alias.as_ref()), intent.clone()));
        }
        self
    }

    pub fn source(&mut self, source: &dyn IntentSource) -> Result<&mut Self> {
        debug!("Registering intent source: {}", source.name());
        source.register(self)?;
        Ok(self)
    }

    pub fn build(self) -> Result<IntentRegistry> {
        let mut intents = BTreeMap::new();
        for (name, signatures) in self.intents {
            if signatures.is_empty() {
                return Err(IntentGrepError::EmptyIntent(name));
            }
            intents.insert(
                name.clone(),
                IntentDefinition { name, signatures },
            );
        }

        let mut aliases: HashMap<String, String> = HashMap::new();
        for (alias, intent) in self.aliases {
            if !intents.contains_key(&intent) {
                return Err(IntentGrepError::AliasTargetMissing { alias, intent });
            }
            if let Some(existing) = aliases.get(&alias) {
                if *existing != intent {
                    return Err(IntentGrepError::DuplicateAlias {
                        alias,
                        first: existing.clone(),
                        second: intent,
                    });
                }
                continue;
            }
            aliases.insert(alias, intent);
        }

        debug!(
            "Intent registry built: {} intents, {} aliases",
            intents.len(),
            aliases.len()
        );
        Ok(IntentRegistry { intents, aliases })
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

/// Immutable signature table plus alias index.
#[derive(Debug, Clone)]
pub struct IntentRegistry {
    intents: BTreeMap<String, IntentDefinition>,
    aliases: HashMap<String, String>,
}

impl IntentRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding only the compiled-in intent table.
    pub fn builtin() -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        builder.source(&BuiltinIntents)?;
        builder.build()
    }

    pub fn signatures_for(&self, intent: &str) -> Result<&BTreeSet<Signature>> {
        self.intents
            .get(intent)
            .map(|def| &def.signatures)
            .ok_or_else(|| IntentGrepError::UnknownIntent(intent.to_string()))
    }

    /// Exact, case-insensitive alias lookup.
    pub fn resolve_alias(&self, token: &str) -> Option<&str> {
        self.aliases.get(&normalize(token)).map(String::as_str)
    }

    /// Intent names in lexical order.
    pub fn all_intent_names(&self) -> Vec<&str> {
        self.intents.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.intents.contains_key(intent)
    }

    /// Aliases pointing at `intent`, sorted.
    pub fn aliases_for(&self, intent: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == intent)
            .map(|(alias, _)| alias.as_str())
            .collect();
        found.sort_unstable();
        found
    }

    pub fn definitions(&self) -> impl Iterator<Item = &IntentDefinition> {
        self.intents.values()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
