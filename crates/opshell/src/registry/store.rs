//! Process-wide command store with a secondary alias index.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::command::CommandSpec;
use crate::sources::DynamicCommandSource;

/// Counts reported by [`CommandRegistry::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub commands: usize,
    pub namespaces: usize,
    pub sources: usize,
    pub categories: usize,
}

/// The registry of all static and discovered commands.
///
/// The primary store is keyed `namespace:name` (bare `name` for global
/// commands); the alias index maps each alias to its owning key so alias
/// resolution is a pair of map lookups. Both maps are only mutated together,
/// through the methods here. Mutation is synchronous and unsynchronized:
/// the registry assumes one logical flow of control, so embedding it behind
/// concurrent writers requires an external lock.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandSpec>>,
    aliases: HashMap<String, String>,
    pub(crate) sources: HashMap<String, Arc<dyn DynamicCommandSource>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(name: &str, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) => format!("{ns}:{name}"),
            None => name.to_string(),
        }
    }

    /// Register a command, replacing any command already stored at its key.
    ///
    /// On replacement, every alias the old command owned is retracted before
    /// the new command's aliases are inserted, so the alias index never
    /// points at a stale entry. An alias already claimed by a different
    /// command is taken over by the newer registration.
    pub fn register(&mut self, spec: CommandSpec) -> Option<Arc<CommandSpec>> {
        let key = spec.key();
        let replaced = if self.commands.contains_key(&key) {
            self.aliases.retain(|_, owner| owner != &key);
            self.commands.remove(&key)
        } else {
            None
        };

        for alias in &spec.aliases {
            if let Some(previous) = self.aliases.get(alias) {
                if previous != &key {
                    tracing::warn!(alias = %alias, from = %previous, to = %key, "alias reassigned");
                }
            }
            self.aliases.insert(alias.clone(), key.clone());
        }

        tracing::debug!(key = %key, "command registered");
        self.commands.insert(key, Arc::new(spec));
        replaced
    }

    pub fn register_many(&mut self, specs: Vec<CommandSpec>) {
        for spec in specs {
            self.register(spec);
        }
    }

    /// Remove a command and every alias pointing at it.
    pub fn unregister(&mut self, name: &str, namespace: Option<&str>) -> Option<Arc<CommandSpec>> {
        let key = Self::key_for(name, namespace);
        self.aliases.retain(|_, owner| owner != &key);
        self.commands.remove(&key)
    }

    pub fn get(&self, name: &str, namespace: Option<&str>) -> Option<Arc<CommandSpec>> {
        self.commands.get(&Self::key_for(name, namespace)).cloned()
    }

    pub fn has(&self, name: &str, namespace: Option<&str>) -> bool {
        self.commands.contains_key(&Self::key_for(name, namespace))
    }

    /// All commands, optionally filtered to one namespace, sorted by key.
    pub fn list(&self, namespace: Option<&str>) -> Vec<Arc<CommandSpec>> {
        let mut entries: Vec<(&String, &Arc<CommandSpec>)> = self
            .commands
            .iter()
            .filter(|(_, spec)| match namespace {
                Some(ns) => spec.namespace.as_deref() == Some(ns),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, spec)| Arc::clone(spec)).collect()
    }

    /// Sorted, distinct namespaces currently in use.
    pub fn list_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self
            .commands
            .values()
            .filter_map(|spec| spec.namespace.clone())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }

    /// Resolve `"namespace:name"` or a bare global name.
    pub fn resolve(&self, full_name: &str) -> Option<Arc<CommandSpec>> {
        match full_name.split_once(':') {
            Some((namespace, name)) => self.get(name, Some(namespace)),
            None => self.get(full_name, None),
        }
    }

    /// Resolve an alias through the secondary index.
    pub fn resolve_alias(&self, alias: &str) -> Option<Arc<CommandSpec>> {
        let key = self.aliases.get(alias)?;
        self.commands.get(key).cloned()
    }

    /// Commands whose name matches exactly, across all namespaces, sorted by
    /// namespace for deterministic ambiguity reporting.
    pub fn find_by_name(&self, name: &str) -> Vec<Arc<CommandSpec>> {
        let mut matches: Vec<Arc<CommandSpec>> = self
            .commands
            .values()
            .filter(|spec| spec.name == name)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        matches
    }

    /// Case-insensitive substring search over name, description, namespace,
    /// and aliases.
    pub fn search(&self, keyword: &str) -> Vec<Arc<CommandSpec>> {
        let needle = keyword.to_lowercase();
        let mut matches: Vec<Arc<CommandSpec>> = self
            .commands
            .values()
            .filter(|spec| {
                spec.name.to_lowercase().contains(&needle)
                    || spec.description.to_lowercase().contains(&needle)
                    || spec
                        .namespace
                        .as_deref()
                        .is_some_and(|ns| ns.to_lowercase().contains(&needle))
                    || spec
                        .aliases
                        .iter()
                        .any(|alias| alias.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        matches.sort_by_key(|spec| spec.key());
        matches
    }

    /// All commands grouped by category, sorted for stable help output.
    pub fn by_category(&self) -> BTreeMap<String, Vec<Arc<CommandSpec>>> {
        let mut grouped: BTreeMap<String, Vec<Arc<CommandSpec>>> = BTreeMap::new();
        for spec in self.commands.values() {
            let category = if spec.category.is_empty() {
                "General".to_string()
            } else {
                spec.category.clone()
            };
            grouped.entry(category).or_default().push(Arc::clone(spec));
        }
        for specs in grouped.values_mut() {
            specs.sort_by_key(|spec| spec.key());
        }
        grouped
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            commands: self.commands.len(),
            namespaces: self.list_namespaces().len(),
            sources: self.sources.len(),
            categories: self.by_category().len(),
        }
    }

    /// Remove every command; registered sources stay.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.aliases.clear();
    }

    /// Remove every command in a namespace, with its aliases. Returns how
    /// many commands were removed.
    pub fn clear_namespace(&mut self, namespace: &str) -> usize {
        let keys: Vec<String> = self
            .commands
            .iter()
            .filter(|(_, spec)| spec.namespace.as_deref() == Some(namespace))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.aliases.retain(|_, owner| owner != key);
            self.commands.remove(key);
        }
        keys.len()
    }
}
