//! Macro resolution
//!
//! A resolver maps a `(namespace, macro)` pair to its expansion, or `None`
//! when it has nothing to offer. Resolvers compose into a [`ResolverChain`]
//! that asks each stage in a fixed priority order; the first answer wins.

use crate::config::defaults::{LIB_NAME, VERSION};
use crate::core::properties::Properties;

/// Something that can expand a macro name
pub trait MacroResolver {
    /// Expansion of `macro_name`, or `None` if this resolver does not know it
    fn resolve(&self, namespace: &str, macro_name: &str) -> Option<String>;
}

impl<F> MacroResolver for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn resolve(&self, namespace: &str, macro_name: &str) -> Option<String> {
        self(namespace, macro_name)
    }
}

impl MacroResolver for Properties {
    fn resolve(&self, _namespace: &str, macro_name: &str) -> Option<String> {
        self.get(macro_name).cloned()
    }
}

/// Resolvers tried in order until one answers
#[derive(Default)]
pub struct ResolverChain<'a> {
    stages: Vec<Box<dyn MacroResolver + 'a>>,
}

impl<'a> ResolverChain<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage with lower priority than every stage already present
    #[must_use]
    pub fn then(mut self, stage: impl MacroResolver + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an optional stage
    #[must_use]
    pub fn then_maybe(self, stage: Option<&'a dyn MacroResolver>) -> Self {
        match stage {
            Some(stage) => self.then(Delegate(stage)),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl MacroResolver for ResolverChain<'_> {
    fn resolve(&self, namespace: &str, macro_name: &str) -> Option<String> {
        self.stages
            .iter()
            .find_map(|stage| stage.resolve(namespace, macro_name))
    }
}

/// Forwards to a borrowed resolver
struct Delegate<'a>(&'a dyn MacroResolver);

impl MacroResolver for Delegate<'_> {
    fn resolve(&self, namespace: &str, macro_name: &str) -> Option<String> {
        self.0.resolve(namespace, macro_name)
    }
}

/// Looks a macro up in a borrowed property map
pub struct PropertyLookup<'a>(pub &'a Properties);

impl MacroResolver for PropertyLookup<'_> {
    fn resolve(&self, _namespace: &str, macro_name: &str) -> Option<String> {
        self.0.get(macro_name).cloned()
    }
}

/// Synthetic macros describing this tool
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinMacros;

impl MacroResolver for BuiltinMacros {
    fn resolve(&self, _namespace: &str, macro_name: &str) -> Option<String> {
        match macro_name {
            "software" => Some(LIB_NAME.to_uppercase()),
            "runtime.ide.version" => Some(VERSION.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_macros() {
        assert_eq!(BuiltinMacros.resolve("ns", "software").as_deref(), Some("ARTURO"));
        assert_eq!(
            BuiltinMacros.resolve("ns", "runtime.ide.version").as_deref(),
            Some(VERSION)
        );
        assert!(BuiltinMacros.resolve("ns", "compiler.path").is_none());
    }

    #[test]
    fn test_chain_first_stage_wins() {
        let first = props(&[("a", "first")]);
        let second = props(&[("a", "second"), ("b", "second")]);
        let chain = ResolverChain::new()
            .then(PropertyLookup(&first))
            .then(PropertyLookup(&second));

        assert_eq!(chain.resolve("ns", "a").as_deref(), Some("first"));
        assert_eq!(chain.resolve("ns", "b").as_deref(), Some("second"));
        assert!(chain.resolve("ns", "c").is_none());
    }

    #[test]
    fn test_chain_falls_through_to_delegate() {
        let fallback = |_: &str, name: &str| {
            name.strip_prefix("runtime.tools.")
                .map(|rest| format!("/opt/{rest}"))
        };
        let chain = ResolverChain::new()
            .then(BuiltinMacros)
            .then_maybe(Some(&fallback as &dyn MacroResolver));

        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain.resolve("ns", "runtime.tools.avr-gcc.path").as_deref(),
            Some("/opt/avr-gcc.path")
        );
    }

    #[test]
    fn test_empty_chain_misses() {
        let chain = ResolverChain::new().then_maybe(None);
        assert!(chain.is_empty());
        assert!(chain.resolve("ns", "anything").is_none());
    }
}
