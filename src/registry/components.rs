//! Component matcher registries.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.2.0: Unified separator-then-mode resolution rule
//! - 1.1.0: Independent button/select/modal registries
//!
//! Three independent registries keyed by the matcher string a handler author
//! chose. Incoming identifiers are split on the reserved separator and only
//! the prefix before the first separator is matched, so a handler can encode
//! per-instance state after the separator while still resolving to one
//! stable matcher. The entry's declared mode then applies to that prefix:
//! `Full` requires equality, `Begin` a leading match (longest matcher wins).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::model::definition::{ComponentSpec, Handler, MatcherMode, RunFlags};
use crate::model::event::ComponentKind;

/// Reserved separator between the matcher prefix and per-instance state.
pub const MATCHER_SEPARATOR: &str = ":";

/// Identifier length limit of the observed wire format.
pub const CUSTOM_ID_LIMIT: usize = 50;

pub struct ComponentEntry {
    pub matcher: String,
    pub mode: MatcherMode,
    pub author_only: bool,
    pub flags: RunFlags,
    pub handler: Arc<dyn Handler>,
}

/// Button, select-menu, and modal registries.
#[derive(Default)]
pub struct ComponentRegistry {
    buttons: HashMap<String, Arc<ComponentEntry>>,
    select_menus: HashMap<String, Arc<ComponentEntry>>,
    modals: HashMap<String, Arc<ComponentEntry>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        ComponentRegistry::default()
    }

    /// Register one component handler. The matcher is the identifier the
    /// handler will emit, so it is validated here, at load time: it must not
    /// contain the reserved separator and must fit the identifier limit.
    pub fn register(&mut self, spec: ComponentSpec) -> Result<(), LoadError> {
        validate_matcher(&spec.matcher)?;
        let kind = spec.kind;
        let map = self.map_mut(kind);
        if map.contains_key(&spec.matcher) {
            return Err(LoadError::DuplicateMatcher {
                kind,
                matcher: spec.matcher,
            });
        }
        map.insert(
            spec.matcher.clone(),
            Arc::new(ComponentEntry {
                matcher: spec.matcher,
                mode: spec.mode,
                author_only: spec.author_only,
                flags: spec.flags,
                handler: spec.handler,
            }),
        );
        Ok(())
    }

    /// Resolve an incoming identifier against the registry for `kind`.
    ///
    /// Matching is exact against the pre-separator prefix; there is no fuzzy
    /// mode beyond the separator convention and the declared `Begin` prefix
    /// rule.
    pub fn find(&self, kind: ComponentKind, custom_id: &str) -> Option<Arc<ComponentEntry>> {
        let map = self.map(kind);
        let prefix = custom_id
            .split_once(MATCHER_SEPARATOR)
            .map_or(custom_id, |(head, _)| head);

        // An exact hit satisfies both modes.
        if let Some(entry) = map.get(prefix) {
            return Some(entry.clone());
        }
        map.values()
            .filter(|entry| {
                entry.mode == MatcherMode::Begin && prefix.starts_with(entry.matcher.as_str())
            })
            .max_by_key(|entry| entry.matcher.len())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.buttons.len() + self.select_menus.len() + self.modals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
        self.select_menus.clear();
        self.modals.clear();
    }

    fn map(&self, kind: ComponentKind) -> &HashMap<String, Arc<ComponentEntry>> {
        match kind {
            ComponentKind::Button => &self.buttons,
            ComponentKind::SelectMenu => &self.select_menus,
            ComponentKind::Modal => &self.modals,
        }
    }

    fn map_mut(&mut self, kind: ComponentKind) -> &mut HashMap<String, Arc<ComponentEntry>> {
        match kind {
            ComponentKind::Button => &mut self.buttons,
            ComponentKind::SelectMenu => &mut self.select_menus,
            ComponentKind::Modal => &mut self.modals,
        }
    }
}

fn validate_matcher(matcher: &str) -> Result<(), LoadError> {
    if matcher.is_empty() {
        return Err(LoadError::EmptyMatcher);
    }
    if matcher.contains(MATCHER_SEPARATOR) {
        return Err(LoadError::MatcherContainsSeparator {
            matcher: matcher.to_string(),
            separator: MATCHER_SEPARATOR,
        });
    }
    if matcher.len() > CUSTOM_ID_LIMIT {
        return Err(LoadError::MatcherTooLong {
            matcher: matcher.to_string(),
            len: matcher.len(),
            limit: CUSTOM_ID_LIMIT,
        });
    }
    Ok(())
}
