use std::collections::HashMap;
use std::fmt;

use regex::{Captures, Regex};

pub type TagHandler<C> = Box<dyn Fn(&C, &str) -> String + Send + Sync>;

/// Rewrites `<name=value>` markers in display text through named handlers.
///
/// Matching is a single left-to-right pass over non-overlapping markers; the
/// text a handler returns is never scanned again. Markers whose name has no
/// handler are kept verbatim.
pub struct TagParser<C> {
    handlers: HashMap<String, TagHandler<C>>,
    pattern: Regex,
}

impl<C> TagParser<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            pattern: Regex::new(r"<(\w+)=([^>]*)>").expect("tag regex must compile"),
        }
    }

    /// Adds a handler, replacing any handler already registered under `name`.
    pub fn register_handler<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&C, &str) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn parse(&self, context: &C, text: &str) -> String {
        self.pattern
            .replace_all(text, |captures: &Captures<'_>| match self.handlers.get(&captures[1]) {
                Some(handler) => handler(context, &captures[2]),
                None => captures[0].to_string(),
            })
            .into_owned()
    }
}

impl<C> Default for TagParser<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TagParser<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.handlers.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("TagParser")
            .field("handlers", &names)
            .finish()
    }
}
