//! Ordered, named rule lists with alternate chains.
//!
//! Every engine (block, inline, post-inline, core) keeps its rules in a
//! [`Ruler`]. The default chain (`""`) holds every enabled rule in order. A
//! rule may also join named chains (`"paragraph"`, `"list"`, ...) which the
//! engines consult when they need to know whether a line would start a
//! different construct.
use rustc_hash::FxHashMap;

use crate::Error;

struct Rule<R: ?Sized> {
    name: String,
    enabled: bool,
    func: Box<R>,
    alt: Vec<String>,
}

pub struct Ruler<R: ?Sized> {
    rules: Vec<Rule<R>>,
    chains: FxHashMap<String, Vec<usize>>,
}

impl<R: ?Sized> Default for Ruler<R> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            chains: FxHashMap::default(),
        }
    }
}

impl<R: ?Sized> std::fmt::Debug for Ruler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ruler")
            .field("rules", &self.names(""))
            .finish_non_exhaustive()
    }
}

impl<R: ?Sized> Ruler<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Result<usize, Error> {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .ok_or_else(|| Error::RuleNotFound(name.to_string()))
    }

    fn make(name: &str, func: Box<R>, alt: &[&str]) -> Rule<R> {
        Rule {
            name: name.to_string(),
            enabled: true,
            func,
            alt: alt.iter().map(|chain| (*chain).to_string()).collect(),
        }
    }

    /// Append a rule at the end of the list.
    pub fn push(&mut self, name: &str, func: Box<R>, alt: &[&str]) {
        self.rules.push(Self::make(name, func, alt));
        self.compile();
    }

    /// Insert a rule right before `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuleNotFound`] if no rule named `anchor` exists.
    pub fn before(
        &mut self,
        anchor: &str,
        name: &str,
        func: Box<R>,
        alt: &[&str],
    ) -> Result<(), Error> {
        let index = self.find(anchor)?;
        tracing::debug!(name, anchor, "inserting rule before");
        self.rules.insert(index, Self::make(name, func, alt));
        self.compile();
        Ok(())
    }

    /// Insert a rule right after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuleNotFound`] if no rule named `anchor` exists.
    pub fn after(
        &mut self,
        anchor: &str,
        name: &str,
        func: Box<R>,
        alt: &[&str],
    ) -> Result<(), Error> {
        let index = self.find(anchor)?;
        tracing::debug!(name, anchor, "inserting rule after");
        self.rules.insert(index + 1, Self::make(name, func, alt));
        self.compile();
        Ok(())
    }

    /// Replace the function of an existing rule, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuleNotFound`] if no rule named `name` exists.
    pub fn at(&mut self, name: &str, func: Box<R>, alt: &[&str]) -> Result<(), Error> {
        let index = self.find(name)?;
        if let Some(rule) = self.rules.get_mut(index) {
            rule.func = func;
            rule.alt = alt.iter().map(|chain| (*chain).to_string()).collect();
        }
        self.compile();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::RuleNotFound`] for the first unknown name; no rule is
    /// changed in that case.
    pub fn enable(&mut self, names: &[&str]) -> Result<(), Error> {
        self.toggle(names, true)
    }

    /// # Errors
    ///
    /// Returns [`Error::RuleNotFound`] for the first unknown name; no rule is
    /// changed in that case.
    pub fn disable(&mut self, names: &[&str]) -> Result<(), Error> {
        self.toggle(names, false)
    }

    fn toggle(&mut self, names: &[&str], enabled: bool) -> Result<(), Error> {
        let indices = names
            .iter()
            .map(|name| self.find(name))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(?names, enabled, "toggling rules");
        for index in indices {
            if let Some(rule) = self.rules.get_mut(index) {
                rule.enabled = enabled;
            }
        }
        self.compile();
        Ok(())
    }

    fn compile(&mut self) {
        let mut chains: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        chains.insert(String::new(), Vec::new());
        for rule in &self.rules {
            for chain in &rule.alt {
                chains.entry(chain.clone()).or_default();
            }
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.enabled {
                continue;
            }
            for (chain, members) in &mut chains {
                if chain.is_empty() || rule.alt.iter().any(|alt| alt == chain) {
                    members.push(index);
                }
            }
        }
        self.chains = chains;
    }

    /// Rules of `chain` in order; `""` is the default chain. Unknown chains
    /// are empty.
    pub fn rules_for<'r>(&'r self, chain: &str) -> impl Iterator<Item = &'r R> + use<'r, R> {
        self.chains
            .get(chain)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|index| self.rules.get(*index))
            .map(|rule| rule.func.as_ref())
    }

    /// Names of the rules in `chain`, in order.
    #[must_use]
    pub fn names(&self, chain: &str) -> Vec<&str> {
        self.chains
            .get(chain)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|index| self.rules.get(*index))
            .map(|rule| rule.name.as_str())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name == name)
    }
}
