/*!
Base-chain traversal over the entity classes of all loaded levels.

A class names its base textually.  When some loaded class (from any level)
carries that name as its type, that class is the *direct base*; otherwise the
name refers to an ancestor the archives don't model (typically one of the
engine's native classes like `soldier` or `cannon`), and the chain ends there.
That terminal name is the class's *root class*.

The archives are expected to describe acyclic, finite chains.  We don't
validate that up front, but every walk is capped at `MAX_BASE_DEPTH` steps so
a corrupt archive degrades into a warning instead of a hang.
*/

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::lvl::{EntityClass, Level};

/// Upper bound on base-chain length.  Real chains are a handful deep.
pub const MAX_BASE_DEPTH: usize = 256;

/// Index of a class within a `ClassRegistry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Borrowed view over every entity class of a set of levels, with name-based
/// base resolution.
pub struct ClassRegistry<'a> {
    classes: Vec<&'a EntityClass>,
    by_name: HashMap<&'a str, ClassId>,
}

impl<'a> ClassRegistry<'a> {
    pub fn from_classes<I: IntoIterator<Item = &'a EntityClass>>(classes: I) -> Self {
        let mut registry = ClassRegistry {
            classes: vec![],
            by_name: HashMap::new(),
        };
        for ec in classes {
            let id = ClassId(registry.classes.len() as u32);
            registry.classes.push(ec);
            // The same class is commonly defined by several levels; the first
            // definition loaded wins name lookups.
            registry.by_name.entry(ec.type_name.as_str()).or_insert(id);
        }
        registry
    }

    pub fn from_levels<I: IntoIterator<Item = &'a Level>>(levels: I) -> Self {
        Self::from_classes(levels.into_iter().flat_map(|level| level.classes.iter()))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len() as u32).map(ClassId)
    }

    pub fn get(&self, id: ClassId) -> &'a EntityClass {
        self.classes[id.index()]
    }

    pub fn lookup(&self, type_name: &str) -> Option<ClassId> {
        self.by_name.get(type_name).copied()
    }

    /// The direct base of `id`, if its base name resolves to a loaded class
    /// other than itself.
    pub fn base(&self, id: ClassId) -> Option<ClassId> {
        let ec = self.get(id);
        if !ec.has_base_name() {
            return None;
        }
        self.lookup(&ec.base_name).filter(|base| *base != id)
    }

    /// Follow direct bases from `id` to the last class in the chain.
    fn chain_end(&self, id: ClassId) -> ClassId {
        let mut cur = id;
        for _ in 0..MAX_BASE_DEPTH {
            match self.base(cur) {
                Some(base) => cur = base,
                None => return cur,
            }
        }
        warn!(
            "Base chain of '{}' exceeds {} steps, probably cyclic; stopping at '{}'",
            self.get(id).type_name,
            MAX_BASE_DEPTH,
            self.get(cur).type_name
        );
        cur
    }

    /// Name of the root class of `id`: the textual base name of the last class
    /// in its direct-base chain.  Empty when that class has no base name at
    /// all.
    pub fn root_class_name(&self, id: ClassId) -> &'a str {
        self.get(self.chain_end(id)).base_name.as_str()
    }

    /// Collect the distinct, non-empty root class names over all classes.
    ///
    /// Unlike `root_class_name`, a chain that ends in a class without any base
    /// name contributes nothing: such classes resolve to the empty root but
    /// there is no named root to plot for them.
    pub fn crawl_root_classes(&self) -> BTreeSet<String> {
        let mut roots = BTreeSet::new();
        for id in self.ids() {
            let end = self.get(self.chain_end(id));
            if end.has_base_name() {
                roots.insert(end.base_name.clone());
            }
        }
        roots
    }
}
