//! Cacheability accumulation for assembled documents.
//!
//! Every value object in the tree carries a [`CacheDescriptor`]. Descriptors
//! flow strictly upward: a composite's descriptor is the merge of its own
//! facts with those of every constituent, so no invalidation fact is lost as
//! values are composed into the final document.

use std::collections::BTreeSet;

/// How long a response may be reused.
///
/// `Seconds(0)` means uncacheable. Merging takes the minimum, with
/// [`MaxAge::Permanent`] acting as the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    /// Cacheable forever; invalidated only through tags.
    Permanent,
    /// Cacheable for this many seconds; zero means uncacheable.
    Seconds(u32),
}

impl MaxAge {
    /// The uncacheable max-age.
    pub const UNCACHEABLE: MaxAge = MaxAge::Seconds(0);

    /// Merge two max-ages, keeping the stricter one.
    pub fn merge(self, other: MaxAge) -> MaxAge {
        match (self, other) {
            (MaxAge::Permanent, b) => b,
            (a, MaxAge::Permanent) => a,
            (MaxAge::Seconds(a), MaxAge::Seconds(b)) => MaxAge::Seconds(a.min(b)),
        }
    }

    /// Whether this max-age forbids caching outright.
    pub fn is_uncacheable(self) -> bool {
        self == MaxAge::UNCACHEABLE
    }
}

impl Default for MaxAge {
    fn default() -> Self {
        MaxAge::Permanent
    }
}

/// An accumulator of cache-invalidation facts.
///
/// Holds the invalidation tags, the contextual variance keys, and the
/// max-age governing reuse of whatever was built from the tagged data.
/// Mutation is append-only: tags and contexts are never removed, and the
/// max-age only ever gets stricter.
///
/// # Example
///
/// ```
/// use omnibus::cache::{CacheDescriptor, MaxAge};
///
/// let record = CacheDescriptor::new().with_tag("article:7");
/// let field = CacheDescriptor::new()
///     .with_tag("user:3")
///     .with_max_age(MaxAge::Seconds(600));
///
/// let merged = record.merge(&field);
/// assert!(merged.tags().contains("article:7"));
/// assert!(merged.tags().contains("user:3"));
/// assert_eq!(merged.max_age(), MaxAge::Seconds(600));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDescriptor {
    tags: BTreeSet<String>,
    contexts: BTreeSet<String>,
    max_age: MaxAge,
}

impl CacheDescriptor {
    /// Create an empty descriptor: no tags, no contexts, permanently cacheable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an invalidation tag, builder style.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Add a variance context, builder style.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.insert(context.into());
        self
    }

    /// Set the max-age, builder style. The stricter of the current and
    /// given values wins.
    pub fn with_max_age(mut self, max_age: MaxAge) -> Self {
        self.max_age = self.max_age.merge(max_age);
        self
    }

    /// Add an invalidation tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Add a variance context.
    pub fn add_context(&mut self, context: impl Into<String>) {
        self.contexts.insert(context.into());
    }

    /// The invalidation tags.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// The variance contexts.
    pub fn contexts(&self) -> &BTreeSet<String> {
        &self.contexts
    }

    /// The max-age.
    pub fn max_age(&self) -> MaxAge {
        self.max_age
    }

    /// Merge two descriptors into a new one.
    ///
    /// Tags and contexts are unioned; the stricter max-age wins. The
    /// operation is associative, commutative, and idempotent.
    pub fn merge(&self, other: &CacheDescriptor) -> CacheDescriptor {
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }

    /// Fold another descriptor into this one in place.
    pub fn absorb(&mut self, other: &CacheDescriptor) {
        self.tags.extend(other.tags.iter().cloned());
        self.contexts.extend(other.contexts.iter().cloned());
        self.max_age = self.max_age.merge(other.max_age);
    }

    /// Merge a whole sequence of descriptors into one.
    pub fn merge_all<'a>(descriptors: impl IntoIterator<Item = &'a CacheDescriptor>) -> Self {
        let mut merged = CacheDescriptor::new();
        for descriptor in descriptors {
            merged.absorb(descriptor);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tags: &[&str], contexts: &[&str], max_age: MaxAge) -> CacheDescriptor {
        let mut d = CacheDescriptor::new().with_max_age(max_age);
        for tag in tags {
            d.add_tag(*tag);
        }
        for context in contexts {
            d.add_context(*context);
        }
        d
    }

    #[test]
    fn empty_descriptor_is_permanent() {
        let d = CacheDescriptor::new();
        assert!(d.tags().is_empty());
        assert!(d.contexts().is_empty());
        assert_eq!(d.max_age(), MaxAge::Permanent);
    }

    #[test]
    fn merge_unions_tags_and_contexts() {
        let a = descriptor(&["node:1"], &["url.site"], MaxAge::Permanent);
        let b = descriptor(&["node:2"], &["user.permissions"], MaxAge::Permanent);

        let merged = a.merge(&b);
        assert_eq!(merged.tags().len(), 2);
        assert_eq!(merged.contexts().len(), 2);
    }

    #[test]
    fn merge_takes_minimum_max_age() {
        let a = descriptor(&[], &[], MaxAge::Seconds(300));
        let b = descriptor(&[], &[], MaxAge::Seconds(60));
        assert_eq!(a.merge(&b).max_age(), MaxAge::Seconds(60));
    }

    #[test]
    fn permanent_is_merge_identity() {
        let a = descriptor(&[], &[], MaxAge::Permanent);
        let b = descriptor(&[], &[], MaxAge::Seconds(60));
        assert_eq!(a.merge(&b).max_age(), MaxAge::Seconds(60));
        assert_eq!(b.merge(&a).max_age(), MaxAge::Seconds(60));
    }

    #[test]
    fn uncacheable_dominates() {
        let a = descriptor(&[], &[], MaxAge::UNCACHEABLE);
        let b = descriptor(&[], &[], MaxAge::Seconds(3600));
        assert!(a.merge(&b).max_age().is_uncacheable());

        let c = descriptor(&[], &[], MaxAge::Permanent);
        assert!(a.merge(&c).max_age().is_uncacheable());
    }

    #[test]
    fn merge_is_commutative() {
        let a = descriptor(&["a"], &["x"], MaxAge::Seconds(10));
        let b = descriptor(&["b"], &["y"], MaxAge::Seconds(20));
        assert_eq!(a.merge(&b), b.merge(&a));
    }

    #[test]
    fn merge_is_associative() {
        let a = descriptor(&["a"], &[], MaxAge::Seconds(30));
        let b = descriptor(&["b"], &["x"], MaxAge::Permanent);
        let c = descriptor(&["c"], &["y"], MaxAge::Seconds(5));
        assert_eq!(a.merge(&b.merge(&c)), a.merge(&b).merge(&c));
    }

    #[test]
    fn merge_is_idempotent() {
        let a = descriptor(&["a", "b"], &["x"], MaxAge::Seconds(42));
        assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn merge_all_folds_every_descriptor() {
        let descriptors = vec![
            descriptor(&["a"], &[], MaxAge::Permanent),
            descriptor(&["b"], &["x"], MaxAge::Seconds(120)),
            descriptor(&["c"], &[], MaxAge::UNCACHEABLE),
        ];

        let merged = CacheDescriptor::merge_all(&descriptors);
        assert_eq!(merged.tags().len(), 3);
        assert!(merged.max_age().is_uncacheable());

        for d in &descriptors {
            assert!(d.tags().is_subset(merged.tags()));
        }
    }
}
