//! Plain-text operations: the payload carried by every [`crate::Operation`].
//!
//! A `TextOp` walks the whole document from left to right. Each component either
//! keeps (`Retain`), adds (`Insert`) or removes (`Delete`) characters, so an op
//! knows the exact length of the document it applies to (`base_len`) and of the
//! document it produces (`target_len`). All lengths count `char`s, not bytes.
//!
//! The builder keeps ops canonical: no empty components, adjacent components of
//! the same kind merged, and an insert always placed before a neighbouring delete.
//! Two ops with the same effect therefore compare equal.

use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Retain(usize),
    Insert(String),
    Delete(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextOp {
    components: Vec<Component>,
    base_len: usize,
    target_len: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after the first `n` chars.
fn split_chars(s: &str, n: usize) -> (&str, &str) {
    let at = s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len());
    s.split_at(at)
}

impl TextOp {
    pub fn new() -> Self {
        Self::default()
    }

    /// The op that leaves a document of `len` chars untouched.
    pub fn identity(len: usize) -> Self {
        Self::new().retain(len)
    }

    /// Rebuild an op from raw components, normalizing as it goes.
    pub fn from_components(components: impl IntoIterator<Item = Component>) -> Self {
        let mut op = Self::new();
        for component in components {
            op.push(component);
        }
        op
    }

    pub fn retain(mut self, n: usize) -> Self {
        self.push_retain(n);
        self
    }

    pub fn insert(mut self, text: &str) -> Self {
        self.push_insert(text);
        self
    }

    pub fn delete(mut self, n: usize) -> Self {
        self.push_delete(n);
        self
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Length of the document this op applies to.
    pub fn base_len(&self) -> usize {
        self.base_len
    }

    /// Length of the document this op produces.
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// True when applying the op changes nothing.
    pub fn is_noop(&self) -> bool {
        self.components
            .iter()
            .all(|c| matches!(c, Component::Retain(_)))
    }

    fn push(&mut self, component: Component) {
        match component {
            Component::Retain(n) => self.push_retain(n),
            Component::Insert(s) => self.push_insert(&s),
            Component::Delete(n) => self.push_delete(n),
        }
    }

    fn push_retain(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.base_len += n;
        self.target_len += n;
        match self.components.last_mut() {
            Some(Component::Retain(prev)) => *prev += n,
            _ => self.components.push(Component::Retain(n)),
        }
    }

    fn push_insert(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.target_len += char_len(text);
        let len = self.components.len();
        match self.components.as_mut_slice() {
            [.., Component::Insert(prev)] => prev.push_str(text),
            [.., Component::Insert(prev), Component::Delete(_)] => prev.push_str(text),
            [.., Component::Delete(_)] => self
                .components
                .insert(len - 1, Component::Insert(text.to_owned())),
            _ => self.components.push(Component::Insert(text.to_owned())),
        }
    }

    fn push_delete(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.base_len += n;
        match self.components.last_mut() {
            Some(Component::Delete(prev)) => *prev += n,
            _ => self.components.push(Component::Delete(n)),
        }
    }

    /// Apply to `doc`. Returns `None` when `doc` is not `base_len` chars long.
    pub fn apply(&self, doc: &str) -> Option<String> {
        if char_len(doc) != self.base_len {
            return None;
        }
        let mut out = String::with_capacity(doc.len());
        let mut rest = doc;
        for component in &self.components {
            match component {
                Component::Retain(n) => {
                    let (kept, tail) = split_chars(rest, *n);
                    out.push_str(kept);
                    rest = tail;
                }
                Component::Insert(text) => out.push_str(text),
                Component::Delete(n) => rest = split_chars(rest, *n).1,
            }
        }
        out.push_str(rest);
        Some(out)
    }

    /// A single op with the effect of `self` followed by `next`.
    ///
    /// Undefined, and `None`, unless `next` applies to the document `self` produces.
    pub fn compose(&self, next: &TextOp) -> Option<TextOp> {
        if self.target_len != next.base_len {
            return None;
        }
        let mut out = TextOp::new();
        let mut first = self.components.iter().cloned();
        let mut second = next.components.iter().cloned();
        let mut c1 = first.next();
        let mut c2 = second.next();

        loop {
            match (c1.take(), c2.take()) {
                (None, None) => break,
                (Some(Component::Delete(n)), pending) => {
                    out.push_delete(n);
                    c1 = first.next();
                    c2 = pending;
                }
                (pending, Some(Component::Insert(text))) => {
                    out.push_insert(&text);
                    c1 = pending;
                    c2 = second.next();
                }
                (None, _) | (_, None) => return None,
                (Some(Component::Retain(n)), Some(Component::Retain(m))) => {
                    out.push_retain(n.min(m));
                    (c1, c2) = match n.cmp(&m) {
                        Ordering::Greater => (Some(Component::Retain(n - m)), second.next()),
                        Ordering::Less => (first.next(), Some(Component::Retain(m - n))),
                        Ordering::Equal => (first.next(), second.next()),
                    };
                }
                (Some(Component::Retain(n)), Some(Component::Delete(m))) => {
                    out.push_delete(n.min(m));
                    (c1, c2) = match n.cmp(&m) {
                        Ordering::Greater => (Some(Component::Retain(n - m)), second.next()),
                        Ordering::Less => (first.next(), Some(Component::Delete(m - n))),
                        Ordering::Equal => (first.next(), second.next()),
                    };
                }
                (Some(Component::Insert(text)), Some(Component::Retain(m))) => {
                    let len = char_len(&text);
                    let (kept, tail) = split_chars(&text, m);
                    out.push_insert(kept);
                    (c1, c2) = match len.cmp(&m) {
                        Ordering::Greater => {
                            (Some(Component::Insert(tail.to_owned())), second.next())
                        }
                        Ordering::Less => (first.next(), Some(Component::Retain(m - len))),
                        Ordering::Equal => (first.next(), second.next()),
                    };
                }
                // Text inserted by `self` and removed again by `next` cancels out.
                (Some(Component::Insert(text)), Some(Component::Delete(m))) => {
                    let len = char_len(&text);
                    (c1, c2) = match len.cmp(&m) {
                        Ordering::Greater => (
                            Some(Component::Insert(split_chars(&text, m).1.to_owned())),
                            second.next(),
                        ),
                        Ordering::Less => (first.next(), Some(Component::Delete(m - len))),
                        Ordering::Equal => (first.next(), second.next()),
                    };
                }
            }
        }
        Some(out)
    }

    /// Transform two concurrent ops against each other.
    ///
    /// Returns `(a', b')` such that `a` then `b'` and `b` then `a'` produce the same
    /// document. When both insert at the same position, `b`'s text ends up first;
    /// callers pass the op the sequencer has already ordered as `b`. `None` when
    /// the ops do not share a base length and therefore cannot be concurrent.
    pub fn transform(a: &TextOp, b: &TextOp) -> Option<(TextOp, TextOp)> {
        if a.base_len != b.base_len {
            return None;
        }
        let mut a_prime = TextOp::new();
        let mut b_prime = TextOp::new();
        let mut left = a.components.iter().cloned();
        let mut right = b.components.iter().cloned();
        let mut c1 = left.next();
        let mut c2 = right.next();

        loop {
            match (c1.take(), c2.take()) {
                (None, None) => break,
                (pending, Some(Component::Insert(text))) => {
                    a_prime.push_retain(char_len(&text));
                    b_prime.push_insert(&text);
                    c1 = pending;
                    c2 = right.next();
                }
                (Some(Component::Insert(text)), pending) => {
                    a_prime.push_insert(&text);
                    b_prime.push_retain(char_len(&text));
                    c1 = left.next();
                    c2 = pending;
                }
                (None, _) | (_, None) => return None,
                (Some(Component::Retain(n)), Some(Component::Retain(m))) => {
                    let min = n.min(m);
                    a_prime.push_retain(min);
                    b_prime.push_retain(min);
                    (c1, c2) = split_remainders(
                        Component::Retain(n),
                        Component::Retain(m),
                        &mut left,
                        &mut right,
                    );
                }
                // Both removed the same chars; neither side has anything left to do.
                (Some(Component::Delete(n)), Some(Component::Delete(m))) => {
                    (c1, c2) = split_remainders(
                        Component::Delete(n),
                        Component::Delete(m),
                        &mut left,
                        &mut right,
                    );
                }
                (Some(Component::Delete(n)), Some(Component::Retain(m))) => {
                    a_prime.push_delete(n.min(m));
                    (c1, c2) = split_remainders(
                        Component::Delete(n),
                        Component::Retain(m),
                        &mut left,
                        &mut right,
                    );
                }
                (Some(Component::Retain(n)), Some(Component::Delete(m))) => {
                    b_prime.push_delete(n.min(m));
                    (c1, c2) = split_remainders(
                        Component::Retain(n),
                        Component::Delete(m),
                        &mut left,
                        &mut right,
                    );
                }
            }
        }
        Some((a_prime, b_prime))
    }
}

/// Consume the overlapping prefix of two counted components, keeping whatever is
/// left of the longer one and pulling the next component for the exhausted side.
fn split_remainders(
    c1: Component,
    c2: Component,
    left: &mut impl Iterator<Item = Component>,
    right: &mut impl Iterator<Item = Component>,
) -> (Option<Component>, Option<Component>) {
    let n = counted_len(&c1);
    let m = counted_len(&c2);
    match n.cmp(&m) {
        Ordering::Greater => (Some(with_len(c1, n - m)), right.next()),
        Ordering::Less => (left.next(), Some(with_len(c2, m - n))),
        Ordering::Equal => (left.next(), right.next()),
    }
}

fn counted_len(component: &Component) -> usize {
    match component {
        Component::Retain(n) | Component::Delete(n) => *n,
        Component::Insert(text) => char_len(text),
    }
}

// Only retains and deletes are ever split by length.
fn with_len(component: Component, n: usize) -> Component {
    match component {
        Component::Retain(_) => Component::Retain(n),
        Component::Delete(_) => Component::Delete(n),
        insert => insert,
    }
}
