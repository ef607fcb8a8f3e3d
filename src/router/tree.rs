//! A compressed-prefix ("radix") trie over `/`-delimited URL paths, storing
//! one leaf value per registered pattern.
//!
//! Node children come in three disjoint kinds: literal byte-prefix branches
//! (no two of which may share a first character -- the central invariant
//! that makes matching deterministic and backtracking-free), a single
//! placeholder branch (`:name`, matches one path segment), and a single
//! deep-wildcard branch (`*`, matches the remainder of the path including
//! any `/` characters). A node holds at most one of {placeholder, deep}.

use crate::error::RegistrationError;

/// One `/`-delimited capture taken from a placeholder or wildcard segment.
pub type Capture = (String, String);

struct Branch<T> {
    prefix: String,
    child: Box<Node<T>>,
}

struct Placeholder<T> {
    name: String,
    child: Box<Node<T>>,
}

struct DeepWildcard<T> {
    name: String,
    leaf: T,
}

/// A single node in the tree.
struct Node<T> {
    terminal: Option<T>,
    literals: Vec<Branch<T>>,
    placeholder: Option<Placeholder<T>>,
    deep: Option<DeepWildcard<T>>,
}

impl<T> Node<T> {
    fn empty() -> Self {
        Node {
            terminal: None,
            literals: Vec::new(),
            placeholder: None,
            deep: None,
        }
    }

    fn has_wildcard(&self) -> bool {
        self.placeholder.is_some() || self.deep.is_some()
    }
}

/// A compressed trie mapping `/`-rooted path patterns to leaves of type `T`.
pub struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Tree { root: Node::empty() }
    }
}

impl<T> Tree<T> {
    /// An empty tree.
    pub fn new() -> Self {
        Tree::default()
    }

    /// Registers `leaf` at `pattern`, which must start with `/`. `pattern`
    /// is echoed back in any [`RegistrationError`] for diagnostics.
    pub fn insert(&mut self, pattern: &str, leaf: T) -> Result<(), RegistrationError> {
        let suffix = pattern.strip_prefix('/').unwrap_or(pattern);
        insert_at(&mut self.root, suffix, leaf, pattern)
    }

    /// Inserts at `pattern` if no terminal exists there yet (via
    /// `make_default`), otherwise mutates the existing terminal in place
    /// via `update`. Used by the router's methods-index tree, whose leaves
    /// accumulate one entry per HTTP method registered at the same path.
    pub fn upsert(
        &mut self,
        pattern: &str,
        make_default: impl FnOnce() -> T,
        update: impl FnOnce(&mut T),
    ) -> Result<(), RegistrationError> {
        let suffix = pattern.strip_prefix('/').unwrap_or(pattern);
        upsert_at(&mut self.root, suffix, make_default, update)
    }

    /// Matches `path` (with or without a leading `/`) against the tree,
    /// returning the leaf and ordered captures on success.
    pub fn matches(&self, path: &str) -> Option<(&T, Vec<Capture>)> {
        let suffix = path.strip_prefix('/').unwrap_or(path);
        let mut captures = Vec::new();
        let leaf = match_at(&self.root, suffix, &mut captures)?;
        Some((leaf, captures))
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// The position of the first `:` or `*` in `s`, if any lies strictly after
/// the start (a leading `:`/`*` is handled by the caller before this is
/// ever consulted).
fn first_wildcard_marker(s: &str) -> Option<usize> {
    s.char_indices()
        .skip(1)
        .find(|&(_, c)| c == ':' || c == '*')
        .map(|(i, _)| i)
}

fn placeholder_token(s: &str) -> (&str, &str) {
    match s.find('/') {
        Some(i) => (&s[1..i], &s[i..]),
        None => (&s[1..], ""),
    }
}

fn insert_at<T>(node: &mut Node<T>, s: &str, leaf: T, pattern: &str) -> Result<(), RegistrationError> {
    if s.is_empty() {
        if node.terminal.is_some() {
            return Err(RegistrationError::DuplicateRoute(pattern.to_string()));
        }
        node.terminal = Some(leaf);
        return Ok(());
    }

    if let Some(rest) = s.strip_prefix('*') {
        if !rest.is_empty() {
            return Err(RegistrationError::AmbiguousWildcard(pattern.to_string()));
        }
        if node.has_wildcard() {
            return Err(RegistrationError::AmbiguousWildcard(pattern.to_string()));
        }
        node.deep = Some(DeepWildcard {
            name: "*".to_string(),
            leaf,
        });
        return Ok(());
    }

    if s.starts_with(':') {
        let (name, remainder) = placeholder_token(s);
        match (&mut node.placeholder, &node.deep) {
            (_, Some(_)) => Err(RegistrationError::AmbiguousWildcard(pattern.to_string())),
            (Some(existing), None) => {
                if !existing.name.is_empty() && !name.is_empty() && existing.name != name {
                    return Err(RegistrationError::PlaceholderConflict(
                        pattern.to_string(),
                        existing.name.clone(),
                        name.to_string(),
                    ));
                }
                if existing.name.is_empty() && !name.is_empty() {
                    existing.name = name.to_string();
                }
                insert_at(&mut existing.child, remainder, leaf, pattern)
            }
            (None, None) => {
                let mut child = Box::new(Node::empty());
                insert_at(&mut child, remainder, leaf, pattern)?;
                node.placeholder = Some(Placeholder {
                    name: name.to_string(),
                    child,
                });
                Ok(())
            }
        }
    } else {
        insert_literal(node, s, leaf, pattern)
    }
}

fn insert_literal<T>(node: &mut Node<T>, s: &str, leaf: T, pattern: &str) -> Result<(), RegistrationError> {
    let first = s.as_bytes()[0];
    if let Some(idx) = node.literals.iter().position(|b| b.prefix.as_bytes()[0] == first) {
        let p = common_prefix_len(&node.literals[idx].prefix, s);
        let branch_len = node.literals[idx].prefix.len();

        if p == branch_len && p == s.len() {
            return insert_at(&mut node.literals[idx].child, "", leaf, pattern);
        }
        if p == branch_len {
            return insert_at(&mut node.literals[idx].child, &s[p..], leaf, pattern);
        }
        if p == s.len() {
            // s is a strict prefix of the existing branch: split, hoisting
            // a new intermediate node that carries `leaf` as its terminal.
            let old = node.literals.remove(idx);
            let tail = old.prefix[p..].to_string();
            let mut intermediate = Box::new(Node::empty());
            intermediate.terminal = Some(leaf);
            intermediate.literals.push(Branch {
                prefix: tail,
                child: old.child,
            });
            node.literals.push(Branch {
                prefix: s.to_string(),
                child: intermediate,
            });
            return Ok(());
        }

        // Partial overlap: split at the common prefix and recurse the
        // residual suffix into the new intermediate node.
        let old = node.literals.remove(idx);
        let common = old.prefix[..p].to_string();
        let old_tail = old.prefix[p..].to_string();
        let mut intermediate = Box::new(Node::empty());
        intermediate.literals.push(Branch {
            prefix: old_tail,
            child: old.child,
        });
        insert_at(&mut intermediate, &s[p..], leaf, pattern)?;
        node.literals.push(Branch {
            prefix: common,
            child: intermediate,
        });
        return Ok(());
    }

    match first_wildcard_marker(s) {
        Some(p) => {
            let prefix = s[..p].to_string();
            let mut child = Box::new(Node::empty());
            insert_at(&mut child, &s[p..], leaf, pattern)?;
            node.literals.push(Branch { prefix, child });
        }
        None => {
            let mut child = Box::new(Node::empty());
            child.terminal = Some(leaf);
            node.literals.push(Branch {
                prefix: s.to_string(),
                child,
            });
        }
    }
    Ok(())
}

fn upsert_at<T>(
    node: &mut Node<T>,
    s: &str,
    make_default: impl FnOnce() -> T,
    update: impl FnOnce(&mut T),
) -> Result<(), RegistrationError> {
    if s.is_empty() {
        match &mut node.terminal {
            Some(existing) => update(existing),
            None => node.terminal = Some(make_default()),
        }
        return Ok(());
    }

    if let Some(rest) = s.strip_prefix('*') {
        if !rest.is_empty() {
            return Err(RegistrationError::AmbiguousWildcard(s.to_string()));
        }
        match &mut node.deep {
            Some(existing) => update(&mut existing.leaf),
            None => {
                if node.placeholder.is_some() {
                    return Err(RegistrationError::AmbiguousWildcard(s.to_string()));
                }
                node.deep = Some(DeepWildcard {
                    name: "*".to_string(),
                    leaf: make_default(),
                });
            }
        }
        return Ok(());
    }

    if s.starts_with(':') {
        let (name, remainder) = placeholder_token(s);
        if node.deep.is_some() {
            return Err(RegistrationError::AmbiguousWildcard(s.to_string()));
        }
        if node.placeholder.is_none() {
            node.placeholder = Some(Placeholder {
                name: name.to_string(),
                child: Box::new(Node::empty()),
            });
        } else if let Some(existing) = &mut node.placeholder {
            if existing.name.is_empty() && !name.is_empty() {
                existing.name = name.to_string();
            }
        }
        let child = &mut node.placeholder.as_mut().unwrap().child;
        return upsert_at(child, remainder, make_default, update);
    }

    upsert_literal(node, s, make_default, update)
}

fn upsert_literal<T>(
    node: &mut Node<T>,
    s: &str,
    make_default: impl FnOnce() -> T,
    update: impl FnOnce(&mut T),
) -> Result<(), RegistrationError> {
    let first = s.as_bytes()[0];
    if let Some(idx) = node.literals.iter().position(|b| b.prefix.as_bytes()[0] == first) {
        let p = common_prefix_len(&node.literals[idx].prefix, s);
        let branch_len = node.literals[idx].prefix.len();

        if p == branch_len && p == s.len() {
            return upsert_at(&mut node.literals[idx].child, "", make_default, update);
        }
        if p == branch_len {
            return upsert_at(&mut node.literals[idx].child, &s[p..], make_default, update);
        }
        if p == s.len() {
            let old = node.literals.remove(idx);
            let tail = old.prefix[p..].to_string();
            let mut intermediate = Box::new(Node::empty());
            intermediate.terminal = Some(make_default());
            intermediate.literals.push(Branch {
                prefix: tail,
                child: old.child,
            });
            node.literals.push(Branch {
                prefix: s.to_string(),
                child: intermediate,
            });
            return Ok(());
        }

        let old = node.literals.remove(idx);
        let common = old.prefix[..p].to_string();
        let old_tail = old.prefix[p..].to_string();
        let mut intermediate = Box::new(Node::empty());
        intermediate.literals.push(Branch {
            prefix: old_tail,
            child: old.child,
        });
        upsert_at(&mut intermediate, &s[p..], make_default, update)?;
        node.literals.push(Branch {
            prefix: common,
            child: intermediate,
        });
        return Ok(());
    }

    match first_wildcard_marker(s) {
        Some(p) => {
            let prefix = s[..p].to_string();
            let mut child = Box::new(Node::empty());
            upsert_at(&mut child, &s[p..], make_default, update)?;
            node.literals.push(Branch { prefix, child });
        }
        None => {
            let mut child = Box::new(Node::empty());
            child.terminal = Some(make_default());
            node.literals.push(Branch {
                prefix: s.to_string(),
                child,
            });
        }
    }
    Ok(())
}

fn match_at<'a, T>(node: &'a Node<T>, s: &str, captures: &mut Vec<Capture>) -> Option<&'a T> {
    if s.is_empty() {
        if let Some(leaf) = &node.terminal {
            return Some(leaf);
        }
        if let Some(deep) = &node.deep {
            captures.push((deep.name.clone(), String::new()));
            return Some(&deep.leaf);
        }
        return None;
    }

    for branch in &node.literals {
        if let Some(remainder) = s.strip_prefix(branch.prefix.as_str()) {
            if let Some(leaf) = match_at(&branch.child, remainder, captures) {
                return Some(leaf);
            }
        }
    }

    if let Some(placeholder) = &node.placeholder {
        let (value, remainder) = match s.find('/') {
            Some(i) => (&s[..i], &s[i..]),
            None => (s, ""),
        };
        captures.push((placeholder.name.clone(), value.to_string()));
        if let Some(leaf) = match_at(&placeholder.child, remainder, captures) {
            return Some(leaf);
        }
        captures.pop();
    }

    if let Some(deep) = &node.deep {
        captures.push((deep.name.clone(), s.to_string()));
        return Some(&deep.leaf);
    }

    None
}
