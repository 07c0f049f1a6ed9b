//! Command registry: the tree of groups and commands behind the CLI.
//!
//! Paths are space-separated names (`"create import"`). Every command entry
//! holds an `Arc<dyn CommandHandler>`; an alias clones that `Arc`, so both
//! names always run the very same handler. Registration order is kept and
//! drives help and listings.

use std::sync::Arc;

use crate::lib::errors::RegistrationError;

use super::{handler::CommandHandler, router::CommandRouter};

/// Shared reference to a handler.
pub type SharedHandler = Arc<dyn CommandHandler>;

const MAX_NAME_LEN: usize = 64;

/// Whether a registration shows up in help and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Resolvable by exact name only.
    Hidden,
}

pub(crate) enum Node {
    Group(GroupNode),
    Command(CommandEntry),
}

impl Node {
    pub(crate) fn name(&self) -> &str {
        match self {
            Node::Group(group) => &group.name,
            Node::Command(entry) => &entry.name,
        }
    }

    pub(crate) fn is_hidden(&self) -> bool {
        match self {
            Node::Group(_) => false,
            Node::Command(entry) => entry.hidden,
        }
    }
}

pub(crate) struct GroupNode {
    pub(crate) name: String,
    pub(crate) about: String,
    pub(crate) children: Vec<Node>,
}

impl GroupNode {
    fn new(name: &str, about: &str) -> Self {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            children: Vec::new(),
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|node| node.name() == name)
    }

    fn child_group_mut(&mut self, name: &str) -> Option<&mut GroupNode> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Group(group) if group.name == name => Some(group),
            _ => None,
        })
    }

    /// Names of visible children, in registration order.
    pub(crate) fn visible_names(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|node| !node.is_hidden())
            .map(|node| node.name().to_string())
            .collect()
    }

    fn collect_visible(&self, prefix: &str, out: &mut Vec<String>) {
        for node in self.children.iter().filter(|node| !node.is_hidden()) {
            let path = join_path(prefix, node.name());
            match node {
                Node::Group(group) => group.collect_visible(&path, out),
                Node::Command(_) => out.push(path),
            }
        }
    }
}

pub(crate) struct CommandEntry {
    pub(crate) name: String,
    pub(crate) handler: SharedHandler,
    pub(crate) hidden: bool,
}

/// Builder for the command tree. Consumed by [`CommandRegistry::into_router`].
pub struct CommandRegistry {
    root: GroupNode,
}

impl CommandRegistry {
    pub fn new(name: &str, about: &str) -> Self {
        Self {
            root: GroupNode::new(name, about),
        }
    }

    /// Name of the root application.
    pub fn name(&self) -> &str {
        &self.root.name
    }

    /// Declare a group. Declaring an existing group again is a no-op.
    pub fn group(&mut self, path: &str, about: &str) -> Result<(), RegistrationError> {
        let (parents, leaf) = split_path(path)?;
        let parent = self.parent_mut(&parents)?;
        if let Some(node) = parent.child(leaf) {
            return match node {
                Node::Group(_) => Ok(()),
                Node::Command(_) => Err(RegistrationError::NameConflict {
                    path: normalize(path),
                    existing: "command",
                }),
            };
        }
        parent
            .children
            .push(Node::Group(GroupNode::new(leaf, about)));
        Ok(())
    }

    /// Bind `path` to `handler`. Registering the same handler twice is a
    /// no-op; a different handler under a taken name is an error.
    pub fn register(
        &mut self,
        path: &str,
        handler: SharedHandler,
        visibility: Visibility,
    ) -> Result<(), RegistrationError> {
        let (parents, leaf) = split_path(path)?;
        let parent = self.parent_mut(&parents)?;
        if let Some(node) = parent.child(leaf) {
            return match node {
                Node::Command(entry) if same_handler(&entry.handler, &handler) => {
                    if entry.hidden == (visibility == Visibility::Hidden) {
                        Ok(())
                    } else {
                        Err(RegistrationError::VisibilityConflict {
                            path: normalize(path),
                        })
                    }
                }
                Node::Command(_) => Err(RegistrationError::DuplicateCommand {
                    path: normalize(path),
                }),
                Node::Group(_) => Err(RegistrationError::NameConflict {
                    path: normalize(path),
                    existing: "group",
                }),
            };
        }
        parent.children.push(Node::Command(CommandEntry {
            name: leaf.to_string(),
            handler,
            hidden: visibility == Visibility::Hidden,
        }));
        Ok(())
    }

    /// Register `new_path` with the handler already bound to `existing`.
    pub fn alias(
        &mut self,
        existing: &str,
        new_path: &str,
        visibility: Visibility,
    ) -> Result<(), RegistrationError> {
        let handler = self
            .resolve(existing)
            .ok_or_else(|| RegistrationError::UnknownAliasTarget {
                path: normalize(existing),
            })?;
        self.register(new_path, handler, visibility)
    }

    /// Handler bound to `path`, if `path` names a command.
    pub fn resolve(&self, path: &str) -> Option<SharedHandler> {
        let mut group = &self.root;
        let mut names = path.split_whitespace().peekable();
        while let Some(name) = names.next() {
            match group.child(name)? {
                Node::Group(next) => group = next,
                Node::Command(entry) if names.peek().is_none() => {
                    return Some(Arc::clone(&entry.handler))
                }
                Node::Command(_) => return None,
            }
        }
        None
    }

    /// Full paths of every visible command, in registration order.
    pub fn visible_commands(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_visible("", &mut out);
        out
    }

    pub fn into_router(self) -> CommandRouter {
        CommandRouter::new(self)
    }

    pub(crate) fn root(&self) -> &GroupNode {
        &self.root
    }

    fn parent_mut(&mut self, parents: &[&str]) -> Result<&mut GroupNode, RegistrationError> {
        let mut group = &mut self.root;
        for (depth, name) in parents.iter().enumerate() {
            group = group
                .child_group_mut(name)
                .ok_or_else(|| RegistrationError::UnknownGroup {
                    path: parents[..=depth].join(" "),
                })?;
        }
        Ok(group)
    }
}

/// Compare handler identity, ignoring vtable differences.
pub fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn split_path(path: &str) -> Result<(Vec<&str>, &str), RegistrationError> {
    let mut names: Vec<&str> = path.split_whitespace().collect();
    let leaf = names.pop().ok_or(RegistrationError::InvalidName {
        name: path.to_string(),
        reason: "name must not be empty",
    })?;
    for name in names.iter().chain(std::iter::once(&leaf)) {
        validate_name(name)?;
    }
    Ok((names, leaf))
}

fn validate_name(name: &str) -> Result<(), RegistrationError> {
    let reason = if name.len() > MAX_NAME_LEN {
        Some("name is too long")
    } else if name.starts_with('-') {
        Some("name must not start with `-`")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some("only ASCII letters, digits, `-` and `_` are allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(RegistrationError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn normalize(path: &str) -> String {
    path.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix} {name}")
    }
}
