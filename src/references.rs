//! Best-effort reference notes: which imports a declaration uses and which
//! external names it calls. Not a resolver; names are matched textually.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tree_sitter::Node;

use crate::collector::node_text;
use crate::grammar::Language;

/// Imported name as bound in the file, mapped to its full import path.
pub type ImportBindings = BTreeMap<String, String>;

/// References and calls found in one declaration's subtree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Notes {
    /// Invoked or instantiated names that are neither imported nor declared in the file.
    pub calls: BTreeSet<String>,
    /// Full import paths of imported names mentioned.
    pub references: BTreeSet<String>,
}

/// Collect every import binding in the file.
pub fn import_bindings(language: Language, root: Node<'_>, source: &str) -> ImportBindings {
    let mut bindings = ImportBindings::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let handled = match (language, node.kind()) {
            (Language::Go, "import_declaration") => {
                collect_go_imports(node, source, &mut bindings);
                true
            },
            (Language::Java, "import_declaration") => {
                collect_java_import(node, source, &mut bindings);
                true
            },
            (Language::Python, "import_from_statement") => {
                collect_python_from_import(node, source, &mut bindings);
                true
            },
            (Language::Python, "import_statement") => {
                collect_python_import(node, source, &mut bindings);
                true
            },
            (Language::Rust, "use_declaration") => {
                if let Some(argument) = node.child_by_field_name("argument") {
                    collect_use_tree(argument, "", source, &mut bindings);
                }
                true
            },
            (Language::Tsx | Language::TypeScript, "import_statement") => {
                collect_ts_import(node, source, &mut bindings);
                true
            },
            _ => false,
        };
        if handled {
            continue;
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        // Reverse so the stack pops children in source order.
        stack.extend(children.into_iter().rev());
    }

    return bindings;
}

/// Scan a declaration's subtree for imported names and external calls.
/// `local_names` holds every name declared in the file.
pub fn collect_notes(
    language: Language,
    node: Node<'_>,
    source: &str,
    imports: &ImportBindings,
    local_names: &HashSet<&str>,
) -> Notes {
    let mut notes = Notes::default();
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if is_identifier(language, current.kind())
            && let Some(path) = node_text(current, source).and_then(|t| return imports.get(t))
        {
            notes.references.insert(path.clone());
        }

        if let Some(callee) = callee_name(language, current, source)
            && !local_names.contains(callee)
            && !imports.contains_key(callee)
        {
            notes.calls.insert(callee.to_string());
        }

        let mut cursor = current.walk();
        stack.extend(current.named_children(&mut cursor));
    }

    return notes;
}

/// Node kinds that name a value, type or package in `language`.
fn is_identifier(language: Language, kind: &str) -> bool {
    return match language {
        Language::Go => matches!(kind, "identifier" | "package_identifier" | "type_identifier"),
        Language::Python => kind == "identifier",
        Language::Java | Language::Rust | Language::Tsx | Language::TypeScript => {
            matches!(kind, "identifier" | "type_identifier")
        },
    };
}

/// The bare name invoked by a call or instantiation node, if it is a plain identifier.
/// Method calls on a receiver (`self.save()`, `list.add(x)`) yield nothing.
fn callee_name<'a>(language: Language, node: Node<'_>, source: &'a str) -> Option<&'a str> {
    let callee = match (language, node.kind()) {
        (
            Language::Go | Language::Rust | Language::Tsx | Language::TypeScript,
            "call_expression",
        ) => node.child_by_field_name("function")?,
        (Language::Java, "method_invocation") => {
            if node.child_by_field_name("object").is_some() {
                return None;
            }
            node.child_by_field_name("name")?
        },
        (Language::Java, "object_creation_expression") => {
            let created = node.child_by_field_name("type")?;
            if created.kind() == "generic_type" {
                created.named_child(0)?
            } else {
                created
            }
        },
        (Language::Python, "call") => node.child_by_field_name("function")?,
        (Language::Tsx | Language::TypeScript, "new_expression") => {
            node.child_by_field_name("constructor")?
        },
        _ => return None,
    };

    if !matches!(callee.kind(), "identifier" | "type_identifier") {
        return None;
    }
    return node_text(callee, source);
}

/// Last segment of a dotted or `::`-separated path.
fn last_segment(path: &str) -> &str {
    return path.rsplit(['.', ':', '/']).next().unwrap_or(path);
}

/// Strip the quotes from a string literal node's text.
fn unquote(text: &str) -> &str {
    return text.trim_matches(|c| return matches!(c, '"' | '\'' | '`'));
}

// ── Python ─────────────────────────────────────────────────────────────

/// `import a.b` binds `a`; `import a.b as c` binds `c`.
fn collect_python_import(node: Node<'_>, source: &str, bindings: &mut ImportBindings) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => {
                let path =
                    name.child_by_field_name("name").and_then(|n| return node_text(n, source));
                let alias =
                    name.child_by_field_name("alias").and_then(|n| return node_text(n, source));
                if let (Some(path), Some(alias)) = (path, alias) {
                    bindings.insert(alias.to_string(), path.to_string());
                }
            },
            "dotted_name" => {
                if let Some(path) = node_text(name, source) {
                    let bound = path.split('.').next().unwrap_or(path);
                    bindings.insert(bound.to_string(), path.to_string());
                }
            },
            _ => {},
        }
    }
}

/// `from m import x as y` binds `y` to `m.x`. Wildcards bind nothing.
fn collect_python_from_import(node: Node<'_>, source: &str, bindings: &mut ImportBindings) {
    let Some(module) = node
        .child_by_field_name("module_name")
        .and_then(|m| return node_text(m, source))
    else {
        return;
    };
    let joined = |name: &str| {
        if module.ends_with('.') {
            return format!("{module}{name}");
        }
        return format!("{module}.{name}");
    };

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        match name.kind() {
            "aliased_import" => {
                let path =
                    name.child_by_field_name("name").and_then(|n| return node_text(n, source));
                let alias =
                    name.child_by_field_name("alias").and_then(|n| return node_text(n, source));
                if let (Some(path), Some(alias)) = (path, alias) {
                    bindings.insert(alias.to_string(), joined(path));
                }
            },
            "dotted_name" => {
                if let Some(path) = node_text(name, source) {
                    bindings.insert(last_segment(path).to_string(), joined(path));
                }
            },
            _ => {},
        }
    }
}

// ── Java ───────────────────────────────────────────────────────────────

/// `import a.b.C;` binds `C`. On-demand (`.*`) imports bind nothing.
fn collect_java_import(node: Node<'_>, source: &str, bindings: &mut ImportBindings) {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    if children.iter().any(|c| return c.kind() == "asterisk") {
        return;
    }
    let path = children
        .iter()
        .find(|c| return matches!(c.kind(), "identifier" | "scoped_identifier"))
        .and_then(|c| return node_text(*c, source));
    if let Some(path) = path {
        bindings.insert(last_segment(path).to_string(), path.to_string());
    }
}

// ── Rust ───────────────────────────────────────────────────────────────

/// Walk a `use` tree, binding each leaf under its alias or final segment.
fn collect_use_tree(node: Node<'_>, prefix: &str, source: &str, bindings: &mut ImportBindings) {
    let join = |tail: &str| {
        if prefix.is_empty() {
            return tail.to_string();
        }
        return format!("{prefix}::{tail}");
    };

    match node.kind() {
        "identifier" | "scoped_identifier" => {
            if let Some(path) = node_text(node, source) {
                bindings.insert(last_segment(path).to_string(), join(path));
            }
        },
        "self" => {
            // `use a::b::{self}` binds `b`.
            if !prefix.is_empty() {
                bindings.insert(last_segment(prefix).to_string(), prefix.to_string());
            }
        },
        "use_as_clause" => {
            let path = node.child_by_field_name("path").and_then(|n| return node_text(n, source));
            let alias = node.child_by_field_name("alias").and_then(|n| return node_text(n, source));
            if let (Some(path), Some(alias)) = (path, alias) {
                bindings.insert(alias.to_string(), join(path));
            }
        },
        "scoped_use_list" => {
            let path = node.child_by_field_name("path").and_then(|n| return node_text(n, source));
            let nested = match path {
                Some(path) => join(path),
                None => prefix.to_string(),
            };
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_tree(list, &nested, source, bindings);
            }
        },
        "use_list" => {
            let mut cursor = node.walk();
            for item in node.named_children(&mut cursor) {
                collect_use_tree(item, prefix, source, bindings);
            }
        },
        _ => {},
    }
}

// ── TypeScript ─────────────────────────────────────────────────────────

/// Default, named (`{ a as b }`) and namespace (`* as ns`) imports.
fn collect_ts_import(node: Node<'_>, source: &str, bindings: &mut ImportBindings) {
    let Some(module) = node
        .child_by_field_name("source")
        .and_then(|s| return node_text(s, source))
        .map(unquote)
    else {
        return;
    };

    let mut cursor = node.walk();
    let Some(clause) = node
        .named_children(&mut cursor)
        .find(|c| return c.kind() == "import_clause")
    else {
        return;
    };

    let mut clause_cursor = clause.walk();
    for part in clause.named_children(&mut clause_cursor) {
        match part.kind() {
            "identifier" => {
                if let Some(name) = node_text(part, source) {
                    bindings.insert(name.to_string(), module.to_string());
                }
            },
            "named_imports" => collect_ts_named_imports(part, module, source, bindings),
            "namespace_import" => {
                let name = part
                    .named_child(0)
                    .and_then(|n| return node_text(n, source));
                if let Some(name) = name {
                    bindings.insert(name.to_string(), module.to_string());
                }
            },
            _ => {},
        }
    }
}

/// Bind each `import_specifier` of a `{ ... }` clause.
fn collect_ts_named_imports(
    node: Node<'_>,
    module: &str,
    source: &str,
    bindings: &mut ImportBindings,
) {
    let mut cursor = node.walk();
    for specifier in node.named_children(&mut cursor) {
        if specifier.kind() != "import_specifier" {
            continue;
        }
        let Some(name) = specifier
            .child_by_field_name("name")
            .and_then(|n| return node_text(n, source))
        else {
            continue;
        };
        let bound = specifier
            .child_by_field_name("alias")
            .and_then(|n| return node_text(n, source))
            .unwrap_or(name);
        bindings.insert(bound.to_string(), format!("{module}.{name}"));
    }
}

// ── Go ─────────────────────────────────────────────────────────────────

/// Single and grouped import specs. Blank (`_`) and dot imports bind nothing.
fn collect_go_imports(node: Node<'_>, source: &str, bindings: &mut ImportBindings) {
    let mut specs = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => {
                let mut list_cursor = child.walk();
                specs.extend(
                    child
                        .named_children(&mut list_cursor)
                        .filter(|s| return s.kind() == "import_spec"),
                );
            },
            _ => {},
        }
    }

    for spec in specs {
        let Some(path) = spec
            .child_by_field_name("path")
            .and_then(|p| return node_text(p, source))
            .map(unquote)
        else {
            continue;
        };
        let alias = spec.child_by_field_name("name").and_then(|n| return node_text(n, source));
        let bound = match alias {
            Some("_" | ".") => continue,
            Some(alias) => alias,
            None => last_segment(path),
        };
        bindings.insert(bound.to_string(), path.to_string());
    }
}
