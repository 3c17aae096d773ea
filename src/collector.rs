//! Declaration discovery: walk a tree-sitter CST and list every sliceable
//! declaration in appearance order, outer before inner.

use tree_sitter::Node;

use crate::grammar::Language;
use crate::types::SymbolKind;

/// A raw declaration found while walking the CST.
pub struct Declaration<'tree> {
    /// Last line, 1-indexed, inclusive.
    pub end_line: usize,
    /// Symbol kind the declaration maps to.
    pub kind: SymbolKind,
    /// Unqualified name.
    pub name: String,
    /// Node whose subtree is scanned for references.
    pub node: Node<'tree>,
    /// Enclosing scope, if any.
    pub owner: Option<Owner>,
    /// First line, 1-indexed.
    pub start_line: usize,
}

/// Enclosing scope of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Scope is another declaration, by index into the collected list.
    Declared(usize),
    /// Scope is a type not declared in the file (or declared after its use),
    /// such as the target of a Rust `impl` or a Go method receiver.
    External {
        /// Type name.
        name: String,
        /// Declared scope the external type name is nested in.
        within: Option<usize>,
    },
}

/// Dispatch to the correct collector for `language`.
pub fn collect_declarations<'tree>(
    language: Language,
    root: Node<'tree>,
    source: &str,
) -> Vec<Declaration<'tree>> {
    let mut declarations = Vec::new();
    match language {
        Language::Go => collect_go_declarations(root, source, &mut declarations),
        Language::Java => walk_java_body(root, source, None, &mut declarations),
        Language::Python => walk_python_block(root, source, None, &mut declarations),
        Language::Rust => walk_rust_items(root, source, None, &mut declarations),
        Language::Tsx | Language::TypeScript => {
            walk_ts_statements(root, source, None, &mut declarations);
        },
    }
    return declarations;
}

/// 1-indexed inclusive line range of a node. A node that ends at column 0
/// (its trailing newline) ends on the previous line.
pub fn line_range(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position().row.saturating_add(1);
    let end_position = node.end_position();
    let end = if end_position.column == 0 && end_position.row > node.start_position().row {
        end_position.row
    } else {
        end_position.row.saturating_add(1)
    };
    return (start, end.max(start));
}

/// UTF-8 text of a node, or `None` if it is not valid.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    return node.utf8_text(source.as_bytes()).ok();
}

/// Text of the node's `name` field.
fn field_name(node: Node<'_>, source: &str) -> Option<String> {
    let name_node = node.child_by_field_name("name")?;
    return node_text(name_node, source).map(String::from);
}

/// Record a declaration spanning `range_node` and return its index.
fn push_declaration<'tree>(
    declarations: &mut Vec<Declaration<'tree>>,
    range_node: Node<'tree>,
    kind: SymbolKind,
    name: String,
    owner: Option<Owner>,
) -> usize {
    let (start_line, end_line) = line_range(range_node);
    let index = declarations.len();
    declarations.push(Declaration {
        end_line,
        kind,
        name,
        node: range_node,
        owner,
        start_line,
    });
    return index;
}

/// Functions nested in a scope are methods; at top level they are free functions.
const fn function_kind(owner: Option<usize>) -> SymbolKind {
    return if owner.is_some() { SymbolKind::Method } else { SymbolKind::Function };
}

/// Resolve the owner of a method attached to a type by name (Rust `impl`, Go receiver).
/// Prefers a class-like declaration with that name in the same scope.
fn owner_by_type_name(
    declarations: &[Declaration<'_>],
    name: &str,
    within: Option<usize>,
) -> Owner {
    let declared = declarations.iter().position(|d| {
        let same_scope = match (&d.owner, within) {
            (None, None) => true,
            (Some(Owner::Declared(i)), Some(w)) => *i == w,
            _ => false,
        };
        return d.kind == SymbolKind::Class && d.name == name && same_scope;
    });
    return match declared {
        Some(index) => Owner::Declared(index),
        None => Owner::External {
            name: name.to_string(),
            within,
        },
    };
}

/// First node of `kind` in a pre-order walk of `node`'s subtree.
fn first_descendant_of_kind<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = first_descendant_of_kind(child, kind) {
            return Some(found);
        }
    }
    return None;
}

// ── Python ─────────────────────────────────────────────────────────────

/// Collect classes and functions from a module or class body.
/// Decorators are part of the declaration's range. Function bodies are not entered.
fn walk_python_block<'tree>(
    block: Node<'tree>,
    source: &str,
    owner: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        let definition = if child.kind() == "decorated_definition" {
            let Some(inner) = child.child_by_field_name("definition") else {
                continue;
            };
            inner
        } else {
            child
        };
        let Some(name) = field_name(definition, source) else {
            continue;
        };

        match definition.kind() {
            "class_definition" => {
                let scope = owner.map(Owner::Declared);
                let index = push_declaration(declarations, child, SymbolKind::Class, name, scope);
                if let Some(body) = definition.child_by_field_name("body") {
                    walk_python_block(body, source, Some(index), declarations);
                }
            },
            "function_definition" => {
                let kind = function_kind(owner);
                push_declaration(declarations, child, kind, name, owner.map(Owner::Declared));
            },
            _ => {},
        }
    }
}

// ── Java ───────────────────────────────────────────────────────────────

/// Java type declarations that open a scope.
const JAVA_TYPE_KINDS: &[&str] = &[
    "annotation_type_declaration",
    "class_declaration",
    "enum_declaration",
    "interface_declaration",
    "record_declaration",
];

/// Collect types and their members from a compilation unit or type body.
fn walk_java_body<'tree>(
    body: Node<'tree>,
    source: &str,
    owner: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let kind = child.kind();
        let scope = owner.map(Owner::Declared);

        if JAVA_TYPE_KINDS.contains(&kind) {
            let Some(name) = field_name(child, source) else {
                continue;
            };
            let index = push_declaration(declarations, child, SymbolKind::Class, name, scope);
            if let Some(type_body) = child.child_by_field_name("body") {
                walk_java_body(type_body, source, Some(index), declarations);
            }
            continue;
        }

        match kind {
            "compact_constructor_declaration"
            | "constructor_declaration"
            | "method_declaration" => {
                if let Some(name) = field_name(child, source) {
                    push_declaration(declarations, child, function_kind(owner), name, scope);
                }
            },
            "constant_declaration" | "field_declaration" => {
                // `int a, b;` is one declaration; it is named after its first variable.
                let name = child
                    .child_by_field_name("declarator")
                    .and_then(|d| return field_name(d, source));
                if let Some(name) = name {
                    push_declaration(declarations, child, SymbolKind::Field, name, scope);
                }
            },
            // Members of an enum follow its constants.
            "enum_body_declarations" => walk_java_body(child, source, owner, declarations),
            _ => {},
        }
    }
}

// ── Rust ───────────────────────────────────────────────────────────────

/// Collect items from a source file or inline module body.
fn walk_rust_items<'tree>(
    container: Node<'tree>,
    source: &str,
    owner: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = container.walk();
    for node in container.named_children(&mut cursor) {
        if node.kind() == "impl_item" {
            collect_impl_methods(node, source, owner, declarations);
            continue;
        }

        let kind = match node.kind() {
            "const_item" | "macro_definition" | "static_item" | "type_item" => SymbolKind::Other,
            "enum_item" | "struct_item" | "trait_item" | "union_item" => SymbolKind::Class,
            "function_item" => SymbolKind::Function,
            "mod_item" => SymbolKind::Module,
            _ => continue,
        };
        let Some(name) = field_name(node, source) else {
            continue;
        };
        // `mod foo;` has no body and nothing to slice beyond one line; still listed.
        let index = push_declaration(declarations, node, kind, name, owner.map(Owner::Declared));

        if let Some(body) = node.child_by_field_name("body") {
            match node.kind() {
                "mod_item" => walk_rust_items(body, source, Some(index), declarations),
                "trait_item" => collect_trait_methods(body, source, index, declarations),
                _ => {},
            }
        }
    }
}

/// Collect methods from a Rust impl block, scoped under the implemented type.
fn collect_impl_methods<'tree>(
    impl_node: Node<'tree>,
    source: &str,
    within: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let Some(type_name) = impl_node
        .child_by_field_name("type")
        .and_then(|t| return rust_type_base_name(t, source))
    else {
        return;
    };
    let Some(body) = impl_node.child_by_field_name("body") else {
        return;
    };

    let owner = owner_by_type_name(declarations, &type_name, within);
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() != "function_item" {
            continue;
        }
        if let Some(name) = field_name(child, source) {
            push_declaration(declarations, child, SymbolKind::Method, name, Some(owner.clone()));
        }
    }
}

/// Collect provided and required methods of a trait.
fn collect_trait_methods<'tree>(
    body: Node<'tree>,
    source: &str,
    trait_index: usize,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if !matches!(child.kind(), "function_item" | "function_signature_item") {
            continue;
        }
        if let Some(name) = field_name(child, source) {
            let owner = Some(Owner::Declared(trait_index));
            push_declaration(declarations, child, SymbolKind::Method, name, owner);
        }
    }
}

/// Base name of an impl target: `Config` for `Config`, `Config<T>`,
/// `crate::cfg::Config` and `&Config`.
fn rust_type_base_name(node: Node<'_>, source: &str) -> Option<String> {
    return match node.kind() {
        "generic_type" => rust_type_base_name(node.child_by_field_name("type")?, source),
        "reference_type" | "pointer_type" => {
            rust_type_base_name(node.child_by_field_name("type")?, source)
        },
        "scoped_type_identifier" => field_name(node, source),
        _ => node_text(node, source).map(String::from),
    };
}

// ── TypeScript ─────────────────────────────────────────────────────────

/// Collect declarations from a program or namespace body.
fn walk_ts_statements<'tree>(
    container: Node<'tree>,
    source: &str,
    owner: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = container.walk();
    for statement in container.named_children(&mut cursor) {
        let Some(node) = unwrap_ts_statement(statement) else {
            continue;
        };
        // The export keyword belongs to the declaration's range.
        let range_node = if statement.kind() == "export_statement" { statement } else { node };
        let scope = owner.map(Owner::Declared);

        match node.kind() {
            "abstract_class_declaration" | "class_declaration" | "interface_declaration" => {
                let Some(name) = field_name(node, source) else {
                    continue;
                };
                let index =
                    push_declaration(declarations, range_node, SymbolKind::Class, name, scope);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_ts_class_body(body, source, index, declarations);
                }
            },
            "enum_declaration" => {
                if let Some(name) = field_name(node, source) {
                    push_declaration(declarations, range_node, SymbolKind::Class, name, scope);
                }
            },
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_name(node, source) {
                    push_declaration(declarations, range_node, function_kind(owner), name, scope);
                }
            },
            "internal_module" | "module" => {
                let Some(name) = field_name(node, source) else {
                    continue;
                };
                let index =
                    push_declaration(declarations, range_node, SymbolKind::Module, name, scope);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_ts_statements(body, source, Some(index), declarations);
                }
            },
            "lexical_declaration" | "variable_declaration" => {
                collect_ts_variable_declarators(node, range_node, source, owner, declarations);
            },
            "type_alias_declaration" => {
                if let Some(name) = field_name(node, source) {
                    push_declaration(declarations, range_node, SymbolKind::Other, name, scope);
                }
            },
            _ => {},
        }
    }
}

/// Look through `export` and expression-statement wrappers to the declaration.
fn unwrap_ts_statement(statement: Node<'_>) -> Option<Node<'_>> {
    return match statement.kind() {
        "export_statement" => statement.child_by_field_name("declaration"),
        "expression_statement" => statement
            .named_child(0)
            .filter(|n| return n.kind() == "internal_module"),
        _ => Some(statement),
    };
}

/// Collect members of a class or interface body.
fn walk_ts_class_body<'tree>(
    body: Node<'tree>,
    source: &str,
    class_index: usize,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let kind = match member.kind() {
            "abstract_method_signature" | "method_definition" | "method_signature" => {
                SymbolKind::Method
            },
            "property_signature" | "public_field_definition" => SymbolKind::Field,
            _ => continue,
        };
        if let Some(name) = field_name(member, source) {
            let owner = Some(Owner::Declared(class_index));
            push_declaration(declarations, member, kind, name, owner);
        }
    }
}

/// Extract variable names from a `const`/`let`/`var` declaration.
/// A lone declarator spans the whole statement; several declarators on one
/// statement each span only themselves so sibling ranges stay disjoint.
fn collect_ts_variable_declarators<'tree>(
    node: Node<'tree>,
    range_node: Node<'tree>,
    source: &str,
    owner: Option<usize>,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = node.walk();
    let declarators: Vec<Node<'tree>> = node
        .named_children(&mut cursor)
        .filter(|c| return c.kind() == "variable_declarator")
        .collect();
    let single = declarators.len() == 1;

    for declarator in declarators {
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        // Destructuring patterns have no single name.
        if name_node.kind() != "identifier" {
            continue;
        }
        let Some(name) = node_text(name_node, source) else {
            continue;
        };
        let is_function = declarator.child_by_field_name("value").is_some_and(|v| {
            return matches!(v.kind(), "arrow_function" | "function" | "function_expression");
        });
        let kind = if is_function { function_kind(owner) } else { SymbolKind::Other };
        let span = if single { range_node } else { declarator };
        push_declaration(declarations, span, kind, name.to_string(), owner.map(Owner::Declared));
    }
}

// ── Go ─────────────────────────────────────────────────────────────────

/// Collect functions, methods and type specs from a Go source file.
fn collect_go_declarations<'tree>(
    root: Node<'tree>,
    source: &str,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "function_declaration" => {
                if let Some(name) = field_name(node, source) {
                    push_declaration(declarations, node, SymbolKind::Function, name, None);
                }
            },
            "method_declaration" => {
                let Some(name) = field_name(node, source) else {
                    continue;
                };
                let receiver = node
                    .child_by_field_name("receiver")
                    .and_then(|r| return first_descendant_of_kind(r, "type_identifier"))
                    .and_then(|t| return node_text(t, source));
                let owner = receiver.map(|r| return owner_by_type_name(declarations, r, None));
                let kind = if owner.is_some() { SymbolKind::Method } else { SymbolKind::Function };
                push_declaration(declarations, node, kind, name, owner);
            },
            "type_declaration" => collect_go_type_specs(node, source, declarations),
            _ => {},
        }
    }
}

/// Collect the specs of a `type` declaration. A lone spec spans the whole
/// declaration, `type` keyword included.
fn collect_go_type_specs<'tree>(
    node: Node<'tree>,
    source: &str,
    declarations: &mut Vec<Declaration<'tree>>,
) {
    let mut cursor = node.walk();
    let specs: Vec<Node<'tree>> = node
        .named_children(&mut cursor)
        .filter(|c| return matches!(c.kind(), "type_alias" | "type_spec"))
        .collect();
    let single = specs.len() == 1;

    for spec in specs {
        let Some(name) = field_name(spec, source) else {
            continue;
        };
        let is_class = spec
            .child_by_field_name("type")
            .is_some_and(|t| return matches!(t.kind(), "interface_type" | "struct_type"));
        let kind = if is_class { SymbolKind::Class } else { SymbolKind::Other };
        let span = if single { node } else { spec };
        push_declaration(declarations, span, kind, name, None);
    }
}
