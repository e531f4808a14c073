//! Expression evaluation over a parsed XML document.

use crate::error::StoreError;
use crate::query::parser::{Axis, CompareOp, Expr, Function, NodeTest, PathExpr, PathStart, Step};
use roxmltree::Node;
use std::collections::HashSet;

/// A selectable item: a tree node or one attribute of an element.
#[derive(Debug, Clone)]
enum Item<'a, 'input> {
    Node(Node<'a, 'input>),
    Attribute {
        owner: Node<'a, 'input>,
        index: usize,
        value: String,
    },
}

impl<'a, 'input> Item<'a, 'input> {
    /// Document-order key.
    fn order(&self) -> (u32, usize) {
        match self {
            Item::Node(node) => (node.id().get(), 0),
            Item::Attribute { owner, index, .. } => (owner.id().get(), index + 1),
        }
    }

    fn string_value(&self) -> String {
        match self {
            Item::Node(node) => node_string(*node),
            Item::Attribute { value, .. } => value.clone(),
        }
    }
}

fn node_string(node: Node<'_, '_>) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    if node.is_element() || node.is_root() {
        return node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
    }
    node.text().unwrap_or_default().to_string()
}

#[derive(Debug, Clone)]
enum Value<'a, 'input> {
    Nodes(Vec<Item<'a, 'input>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl<'a, 'input> Value<'a, 'input> {
    fn to_bool(&self) -> bool {
        match self {
            Value::Nodes(items) => !items.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn to_string_value(&self) -> String {
        match self {
            Value::Nodes(items) => items.first().map(Item::string_value).unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_number(&other.to_string_value()),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    // Integral values below 2^53 print without a fraction; larger ones
    // would saturate an i64 cast.
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Clone)]
struct Context<'a, 'input> {
    item: Item<'a, 'input>,
    position: usize,
    size: usize,
}

/// Evaluate `expr` against `doc` and report whether it selects anything.
///
/// A node-set result matches when non-empty; other values follow the usual
/// boolean conversion.
pub fn matches(expr: &Expr, doc: &roxmltree::Document<'_>) -> Result<bool, StoreError> {
    let context = Context {
        item: Item::Node(doc.root()),
        position: 1,
        size: 1,
    };
    Ok(evaluate(expr, &context)?.to_bool())
}

fn evaluate<'a, 'input>(
    expr: &Expr,
    context: &Context<'a, 'input>,
) -> Result<Value<'a, 'input>, StoreError> {
    match expr {
        Expr::Or(a, b) => Ok(Value::Bool(
            evaluate(a, context)?.to_bool() || evaluate(b, context)?.to_bool(),
        )),
        Expr::And(a, b) => Ok(Value::Bool(
            evaluate(a, context)?.to_bool() && evaluate(b, context)?.to_bool(),
        )),
        Expr::Compare(op, a, b) => {
            let left = evaluate(a, context)?;
            let right = evaluate(b, context)?;
            Ok(Value::Bool(compare(*op, &left, &right)))
        }
        Expr::Literal(s) => Ok(Value::Str(s.clone())),
        Expr::Number(n) => Ok(Value::Num(*n)),
        Expr::Call(function, args) => call(*function, args, context),
        Expr::Path(path) => Ok(Value::Nodes(select_path(path, context)?)),
    }
}

fn call<'a, 'input>(
    function: Function,
    args: &[Expr],
    context: &Context<'a, 'input>,
) -> Result<Value<'a, 'input>, StoreError> {
    let string_arg = |index: usize| -> Result<String, StoreError> {
        match args.get(index) {
            Some(arg) => Ok(evaluate(arg, context)?.to_string_value()),
            None => Ok(context.item.string_value()),
        }
    };

    Ok(match function {
        Function::Contains => Value::Bool(string_arg(0)?.contains(&string_arg(1)?)),
        Function::StartsWith => Value::Bool(string_arg(0)?.starts_with(&string_arg(1)?)),
        Function::Not => Value::Bool(!evaluate(&args[0], context)?.to_bool()),
        Function::Count => match evaluate(&args[0], context)? {
            Value::Nodes(items) => Value::Num(items.len() as f64),
            _ => {
                return Err(StoreError::QueryFailure(
                    "count() expects a node-set argument".to_string(),
                ))
            }
        },
        Function::Position => Value::Num(context.position as f64),
        Function::Last => Value::Num(context.size as f64),
        Function::String => Value::Str(string_arg(0)?),
        Function::StringLength => Value::Num(string_arg(0)?.chars().count() as f64),
        Function::NormalizeSpace => Value::Str(
            string_arg(0)?
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Function::True => Value::Bool(true),
        Function::False => Value::Bool(false),
    })
}

fn compare(op: CompareOp, left: &Value<'_, '_>, right: &Value<'_, '_>) -> bool {
    match (left, right) {
        (Value::Nodes(a), Value::Nodes(b)) => a.iter().any(|x| {
            let x = x.string_value();
            b.iter()
                .any(|y| compare_atoms(op, &Value::Str(x.clone()), &Value::Str(y.string_value())))
        }),
        (Value::Nodes(items), Value::Bool(_)) => {
            compare_atoms(op, &Value::Bool(!items.is_empty()), right)
        }
        (Value::Bool(_), Value::Nodes(items)) => {
            compare_atoms(op, left, &Value::Bool(!items.is_empty()))
        }
        (Value::Nodes(items), other) => items
            .iter()
            .any(|x| compare_atoms(op, &Value::Str(x.string_value()), other)),
        (other, Value::Nodes(items)) => items
            .iter()
            .any(|y| compare_atoms(op, other, &Value::Str(y.string_value()))),
        _ => compare_atoms(op, left, right),
    }
}

fn compare_atoms(op: CompareOp, left: &Value<'_, '_>, right: &Value<'_, '_>) -> bool {
    match op {
        CompareOp::Eq | CompareOp::NotEq => {
            let equal = match (left, right) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => left.to_bool() == right.to_bool(),
                (Value::Num(_), _) | (_, Value::Num(_)) => left.to_number() == right.to_number(),
                _ => left.to_string_value() == right.to_string_value(),
            };
            if op == CompareOp::Eq {
                equal
            } else {
                !equal
            }
        }
        CompareOp::Lt => left.to_number() < right.to_number(),
        CompareOp::LtEq => left.to_number() <= right.to_number(),
        CompareOp::Gt => left.to_number() > right.to_number(),
        CompareOp::GtEq => left.to_number() >= right.to_number(),
    }
}

fn select_path<'a, 'input>(
    path: &PathExpr,
    context: &Context<'a, 'input>,
) -> Result<Vec<Item<'a, 'input>>, StoreError> {
    let mut current = match &path.start {
        PathStart::Context => vec![context.item.clone()],
        PathStart::Root => vec![Item::Node(document_root(&context.item))],
        PathStart::Collection { predicates, .. } => apply_predicates(
            vec![Item::Node(document_root(&context.item))],
            predicates,
        )?,
    };

    for step in &path.steps {
        let mut next = Vec::new();
        for item in &current {
            let selected = select_step(item, step);
            next.extend(apply_predicates(selected, &step.predicates)?);
        }
        current = into_document_order(next);
    }

    Ok(current)
}

fn document_root<'a, 'input>(item: &Item<'a, 'input>) -> Node<'a, 'input> {
    match item {
        Item::Node(node) => node.document().root(),
        Item::Attribute { owner, .. } => owner.document().root(),
    }
}

fn select_step<'a, 'input>(item: &Item<'a, 'input>, step: &Step) -> Vec<Item<'a, 'input>> {
    let node = match item {
        Item::Node(node) => *node,
        Item::Attribute { owner, .. } => {
            return match step.axis {
                Axis::SelfNode if step.test == NodeTest::Node => vec![item.clone()],
                Axis::Parent => vec![Item::Node(*owner)],
                _ => Vec::new(),
            };
        }
    };

    match step.axis {
        Axis::Child => node
            .children()
            .filter(|child| node_matches(*child, &step.test))
            .map(Item::Node)
            .collect(),
        Axis::DescendantOrSelf => node
            .descendants()
            .filter(|n| node_matches(*n, &step.test))
            .map(Item::Node)
            .collect(),
        Axis::SelfNode => {
            if node_matches(node, &step.test) {
                vec![Item::Node(node)]
            } else {
                Vec::new()
            }
        }
        Axis::Parent => node
            .parent()
            .filter(|parent| node_matches(*parent, &step.test))
            .map(Item::Node)
            .into_iter()
            .collect(),
        Axis::Attribute => {
            if !node.is_element() {
                return Vec::new();
            }
            node.attributes()
                .enumerate()
                .filter(|(_, attr)| match &step.test {
                    NodeTest::Name(name) => attr.name() == name.as_str(),
                    NodeTest::Any | NodeTest::Node => true,
                    NodeTest::Text => false,
                })
                .map(|(index, attr)| Item::Attribute {
                    owner: node,
                    index,
                    value: attr.value().to_string(),
                })
                .collect()
        }
    }
}

fn node_matches(node: Node<'_, '_>, test: &NodeTest) -> bool {
    match test {
        NodeTest::Name(name) => node.is_element() && node.tag_name().name() == name.as_str(),
        NodeTest::Any => node.is_element(),
        NodeTest::Text => node.is_text(),
        NodeTest::Node => true,
    }
}

fn apply_predicates<'a, 'input>(
    mut items: Vec<Item<'a, 'input>>,
    predicates: &[Expr],
) -> Result<Vec<Item<'a, 'input>>, StoreError> {
    for predicate in predicates {
        let size = items.len();
        let mut kept = Vec::with_capacity(size);
        for (index, item) in items.into_iter().enumerate() {
            let context = Context {
                item,
                position: index + 1,
                size,
            };
            let keep = match evaluate(predicate, &context)? {
                Value::Num(n) => n == context.position as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(context.item);
            }
        }
        items = kept;
    }
    Ok(items)
}

fn into_document_order<'a, 'input>(items: Vec<Item<'a, 'input>>) -> Vec<Item<'a, 'input>> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Item<'a, 'input>> = items
        .into_iter()
        .filter(|item| seen.insert(item.order()))
        .collect();
    unique.sort_by_key(Item::order);
    unique
}
