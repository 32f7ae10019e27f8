//! XPath evaluation over a [`Document`].

use std::collections::{HashMap, HashSet};

use crate::dom::document::NodeKind;
use crate::dom::{Document, DomView, NodeId};
use crate::error::LocatorError;

use super::xpath::{self, Axis, CmpOp, Expr, Function, LocationPath, NodeTest, Step};

/// A node in an XPath node-set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum XNode {
    Node(NodeId),
    /// Attribute `index` of an element
    Attr(NodeId, usize),
}

impl XNode {
    fn owner(self) -> NodeId {
        match self {
            XNode::Node(n) | XNode::Attr(n, _) => n,
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<XNode>),
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Preorder index of one tree, used for document order and the
/// following/preceding axes
struct TreeIndex {
    position: HashMap<NodeId, usize>,
    nodes: Vec<NodeId>,
    /// Position of the last descendant of each node
    subtree_end: Vec<usize>,
}

impl TreeIndex {
    fn build(doc: &Document, root: NodeId) -> Self {
        let mut nodes = Vec::new();
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            nodes.push(n);
            stack.extend(doc.children(n).iter().rev().copied());
        }
        let position: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut subtree_end: Vec<usize> = (0..nodes.len()).collect();
        for i in (0..nodes.len()).rev() {
            if let Some(parent) = doc.parent(nodes[i]) {
                if let Some(&p) = position.get(&parent) {
                    subtree_end[p] = subtree_end[p].max(subtree_end[i]);
                }
            }
        }
        Self { position, nodes, subtree_end }
    }

    fn sort_key(&self, node: XNode) -> (usize, usize) {
        let pos = self.position.get(&node.owner()).copied().unwrap_or(usize::MAX);
        match node {
            XNode::Node(_) => (pos, 0),
            XNode::Attr(_, i) => (pos, i + 1),
        }
    }

    fn sort(&self, nodes: &mut Vec<XNode>) {
        let mut seen = HashSet::new();
        nodes.retain(|n| seen.insert(*n));
        nodes.sort_by_key(|&n| self.sort_key(n));
    }

    fn descendants(&self, node: NodeId) -> &[NodeId] {
        match self.position.get(&node) {
            Some(&p) => &self.nodes[p + 1..=self.subtree_end[p]],
            None => &[],
        }
    }
}

struct Context {
    node: XNode,
    position: usize,
    size: usize,
}

struct Evaluator<'a> {
    doc: &'a Document,
    root: NodeId,
    index: TreeIndex,
}

/// Evaluate `expr` with `context` as the context node and return the
/// resulting element/text nodes in document order. Attribute results are
/// reported as their owner element.
pub fn evaluate(doc: &Document, context: NodeId, expr: &str) -> Result<Vec<NodeId>, LocatorError> {
    let parsed = xpath::parse(expr)?;
    let root = doc.tree_root(context);
    let evaluator = Evaluator { doc, root, index: TreeIndex::build(doc, root) };
    let ctx = Context { node: XNode::Node(context), position: 1, size: 1 };
    match evaluator.eval(&parsed, &ctx)? {
        Value::Nodes(nodes) => {
            let mut out: Vec<NodeId> = Vec::with_capacity(nodes.len());
            for node in nodes {
                let owner = node.owner();
                if !out.contains(&owner) {
                    out.push(owner);
                }
            }
            Ok(out)
        }
        _ => Err(LocatorError::NotANodeSet(expr.to_string())),
    }
}

/// Evaluate an expression to a number (e.g. `count(//a)`)
pub fn evaluate_number(doc: &Document, context: NodeId, expr: &str) -> Result<f64, LocatorError> {
    let parsed = xpath::parse(expr)?;
    let root = doc.tree_root(context);
    let evaluator = Evaluator { doc, root, index: TreeIndex::build(doc, root) };
    let ctx = Context { node: XNode::Node(context), position: 1, size: 1 };
    let value = evaluator.eval(&parsed, &ctx)?;
    Ok(evaluator.to_number(&value))
}

impl<'a> Evaluator<'a> {
    fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value, LocatorError> {
        Ok(match expr {
            Expr::Or(a, b) => {
                Value::Bool(self.eval_bool(a, ctx)? || self.eval_bool(b, ctx)?)
            }
            Expr::And(a, b) => {
                Value::Bool(self.eval_bool(a, ctx)? && self.eval_bool(b, ctx)?)
            }
            Expr::Compare(op, a, b) => {
                let left = self.eval(a, ctx)?;
                let right = self.eval(b, ctx)?;
                Value::Bool(self.compare(*op, &left, &right))
            }
            Expr::Negate(inner) => {
                let value = self.eval(inner, ctx)?;
                Value::Num(-self.to_number(&value))
            }
            Expr::Union(a, b) => {
                let mut left = self.eval_nodes(a, ctx)?;
                left.extend(self.eval_nodes(b, ctx)?);
                self.index.sort(&mut left);
                Value::Nodes(left)
            }
            Expr::Path(path) => Value::Nodes(self.eval_path(path, ctx)?),
            Expr::Filter { primary, predicates, steps } => {
                let mut nodes = self.eval_nodes(primary, ctx)?;
                self.index.sort(&mut nodes);
                for predicate in predicates {
                    nodes = self.apply_predicate(nodes, predicate)?;
                }
                for step in steps {
                    nodes = self.apply_step(&nodes, step)?;
                }
                Value::Nodes(nodes)
            }
            Expr::Literal(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Function(function, args) => self.call(*function, args, ctx)?,
        })
    }

    fn eval_bool(&self, expr: &Expr, ctx: &Context) -> Result<bool, LocatorError> {
        let value = self.eval(expr, ctx)?;
        Ok(self.to_bool(&value))
    }

    fn eval_string(&self, expr: &Expr, ctx: &Context) -> Result<String, LocatorError> {
        let value = self.eval(expr, ctx)?;
        Ok(self.to_string(&value))
    }

    fn eval_nodes(&self, expr: &Expr, ctx: &Context) -> Result<Vec<XNode>, LocatorError> {
        match self.eval(expr, ctx)? {
            Value::Nodes(nodes) => Ok(nodes),
            _ => Err(LocatorError::NotANodeSet(format!("{expr:?}"))),
        }
    }

    fn eval_path(&self, path: &LocationPath, ctx: &Context) -> Result<Vec<XNode>, LocatorError> {
        let mut current = if path.absolute {
            vec![XNode::Node(self.root)]
        } else {
            vec![ctx.node]
        };
        for step in &path.steps {
            current = self.apply_step(&current, step)?;
        }
        Ok(current)
    }

    fn apply_step(&self, input: &[XNode], step: &Step) -> Result<Vec<XNode>, LocatorError> {
        let mut output = Vec::new();

        // `//` expands to descendant-or-self::node(); skip inputs already
        // covered by an earlier input's subtree
        if step.axis == Axis::DescendantOrSelf
            && step.test == NodeTest::Node
            && step.predicates.is_empty()
        {
            let mut sorted = input.to_vec();
            self.index.sort(&mut sorted);
            let mut covered_until: Option<usize> = None;
            for node in sorted {
                let XNode::Node(n) = node else {
                    output.push(node);
                    continue;
                };
                let Some(&pos) = self.index.position.get(&n) else { continue };
                if covered_until.map(|end| pos <= end).unwrap_or(false) {
                    continue;
                }
                output.push(node);
                output.extend(self.index.descendants(n).iter().map(|&d| XNode::Node(d)));
                covered_until = Some(self.index.subtree_end[pos]);
            }
            return Ok(output);
        }

        for &node in input {
            let mut candidates: Vec<XNode> = self
                .axis(node, step.axis)
                .into_iter()
                .filter(|&c| self.matches(c, step.axis, &step.test))
                .collect();
            for predicate in &step.predicates {
                candidates = self.apply_predicate(candidates, predicate)?;
            }
            output.extend(candidates);
        }
        self.index.sort(&mut output);
        Ok(output)
    }

    fn apply_predicate(&self, nodes: Vec<XNode>, predicate: &Expr) -> Result<Vec<XNode>, LocatorError> {
        let size = nodes.len();
        let mut kept = Vec::new();
        for (i, node) in nodes.into_iter().enumerate() {
            let ctx = Context { node, position: i + 1, size };
            let keep = match self.eval(predicate, &ctx)? {
                Value::Num(n) => n == (i + 1) as f64,
                other => self.to_bool(&other),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    /// Nodes along `axis`, in axis order (nearest first for reverse axes)
    fn axis(&self, node: XNode, axis: Axis) -> Vec<XNode> {
        let doc = self.doc;
        let n = match (node, axis) {
            (XNode::Attr(owner, _), Axis::Parent) => return vec![XNode::Node(owner)],
            (XNode::Attr(_, _), Axis::SelfAxis) => return vec![node],
            (XNode::Attr(owner, _), Axis::Ancestor | Axis::AncestorOrSelf) => {
                let mut out = if axis == Axis::AncestorOrSelf { vec![node] } else { Vec::new() };
                out.extend(self.axis(XNode::Node(owner), Axis::AncestorOrSelf));
                return out;
            }
            (XNode::Attr(owner, _), Axis::Following) => {
                let Some(&pos) = self.index.position.get(&owner) else { return Vec::new() };
                return self.index.nodes[pos + 1..].iter().map(|&d| XNode::Node(d)).collect();
            }
            (XNode::Attr(owner, _), Axis::Preceding) => {
                return self.axis(XNode::Node(owner), Axis::Preceding);
            }
            (XNode::Attr(_, _), _) => return Vec::new(),
            (XNode::Node(n), _) => n,
        };

        let wrap = |ids: &[NodeId]| ids.iter().map(|&d| XNode::Node(d)).collect::<Vec<_>>();
        match axis {
            Axis::Child => wrap(doc.children(n)),
            Axis::Descendant => wrap(self.index.descendants(n)),
            Axis::DescendantOrSelf => {
                let mut out = vec![node];
                out.extend(wrap(self.index.descendants(n)));
                out
            }
            Axis::SelfAxis => vec![node],
            Axis::Parent => doc.parent(n).map(|p| vec![XNode::Node(p)]).unwrap_or_default(),
            Axis::Ancestor | Axis::AncestorOrSelf => {
                let mut out = if axis == Axis::AncestorOrSelf { vec![node] } else { Vec::new() };
                let mut current = doc.parent(n);
                while let Some(p) = current {
                    out.push(XNode::Node(p));
                    current = doc.parent(p);
                }
                out
            }
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = doc.parent(n) else { return Vec::new() };
                let siblings = doc.children(parent);
                let Some(pos) = siblings.iter().position(|&s| s == n) else { return Vec::new() };
                if axis == Axis::FollowingSibling {
                    wrap(&siblings[pos + 1..])
                } else {
                    siblings[..pos].iter().rev().map(|&s| XNode::Node(s)).collect()
                }
            }
            Axis::Following => {
                let Some(&pos) = self.index.position.get(&n) else { return Vec::new() };
                wrap(&self.index.nodes[self.index.subtree_end[pos] + 1..])
            }
            Axis::Preceding => {
                let Some(&pos) = self.index.position.get(&n) else { return Vec::new() };
                let mut ancestors = HashSet::new();
                let mut current = doc.parent(n);
                while let Some(p) = current {
                    ancestors.insert(p);
                    current = doc.parent(p);
                }
                self.index.nodes[..pos]
                    .iter()
                    .rev()
                    .filter(|d| !ancestors.contains(d))
                    .map(|&d| XNode::Node(d))
                    .collect()
            }
            Axis::Attribute => match doc.element(n) {
                Some(el) => (0..el.attributes.len()).map(|i| XNode::Attr(n, i)).collect(),
                None => Vec::new(),
            },
        }
    }

    fn matches(&self, node: XNode, axis: Axis, test: &NodeTest) -> bool {
        match node {
            XNode::Attr(owner, i) => {
                let Some((name, _)) = self.doc.attribute_at(owner, i) else { return false };
                match test {
                    NodeTest::Any | NodeTest::Node => true,
                    NodeTest::Name(expected) => name == expected,
                    NodeTest::Text => false,
                }
            }
            XNode::Node(n) => {
                if axis == Axis::Attribute {
                    return false;
                }
                match (test, self.doc.kind(n)) {
                    (NodeTest::Node, _) => true,
                    (NodeTest::Text, Some(NodeKind::Text(_))) => true,
                    (NodeTest::Any, Some(NodeKind::Element(_))) => true,
                    (NodeTest::Name(expected), Some(NodeKind::Element(el))) => {
                        el.tag_name.eq_ignore_ascii_case(expected)
                    }
                    _ => false,
                }
            }
        }
    }

    fn string_value(&self, node: XNode) -> String {
        match node {
            XNode::Attr(owner, i) => self
                .doc
                .attribute_at(owner, i)
                .map(|(_, v)| v.to_string())
                .unwrap_or_default(),
            XNode::Node(n) => self.doc.text_content(n),
        }
    }

    fn node_name(&self, node: XNode) -> String {
        match node {
            XNode::Attr(owner, i) => self
                .doc
                .attribute_at(owner, i)
                .map(|(k, _)| k.to_string())
                .unwrap_or_default(),
            XNode::Node(n) => self.doc.tag_name(n).to_string(),
        }
    }

    fn first_in_order(&self, nodes: &[XNode]) -> Option<XNode> {
        nodes.iter().copied().min_by_key(|&n| self.index.sort_key(n))
    }

    fn to_string(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::Nodes(nodes) => self
                .first_in_order(nodes)
                .map(|n| self.string_value(n))
                .unwrap_or_default(),
        }
    }

    fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_number(&self.to_string(other)),
        }
    }

    fn to_bool(&self, value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Nodes(nodes) => !nodes.is_empty(),
        }
    }

    fn compare(&self, op: CmpOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Nodes(a), Value::Nodes(b)) => {
                let right_values: Vec<String> = b.iter().map(|&n| self.string_value(n)).collect();
                a.iter().any(|&n| {
                    let l = self.string_value(n);
                    right_values.iter().any(|r| compare_strings(op, &l, r))
                })
            }
            (Value::Nodes(nodes), other) | (other, Value::Nodes(nodes)) => {
                let nodes_on_left = matches!(left, Value::Nodes(_));
                match other {
                    Value::Bool(b) => {
                        let set = !nodes.is_empty();
                        let (l, r) = if nodes_on_left { (set, *b) } else { (*b, set) };
                        compare_bools(op, l, r)
                    }
                    Value::Num(num) => nodes.iter().any(|&n| {
                        let v = parse_number(&self.string_value(n));
                        let (l, r) = if nodes_on_left { (v, *num) } else { (*num, v) };
                        compare_numbers(op, l, r)
                    }),
                    _ => {
                        let s = self.to_string(other);
                        nodes.iter().any(|&n| {
                            let v = self.string_value(n);
                            if nodes_on_left {
                                compare_strings(op, &v, &s)
                            } else {
                                compare_strings(op, &s, &v)
                            }
                        })
                    }
                }
            }
            _ => match op {
                CmpOp::Eq | CmpOp::Neq => {
                    if matches!(left, Value::Bool(_)) || matches!(right, Value::Bool(_)) {
                        compare_bools(op, self.to_bool(left), self.to_bool(right))
                    } else if matches!(left, Value::Num(_)) || matches!(right, Value::Num(_)) {
                        compare_numbers(op, self.to_number(left), self.to_number(right))
                    } else {
                        compare_strings(op, &self.to_string(left), &self.to_string(right))
                    }
                }
                _ => compare_numbers(op, self.to_number(left), self.to_number(right)),
            },
        }
    }

    fn context_string(&self, args: &[Expr], ctx: &Context) -> Result<String, LocatorError> {
        match args.first() {
            Some(arg) => self.eval_string(arg, ctx),
            None => Ok(self.string_value(ctx.node)),
        }
    }

    fn call(&self, function: Function, args: &[Expr], ctx: &Context) -> Result<Value, LocatorError> {
        Ok(match function {
            Function::NormalizeSpace => {
                Value::Str(normalize_space(&self.context_string(args, ctx)?))
            }
            Function::Contains => {
                let haystack = self.eval_string(&args[0], ctx)?;
                let needle = self.eval_string(&args[1], ctx)?;
                Value::Bool(haystack.contains(&needle))
            }
            Function::StartsWith => {
                let haystack = self.eval_string(&args[0], ctx)?;
                let prefix = self.eval_string(&args[1], ctx)?;
                Value::Bool(haystack.starts_with(&prefix))
            }
            Function::Concat => {
                let mut out = String::new();
                for arg in args {
                    out.push_str(&self.eval_string(arg, ctx)?);
                }
                Value::Str(out)
            }
            Function::String => Value::Str(self.context_string(args, ctx)?),
            Function::StringLength => {
                Value::Num(self.context_string(args, ctx)?.chars().count() as f64)
            }
            Function::Name | Function::LocalName => {
                let node = match args.first() {
                    Some(arg) => {
                        let nodes = self.eval_nodes(arg, ctx)?;
                        self.first_in_order(&nodes)
                    }
                    None => Some(ctx.node),
                };
                let name = node.map(|n| self.node_name(n)).unwrap_or_default();
                if function == Function::LocalName {
                    Value::Str(name.rsplit(':').next().unwrap_or("").to_string())
                } else {
                    Value::Str(name)
                }
            }
            Function::Count => Value::Num(self.eval_nodes(&args[0], ctx)?.len() as f64),
            Function::Not => Value::Bool(!self.eval_bool(&args[0], ctx)?),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Position => Value::Num(ctx.position as f64),
            Function::Last => Value::Num(ctx.size as f64),
        })
    }
}

/// XPath `normalize-space`: collapse XML whitespace runs and trim
pub fn normalize_space(s: &str) -> String {
    s.split(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn compare_strings(op: CmpOp, l: &str, r: &str) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Neq => l != r,
        _ => compare_numbers(op, parse_number(l), parse_number(r)),
    }
}

fn compare_numbers(op: CmpOp, l: f64, r: f64) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Neq => l != r,
        CmpOp::Lt => l < r,
        CmpOp::Le => l <= r,
        CmpOp::Gt => l > r,
        CmpOp::Ge => l >= r,
    }
}

fn compare_bools(op: CmpOp, l: bool, r: bool) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Neq => l != r,
        _ => compare_numbers(op, l as u8 as f64, r as u8 as f64),
    }
}
