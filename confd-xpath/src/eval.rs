//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::NodeKind;
use confd_utils::Path;

use crate::ast::{Axis, Expr, LocationPath};
use crate::error::Error;
use crate::view::XView;

#[derive(Clone, Debug)]
pub enum Value {
    NodeSet(Vec<Path>),
    Str(String),
    Num(f64),
}

impl Value {
    pub fn to_bool(&self, view: &dyn XView) -> bool {
        match self {
            Value::NodeSet(paths) => paths.iter().any(|p| view.exists(p)),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0,
        }
    }

    pub fn to_text(&self, view: &dyn XView) -> String {
        match self {
            Value::NodeSet(paths) => paths
                .iter()
                .find(|p| view.exists(p))
                .and_then(|p| view.leaf_value(p))
                .unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
        }
    }

    pub fn to_num(&self, view: &dyn XView) -> f64 {
        match self {
            Value::Num(n) => *n,
            other => other.to_text(view).trim().parse().unwrap_or(f64::NAN),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// The node a relative path or `current()` resolves against (spec §4.E
/// "context node").
pub struct EvalContext<'a> {
    pub view: &'a dyn XView,
    pub current: Path,
}

pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, Error> {
    Ok(match expr {
        Expr::Path(lp) => Value::NodeSet(resolve_path(lp, ctx)),
        Expr::Str(s) => Value::Str(s.clone()),
        Expr::Num(n) => Value::Num(*n),
        Expr::Call(name, args) => eval_call(name, args, ctx)?,
        Expr::And(a, b) => Value::Num(bool_num(
            evaluate(a, ctx)?.to_bool(ctx.view) && evaluate(b, ctx)?.to_bool(ctx.view),
        )),
        Expr::Or(a, b) => Value::Num(bool_num(
            evaluate(a, ctx)?.to_bool(ctx.view) || evaluate(b, ctx)?.to_bool(ctx.view),
        )),
        Expr::Not(a) => Value::Num(bool_num(!evaluate(a, ctx)?.to_bool(ctx.view))),
        Expr::Eq(a, b) => Value::Num(bool_num(compare_eq(a, b, ctx)?)),
        Expr::Ne(a, b) => Value::Num(bool_num(!compare_eq(a, b, ctx)?)),
        Expr::Lt(a, b) => Value::Num(bool_num(evaluate(a, ctx)?.to_num(ctx.view) < evaluate(b, ctx)?.to_num(ctx.view))),
        Expr::Le(a, b) => {
            Value::Num(bool_num(evaluate(a, ctx)?.to_num(ctx.view) <= evaluate(b, ctx)?.to_num(ctx.view)))
        }
        Expr::Gt(a, b) => Value::Num(bool_num(evaluate(a, ctx)?.to_num(ctx.view) > evaluate(b, ctx)?.to_num(ctx.view))),
        Expr::Ge(a, b) => {
            Value::Num(bool_num(evaluate(a, ctx)?.to_num(ctx.view) >= evaluate(b, ctx)?.to_num(ctx.view)))
        }
    })
}

fn bool_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// `=`/`!=` between a node-set and a literal compares the literal
/// against every node's textual value (true if any matches), matching
/// XPath 1.0's node-set equality rule; between two non-node-sets it's a
/// plain textual comparison.
fn compare_eq(a: &Expr, b: &Expr, ctx: &EvalContext<'_>) -> Result<bool, Error> {
    let va = evaluate(a, ctx)?;
    let vb = evaluate(b, ctx)?;
    Ok(match (&va, &vb) {
        (Value::NodeSet(paths), other) | (other, Value::NodeSet(paths)) => {
            let text = other.to_text(ctx.view);
            paths
                .iter()
                .filter(|p| ctx.view.exists(p))
                .any(|p| ctx.view.leaf_value(p).as_deref() == Some(text.as_str()))
        }
        _ => va.to_text(ctx.view) == vb.to_text(ctx.view),
    })
}

fn eval_call(name: &str, args: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, Error> {
    match name {
        "starts-with" => {
            let [a, b] = require_args::<2>(name, args)?;
            let (sa, sb) = (evaluate(a, ctx)?.to_text(ctx.view), evaluate(b, ctx)?.to_text(ctx.view));
            Ok(Value::Num(bool_num(sa.starts_with(sb.as_str()))))
        }
        "substring-before" => {
            let [a, b] = require_args::<2>(name, args)?;
            let (sa, sb) = (evaluate(a, ctx)?.to_text(ctx.view), evaluate(b, ctx)?.to_text(ctx.view));
            let out = sa.split_once(sb.as_str()).map(|(before, _)| before).unwrap_or("");
            Ok(Value::Str(out.to_owned()))
        }
        "substring-after" => {
            let [a, b] = require_args::<2>(name, args)?;
            let (sa, sb) = (evaluate(a, ctx)?.to_text(ctx.view), evaluate(b, ctx)?.to_text(ctx.view));
            let out = sa.split_once(sb.as_str()).map(|(_, after)| after).unwrap_or("");
            Ok(Value::Str(out.to_owned()))
        }
        "count" => {
            let [a] = require_args::<1>(name, args)?;
            match evaluate(a, ctx)? {
                Value::NodeSet(paths) => Ok(Value::Num(paths.iter().filter(|p| ctx.view.exists(p)).count() as f64)),
                _ => Ok(Value::Num(0.0)),
            }
        }
        "local-name" => {
            if args.is_empty() {
                return Ok(Value::Str(ctx.current.last().unwrap_or("").to_owned()));
            }
            let [a] = require_args::<1>(name, args)?;
            match evaluate(a, ctx)? {
                Value::NodeSet(paths) => Ok(Value::Str(
                    paths.first().and_then(|p| p.last()).unwrap_or("").to_owned(),
                )),
                _ => Ok(Value::Str(String::new())),
            }
        }
        other => Err(Error::UnknownFunction(other.to_owned())),
    }
}

fn require_args<const N: usize>(name: &str, args: &[Expr]) -> Result<[&Expr; N], Error> {
    if args.len() != N {
        return Err(Error::WrongArgCount(name.to_owned()));
    }
    Ok(std::array::from_fn(|i| &args[i]))
}

fn resolve_path(lp: &LocationPath, ctx: &EvalContext<'_>) -> Vec<Path> {
    let mut set = if lp.absolute { vec![Path::root()] } else { vec![ctx.current.clone()] };
    for step in &lp.steps {
        let mut next = Vec::new();
        for base in &set {
            match &step.axis {
                Axis::SelfAxis => next.push(base.clone()),
                Axis::Current => next.push(ctx.current.clone()),
                Axis::Parent => {
                    if let Some(parent) = logical_parent(ctx.view, base) {
                        next.push(parent);
                    }
                }
                Axis::Child(name) => next.extend(resolve_child(ctx.view, base, name)),
            }
        }
        next.retain(|candidate| {
            step.predicates.iter().all(|pred| {
                let pctx = EvalContext { view: ctx.view, current: candidate.clone() };
                evaluate(pred, &pctx).map(|v| v.to_bool(ctx.view)).unwrap_or(false)
            })
        });
        set = next;
    }
    set
}

fn resolve_child(view: &dyn XView, base: &Path, name: &str) -> Vec<Path> {
    let Some(parent_schema) = view.schema().descendant(base) else {
        return Vec::new();
    };
    let Some(child_schema) = parent_schema.resolve_child(name) else {
        return Vec::new();
    };
    let child_path = base.push(name);
    if child_schema.kind == NodeKind::List {
        view.list_entry_keys(&child_path)
            .into_iter()
            .map(|keys| keys.into_iter().fold(child_path.clone(), |p, k| p.push(k)))
            .collect()
    } else {
        vec![child_path]
    }
}

/// One logical step up from `path`: for a plain child this is its
/// immediate parent; for a list-entry path (ending at its full key
/// tuple) this skips past the list's own virtual name level too, since
/// XPath has no separate addressable node for the list itself.
fn logical_parent(view: &dyn XView, path: &Path) -> Option<Path> {
    let comps = path.components();
    let mut bounds = vec![0usize];
    let mut node = view.schema().root();
    let mut i = 0;
    while i < comps.len() {
        let Some(child) = node.resolve_child(&comps[i]) else { break };
        i += 1;
        if child.kind == NodeKind::List {
            let nkeys = child.keys.len();
            if comps.len() - i < nkeys {
                break;
            }
            i += nkeys;
        }
        bounds.push(i);
        node = child;
    }
    if bounds.len() < 2 {
        return None;
    }
    let prev = bounds[bounds.len() - 2];
    Some(Path::from_components(comps[..prev].iter().cloned()))
}
