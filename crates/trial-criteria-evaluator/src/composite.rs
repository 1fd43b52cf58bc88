//! Combination of child evaluations for composite rules.
//!
//! | Rule | Outcome |
//! |------|---------|
//! | `AND` | worst child result; `AND()` is `PASS` |
//! | `OR` | `PASS` if any child passes, else best child result; `OR()` is `FAIL` |
//! | `NOT` | `PASS` and `FAIL` swap, other results unchanged |
//! | `WARN_IF` | child `PASS` becomes recoverable `WARN`, child `FAIL` becomes recoverable `PASS` |
//!
//! "Worst" and "best" follow [`EvaluationResult::severity`]:
//! `FAIL > UNDETERMINED > WARN > PASS > NOT_EVALUATED`. A combined outcome is
//! recoverable only if every child that produced it is recoverable, so a
//! single non-recoverable `FAIL` under an `AND` fails the whole conjunction.

use trial_criteria::CompositeRule;

use crate::evaluation::{Evaluation, EvaluationResult};

/// Combines already evaluated children according to `rule`.
pub fn combine(rule: CompositeRule, children: Vec<Evaluation>) -> Evaluation {
    match rule {
        CompositeRule::And => and(children),
        CompositeRule::Or => or(children),
        CompositeRule::Not => unary(children, not),
        CompositeRule::WarnIf => unary(children, warn_if),
    }
}

/// Conjunction: the worst child result wins.
pub fn and(children: Vec<Evaluation>) -> Evaluation {
    let worst = children
        .iter()
        .map(|child| child.result)
        .max_by_key(EvaluationResult::severity);

    match worst {
        Some(worst) => merge_contributing(&children, worst),
        None => Evaluation::new(EvaluationResult::Pass, false),
    }
}

/// Disjunction: any passing child wins, otherwise the best child result.
pub fn or(children: Vec<Evaluation>) -> Evaluation {
    let best = if children.iter().any(|child| child.result == EvaluationResult::Pass) {
        Some(EvaluationResult::Pass)
    } else {
        children
            .iter()
            .map(|child| child.result)
            .min_by_key(EvaluationResult::severity)
    };

    match best {
        Some(best) => merge_contributing(&children, best),
        None => Evaluation::new(EvaluationResult::Fail, false),
    }
}

/// Negation: swaps `PASS` and `FAIL` together with their messages.
pub fn not(child: Evaluation) -> Evaluation {
    let result = match child.result {
        EvaluationResult::Pass => EvaluationResult::Fail,
        EvaluationResult::Fail => EvaluationResult::Pass,
        _ => return child,
    };
    Evaluation {
        result,
        recoverable: child.recoverable,
        pass_messages: child.fail_messages,
        warn_messages: child.warn_messages,
        undetermined_messages: child.undetermined_messages,
        fail_messages: child.pass_messages,
    }
}

/// Advisory flag: a passing child raises a recoverable warning.
///
/// A failing child means the flagged condition is absent, which is a
/// recoverable pass. Other results are passed through.
pub fn warn_if(child: Evaluation) -> Evaluation {
    match child.result {
        EvaluationResult::Pass => Evaluation {
            result: EvaluationResult::Warn,
            recoverable: true,
            pass_messages: Default::default(),
            warn_messages: child.pass_messages,
            undetermined_messages: child.undetermined_messages,
            fail_messages: child.fail_messages,
        },
        EvaluationResult::Fail => Evaluation {
            result: EvaluationResult::Pass,
            recoverable: true,
            pass_messages: child.fail_messages,
            warn_messages: child.warn_messages,
            undetermined_messages: child.undetermined_messages,
            fail_messages: Default::default(),
        },
        _ => child,
    }
}

fn unary(children: Vec<Evaluation>, apply: fn(Evaluation) -> Evaluation) -> Evaluation {
    match children.into_iter().next() {
        Some(child) => apply(child),
        None => Evaluation::not_evaluated(),
    }
}

fn merge_contributing(children: &[Evaluation], result: EvaluationResult) -> Evaluation {
    let contributing: Vec<&Evaluation> = children
        .iter()
        .filter(|child| child.result == result)
        .collect();
    let recoverable = contributing.iter().all(|child| child.recoverable);
    contributing
        .into_iter()
        .fold(Evaluation::new(result, recoverable), |merged, child| {
            merged.with_messages_from(child)
        })
}
