//! Shorthand expression language.
//!
//! A shorthand definition packs an exercise prescription into one string:
//! `weight:sets:reps@rpe` (or `weight:reps:sets@rpe`, depending on
//! [`ShorthandConfig::sets_before_reps`]). Every field is an arithmetic
//! expression over the identifiers in scope, e.g.
//! `(squat.starting_weight + 10):3:5@8`.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{evaluate, Binding, Scope};
pub use lexer::{tokenize, Lexer, Token};
pub use parser::{parse, BinaryOperator, Node, UnaryOperator};

use crate::{Definition, Error, Result, ShorthandConfig};

/// Field of a shorthand definition, used in error messages
#[derive(Clone, Copy, Debug)]
enum Field {
    Weight,
    Sets,
    Reps,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Weight => "weight",
            Field::Sets => "sets",
            Field::Reps => "reps",
        }
    }
}

/// Resolve a full shorthand definition
///
/// Fails with [`Error::ShorthandNotAllowed`] when shorthand is disabled,
/// and with [`Error::UserCode`] when weight, sets or reps is missing.
/// RPE is optional.
pub fn resolve_definition(
    config: &ShorthandConfig,
    text: &str,
    identifiers: &[Binding],
) -> Result<Definition> {
    if !config.enabled {
        return Err(Error::ShorthandNotAllowed(format!(
            "can't resolve shorthand expression {:?}: defaults:shorthand:enabled is false",
            text
        )));
    }

    let (scheme, rpe_text) = match text.split_once('@') {
        Some((scheme, rpe)) => (scheme, Some(rpe)),
        None => (text, None),
    };

    let fields: Vec<&str> = scheme.split(':').collect();
    if fields.len() > 3 {
        return Err(Error::UserCode(format!(
            "too many fields in shorthand expression {:?}: expected weight, sets and reps",
            text
        )));
    }

    let order = if config.sets_before_reps {
        [Field::Weight, Field::Sets, Field::Reps]
    } else {
        [Field::Weight, Field::Reps, Field::Sets]
    };

    let (mut weight, mut sets, mut reps) = (0.0, 0.0, 0.0);
    for (i, field) in order.into_iter().enumerate() {
        let source = fields.get(i).copied().unwrap_or("");
        let value = resolve_optional(source, identifiers)?.ok_or_else(|| {
            Error::UserCode(format!(
                "incomplete shorthand expression: missing {}",
                field.name()
            ))
        })?;
        match field {
            Field::Weight => weight = value,
            Field::Sets => sets = value,
            Field::Reps => reps = value,
        }
    }

    let rpe = match rpe_text {
        Some(source) => resolve_optional(source, identifiers)?,
        None => None,
    };

    let definition = Definition {
        weight,
        sets,
        reps,
        rpe,
    };
    tracing::debug!(text, ?definition, "resolved shorthand definition");
    Ok(definition)
}

/// Resolve a single standalone expression, e.g. a block input
pub fn resolve_expression(text: &str, identifiers: &[Binding]) -> Result<f64> {
    resolve_optional(text, identifiers)?.ok_or_else(|| {
        Error::UserCode(format!(
            "incomplete shorthand expression: empty expression {:?}",
            text
        ))
    })
}

/// Tokenize, parse and evaluate; `None` for an empty expression
fn resolve_optional(text: &str, identifiers: &[Binding]) -> Result<Option<f64>> {
    match parse(tokenize(text)?)? {
        Some(node) => evaluate(&node, identifiers).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETS_FIRST: ShorthandConfig = ShorthandConfig {
        enabled: true,
        sets_before_reps: true,
    };

    const REPS_FIRST: ShorthandConfig = ShorthandConfig {
        enabled: true,
        sets_before_reps: false,
    };

    fn definition(weight: f64, sets: f64, reps: f64, rpe: Option<f64>) -> Definition {
        Definition {
            weight,
            sets,
            reps,
            rpe,
        }
    }

    #[test]
    fn test_resolves_identifiers() {
        let identifiers = [
            Binding::new("squat_starting_weight", 225.0),
            Binding::new("squat_increment", 10.0),
            Binding::new("rx_sets", 3.0),
            Binding::new("rx_reps", 5.0),
            Binding::new("rpe", 8.0),
        ];
        let resolved = resolve_definition(
            &SETS_FIRST,
            "(squat_starting_weight + squat_increment * 2):(rx_sets):(rx_reps)@rpe",
            &identifiers,
        )
        .unwrap();
        assert_eq!(resolved, definition(245.0, 3.0, 5.0, Some(8.0)));
    }

    #[test]
    fn test_sets_before_reps_with_rpe() {
        let resolved = resolve_definition(&SETS_FIRST, "225:3:5@8", &[]).unwrap();
        assert_eq!(resolved, definition(225.0, 3.0, 5.0, Some(8.0)));
    }

    #[test]
    fn test_reps_before_sets_with_rpe() {
        let resolved = resolve_definition(&REPS_FIRST, "225:3:5@8", &[]).unwrap();
        assert_eq!(resolved, definition(225.0, 5.0, 3.0, Some(8.0)));
    }

    #[test]
    fn test_field_orders_agree() {
        for (w, s, r) in [(100.0, 5.0, 3.0), (62.5, 1.0, 10.0), (0.5, 8.0, 2.0)] {
            let sets_first = format!("{}:{}:{}", w, s, r);
            let reps_first = format!("{}:{}:{}", w, r, s);
            assert_eq!(
                resolve_definition(&SETS_FIRST, &sets_first, &[]).unwrap(),
                resolve_definition(&REPS_FIRST, &reps_first, &[]).unwrap(),
            );
        }
    }

    #[test]
    fn test_disabled_shorthand() {
        let disabled = ShorthandConfig {
            enabled: false,
            sets_before_reps: true,
        };
        for text in ["225:3:5", "", "not even valid %"] {
            assert!(matches!(
                resolve_definition(&disabled, text, &[]),
                Err(Error::ShorthandNotAllowed(_))
            ));
        }
    }

    #[test]
    fn test_missing_fields() {
        for (text, field) in [(":3:5", "weight"), ("225::5", "sets"), ("225:3:", "reps"), ("225:3", "reps")] {
            let err = resolve_definition(&SETS_FIRST, text, &[]).unwrap_err();
            assert!(matches!(err, Error::UserCode(_)));
            assert!(err.to_string().contains(field), "{} -> {}", text, err);
        }
    }

    #[test]
    fn test_missing_sets_in_reps_first_order() {
        let err = resolve_definition(&REPS_FIRST, "225:5", &[]).unwrap_err();
        assert!(err.to_string().contains("missing sets"));
    }

    #[test]
    fn test_rpe_optional() {
        assert_eq!(
            resolve_definition(&SETS_FIRST, "225:3:5", &[]).unwrap(),
            definition(225.0, 3.0, 5.0, None)
        );
        assert_eq!(
            resolve_definition(&SETS_FIRST, "225:3:5@", &[]).unwrap(),
            definition(225.0, 3.0, 5.0, None)
        );
    }

    #[test]
    fn test_too_many_fields() {
        assert!(matches!(
            resolve_definition(&SETS_FIRST, "225:3:5:1", &[]),
            Err(Error::UserCode(_))
        ));
    }

    #[test]
    fn test_whitespace_around_fields() {
        assert_eq!(
            resolve_definition(&SETS_FIRST, " 225 : 3 : 5 @ 7.5 ", &[]).unwrap(),
            definition(225.0, 3.0, 5.0, Some(7.5))
        );
    }

    #[test]
    fn test_errors_from_inner_stages_propagate() {
        assert!(matches!(
            resolve_definition(&SETS_FIRST, "225%:3:5", &[]),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(
            resolve_definition(&SETS_FIRST, "(225:3:5", &[]),
            Err(Error::Parsing(_))
        ));
        assert!(matches!(
            resolve_definition(&SETS_FIRST, "x:3:5", &[]),
            Err(Error::UserCode(_))
        ));
    }

    #[test]
    fn test_resolve_expression() {
        let identifiers = [Binding::new("squat.starting_weight", 225.0)];
        assert_eq!(
            resolve_expression("squat.starting_weight + 20", &identifiers).unwrap(),
            245.0
        );
    }

    #[test]
    fn test_resolve_empty_expression() {
        for text in ["", "   "] {
            assert!(matches!(
                resolve_expression(text, &[]),
                Err(Error::UserCode(_))
            ));
        }
    }

    #[test]
    fn test_deeply_nested_expression_is_rejected() {
        let text = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            resolve_expression(&text, &[]),
            Err(Error::Parsing(_))
        ));
    }
}
