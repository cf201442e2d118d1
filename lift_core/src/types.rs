//! Core domain types for liftc programs.
//!
//! This module defines the fundamental types used throughout the system:
//! - Program defaults (units, exercise properties, shorthand options)
//! - Declared exercises, templates and schedule blocks
//! - Rendered output (blocks, sessions, resolved exercise definitions)

use crate::shorthand::Binding;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Defaults
// ============================================================================

/// Weight units a program is written in
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Kilograms,
    Pounds,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Kilograms => "kilograms",
            Units::Pounds => "pounds",
        }
    }

    /// Short label for display ("kg" / "lb")
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Units::Kilograms => "kg",
            Units::Pounds => "lb",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kilograms" => Ok(Units::Kilograms),
            "pounds" => Ok(Units::Pounds),
            other => Err(Error::Config(format!(
                "unknown units '{}', expected kilograms or pounds",
                other
            ))),
        }
    }
}

/// Shorthand options
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShorthandConfig {
    pub enabled: bool,
    /// `weight:sets:reps` when true, `weight:reps:sets` otherwise
    pub sets_before_reps: bool,
}

impl Default for ShorthandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sets_before_reps: true,
        }
    }
}

/// Exercise-level defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseDefaults {
    /// Property names declared exercises are expected to carry
    pub properties: Vec<String>,
}

/// Program-wide defaults, read-only after load
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Defaults {
    pub units: Units,
    pub exercises: ExerciseDefaults,
    pub shorthand: ShorthandConfig,
}

static BUILTIN_DEFAULTS: Lazy<Defaults> = Lazy::new(|| Defaults {
    units: Units::Kilograms,
    exercises: ExerciseDefaults {
        properties: vec!["starting weight".into()],
    },
    shorthand: ShorthandConfig::default(),
});

/// Get a reference to the built-in defaults used when a program omits them
pub fn builtin_defaults() -> &'static Defaults {
    &BUILTIN_DEFAULTS
}

impl Default for Defaults {
    fn default() -> Self {
        builtin_defaults().clone()
    }
}

// ============================================================================
// Declared Exercises
// ============================================================================

/// An exercise declared once and referenced by templates
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DeclaredExercise {
    pub name: String,
    /// Display name; defaults to `name`
    pub alias: String,
    pub properties: BTreeMap<String, f64>,
}

impl DeclaredExercise {
    /// Scope bindings for this exercise's properties, keyed `exercise.property`
    pub fn bindings(&self) -> impl Iterator<Item = Binding> + '_ {
        self.properties
            .iter()
            .map(move |(property, value)| Binding::new(format!("{}.{}", self.name, property), *value))
    }
}

// ============================================================================
// Templates
// ============================================================================

/// A value that is either a literal number or an expression resolved lazily
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Statement {
    Literal(f64),
    Shorthand(String),
}

/// An exercise slot within a template session
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplatedExercise {
    Explicit {
        name: String,
        weight: Statement,
        sets: Statement,
        reps: Statement,
        rpe: Option<Statement>,
    },
    Shorthand {
        name: String,
        value: String,
    },
}

impl TemplatedExercise {
    /// Name of the declared exercise this slot refers to
    pub fn name(&self) -> &str {
        match self {
            TemplatedExercise::Explicit { name, .. } | TemplatedExercise::Shorthand { name, .. } => {
                name
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Session {
    pub name: String,
    pub exercises: Vec<TemplatedExercise>,
}

/// A reusable set of sessions parameterized by named inputs
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Template {
    pub name: String,
    pub alias: String,
    pub inputs: Vec<String>,
    pub sessions: Vec<Session>,
}

// ============================================================================
// Schedule
// ============================================================================

/// A named input supplied by a block
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Input {
    pub name: String,
    pub value: Statement,
}

/// A schedule entry instantiating one template
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Block {
    pub name: String,
    pub template: String,
    pub inputs: Vec<Input>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Schedule {
    pub blocks: Vec<Block>,
}

/// A fully loaded program
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Program {
    pub defaults: Defaults,
    pub exercises: Vec<DeclaredExercise>,
    pub templates: Vec<Template>,
    pub schedule: Schedule,
}

impl Program {
    pub fn exercise(&self, name: &str) -> Option<&DeclaredExercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }
}

// ============================================================================
// Rendered Output
// ============================================================================

/// Resolved prescription for one exercise slot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Definition {
    pub weight: f64,
    pub sets: f64,
    pub reps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
}

impl Definition {
    /// First field holding an infinity or NaN, e.g. after a division by zero
    pub fn non_finite_field(&self) -> Option<(&'static str, f64)> {
        [
            ("weight", Some(self.weight)),
            ("sets", Some(self.sets)),
            ("reps", Some(self.reps)),
            ("rpe", self.rpe),
        ]
        .into_iter()
        .find_map(|(field, value)| value.filter(|v| !v.is_finite()).map(|v| (field, v)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RenderedExercise {
    pub name: String,
    pub alias: String,
    pub definition: Definition,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RenderedSession {
    pub name: String,
    pub exercises: Vec<RenderedExercise>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RenderedBlock {
    pub name: String,
    pub sessions: Vec<RenderedSession>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RenderedSchedule {
    pub blocks: Vec<RenderedBlock>,
}

/// Output of [`crate::render`]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RenderedProgram {
    pub units: Units,
    pub schedule: RenderedSchedule,
}

impl RenderedProgram {
    /// Iterate every rendered exercise with its block and session
    pub fn exercises(
        &self,
    ) -> impl Iterator<Item = (&RenderedBlock, &RenderedSession, &RenderedExercise)> {
        self.schedule.blocks.iter().flat_map(|block| {
            block.sessions.iter().flat_map(move |session| {
                session
                    .exercises
                    .iter()
                    .map(move |exercise| (block, session, exercise))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.units, Units::Kilograms);
        assert_eq!(defaults.exercises.properties, vec!["starting weight"]);
        assert!(defaults.shorthand.enabled);
        assert!(defaults.shorthand.sets_before_reps);
    }

    #[test]
    fn test_units_parse() {
        assert_eq!("pounds".parse::<Units>().unwrap(), Units::Pounds);
        assert_eq!("kilograms".parse::<Units>().unwrap(), Units::Kilograms);
        assert!("stone".parse::<Units>().is_err());
    }

    #[test]
    fn test_exercise_bindings() {
        let exercise = DeclaredExercise {
            name: "squat".into(),
            alias: "Back Squat".into(),
            properties: BTreeMap::from([
                ("starting_weight".to_string(), 225.0),
                ("increment".to_string(), 5.0),
            ]),
        };
        let bindings: Vec<_> = exercise.bindings().collect();
        assert_eq!(
            bindings,
            vec![
                Binding::new("squat.increment", 5.0),
                Binding::new("squat.starting_weight", 225.0),
            ]
        );
    }

    #[test]
    fn test_definition_omits_missing_rpe() {
        let definition = Definition {
            weight: 100.0,
            sets: 3.0,
            reps: 5.0,
            rpe: None,
        };
        let json = serde_json::to_value(&definition).unwrap();
        assert!(json.get("rpe").is_none());
    }

    #[test]
    fn test_definition_non_finite_field() {
        let mut definition = Definition {
            weight: 100.0,
            sets: 3.0,
            reps: 5.0,
            rpe: Some(f64::NAN),
        };
        assert_eq!(definition.non_finite_field().map(|(f, _)| f), Some("rpe"));

        definition.rpe = None;
        assert_eq!(definition.non_finite_field(), None);

        definition.weight = f64::INFINITY;
        assert_eq!(
            definition.non_finite_field(),
            Some(("weight", f64::INFINITY))
        );
    }
}
