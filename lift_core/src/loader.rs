//! Program loader.
//!
//! Validates a decoded [`Value`] tree into a [`Program`]. Validation is
//! shallow shape-checking: every mismatch becomes an
//! [`Error::InvalidProgram`] qualified by a colon-joined path such as
//! `templates:0:sessions:1:exercises:2:squat:weight`.
//!
//! Cross references (blocks to templates, templates to exercises) are
//! checked by the renderer, not here.

use crate::document::{Value, SHORTHAND_TAG};
use crate::types::*;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

type Entries = [(String, Value)];

const ROOT_KEYS: &[&str] = &["defaults", "exercises", "templates", "schedule"];
const DEFAULTS_KEYS: &[&str] = &["units", "exercises", "shorthand"];
const EXERCISE_DEFAULTS_KEYS: &[&str] = &["properties", "shorthand"];
const SHORTHAND_KEYS: &[&str] = &["enabled", "sets_before_reps"];
const TEMPLATE_KEYS: &[&str] = &["name", "alias", "renders_as", "inputs", "sessions"];
const SESSION_KEYS: &[&str] = &["name", "exercises"];
const EXPLICIT_KEYS: &[&str] = &["weight", "sets", "reps", "rpe"];
const SCHEDULE_KEYS: &[&str] = &["blocks"];
const BLOCK_KEYS: &[&str] = &["name", "template", "inputs"];
const DECLARED_EXERCISE_RESERVED: &[&str] = &["name", "alias", "renders_as"];

/// Load a program, falling back to the built-in defaults
pub fn load_program(document: &Value) -> Result<Program> {
    load_program_with(document, builtin_defaults())
}

/// Load a program, taking any default the document omits from `fallback`
pub fn load_program_with(document: &Value, fallback: &Defaults) -> Result<Program> {
    let root: &Entries = match document {
        Value::Null => &[],
        other => map(other, "")?,
    };
    warn_unknown_keys("", root, ROOT_KEYS);

    let defaults = match present(root, "defaults") {
        Some(value) => load_defaults(value, fallback, "defaults")?,
        None => fallback.clone(),
    };
    let exercises = load_exercises(present(root, "exercises"), &defaults, "exercises")?;
    let templates = load_templates(present(root, "templates"), &defaults, "templates")?;
    let schedule = load_schedule(present(root, "schedule"), "schedule")?;

    tracing::debug!(
        "Loaded program: {} exercises, {} templates, {} blocks",
        exercises.len(),
        templates.len(),
        schedule.blocks.len()
    );

    Ok(Program {
        defaults,
        exercises,
        templates,
        schedule,
    })
}

// ============================================================================
// Defaults
// ============================================================================

fn load_defaults(value: &Value, fallback: &Defaults, path: &str) -> Result<Defaults> {
    let entries = map(value, path)?;
    warn_unknown_keys(path, entries, DEFAULTS_KEYS);

    let units = match present(entries, "units") {
        Some(value) => {
            let path = child(path, "units");
            let text = string(value, &path)?;
            text.parse::<Units>().map_err(|_| {
                Error::at(
                    &path,
                    format!("expected kilograms or pounds, found \"{}\"", text),
                )
            })?
        }
        None => fallback.units,
    };

    let exercises_path = child(path, "exercises");
    let exercise_entries = present(entries, "exercises")
        .map(|v| map(v, &exercises_path))
        .transpose()?;
    if let Some(exercise_entries) = exercise_entries {
        warn_unknown_keys(&exercises_path, exercise_entries, EXERCISE_DEFAULTS_KEYS);
    }

    let properties = match exercise_entries.and_then(|e| present(e, "properties")) {
        Some(value) => string_list(value, &child(&exercises_path, "properties"))?,
        None => fallback.exercises.properties.clone(),
    };

    // `defaults:exercises:shorthand` is accepted when the top-level key is absent
    let shorthand = match present(entries, "shorthand") {
        Some(value) => load_shorthand(value, fallback.shorthand, &child(path, "shorthand"))?,
        None => match exercise_entries.and_then(|e| present(e, "shorthand")) {
            Some(value) => load_shorthand(
                value,
                fallback.shorthand,
                &child(&exercises_path, "shorthand"),
            )?,
            None => fallback.shorthand,
        },
    };

    Ok(Defaults {
        units,
        exercises: ExerciseDefaults { properties },
        shorthand,
    })
}

fn load_shorthand(value: &Value, fallback: ShorthandConfig, path: &str) -> Result<ShorthandConfig> {
    let entries = map(value, path)?;
    warn_unknown_keys(path, entries, SHORTHAND_KEYS);

    let enabled = match present(entries, "enabled") {
        Some(value) => boolean(value, &child(path, "enabled"))?,
        None => fallback.enabled,
    };
    let sets_before_reps = match present(entries, "sets_before_reps") {
        Some(value) => boolean(value, &child(path, "sets_before_reps"))?,
        None => fallback.sets_before_reps,
    };

    Ok(ShorthandConfig {
        enabled,
        sets_before_reps,
    })
}

// ============================================================================
// Declared Exercises
// ============================================================================

fn load_exercises(
    value: Option<&Value>,
    defaults: &Defaults,
    path: &str,
) -> Result<Vec<DeclaredExercise>> {
    let known_properties: HashSet<String> = defaults
        .exercises
        .properties
        .iter()
        .map(|p| property_key(p))
        .collect();

    let mut exercises: Vec<DeclaredExercise> = Vec::new();
    for (i, item) in optional_list(value, path)?.iter().enumerate() {
        let path = child(path, i);
        let entries = map(item, &path)?;
        let name = required_string(entries, "name", &path)?;
        if exercises.iter().any(|e| e.name == name) {
            return Err(Error::at(
                &child(&path, "name"),
                format!("duplicate exercise \"{}\"", name),
            ));
        }
        let alias = load_alias(entries, &path)?.unwrap_or_else(|| name.clone());

        let mut properties = BTreeMap::new();
        for (key, value) in entries {
            if DECLARED_EXERCISE_RESERVED.contains(&key.as_str()) {
                continue;
            }
            let value = number(value, &child(&path, key))?;
            let property = property_key(key);
            if !known_properties.contains(&property) {
                tracing::warn!(
                    "{} - property \"{}\" is not listed in defaults:exercises:properties",
                    path,
                    key
                );
            }
            if properties.insert(property.clone(), value).is_some() {
                return Err(Error::at(
                    &child(&path, key),
                    format!("duplicate property \"{}\"", property),
                ));
            }
        }

        exercises.push(DeclaredExercise {
            name,
            alias,
            properties,
        });
    }
    Ok(exercises)
}

/// Identifier form of a property name: `starting weight` -> `starting_weight`
fn property_key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

fn load_alias(entries: &Entries, path: &str) -> Result<Option<String>> {
    for key in ["alias", "renders_as"] {
        if let Some(value) = present(entries, key) {
            return Ok(Some(string(value, &child(path, key))?.to_string()));
        }
    }
    Ok(None)
}

// ============================================================================
// Templates
// ============================================================================

fn load_templates(value: Option<&Value>, defaults: &Defaults, path: &str) -> Result<Vec<Template>> {
    let mut templates: Vec<Template> = Vec::new();
    for (i, item) in optional_list(value, path)?.iter().enumerate() {
        let path = child(path, i);
        let entries = map(item, &path)?;
        warn_unknown_keys(&path, entries, TEMPLATE_KEYS);

        let name = required_string(entries, "name", &path)?;
        if templates.iter().any(|t| t.name == name) {
            return Err(Error::at(
                &child(&path, "name"),
                format!("duplicate template \"{}\"", name),
            ));
        }
        let alias = load_alias(entries, &path)?.unwrap_or_else(|| name.clone());
        let inputs = match present(entries, "inputs") {
            Some(value) => string_list(value, &child(&path, "inputs"))?,
            None => Vec::new(),
        };

        let sessions_path = child(&path, "sessions");
        let sessions = optional_list(present(entries, "sessions"), &sessions_path)?
            .iter()
            .enumerate()
            .map(|(j, session)| load_session(session, defaults, &child(&sessions_path, j)))
            .collect::<Result<Vec<_>>>()?;

        templates.push(Template {
            name,
            alias,
            inputs,
            sessions,
        });
    }
    Ok(templates)
}

fn load_session(value: &Value, defaults: &Defaults, path: &str) -> Result<Session> {
    let entries = map(value, path)?;
    warn_unknown_keys(path, entries, SESSION_KEYS);

    let name = required_string(entries, "name", path)?;
    let exercises_path = child(path, "exercises");
    let exercises = optional_list(present(entries, "exercises"), &exercises_path)?
        .iter()
        .enumerate()
        .map(|(k, item)| load_templated_exercise(item, defaults, &child(&exercises_path, k)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Session { name, exercises })
}

fn load_templated_exercise(
    value: &Value,
    defaults: &Defaults,
    path: &str,
) -> Result<TemplatedExercise> {
    let entries = map(value, path)?;
    let (name, value) = match entries {
        [(name, value)] => (name.clone(), value),
        _ => {
            return Err(Error::at(
                path,
                format!(
                    "expected a single exercise entry, found {} keys",
                    entries.len()
                ),
            ))
        }
    };
    let path = child(path, &name);

    match value {
        Value::Map(fields) => {
            warn_unknown_keys(&path, fields, EXPLICIT_KEYS);
            let weight = required_statement(fields, "weight", &path)?;
            let sets = required_statement(fields, "sets", &path)?;
            let reps = required_statement(fields, "reps", &path)?;
            let rpe = present(fields, "rpe")
                .map(|v| statement(v, &child(&path, "rpe")))
                .transpose()?;
            Ok(TemplatedExercise::Explicit {
                name,
                weight,
                sets,
                reps,
                rpe,
            })
        }
        Value::String(text) if defaults.shorthand.enabled => Ok(TemplatedExercise::Shorthand {
            name,
            value: text.clone(),
        }),
        Value::String(_) => Err(Error::at(
            &path,
            "implicit shorthand is disabled by defaults:shorthand:enabled; use an explicit map or a !shorthand tag",
        )),
        Value::Tagged { .. } => Ok(TemplatedExercise::Shorthand {
            name,
            value: shorthand_text(value, &path)?,
        }),
        other => Err(Error::at(
            &path,
            format!("expected map or shorthand string, found {}", other.kind()),
        )),
    }
}

// ============================================================================
// Schedule
// ============================================================================

fn load_schedule(value: Option<&Value>, path: &str) -> Result<Schedule> {
    let Some(value) = value else {
        return Ok(Schedule::default());
    };
    let entries = map(value, path)?;
    warn_unknown_keys(path, entries, SCHEDULE_KEYS);

    let blocks_path = child(path, "blocks");
    let blocks = optional_list(present(entries, "blocks"), &blocks_path)?
        .iter()
        .enumerate()
        .map(|(i, block)| load_block(block, &child(&blocks_path, i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Schedule { blocks })
}

fn load_block(value: &Value, path: &str) -> Result<Block> {
    let entries = map(value, path)?;
    warn_unknown_keys(path, entries, BLOCK_KEYS);

    let name = required_string(entries, "name", path)?;
    let template = required_string(entries, "template", path)?;

    let inputs_path = child(path, "inputs");
    let mut inputs = Vec::new();
    match present(entries, "inputs") {
        None => {}
        // `inputs: {a: 1, b: 2}`
        Some(Value::Map(pairs)) => {
            for (input, value) in pairs {
                inputs.push(Input {
                    name: input.clone(),
                    value: statement(value, &child(&inputs_path, input))?,
                });
            }
        }
        // `inputs: [{a: 1}, {b: 2}]`
        Some(Value::List(items)) => {
            for (k, item) in items.iter().enumerate() {
                let item_path = child(&inputs_path, k);
                for (input, value) in map(item, &item_path)? {
                    inputs.push(Input {
                        name: input.clone(),
                        value: statement(value, &child(&item_path, input))?,
                    });
                }
            }
        }
        Some(other) => {
            return Err(Error::at(
                &inputs_path,
                format!("expected list, found {}", other.kind()),
            ))
        }
    }

    Ok(Block {
        name,
        template,
        inputs,
    })
}

// ============================================================================
// Shape helpers
// ============================================================================

fn child(path: &str, key: impl fmt::Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", path, key)
    }
}

fn expected(path: &str, kind: &str, found: &Value) -> Error {
    Error::at(path, format!("expected {}, found {}", kind, found.kind()))
}

/// Field lookup treating an explicit null the same as an absent key
fn present<'a>(entries: &'a Entries, key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
        .filter(|v| !v.is_null())
}

fn map<'a>(value: &'a Value, path: &str) -> Result<&'a Entries> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(expected(path, "map", other)),
    }
}

fn optional_list<'a>(value: Option<&'a Value>, path: &str) -> Result<&'a [Value]> {
    match value {
        None => Ok(&[]),
        Some(Value::List(items)) => Ok(items),
        Some(other) => Err(expected(path, "list", other)),
    }
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(expected(path, "string", other)),
    }
}

fn number(value: &Value, path: &str) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(expected(path, "number", other)),
    }
}

fn boolean(value: &Value, path: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(expected(path, "bool", other)),
    }
}

fn string_list(value: &Value, path: &str) -> Result<Vec<String>> {
    optional_list(Some(value), path)?
        .iter()
        .enumerate()
        .map(|(i, item)| string(item, &child(path, i)).map(str::to_string))
        .collect()
}

fn required_string(entries: &Entries, key: &str, path: &str) -> Result<String> {
    let path = child(path, key);
    match present(entries, key) {
        Some(value) => Ok(string(value, &path)?.to_string()),
        None => Err(Error::at(&path, "missing required field")),
    }
}

fn required_statement(entries: &Entries, key: &str, path: &str) -> Result<Statement> {
    let path = child(path, key);
    match present(entries, key) {
        Some(value) => statement(value, &path),
        None => Err(Error::at(&path, "missing required field")),
    }
}

/// A number, an expression string, or a `!shorthand` tagged string
fn statement(value: &Value, path: &str) -> Result<Statement> {
    match value {
        Value::Number(n) => Ok(Statement::Literal(*n)),
        Value::String(text) => Ok(Statement::Shorthand(text.clone())),
        Value::Tagged { .. } => Ok(Statement::Shorthand(shorthand_text(value, path)?)),
        other => Err(expected(path, "number or shorthand string", other)),
    }
}

fn shorthand_text(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::Tagged { tag, value } if tag == SHORTHAND_TAG => match value.as_ref() {
            Value::String(text) => Ok(text.clone()),
            // `!shorthand 7` may decode as a number
            Value::Number(n) => Ok(n.to_string()),
            other => Err(Error::at(
                path,
                format!("!{} tags must be used with strings, found {}", SHORTHAND_TAG, other.kind()),
            )),
        },
        Value::Tagged { tag, .. } => Err(Error::at(path, format!("unsupported tag !{}", tag))),
        other => Err(expected(path, "shorthand string", other)),
    }
}

fn warn_unknown_keys(path: &str, entries: &Entries, known: &[&str]) {
    let location = if path.is_empty() { "document" } else { path };
    for (key, _) in entries {
        if !known.contains(&key.as_str()) {
            tracing::warn!("{} - ignoring unknown field \"{}\"", location, key);
        }
    }
}
