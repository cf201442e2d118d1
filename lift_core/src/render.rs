//! Renderer: resolves every templated exercise slot to concrete numbers.
//!
//! For each schedule block the renderer:
//! 1. looks up the block's template
//! 2. resolves the block inputs against declared-exercise properties
//! 3. resolves each session's exercise slots against properties + inputs
//!
//! Rendering is pure; the same program always renders the same output.

use crate::document::Value;
use crate::shorthand::{resolve_definition, resolve_expression, Binding};
use crate::types::*;
use crate::{loader, Error, Result};

/// Render a loaded program
///
/// Fails on the first error; no partial output is produced.
pub fn render(program: &Program) -> Result<RenderedProgram> {
    tracing::debug!("Rendering {} blocks", program.schedule.blocks.len());

    let exercise_bindings: Vec<Binding> = program
        .exercises
        .iter()
        .flat_map(DeclaredExercise::bindings)
        .collect();

    let blocks = program
        .schedule
        .blocks
        .iter()
        .map(|block| render_block(program, &exercise_bindings, block))
        .collect::<Result<Vec<_>>>()?;

    Ok(RenderedProgram {
        units: program.defaults.units,
        schedule: RenderedSchedule { blocks },
    })
}

/// Load and render a decoded document in one step
pub fn render_document(document: &Value, fallback: &Defaults) -> Result<RenderedProgram> {
    let program = loader::load_program_with(document, fallback)?;
    render(&program)
}

/// Build the identifier scope for one block
///
/// Block inputs are resolved against exercise properties only, then
/// appended. An input whose name is already bound replaces the earlier
/// value (last write wins).
pub fn block_scope(exercise_bindings: &[Binding], block: &Block) -> Result<Vec<Binding>> {
    let mut identifiers = exercise_bindings.to_vec();
    for input in &block.inputs {
        let value = resolve_statement(&input.value, exercise_bindings).map_err(|e| {
            e.context(format!("block \"{}\" input \"{}\"", block.name, input.name))
        })?;

        match identifiers.iter_mut().find(|b| b.name == input.name) {
            Some(existing) => {
                tracing::warn!(
                    "block \"{}\": input \"{}\" shadows an existing identifier",
                    block.name,
                    input.name
                );
                existing.value = value;
            }
            None => identifiers.push(Binding::new(input.name.as_str(), value)),
        }
    }
    Ok(identifiers)
}

fn render_block(
    program: &Program,
    exercise_bindings: &[Binding],
    block: &Block,
) -> Result<RenderedBlock> {
    let template = program.template(&block.template).ok_or_else(|| {
        Error::InvalidProgram(format!(
            "invalid schedule - block \"{}\" references undeclared template \"{}\"",
            block.name, block.template
        ))
    })?;
    warn_input_mismatch(template, block);

    let identifiers = block_scope(exercise_bindings, block)?;
    tracing::trace!(block = %block.name, ?identifiers, "built block scope");

    let sessions = template
        .sessions
        .iter()
        .map(|session| render_session(program, block, &identifiers, session))
        .collect::<Result<Vec<_>>>()?;

    Ok(RenderedBlock {
        name: block.name.clone(),
        sessions,
    })
}

fn render_session(
    program: &Program,
    block: &Block,
    identifiers: &[Binding],
    session: &Session,
) -> Result<RenderedSession> {
    let exercises = session
        .exercises
        .iter()
        .map(|slot| {
            render_exercise(program, block, identifiers, slot).map_err(|e| {
                e.context(format!(
                    "block \"{}\" session \"{}\" exercise \"{}\"",
                    block.name,
                    session.name,
                    slot.name()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RenderedSession {
        name: session.name.clone(),
        exercises,
    })
}

fn render_exercise(
    program: &Program,
    block: &Block,
    identifiers: &[Binding],
    slot: &TemplatedExercise,
) -> Result<RenderedExercise> {
    let declared = program.exercise(slot.name()).ok_or_else(|| {
        Error::InvalidProgram(format!(
            "invalid session - block \"{}\" references undeclared exercise \"{}\"",
            block.name,
            slot.name()
        ))
    })?;

    let definition = match slot {
        TemplatedExercise::Explicit {
            weight,
            sets,
            reps,
            rpe,
            ..
        } => Definition {
            weight: resolve_statement(weight, identifiers)?,
            sets: resolve_statement(sets, identifiers)?,
            reps: resolve_statement(reps, identifiers)?,
            rpe: rpe
                .as_ref()
                .map(|statement| resolve_statement(statement, identifiers))
                .transpose()?,
        },
        TemplatedExercise::Shorthand { value, .. } => {
            resolve_definition(&program.defaults.shorthand, value, identifiers)?
        }
    };

    Ok(RenderedExercise {
        name: declared.name.clone(),
        alias: declared.alias.clone(),
        definition,
    })
}

fn resolve_statement(statement: &Statement, identifiers: &[Binding]) -> Result<f64> {
    match statement {
        Statement::Literal(value) => Ok(*value),
        Statement::Shorthand(text) => resolve_expression(text, identifiers),
    }
}

// Inputs are matched to template declarations loosely; mismatches only warn.
fn warn_input_mismatch(template: &Template, block: &Block) {
    for declared in &template.inputs {
        if !block.inputs.iter().any(|i| &i.name == declared) {
            tracing::warn!(
                "block \"{}\" does not supply input \"{}\" declared by template \"{}\"",
                block.name,
                declared,
                template.name
            );
        }
    }
    for input in &block.inputs {
        if !template.inputs.contains(&input.name) {
            tracing::warn!(
                "block \"{}\" supplies input \"{}\" not declared by template \"{}\"",
                block.name,
                input.name,
                template.name
            );
        }
    }
}
