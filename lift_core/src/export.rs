//! Export of rendered programs.
//!
//! A [`RenderedProgram`] can be written as JSON, YAML, or a flat CSV table
//! with one row per prescribed exercise.

use crate::types::{Definition, RenderedBlock, RenderedExercise, RenderedProgram, RenderedSession};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Output format for rendered programs
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "unknown output format '{}', expected json, yaml or csv",
                other
            )),
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "block", "session", "exercise", "alias", "weight", "sets", "reps", "rpe", "units",
];

/// A row in the CSV output
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    block: &'a str,
    session: &'a str,
    exercise: &'a str,
    alias: &'a str,
    weight: f64,
    sets: f64,
    reps: f64,
    rpe: Option<f64>,
    units: &'static str,
}

impl<'a> CsvRow<'a> {
    fn new(
        program: &RenderedProgram,
        block: &'a RenderedBlock,
        session: &'a RenderedSession,
        exercise: &'a RenderedExercise,
    ) -> Self {
        CsvRow {
            block: &block.name,
            session: &session.name,
            exercise: &exercise.name,
            alias: &exercise.alias,
            weight: exercise.definition.weight,
            sets: exercise.definition.sets,
            reps: exercise.definition.reps,
            rpe: exercise.definition.rpe,
            units: program.units.as_str(),
        }
    }
}

/// Write a rendered program in the given format
///
/// `pretty` only affects JSON. JSON has no infinity or NaN, so a program
/// holding one (a division by zero) fails with [`Error::Export`] naming the
/// exercise; YAML and CSV write them as `.inf`/`inf` and `.nan`/`NaN`.
pub fn write<W: Write>(
    rendered: &RenderedProgram,
    format: OutputFormat,
    pretty: bool,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            for (block, session, exercise) in rendered.exercises() {
                check_json_numbers(
                    &exercise.definition,
                    format_args!(
                        "block \"{}\" session \"{}\" exercise \"{}\"",
                        block.name, session.name, exercise.name
                    ),
                )?;
            }
            if pretty {
                serde_json::to_writer_pretty(&mut writer, rendered)?;
            } else {
                serde_json::to_writer(&mut writer, rendered)?;
            }
            writer.write_all(b"\n")?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, rendered)?,
        OutputFormat::Csv => write_csv(rendered, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Fail if a definition holds a value JSON cannot represent
pub fn check_json_numbers(definition: &Definition, location: impl fmt::Display) -> Result<()> {
    match definition.non_finite_field() {
        Some((field, value)) => Err(Error::Export(format!(
            "{}: {} is {}, which JSON cannot represent; use yaml or csv output",
            location, field, value
        ))),
        None => Ok(()),
    }
}

/// Write a rendered program to a file, creating parent directories
pub fn write_to_path(
    rendered: &RenderedProgram,
    format: OutputFormat,
    pretty: bool,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    write(rendered, format, pretty, std::io::BufWriter::new(file))?;
    tracing::info!("Wrote {} output to {:?}", format, path);
    Ok(())
}

// The header is written up front so an empty program still yields one.
fn write_csv<W: Write>(rendered: &RenderedProgram, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    let mut rows = 0;
    for (block, session, exercise) in rendered.exercises() {
        csv_writer.serialize(CsvRow::new(rendered, block, session, exercise))?;
        rows += 1;
    }
    csv_writer.flush()?;
    tracing::debug!("Wrote {} CSV rows", rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn sample() -> RenderedProgram {
        RenderedProgram {
            units: Units::Pounds,
            schedule: RenderedSchedule {
                blocks: vec![RenderedBlock {
                    name: "week 1".into(),
                    sessions: vec![RenderedSession {
                        name: "day 1".into(),
                        exercises: vec![
                            RenderedExercise {
                                name: "squat".into(),
                                alias: "Back Squat".into(),
                                definition: Definition {
                                    weight: 245.0,
                                    sets: 5.0,
                                    reps: 5.0,
                                    rpe: None,
                                },
                            },
                            RenderedExercise {
                                name: "bench".into(),
                                alias: "bench".into(),
                                definition: Definition {
                                    weight: 135.5,
                                    sets: 3.0,
                                    reps: 8.0,
                                    rpe: Some(8.0),
                                },
                            },
                        ],
                    }],
                }],
            },
        }
    }

    fn render_to_string(format: OutputFormat, pretty: bool) -> String {
        let mut buffer = Vec::new();
        write(&sample(), format, pretty, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_output() {
        let output = render_to_string(OutputFormat::Json, false);
        let parsed: RenderedProgram = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, sample());
        assert!(output.contains("\"units\":\"pounds\""));
        // Absent RPE is omitted rather than null
        assert!(!output.contains("null"));
    }

    #[test]
    fn test_yaml_output() {
        let output = render_to_string(OutputFormat::Yaml, true);
        let parsed: RenderedProgram = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_csv_output() {
        let output = render_to_string(OutputFormat::Csv, true);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "block,session,exercise,alias,weight,sets,reps,rpe,units"
        );
        assert_eq!(lines[1], "week 1,day 1,squat,Back Squat,245.0,5.0,5.0,,pounds");
        assert_eq!(lines[2], "week 1,day 1,bench,bench,135.5,3.0,8.0,8.0,pounds");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_to_path_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("program.csv");
        write_to_path(&sample(), OutputFormat::Csv, false, &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("block,"));
    }

    #[test]
    fn test_csv_output_for_empty_program() {
        let mut buffer = Vec::new();
        write(&RenderedProgram::default(), OutputFormat::Csv, false, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "block,session,exercise,alias,weight,sets,reps,rpe,units\n"
        );
    }

    fn divide_by_zero_program() -> RenderedProgram {
        let document = crate::document::from_yaml_str(
            r#"
exercises:
  - name: squat
    starting_weight: 225
templates:
  - name: t
    sessions:
      - name: day 1
        exercises:
          - squat: (squat.starting_weight / 0):5:5
schedule:
  blocks:
    - name: week 1
      template: t
"#,
        )
        .unwrap();
        crate::render_document(&document, &Defaults::default()).unwrap()
    }

    #[test]
    fn test_json_rejects_division_by_zero() {
        let rendered = divide_by_zero_program();
        assert!(rendered.schedule.blocks[0].sessions[0].exercises[0]
            .definition
            .weight
            .is_infinite());

        let mut buffer = Vec::new();
        let err = write(&rendered, OutputFormat::Json, false, &mut buffer).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        let message = err.to_string();
        assert!(message.contains("block \"week 1\" session \"day 1\" exercise \"squat\""));
        assert!(message.contains("weight is inf"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_yaml_and_csv_keep_division_by_zero() {
        let rendered = divide_by_zero_program();

        let mut yaml = Vec::new();
        write(&rendered, OutputFormat::Yaml, false, &mut yaml).unwrap();
        assert!(String::from_utf8(yaml).unwrap().contains("weight: .inf"));

        let mut csv = Vec::new();
        write(&rendered, OutputFormat::Csv, false, &mut csv).unwrap();
        assert!(String::from_utf8(csv)
            .unwrap()
            .contains("week 1,day 1,squat,squat,inf,5.0,5.0,,kilograms"));
    }
}
