//! Model file parser for the line-oriented text format
//!
//! One directive per line, whitespace separated:
//!
//! ```text
//! # comment
//! v x y z [w]          vertex, w defaults to 1
//! f a b c              face over 1-based vertex indices (a/t/n accepted)
//! xc i [r [g [b [a]]]] face color, missing channels 0, alpha 255
//! ```
//!
//! `vt`, `vn`, `vp` and `l` are accepted and ignored; unknown directives
//! are logged and skipped.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res, opt, rest},
    multi::separated_list0,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::{LoadError, ModelError, ParseError, ParseErrorKind};
use crate::geometry::Color;
use crate::model::Model;
use crate::vector::Vector;

const VERTEX_FIELDS: [&str; 4] = ["x", "y", "z", "w"];
const COLOR_FIELDS: [&str; 4] = ["r", "g", "b", "a"];

/// Split a line into whitespace separated fields
fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(space0, separated_list0(space1, is_not(" \t")))(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    all_consuming(double)(input)
}

fn channel(input: &str) -> IResult<&str, u8> {
    all_consuming(map_res(digit1, |s: &str| s.parse::<u8>()))(input)
}

fn index(input: &str) -> IResult<&str, usize> {
    all_consuming(map_res(digit1, |s: &str| s.parse::<usize>()))(input)
}

/// A face corner: `v`, `v/t`, `v//n` or `v/t/n`; only `v` is kept
fn corner(input: &str) -> IResult<&str, usize> {
    all_consuming(terminated(
        map_res(digit1, |s: &str| s.parse::<usize>()),
        opt(preceded(tag("/"), rest)),
    ))(input)
}

struct Line<'a> {
    number: usize,
    text: &'a str,
}

impl Line<'_> {
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.number,
            kind,
            text: self.text.to_string(),
        }
    }

    /// Report a 0-based model index error with 1-based file indices
    fn model_error(&self, err: ModelError) -> ParseError {
        self.error(match err {
            ModelError::VertexOutOfRange { index, count } => ParseErrorKind::VertexOutOfRange {
                index: index + 1,
                count,
            },
            ModelError::FaceOutOfRange { index, count } => ParseErrorKind::FaceOutOfRange {
                index: index + 1,
                count,
            },
        })
    }

    fn field<T>(
        &self,
        parser: fn(&str) -> IResult<&str, T>,
        field: &'static str,
        value: &str,
    ) -> Result<T, ParseError> {
        parser(value).map(|(_, v)| v).map_err(|_| {
            self.error(ParseErrorKind::InvalidNumber {
                field,
                value: value.to_string(),
            })
        })
    }

    fn arity(
        &self,
        directive: &'static str,
        values: &[&str],
        min: usize,
        max: usize,
    ) -> Result<(), ParseError> {
        let found = values.len();
        if found < min {
            return Err(self.error(ParseErrorKind::TooFewValues {
                directive,
                expected: min,
                found,
            }));
        }
        if found > max {
            return Err(self.error(ParseErrorKind::TooManyValues {
                directive,
                expected: max,
                found,
            }));
        }
        Ok(())
    }
}

/// Parse a model description. Any error discards the whole model.
pub fn parse(source: &str) -> Result<Model, ParseError> {
    let mut model = Model::new();

    for (i, text) in source.lines().enumerate() {
        let line = Line {
            number: i + 1,
            text: text.trim_end(),
        };
        // `fields` cannot fail: an empty line yields an empty list
        let values = match fields(line.text) {
            Ok((_, values)) => values,
            Err(_) => continue,
        };
        let Some((&directive, values)) = values.split_first() else {
            continue;
        };

        match directive {
            "v" => {
                line.arity("v", values, 3, 4)?;
                let mut xyzw = [0.0, 0.0, 0.0, 1.0];
                for (slot, (value, name)) in xyzw.iter_mut().zip(values.iter().zip(VERTEX_FIELDS)) {
                    *slot = line.field(number, name, value)?;
                }
                model.add_vertex(Vector::new(xyzw[0], xyzw[1], xyzw[2], xyzw[3]));
            }
            "f" => {
                line.arity("f", values, 3, 3)?;
                let mut indices = [0usize; 3];
                for (slot, value) in indices.iter_mut().zip(values) {
                    let one_based = line.field(corner, "vertex index", value)?;
                    if one_based == 0 {
                        return Err(line.error(ParseErrorKind::VertexOutOfRange {
                            index: 0,
                            count: model.vertices().len(),
                        }));
                    }
                    *slot = one_based - 1;
                }
                model
                    .add_face(indices, Color::WHITE)
                    .map_err(|err| line.model_error(err))?;
            }
            "xc" => {
                line.arity("xc", values, 1, 5)?;
                let face = line.field(index, "face index", values[0])?;
                if face == 0 {
                    return Err(line.error(ParseErrorKind::FaceOutOfRange {
                        index: 0,
                        count: model.len(),
                    }));
                }
                let mut rgba = [0u8, 0, 0, 255];
                let channels = values[1..].iter().zip(COLOR_FIELDS);
                for (slot, (value, name)) in rgba.iter_mut().zip(channels) {
                    *slot = line.field(channel, name, value)?;
                }
                let [r, g, b, a] = rgba;
                model
                    .set_face_color(face - 1, Color::rgba(r, g, b, a))
                    .map_err(|err| line.model_error(err))?;
            }
            "vt" | "vn" | "vp" | "l" => {}
            comment if comment.starts_with('#') => {}
            _ => warn!("ignoring line {}: {}", line.number, line.text),
        }
    }

    debug!(
        "parsed model with {} vertices and {} faces",
        model.vertices().len(),
        model.len()
    );
    Ok(model)
}

/// Find a model file: the name as given, then with `.obj` appended, then
/// under `resources/objects` in the working directory.
pub fn resolve_path(name: &Path) -> Option<PathBuf> {
    if name.is_file() {
        return Some(name.to_path_buf());
    }
    let with_extension = if name.extension().is_some_and(|ext| ext == "obj") {
        name.to_path_buf()
    } else {
        let mut file = name.as_os_str().to_owned();
        file.push(".obj");
        PathBuf::from(file)
    };
    if with_extension.is_file() {
        return Some(with_extension);
    }
    let bundled = Path::new("resources").join("objects").join(&with_extension);
    bundled.is_file().then_some(bundled)
}

/// Resolve and parse a model file
pub fn load(name: impl AsRef<Path>) -> Result<Model, LoadError> {
    let name = name.as_ref();
    let path = resolve_path(name).ok_or_else(|| LoadError::NotFound(name.to_path_buf()))?;
    let source = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let model = parse(&source)?;
    debug!("loaded {} from {}", name.display(), path.display());
    Ok(model)
}
