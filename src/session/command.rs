//! The command language: typed commands plus the textual parser.
//!
//! The session's real entry point is the typed [`Command`] enum; the text
//! grammar below is a thin front end over it, and is also what session
//! state scripts are written in:
//!
//! ```text
//! @0 < 'data.dat'            # load a dataset file into slot 0
//! @+ = 0                     # append a fresh empty dataset
//! use @0                     # select the default dataset
//! title = 'scan 7'
//! %g = Gaussian              # declare (uninitialized)
//! %g = Gaussian(100, 12, 1)  # define with explicit parameters
//! guess %g = Gaussian in @0  # heuristic initialization
//! fit 50                     # refine, optional iteration cap
//! info data in @0 > 'out'    # info query, optional redirect
//! dump > 'state.fit'         # write the state script
//! M = 500                    # resize the point table (state replay)
//! X[0] = 1, Y[0] = 2, S[0] = 1
//! delete %g
//! reset
//! ```

use std::path::PathBuf;

use crate::domain::ShapeKind;
use crate::error::SessionError;

/// One session command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `@N < 'path'`
    Load { dataset: usize, path: PathBuf },
    /// `@+ = 0`
    AppendDataset,
    /// `use @N`
    Use { dataset: usize },
    /// `title = 'text'`
    Title { text: String },
    /// `%name = Shape`
    Declare { name: String, shape: ShapeKind },
    /// `%name = Shape(p1, p2, ...)`
    Define {
        name: String,
        shape: ShapeKind,
        params: Vec<f64>,
    },
    /// `guess %name = Shape [in @N]`
    Guess {
        name: String,
        shape: ShapeKind,
        dataset: Option<usize>,
    },
    /// `fit [maxiter]`
    Fit { max_iterations: Option<usize> },
    /// `info <topic> [in @N] [> 'path']`
    Info {
        topic: String,
        dataset: Option<usize>,
        redirect: Option<PathBuf>,
    },
    /// `dump > 'path'`
    Dump { path: PathBuf },
    /// `M = n`
    Resize { n: usize },
    /// `X[i] = v, Y[i] = v, S[i] = v`
    SetPoints { assigns: Vec<PointAssign> },
    /// `delete %name`
    Delete { name: String },
    /// `reset`
    Reset,
}

/// One coordinate assignment in a `SetPoints` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAssign {
    pub coord: Coord,
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coord {
    X,
    Y,
    S,
}

/// Parse one command line.
///
/// Returns `Ok(None)` for blank lines and comments.
pub fn parse_command(line: &str) -> Result<Option<Command>, SessionError> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line == "reset" {
        return Ok(Some(Command::Reset));
    }
    if line == "fit" {
        return Ok(Some(Command::Fit {
            max_iterations: None,
        }));
    }
    if let Some(rest) = line.strip_prefix("fit ") {
        let n = rest.trim().parse::<usize>().map_err(|_| {
            SessionError::command(format!("fit: bad iteration count '{}'.", rest.trim()))
        })?;
        return Ok(Some(Command::Fit {
            max_iterations: Some(n),
        }));
    }
    if let Some(rest) = line.strip_prefix("use ") {
        let dataset = parse_dataset_ref(rest.trim())?;
        return Ok(Some(Command::Use { dataset }));
    }
    if let Some(rest) = line.strip_prefix("title") {
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            return Err(SessionError::command("title: expected '='."));
        };
        let (text, tail) = parse_quoted(rest)?;
        expect_empty(tail, "title")?;
        return Ok(Some(Command::Title { text }));
    }
    if let Some(rest) = line.strip_prefix("guess ") {
        return parse_guess(rest.trim()).map(Some);
    }
    if let Some(rest) = line.strip_prefix("info ") {
        return parse_info(rest.trim()).map(Some);
    }
    if let Some(rest) = line.strip_prefix("dump") {
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('>') else {
            return Err(SessionError::command("dump: expected \"> 'path'\"."));
        };
        let (path, tail) = parse_quoted(rest)?;
        expect_empty(tail, "dump")?;
        return Ok(Some(Command::Dump {
            path: PathBuf::from(path),
        }));
    }
    if let Some(rest) = line.strip_prefix("delete ") {
        let (name, tail) = parse_func_ref(rest.trim())?;
        expect_empty(tail, "delete")?;
        return Ok(Some(Command::Delete { name }));
    }
    if line.starts_with('@') {
        return parse_dataset_command(line).map(Some);
    }
    if line.starts_with('%') {
        return parse_definition(line).map(Some);
    }
    if let Some(rest) = line.strip_prefix('M') {
        let rest = rest.trim_start();
        if let Some(rest) = rest.strip_prefix('=') {
            let n = rest.trim().parse::<usize>().map_err(|_| {
                SessionError::command(format!("M: bad point count '{}'.", rest.trim()))
            })?;
            return Ok(Some(Command::Resize { n }));
        }
    }
    if matches!(line.chars().next(), Some('X' | 'Y' | 'S')) && line.contains('[') {
        return parse_assignments(line).map(Some);
    }

    Err(SessionError::command(format!("Unknown command: '{line}'.")))
}

/// Truncate at the first `#` that is outside single quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quote = false;
    for (idx, c) in line.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '#' if !in_quote => return &line[..idx],
            _ => {}
        }
    }
    line
}

fn expect_empty(tail: &str, what: &str) -> Result<(), SessionError> {
    if tail.trim().is_empty() {
        Ok(())
    } else {
        Err(SessionError::command(format!(
            "{what}: unexpected trailing text '{}'.",
            tail.trim()
        )))
    }
}

/// `'text'` -> `(text, rest)`
fn parse_quoted(s: &str) -> Result<(String, &str), SessionError> {
    let s = s.trim_start();
    let Some(inner) = s.strip_prefix('\'') else {
        return Err(SessionError::command(format!(
            "Expected a quoted string, found '{s}'."
        )));
    };
    let Some(end) = inner.find('\'') else {
        return Err(SessionError::command("Unterminated quoted string."));
    };
    Ok((inner[..end].to_string(), &inner[end + 1..]))
}

/// `@N` -> N
fn parse_dataset_ref(s: &str) -> Result<usize, SessionError> {
    let Some(digits) = s.strip_prefix('@') else {
        return Err(SessionError::command(format!(
            "Expected a dataset reference like '@0', found '{s}'."
        )));
    };
    digits
        .trim()
        .parse::<usize>()
        .map_err(|_| SessionError::command(format!("Bad dataset reference '@{digits}'.")))
}

/// `%name` -> `(name, rest)`
fn parse_func_ref(s: &str) -> Result<(String, &str), SessionError> {
    let Some(rest) = s.strip_prefix('%') else {
        return Err(SessionError::command(format!(
            "Expected a function reference like '%name', found '{s}'."
        )));
    };
    let end = rest
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if end == 0 {
        return Err(SessionError::command("Expected a name after '%'."));
    }
    Ok((rest[..end].to_string(), &rest[end..]))
}

fn parse_shape_name(word: &str) -> Result<ShapeKind, SessionError> {
    ShapeKind::parse_name(word)
        .ok_or_else(|| SessionError::command(format!("Unknown function type: '{word}'.")))
}

/// `@N < 'path'` or `@+ = 0`
fn parse_dataset_command(line: &str) -> Result<Command, SessionError> {
    if let Some(rest) = line.strip_prefix("@+") {
        let rest = rest.trim_start();
        let ok = rest
            .strip_prefix('=')
            .map(|r| r.trim() == "0")
            .unwrap_or(false);
        if !ok {
            return Err(SessionError::command("Expected '@+ = 0'."));
        }
        return Ok(Command::AppendDataset);
    }

    let lt = line.find('<').ok_or_else(|| {
        SessionError::command(format!("Dataset command needs '<': '{line}'."))
    })?;
    let dataset = parse_dataset_ref(line[..lt].trim())?;
    let (path, tail) = parse_quoted(&line[lt + 1..])?;
    expect_empty(tail, "load")?;
    Ok(Command::Load {
        dataset,
        path: PathBuf::from(path),
    })
}

/// `%name = Shape` or `%name = Shape(p1, ...)`
fn parse_definition(line: &str) -> Result<Command, SessionError> {
    let (name, rest) = parse_func_ref(line)?;
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return Err(SessionError::command(format!(
            "Expected '=' in function definition: '{line}'."
        )));
    };
    let rest = rest.trim();

    match rest.find('(') {
        None => {
            let shape = parse_shape_name(rest)?;
            Ok(Command::Declare { name, shape })
        }
        Some(open) => {
            let shape = parse_shape_name(rest[..open].trim())?;
            let Some(inner) = rest[open + 1..].trim_end().strip_suffix(')') else {
                return Err(SessionError::command(format!(
                    "Missing ')' in function definition: '{line}'."
                )));
            };
            let mut params = Vec::new();
            for piece in inner.split(',') {
                let piece = piece.trim();
                let v = piece.parse::<f64>().map_err(|_| {
                    SessionError::command(format!("Bad parameter value '{piece}'."))
                })?;
                params.push(v);
            }
            if params.len() != shape.param_len() {
                return Err(SessionError::command(format!(
                    "{} takes {} parameters, found {}.",
                    shape.display_name(),
                    shape.param_len(),
                    params.len()
                )));
            }
            Ok(Command::Define {
                name,
                shape,
                params,
            })
        }
    }
}

/// `%name = Shape [in @N]` after the `guess ` keyword.
fn parse_guess(rest: &str) -> Result<Command, SessionError> {
    let (name, rest) = parse_func_ref(rest)?;
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return Err(SessionError::command("guess: expected '%name = Shape'."));
    };
    let mut rest = rest.trim();

    let mut dataset = None;
    if let Some(at) = rest.find(" in ") {
        dataset = Some(parse_dataset_ref(rest[at + 4..].trim())?);
        rest = rest[..at].trim();
    }

    let shape = parse_shape_name(rest)?;
    Ok(Command::Guess {
        name,
        shape,
        dataset,
    })
}

/// `<topic> [in @N] [> 'path']` after the `info ` keyword.
fn parse_info(rest: &str) -> Result<Command, SessionError> {
    let mut rest = rest.trim();

    let mut redirect = None;
    if let Some(gt) = rest.find('>') {
        let (path, tail) = parse_quoted(&rest[gt + 1..])?;
        expect_empty(tail, "info")?;
        redirect = Some(PathBuf::from(path));
        rest = rest[..gt].trim();
    }

    let mut dataset = None;
    if let Some(at) = rest.find(" in ") {
        dataset = Some(parse_dataset_ref(rest[at + 4..].trim())?);
        rest = rest[..at].trim();
    }

    if rest.is_empty() || !rest.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SessionError::command(format!(
            "info: bad topic '{rest}'."
        )));
    }

    Ok(Command::Info {
        topic: rest.to_string(),
        dataset,
        redirect,
    })
}

/// `X[i] = v, Y[i] = v, S[i] = v`
fn parse_assignments(line: &str) -> Result<Command, SessionError> {
    let mut assigns = Vec::new();
    for piece in line.split(',') {
        let piece = piece.trim();
        let mut chars = piece.chars();
        let coord = match chars.next() {
            Some('X') => Coord::X,
            Some('Y') => Coord::Y,
            Some('S') => Coord::S,
            _ => {
                return Err(SessionError::command(format!(
                    "Bad point assignment '{piece}'."
                )));
            }
        };
        let rest = chars.as_str().trim_start();
        let Some(rest) = rest.strip_prefix('[') else {
            return Err(SessionError::command(format!(
                "Bad point assignment '{piece}': expected '['."
            )));
        };
        let Some(close) = rest.find(']') else {
            return Err(SessionError::command(format!(
                "Bad point assignment '{piece}': expected ']'."
            )));
        };
        let index = rest[..close].trim().parse::<usize>().map_err(|_| {
            SessionError::command(format!("Bad point index in '{piece}'."))
        })?;
        let rest = rest[close + 1..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            return Err(SessionError::command(format!(
                "Bad point assignment '{piece}': expected '='."
            )));
        };
        let value = rest.trim().parse::<f64>().map_err(|_| {
            SessionError::command(format!("Bad point value in '{piece}'."))
        })?;
        assigns.push(PointAssign {
            coord,
            index,
            value,
        });
    }
    Ok(Command::SetPoints { assigns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# a comment").unwrap(), None);
    }

    #[test]
    fn inline_comments_are_stripped_outside_quotes() {
        assert_eq!(
            parse("fit 10 # converge harder"),
            Command::Fit {
                max_iterations: Some(10)
            }
        );
        assert_eq!(
            parse("title = 'with # inside'"),
            Command::Title {
                text: "with # inside".to_string()
            }
        );
    }

    #[test]
    fn load_command() {
        assert_eq!(
            parse("@0 < 'nacl01.dat'"),
            Command::Load {
                dataset: 0,
                path: PathBuf::from("nacl01.dat")
            }
        );
        assert!(parse_command("@x < 'f'").is_err());
        assert!(parse_command("@0 'f'").is_err());
    }

    #[test]
    fn dataset_management() {
        assert_eq!(parse("@+ = 0"), Command::AppendDataset);
        assert_eq!(parse("use @2"), Command::Use { dataset: 2 });
        assert_eq!(
            parse("title = 'scan 7'"),
            Command::Title {
                text: "scan 7".to_string()
            }
        );
    }

    #[test]
    fn guess_and_definitions() {
        assert_eq!(
            parse("guess %gauss = Gaussian"),
            Command::Guess {
                name: "gauss".to_string(),
                shape: ShapeKind::Gaussian,
                dataset: None
            }
        );
        assert_eq!(
            parse("guess %g2 = Lorentzian in @1"),
            Command::Guess {
                name: "g2".to_string(),
                shape: ShapeKind::Lorentzian,
                dataset: Some(1)
            }
        );
        assert_eq!(
            parse("%g = Gaussian"),
            Command::Declare {
                name: "g".to_string(),
                shape: ShapeKind::Gaussian
            }
        );
        assert_eq!(
            parse("%g = Gaussian(100, 12.3, 0.8)"),
            Command::Define {
                name: "g".to_string(),
                shape: ShapeKind::Gaussian,
                params: vec![100.0, 12.3, 0.8]
            }
        );
        assert!(parse_command("%g = Gaussian(1, 2)").is_err());
        assert!(parse_command("%g = Voigt").is_err());
    }

    #[test]
    fn fit_command() {
        assert_eq!(
            parse("fit"),
            Command::Fit {
                max_iterations: None
            }
        );
        assert_eq!(
            parse("fit 30"),
            Command::Fit {
                max_iterations: Some(30)
            }
        );
        assert!(parse_command("fit lots").is_err());
    }

    #[test]
    fn info_command() {
        assert_eq!(
            parse("info version"),
            Command::Info {
                topic: "version".to_string(),
                dataset: None,
                redirect: None
            }
        );
        assert_eq!(
            parse("info data in @0"),
            Command::Info {
                topic: "data".to_string(),
                dataset: Some(0),
                redirect: None
            }
        );
        assert_eq!(
            parse("info state >'saved.fit'"),
            Command::Info {
                topic: "state".to_string(),
                dataset: None,
                redirect: Some(PathBuf::from("saved.fit"))
            }
        );
    }

    #[test]
    fn dump_and_delete() {
        assert_eq!(
            parse("dump > 'state.fit'"),
            Command::Dump {
                path: PathBuf::from("state.fit")
            }
        );
        assert_eq!(
            parse("delete %g"),
            Command::Delete {
                name: "g".to_string()
            }
        );
    }

    #[test]
    fn point_table_commands() {
        assert_eq!(parse("M = 500"), Command::Resize { n: 500 });
        assert_eq!(
            parse("X[0] = 1.5, Y[0] = 2, S[0] = 1"),
            Command::SetPoints {
                assigns: vec![
                    PointAssign {
                        coord: Coord::X,
                        index: 0,
                        value: 1.5
                    },
                    PointAssign {
                        coord: Coord::Y,
                        index: 0,
                        value: 2.0
                    },
                    PointAssign {
                        coord: Coord::S,
                        index: 0,
                        value: 1.0
                    },
                ]
            }
        );
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("guess gauss = Gaussian").is_err());
    }
}
