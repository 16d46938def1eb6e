//! Cases files hold one case per line as whitespace separated numbers. They are used for the
//! activations, the truths and the outputs of a perceptron.

use std::{fmt::Write as _, fs, path::Path};

use crate::{OrchestratorError, Result};

/// Parses the numbers of a single line.
pub(crate) fn parse_row(line: usize, text: &str) -> Result<Vec<f32>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| OrchestratorError::parse(line, format!("invalid number {token:?}")))
        })
        .collect()
}

/// Parses every non blank line of `text` as a case.
pub fn parse_cases(text: &str) -> Result<Vec<Vec<f32>>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_row(i + 1, line))
        .collect()
}

/// Reads the cases of the file at `path`.
pub fn read_cases<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f32>>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(OrchestratorError::io(path))?;

    parse_cases(&text).map_err(|e| e.in_file(path))
}

/// Formats `rows` one case per line.
pub fn render_cases<I>(rows: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<[f32]>,
{
    let mut text = String::new();

    for row in rows {
        push_row(&mut text, row.as_ref());
        text.push('\n');
    }

    text
}

/// Creates or truncates the file at `path` and writes `rows` into it.
pub fn write_cases<P, I>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: AsRef<[f32]>,
{
    let path = path.as_ref();
    fs::write(path, render_cases(rows)).map_err(OrchestratorError::io(path))
}

pub(crate) fn push_row(text: &mut String, row: &[f32]) {
    for (i, v) in row.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }

        let _ = write!(text, "{v}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let cases = parse_cases("0 1\n\n  1\t0  \n").unwrap();
        assert_eq!(cases, vec![vec![0., 1.], vec![1., 0.]]);
    }

    #[test]
    fn bad_numbers_report_their_line() {
        let err = parse_cases("0 1\n\n1 x\n").unwrap_err();
        assert!(matches!(err, OrchestratorError::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn rendered_cases_parse_back() {
        let rows = vec![vec![0.25, 1.], vec![0.1, -3.5]];
        let text = render_cases(&rows);

        assert_eq!(text, "0.25 1\n0.1 -3.5\n");
        assert_eq!(parse_cases(&text).unwrap(), rows);
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.txt");
        let rows = [[0.5f32, 0.75]];

        write_cases(&path, rows).unwrap();
        assert_eq!(read_cases(&path).unwrap(), vec![vec![0.5, 0.75]]);
    }

    #[test]
    fn missing_files_name_the_path() {
        let err = read_cases("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().starts_with("/definitely/not/here.txt"));
    }
}
