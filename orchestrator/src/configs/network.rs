use std::{fmt::Write as _, fs, path::Path, str::FromStr};

use crate::{OrchestratorError, Result, cases};

/// The amount of lines of a network file without inline cases.
const HEADER_LINES: usize = 9;

/// The most activations a merged network file may repeat across its cases.
const MAX_MERGED_VALUES: usize = 1 << 28;

/// The perceptron's text configuration file, one value per line:
///
/// ```text
/// 4           input nodes
/// 2 3 3       hidden layer count, then the nodes of each hidden layer
/// 1           output nodes
/// 4           number of cases
/// 1.0         lambda
/// 0.01        minimum error
/// 10000       maximum steps
/// -1          low bound of the random weights
/// 1           high bound of the random weights
/// ```
///
/// The combined form carries its training cases right after the number of cases, one line per
/// case holding its inputs followed by its truths.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub inputs: usize,
    pub hidden: Vec<usize>,
    pub outputs: usize,
    pub num_cases: usize,
    pub lambda: f32,
    pub min_error: f32,
    pub max_steps: usize,
    pub low: f32,
    pub high: f32,
    /// The inline training cases of the combined form, empty otherwise.
    pub cases: Vec<Vec<f32>>,
}

impl NetworkConfig {
    /// Parses a network file, detecting whether it's the combined form by its line count.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let mut lines = Lines {
            lines: &lines,
            next: 0,
        };

        let inputs = lines.value("input nodes")?;
        let hidden = lines.hidden()?;
        let outputs = lines.value("output nodes")?;
        let num_cases: usize = lines.value("number of cases")?;

        let cases = match lines.remaining() {
            n if n == HEADER_LINES - 4 => Vec::new(),
            n if Some(n) == num_cases.checked_add(HEADER_LINES - 4) => (0..num_cases)
                .map(|_| lines.case(inputs + outputs))
                .collect::<Result<_>>()?,
            n => {
                return Err(OrchestratorError::parse(
                    lines.line(),
                    format!(
                        "expected {} lines after the number of cases, or {} with inline cases, got {n}",
                        HEADER_LINES - 4,
                        num_cases.saturating_add(HEADER_LINES - 4)
                    ),
                ));
            }
        };

        Ok(Self {
            inputs,
            hidden,
            outputs,
            num_cases,
            cases,
            lambda: lines.value("lambda")?,
            min_error: lines.value("minimum error")?,
            max_steps: lines.value("maximum steps")?,
            low: lines.value("low weight bound")?,
            high: lines.value("high weight bound")?,
        })
    }

    /// Reads and parses the network file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(OrchestratorError::io(path))?;

        Self::parse(&text).map_err(|e| e.in_file(path))
    }

    /// Formats this config in the same layout `parse` reads.
    pub fn render(&self) -> String {
        let mut text = String::new();

        let _ = writeln!(text, "{}", self.inputs);
        let _ = write!(text, "{}", self.hidden.len());
        for n in &self.hidden {
            let _ = write!(text, " {n}");
        }
        let _ = writeln!(text, "\n{}", self.outputs);
        let _ = writeln!(text, "{}", self.num_cases);

        for case in &self.cases {
            cases::push_row(&mut text, case);
            text.push('\n');
        }

        let _ = writeln!(text, "{}", self.lambda);
        let _ = writeln!(text, "{}", self.min_error);
        let _ = writeln!(text, "{}", self.max_steps);
        let _ = writeln!(text, "{}", self.low);
        let _ = writeln!(text, "{}", self.high);
        text
    }

    /// Creates or truncates the file at `path` and writes this config into it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(OrchestratorError::io(path))
    }

    pub fn is_combined(&self) -> bool {
        !self.cases.is_empty()
    }

    /// Splits the inline cases into their inputs and their truths.
    pub fn split_cases(&self) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        self.cases
            .iter()
            .map(|case| {
                let (x, y) = case.split_at(self.inputs.min(case.len()));
                (x.to_vec(), y.to_vec())
            })
            .unzip()
    }

    /// Builds a combined network file that trains the perceptron to reproduce `activations`.
    ///
    /// The nodes, the number of cases and the training parameters are taken from `template`,
    /// every case has `activations` as both its inputs and its truths.
    ///
    /// # Returns
    /// The combined config or an error if the amount of activations doesn't match the
    /// template's input or output nodes, or if repeating them for every case would be too large.
    pub fn merge_activations(activations: &[f32], template: &NetworkConfig) -> Result<Self> {
        for (what, nodes) in [("input", template.inputs), ("output", template.outputs)] {
            if activations.len() != nodes {
                return Err(OrchestratorError::InvalidConfig(format!(
                    "{} activations don't match the {nodes} {what} nodes of the network",
                    activations.len()
                )));
            }
        }

        let case = [activations, activations].concat();
        if !template
            .num_cases
            .checked_mul(case.len())
            .is_some_and(|n| n <= MAX_MERGED_VALUES)
        {
            return Err(OrchestratorError::InvalidConfig(format!(
                "{} cases of {} values are too many to merge",
                template.num_cases,
                case.len()
            )));
        }

        Ok(Self {
            cases: vec![case; template.num_cases],
            ..template.clone()
        })
    }
}

/// A cursor over the non blank lines of a network file.
struct Lines<'a> {
    lines: &'a [(usize, &'a str)],
    next: usize,
}

impl<'a> Lines<'a> {
    fn remaining(&self) -> usize {
        self.lines.len() - self.next
    }

    /// The number of the line about to be read, or the one after the last line.
    fn line(&self) -> usize {
        match self.lines.get(self.next) {
            Some(&(n, _)) => n,
            None => self.lines.last().map_or(1, |&(n, _)| n + 1),
        }
    }

    fn take(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let line = self.lines.get(self.next).copied().ok_or_else(|| {
            OrchestratorError::parse(self.line(), format!("missing {what}"))
        })?;

        self.next += 1;
        Ok(line)
    }

    fn value<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let (n, text) = self.take(what)?;

        text.parse()
            .map_err(|_| OrchestratorError::parse(n, format!("invalid {what} {text:?}")))
    }

    fn hidden(&mut self) -> Result<Vec<usize>> {
        let (n, text) = self.take("hidden layers")?;
        let invalid = |token: &str| OrchestratorError::parse(n, format!("invalid hidden layer size {token:?}"));

        let mut tokens = text.split_whitespace();
        let count: usize = match tokens.next() {
            Some(token) => token.parse().map_err(|_| invalid(token))?,
            None => return Err(OrchestratorError::parse(n, "missing hidden layer count")),
        };

        let hidden = tokens
            .map(|token| token.parse().map_err(|_| invalid(token)))
            .collect::<Result<Vec<usize>>>()?;

        if hidden.len() != count {
            return Err(OrchestratorError::parse(
                n,
                format!("expected {count} hidden layer sizes, got {}", hidden.len()),
            ));
        }

        Ok(hidden)
    }

    fn case(&mut self, width: usize) -> Result<Vec<f32>> {
        let (n, text) = self.take("training case")?;
        let case = cases::parse_row(n, text)?;

        if case.len() != width {
            return Err(OrchestratorError::parse(
                n,
                format!("expected {width} values per case, got {}", case.len()),
            ));
        }

        Ok(case)
    }
}
