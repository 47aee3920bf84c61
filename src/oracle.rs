//! Experts that answer queries.
//!
//! An [`Oracle`] is asked whether a learner who fails every item of the
//! antecedent would practically certainly also fail the question. The call is
//! the only blocking point of a session.

use std::io::{BufRead, Write};

use crate::dataset::{Dataset, ItemRecord};
use crate::error::{OracleError, OracleResult};
use crate::item::{ItemId, ItemSet};
use crate::query::Answer;
use crate::states::{KnowledgeState, SearchStrategy, knowledge_states};
use crate::surmise::SurmiseFunction;

/// An expert's judgement on one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The learner would certainly fail the question too.
    CertainFail,
    /// The learner might still pass the question.
    CertainPass,
    /// The expert cannot decide.
    Uncertain,
}

impl Verdict {
    pub fn answer(self) -> Answer {
        match self {
            Verdict::CertainFail => Answer::Yes,
            Verdict::CertainPass => Answer::No,
            Verdict::Uncertain => Answer::Unanswered,
        }
    }
}

impl From<Verdict> for Answer {
    fn from(verdict: Verdict) -> Self {
        verdict.answer()
    }
}

pub trait Oracle {
    fn ask(
        &mut self,
        antecedent: &ItemSet,
        question: &ItemId,
        dataset: &Dataset,
    ) -> OracleResult<Verdict>;
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Text prompt for a human expert.
///
/// Lists the failed items and the target with 1-based numbers. Typing a
/// number prints that item's sample solution; `y`, `n` and `u` answer;
/// `clear` redraws the question.
pub struct ConsoleOracle<R, W> {
    input: R,
    output: W,
    show_ids: bool,
    clear_screen: bool,
}

impl ConsoleOracle<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOracle<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            show_ids: false,
            clear_screen: false,
        }
    }

    /// Print item ids next to their numbers.
    pub fn show_ids(mut self, show: bool) -> Self {
        self.show_ids = show;
        self
    }

    /// Clear the terminal before each question.
    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render(&mut self, numbered: &[&ItemRecord]) -> OracleResult<()> {
        if self.clear_screen {
            write!(self.output, "\x1b[2J\x1b[H")?;
        }
        let Some((target, failed)) = numbered.split_last() else {
            return Ok(());
        };

        writeln!(
            self.output,
            "A learner has just answered these tasks incorrectly:"
        )?;
        for (i, record) in failed.iter().enumerate() {
            self.render_item(i + 1, record)?;
        }
        writeln!(
            self.output,
            "\nIs it practically certain that the learner also fails this task?"
        )?;
        self.render_item(numbered.len(), target)?;
        writeln!(
            self.output,
            "\nAssume the answers reflect actual mastery, not luck or carelessness."
        )?;
        Ok(())
    }

    fn render_item(&mut self, number: usize, record: &ItemRecord) -> OracleResult<()> {
        if self.show_ids {
            write!(self.output, "({}) ", record.id)?;
        }
        writeln!(
            self.output,
            "{number}: {}",
            record.text.as_deref().unwrap_or(record.id.as_str())
        )?;
        if let Some(code) = &record.code {
            for line in code.lines() {
                writeln!(self.output, "\t{line}")?;
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> OracleResult<String> {
        write!(
            self.output,
            "\nNumber for a sample solution, y = yes, n = no, u = uncertain, or clear: "
        )?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(OracleError::Closed);
        }
        Ok(line.trim().to_lowercase())
    }
}

impl<R: BufRead, W: Write> Oracle for ConsoleOracle<R, W> {
    fn ask(
        &mut self,
        antecedent: &ItemSet,
        question: &ItemId,
        dataset: &Dataset,
    ) -> OracleResult<Verdict> {
        let numbered = antecedent
            .iter()
            .chain(std::iter::once(question))
            .map(|id| {
                dataset.get(id.as_str()).ok_or_else(|| OracleError::UnknownItem {
                    id: id.to_string(),
                })
            })
            .collect::<OracleResult<Vec<_>>>()?;

        self.render(&numbered)?;
        loop {
            let input = self.read_line()?;
            match input.as_str() {
                "y" => return Ok(Verdict::CertainFail),
                "n" => return Ok(Verdict::CertainPass),
                "u" => return Ok(Verdict::Uncertain),
                "clear" => self.render(&numbered)?,
                other => match other.parse::<usize>() {
                    Ok(n) if (1..=numbered.len()).contains(&n) => {
                        let record = numbered[n - 1];
                        writeln!(self.output, "\n--- Sample solution for {n} ---")?;
                        writeln!(
                            self.output,
                            "{}",
                            record.solution.as_deref().unwrap_or("(no sample solution)")
                        )?;
                    }
                    Ok(_) => writeln!(self.output, "Invalid number. Please try again.")?,
                    Err(_) => writeln!(
                        self.output,
                        "Invalid input. Please enter a number, or y/n/u."
                    )?,
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated experts
// ---------------------------------------------------------------------------

/// Answers from a known knowledge structure.
///
/// Failing every item of the antecedent means the learner's state is disjoint
/// from it, so the answer is yes iff no such state contains the question.
#[derive(Debug, Clone)]
pub struct StatesOracle {
    states: Vec<KnowledgeState>,
}

impl StatesOracle {
    pub fn new(states: Vec<KnowledgeState>) -> Self {
        Self { states }
    }

    /// Simulate the expert behind a known surmise function.
    pub fn from_surmise(
        surmise: &SurmiseFunction,
        items: &ItemSet,
        strategy: SearchStrategy,
    ) -> Self {
        Self::new(knowledge_states(surmise, items, strategy))
    }

    pub fn states(&self) -> &[KnowledgeState] {
        &self.states
    }

    pub fn judge(&self, antecedent: &ItemSet, question: &ItemId) -> Verdict {
        let passable = self
            .states
            .iter()
            .any(|state| state.is_disjoint(antecedent) && state.contains(question));
        if passable {
            Verdict::CertainPass
        } else {
            Verdict::CertainFail
        }
    }
}

impl Oracle for StatesOracle {
    fn ask(&mut self, antecedent: &ItemSet, question: &ItemId, _: &Dataset) -> OracleResult<Verdict> {
        Ok(self.judge(antecedent, question))
    }
}

/// Wraps a closure as an oracle.
pub struct FnOracle<F>(pub F);

impl<F> Oracle for FnOracle<F>
where
    F: FnMut(&ItemSet, &ItemId) -> Verdict,
{
    fn ask(&mut self, antecedent: &ItemSet, question: &ItemId, _: &Dataset) -> OracleResult<Verdict> {
        Ok((self.0)(antecedent, question))
    }
}
