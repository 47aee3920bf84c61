//! The questioning loop.
//!
//! A [`Session`] ties a [`LearningSpace`] to a [`QueryManager`] and an
//! optional answer log. [`Session::run`] asks the oracle until the candidate
//! pool is exhausted, saving the log after every recorded answer, and then
//! runs the second stage over the pending table.

use std::path::{Path, PathBuf};

use crate::answer_log::AnswerLog;
use crate::config::{SessionConfig, UncertainPolicy};
use crate::dataset::Dataset;
use crate::error::SurmiseResult;
use crate::generate::generate_queries_by_block;
use crate::item::ItemSet;
use crate::manager::QueryManager;
use crate::oracle::{Oracle, Verdict};
use crate::query::{Answer, QueryKey};
use crate::space::{Acceptance, LearningSpace, SecondStageReport};

/// Counts from one call to [`Session::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Oracle calls made.
    pub asked: usize,
    pub positive: usize,
    pub negative: usize,
    pub deferred: usize,
    /// Uncertain verdicts, whether retried or skipped.
    pub uncertain: usize,
    pub second_stage: SecondStageReport,
}

pub struct Session {
    space: LearningSpace,
    manager: QueryManager,
    config: SessionConfig,
    log_path: Option<PathBuf>,
}

impl Session {
    /// Fresh session over `items` with a generated candidate pool.
    pub fn new(items: ItemSet, config: SessionConfig) -> Self {
        let mut rng = config.rng();
        let queries =
            generate_queries_by_block(&items, config.max_block_size, &config.caps(), &mut rng);
        tracing::info!(
            items = items.len(),
            queries = queries.len(),
            max_block_size = config.max_block_size,
            "generated candidate queries"
        );
        Self::with_queries(items, queries, config)
    }

    /// Fresh session over an explicit candidate pool.
    pub fn with_queries(items: ItemSet, queries: Vec<QueryKey>, config: SessionConfig) -> Self {
        let manager = QueryManager::new(queries).with_selection(config.selection, config.rng());
        Self {
            space: LearningSpace::new(items),
            manager,
            config,
            log_path: None,
        }
    }

    /// Rebuild a session from a saved log.
    ///
    /// Answers are replayed in order; when the log carries the remaining
    /// active pool it replaces the freshly generated one, even if empty.
    pub fn resume(items: ItemSet, config: SessionConfig, log: &AnswerLog) -> Self {
        let mut session = Self::new(items, config);
        log.replay(&mut session.manager, &mut session.space);
        if let Some(keys) = log.active_keys() {
            session.manager.restore_active(keys);
        }
        tracing::info!(
            answered = session.manager.answered().len(),
            active = session.manager.n_active(),
            "resumed session"
        );
        session
    }

    /// Save the answer log to `path` after every recorded answer.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn space(&self) -> &LearningSpace {
        &self.space
    }

    pub fn manager(&self) -> &QueryManager {
        &self.manager
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn into_space(self) -> LearningSpace {
        self.space
    }

    /// Current answers and remaining pool.
    pub fn answer_log(&self) -> AnswerLog {
        AnswerLog::from_manager(&self.manager)
    }

    /// Write the answer log, if a path is set.
    pub fn save(&self) -> SurmiseResult<()> {
        if let Some(path) = &self.log_path {
            self.answer_log().save(path)?;
        }
        Ok(())
    }

    /// Ask until the pool is exhausted, then run the second stage.
    ///
    /// An oracle error ends the run early; every answer recorded before it
    /// is already saved.
    pub fn run<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        dataset: &Dataset,
    ) -> SurmiseResult<SessionSummary> {
        let mut summary = SessionSummary::default();

        while let Some(query) = self.manager.get_next_query(&self.space) {
            let verdict = oracle.ask(&query.key.antecedent, &query.key.question, dataset)?;
            summary.asked += 1;

            let answer = match (verdict, self.config.uncertain) {
                (Verdict::Uncertain, UncertainPolicy::Retry) => {
                    summary.uncertain += 1;
                    tracing::debug!(query = %query.key, "uncertain, asking again");
                    continue;
                }
                (Verdict::Uncertain, UncertainPolicy::Skip) => {
                    summary.uncertain += 1;
                    Answer::Unanswered
                }
                (verdict, _) => verdict.answer(),
            };

            match self.manager.record_answer(&mut self.space, query.key, answer) {
                Acceptance::Positive => summary.positive += 1,
                Acceptance::Negative => summary.negative += 1,
                Acceptance::Deferred => summary.deferred += 1,
                Acceptance::Ignored => {}
            }
            tracing::debug!("learning space after answer:\n{}", self.space);
            self.save()?;
        }

        summary.second_stage = self.finish();
        self.save()?;
        tracing::info!(
            asked = summary.asked,
            positive = summary.positive,
            negative = summary.negative,
            deferred = summary.deferred,
            recovered = summary.second_stage.accepted,
            pending = summary.second_stage.remaining,
            "session complete"
        );
        Ok(summary)
    }

    /// Run the second stage over the pending table.
    pub fn finish(&mut self) -> SecondStageReport {
        self.space.run_second_stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OracleError, SurmiseError};
    use crate::item::{ItemId, item_set};
    use crate::oracle::{FnOracle, StatesOracle};
    use crate::states::SearchStrategy;
    use crate::surmise::SurmiseFunction;

    fn config() -> SessionConfig {
        SessionConfig {
            max_block_size: 2,
            seed: Some(3),
            ..Default::default()
        }
    }

    fn chain() -> (ItemSet, SurmiseFunction) {
        let items = item_set(["a", "b", "c"]);
        let mut sf = SurmiseFunction::new();
        sf.add_clause(&"b".into(), item_set(["a"]));
        sf.add_clause(&"c".into(), item_set(["b"]));
        (items, sf)
    }

    #[test]
    fn simulated_expert_keeps_true_states_feasible() {
        let (items, truth) = chain();
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut oracle = StatesOracle::from_surmise(&truth, &items, SearchStrategy::Breadth);

        let mut session = Session::new(items.clone(), config());
        let summary = session.run(&mut oracle, &dataset).unwrap();

        assert!(summary.asked > 0);
        assert_eq!(summary.asked, session.manager().answered().len());
        assert_eq!(session.manager().n_active(), 0);

        let learned = session.space().knowledge_states(SearchStrategy::Breadth);
        for state in oracle.states() {
            assert!(learned.contains(state), "lost true state {state:?}");
        }
        // c never comes without a.
        assert!(!learned.contains(&item_set(["c"])));
        assert!(!learned.contains(&item_set(["b"])));
    }

    #[test]
    fn inference_saves_questions() {
        let (items, truth) = chain();
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut oracle = StatesOracle::from_surmise(&truth, &items, SearchStrategy::Breadth);

        let mut session = Session::new(items, config());
        let pool = session.manager().n_active();
        let summary = session.run(&mut oracle, &dataset).unwrap();
        assert!(summary.asked < pool);
    }

    #[test]
    fn skip_policy_records_unanswered() {
        let items = item_set(["a", "b"]);
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut oracle = FnOracle(|_: &ItemSet, _: &ItemId| Verdict::Uncertain);
        let cfg = SessionConfig {
            uncertain: UncertainPolicy::Skip,
            ..config()
        };

        let mut session = Session::new(items, cfg);
        let summary = session.run(&mut oracle, &dataset).unwrap();

        assert_eq!(summary.uncertain, 2);
        assert_eq!(summary.positive + summary.negative, 0);
        assert!(session.manager().answered().iter().all(|q| q.answer == Answer::Unanswered));
        assert!(session.space().p_yes().is_empty());
    }

    #[test]
    fn retry_policy_asks_again() {
        let items = item_set(["a", "b"]);
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut calls = 0;
        let mut oracle = FnOracle(|_: &ItemSet, _: &ItemId| {
            calls += 1;
            if calls % 2 == 1 {
                Verdict::Uncertain
            } else {
                Verdict::CertainPass
            }
        });

        let mut session = Session::new(items, config());
        let summary = session.run(&mut oracle, &dataset).unwrap();
        assert_eq!(summary.uncertain, 2);
        assert_eq!(summary.negative, 2);
        assert_eq!(summary.asked, 4);
    }

    #[test]
    fn run_saves_after_each_answer() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        let (items, truth) = chain();
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut oracle = StatesOracle::from_surmise(&truth, &items, SearchStrategy::Breadth);

        let mut session = Session::new(items, config()).with_log_path(&path);
        session.run(&mut oracle, &dataset).unwrap();

        let saved = AnswerLog::load(&path).unwrap();
        assert_eq!(saved.answers.len(), session.manager().answered().len());
        assert_eq!(saved.active, Some(Vec::new()));
    }

    #[test]
    fn oracle_error_stops_run_and_keeps_answers() {
        struct FailAfter(usize);
        impl Oracle for FailAfter {
            fn ask(&mut self, _: &ItemSet, _: &ItemId, _: &Dataset) -> crate::error::OracleResult<Verdict> {
                if self.0 == 0 {
                    return Err(OracleError::Closed);
                }
                self.0 -= 1;
                Ok(Verdict::CertainPass)
            }
        }

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        let items = item_set(["a", "b", "c"]);
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();

        let mut session = Session::new(items.clone(), config()).with_log_path(&path);
        let err = session.run(&mut FailAfter(2), &dataset).unwrap_err();
        assert!(matches!(err, SurmiseError::Oracle(OracleError::Closed)));

        let saved = AnswerLog::load(&path).unwrap();
        assert_eq!(saved.answers.len(), 2);

        let resumed = Session::resume(items, config(), &saved);
        assert_eq!(resumed.manager().answered().len(), 2);
        assert_eq!(resumed.space().p_no(), session.space().p_no());
        assert_eq!(resumed.manager().active(), session.manager().active());
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn debug_log_shows_space_after_each_answer() {
        let (items, truth) = chain();
        let dataset = Dataset::from_ids(items.iter().cloned()).unwrap();
        let mut oracle = StatesOracle::from_surmise(&truth, &items, SearchStrategy::Breadth);

        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut session = Session::new(items, config());
        let summary = tracing::subscriber::with_default(subscriber, || {
            session.run(&mut oracle, &dataset).unwrap()
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("learning space after answer").count(), summary.asked);
        assert!(output.contains("P_yes ("));
    }
}
