//! Exercise-name to analyzer-constructor registry.

use formcheck_core::ExerciseKind;

use crate::analyzer::ExerciseAnalyzer;
use crate::pushup::PushupAnalyzer;
use crate::squat::SquatAnalyzer;

type AnalyzerCtor = fn() -> Box<dyn ExerciseAnalyzer>;

/// Explicit registration table built at startup and passed by reference
/// to whatever constructs sessions. No ambient global state.
#[derive(Debug, Default)]
pub struct AnalyzerRegistry {
    entries: Vec<(ExerciseKind, AnalyzerCtor)>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering every built-in exercise.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ExerciseKind::Squat, || Box::new(SquatAnalyzer::default()));
        registry.register(ExerciseKind::Pushup, || Box::new(PushupAnalyzer::default()));
        registry
    }

    /// Register (or replace) the constructor for an exercise.
    pub fn register(&mut self, kind: ExerciseKind, ctor: AnalyzerCtor) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = ctor;
        } else {
            self.entries.push((kind, ctor));
        }
    }

    /// Construct an analyzer by exercise name (case- and
    /// whitespace-insensitive). `None` for unknown names.
    pub fn create(&self, name: &str) -> Option<Box<dyn ExerciseAnalyzer>> {
        let kind = ExerciseKind::from_name(name)?;
        self.create_kind(kind)
    }

    pub fn create_kind(&self, kind: ExerciseKind) -> Option<Box<dyn ExerciseAnalyzer>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ctor)| ctor())
    }

    pub fn registered(&self) -> impl Iterator<Item = ExerciseKind> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}
