use rcopt_core::Observer;

use crate::traits::{HasIteration, HasObjective, HasProjectedGradient};

/// One recorded iterate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub iteration: usize,
    pub objective: f64,
    pub projected_gradient_norm: f64,
}

/// Records the objective and projected-gradient norm of every iterate.
///
/// The observer never acts. Pass it by mutable reference so the records
/// stay available after the run:
///
/// ```ignore
/// let mut history = History::new();
/// let solution = driver.run(&objective, &mut history)?;
/// for record in history.records() { /* ... */ }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<Record>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records in the order they were observed.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Returns `true` if every recorded objective is no larger than the one before it.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[1].objective <= pair[0].objective)
    }

    fn push<E>(&mut self, event: &E)
    where
        E: HasIteration + HasObjective + HasProjectedGradient,
    {
        self.records.push(Record {
            iteration: event.iteration(),
            objective: event.objective(),
            projected_gradient_norm: event.projected_gradient_norm(),
        });
    }
}

impl<E, A> Observer<E, A> for History
where
    E: HasIteration + HasObjective + HasProjectedGradient,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.push(event);
        None
    }
}

impl<E, A> Observer<E, A> for &mut History
where
    E: HasIteration + HasObjective + HasProjectedGradient,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.push(event);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    struct Event(usize, f64, f64);

    impl HasIteration for Event {
        fn iteration(&self) -> usize {
            self.0
        }
    }

    impl HasObjective for Event {
        fn objective(&self) -> f64 {
            self.1
        }
    }

    impl HasProjectedGradient for Event {
        fn projected_gradient_norm(&self) -> f64 {
            self.2
        }
    }

    fn feed(history: &mut History, events: &[Event]) {
        let mut observer = history;
        for event in events {
            assert!(Observer::<_, ()>::observe(&mut observer, event).is_none());
        }
    }

    #[test]
    fn records_every_event_in_order() {
        let mut history = History::new();
        feed(&mut history, &[Event(1, 4.0, 2.0), Event(2, 1.5, 0.5)]);

        assert_eq!(history.records().len(), 2);
        let last = history.last().unwrap();
        assert_eq!(last.iteration, 2);
        assert_relative_eq!(last.objective, 1.5);
        assert_relative_eq!(last.projected_gradient_norm, 0.5);
        assert!(history.is_monotone());
    }

    #[test]
    fn detects_an_increase() {
        let mut history = History::new();
        feed(&mut history, &[Event(1, 1.0, 0.0), Event(2, 2.0, 0.0)]);
        assert!(!history.is_monotone());
    }
}
