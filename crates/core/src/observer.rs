/// Watches a simulation run and may steer it.
///
/// The run loop hands every event it emits to its observer. Returning
/// `Some(action)` asks the loop to act, for example to stop after the current
/// record; returning `None` leaves the run alone. Progress reporting and
/// early-stop limits are both written as observers, so the loop itself stays
/// free of side effects.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer, and `()` is an
/// observer that never acts.
pub trait Observer<E, A> {
    /// Inspects `event` and optionally requests an action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
