/// Control actions an observer may request during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the run and return the summary so far.
    ///
    /// Requested on an [`Event::Record`](super::Event::Record), the run stops
    /// after that record. Requested on an
    /// [`Event::Electron`](super::Event::Electron), the unfinished event is
    /// discarded.
    StopEarly,
}
