//! Change notifications for renderers. Events carry no state; receivers re-read
//! the relevant snapshot.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    StylesChanged,
    DraftsChanged,
    SessionChanged,
    CandidateChanged { index: usize },
    AnalysisChanged,
}
