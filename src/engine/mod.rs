pub mod clock;
pub mod judgement;
pub mod score;
pub mod session;

pub use clock::{ClockPhase, GameClock, PhaseError};
pub use judgement::{Hit, Judgement, RuntimeNote, find_candidate, judge, mark_late_misses};
pub use score::{ComboState, ScoreBoard, Tally};
pub use session::{Feedback, Session, Snapshot, TurnReport};
