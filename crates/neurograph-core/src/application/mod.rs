/// Generation session state machine
pub mod session;

pub use session::{
    FailureKind, GenerationOutcome, SessionController, SessionFailure, SessionPhase, SessionSnapshot, TextInput,
};
