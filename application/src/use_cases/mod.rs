//! Application use cases

pub mod run_jury;

pub use run_jury::{RunJuryError, RunJuryInput, RunJuryUseCase};
