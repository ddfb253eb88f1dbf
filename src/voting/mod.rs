//! The peer consensus-voting machine (spec.md §4.6).

pub mod candidate;
pub mod machine;

pub use candidate::{Candidate, RegisterEntry};
pub use machine::{MachineState, VotingMachine, VotingState};
