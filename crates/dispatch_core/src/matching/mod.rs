pub mod policy;

pub use policy::{
    choose_best_agent, choose_best_waiting, AgentCandidate, AssignmentPolicy, WaitingCandidate,
};
