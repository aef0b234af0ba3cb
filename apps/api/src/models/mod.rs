pub mod person;
pub mod swarm_decision;
