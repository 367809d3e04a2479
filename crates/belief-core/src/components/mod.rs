//! Entity model: agents, beliefs, behaviours and the social network.

pub mod agent;
pub mod belief;
pub mod network;

pub use agent::{Agent, AgentParameters, Parameters};
pub use belief::{Behaviour, Belief};
pub use network::{Friendship, SocialNetwork};
