pub mod serialization;
pub mod session;

pub use serialization::BeliefSnapshot;
pub use session::{Finish, Game, Turn};
