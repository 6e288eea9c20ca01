mod event;
mod state;
mod state_change;

pub use raiden_light_primitives::types::*;

pub use self::{
	event::*,
	state::*,
	state_change::*,
};
